//! JSON request skeletons with `{{field}}` placeholders.
//!
//! Remote APIs often need large request bodies where only a handful of values change per call. A
//! [`RequestTemplate`] keeps the static structure in a JSON file and fills the placeholders from a field map:
//!
//! * a string that is exactly one placeholder (`"{{total}}"`) is replaced by the field's JSON value, so numbers and
//!   booleans keep their type;
//! * placeholders embedded in longer strings (`"[ref:{{id}}]"`) are replaced textually;
//! * everything else is copied untouched.
//!
//! Object keys are never substituted. Referencing a field that is not in the map is an error, so a typo in a template
//! cannot silently send an empty value to a remote system.
use std::{collections::BTreeSet, fs, path::Path};

use log::*;
use serde_json::{Map, Value};
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("Could not read template file {path}. {reason}")]
    Io { path: String, reason: String },
    #[error("Template is not valid JSON. {0}")]
    InvalidJson(String),
    #[error("Template references the field '{0}', but no value was provided for it")]
    MissingField(String),
}

/// A static JSON request body with `{{field}}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    body: Value,
}

impl RequestTemplate {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn from_json_str(s: &str) -> Result<Self, TemplateError> {
        let body = serde_json::from_str(s).map_err(|e| TemplateError::InvalidJson(e.to_string()))?;
        Ok(Self { body })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| TemplateError::Io { path: path.display().to_string(), reason: e.to_string() })?;
        debug!("📄️ Loaded request template from {}", path.display());
        Self::from_json_str(&contents)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The names of all placeholders referenced anywhere in the template.
    pub fn placeholders(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        collect_placeholders(&self.body, &mut names);
        names
    }

    /// Produces a new request body with every placeholder replaced by its value from `fields`.
    pub fn fill(&self, fields: &Map<String, Value>) -> Result<Value, TemplateError> {
        fill_value(&self.body, fields)
    }
}

fn fill_value(value: &Value, fields: &Map<String, Value>) -> Result<Value, TemplateError> {
    match value {
        Value::String(s) => fill_string(s, fields),
        Value::Array(items) => items.iter().map(|v| fill_value(v, fields)).collect::<Result<Vec<_>, _>>().map(Value::Array),
        Value::Object(map) => {
            let mut result = Map::with_capacity(map.len());
            for (k, v) in map {
                result.insert(k.clone(), fill_value(v, fields)?);
            }
            Ok(Value::Object(result))
        },
        other => Ok(other.clone()),
    }
}

fn fill_string(s: &str, fields: &Map<String, Value>) -> Result<Value, TemplateError> {
    if let Some(name) = whole_placeholder(s) {
        return lookup(name, fields).cloned();
    }
    if !s.contains(OPEN) {
        return Ok(Value::String(s.to_string()));
    }
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };
        result.push_str(&rest[..start]);
        let value = lookup(after_open[..end].trim(), fields)?;
        result.push_str(&render_inline(value));
        rest = &after_open[end + CLOSE.len()..];
    }
    result.push_str(rest);
    Ok(Value::String(result))
}

fn lookup<'a>(name: &str, fields: &'a Map<String, Value>) -> Result<&'a Value, TemplateError> {
    fields.get(name).ok_or_else(|| TemplateError::MissingField(name.to_string()))
}

fn whole_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    (!inner.contains(OPEN) && !inner.contains(CLOSE)).then(|| inner.trim())
}

fn render_inline(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn collect_placeholders(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            let mut rest = s.as_str();
            while let Some(start) = rest.find(OPEN) {
                let after_open = &rest[start + OPEN.len()..];
                let Some(end) = after_open.find(CLOSE) else {
                    break;
                };
                names.insert(after_open[..end].trim().to_string());
                rest = &after_open[end + CLOSE.len()..];
            }
        },
        Value::Array(items) => items.iter().for_each(|v| collect_placeholders(v, names)),
        Value::Object(map) => map.values().for_each(|v| collect_placeholders(v, names)),
        _ => {},
    }
}
