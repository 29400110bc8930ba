//! The request skeletons IdoSell order calls are built from.
//!
//! Both ship with the crate. A deployment can point at its own files instead, e.g. to change the shop id or the
//! payment type.
use log::*;
use osync_common::{RequestTemplate, TemplateError};

pub const CREATE_BODY: &str = include_str!("../templates/create_body.json");
pub const EDIT_BODY: &str = include_str!("../templates/edit_body.json");

pub fn default_create_template() -> Result<RequestTemplate, TemplateError> {
    RequestTemplate::from_json_str(CREATE_BODY)
}

pub fn default_edit_template() -> Result<RequestTemplate, TemplateError> {
    RequestTemplate::from_json_str(EDIT_BODY)
}

/// Loads the template at `path`, or the built-in one when no path is configured.
pub fn load_or_default(path: Option<&str>, default: &str) -> Result<RequestTemplate, TemplateError> {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => RequestTemplate::from_file(p),
        None => {
            debug!("Using the built-in request template");
            RequestTemplate::from_json_str(default)
        },
    }
}
