use chrono::{DateTime, Utc};
use serde::{de::Error, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::RefurbedApiError;

/// Refurbed sends 64-bit ids as JSON strings, but older endpoints sometimes use bare numbers.
fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::default()),
        other => Err(D::Error::custom(format!("{other} is not a valid id"))),
    }
}

/// Money amounts are decimal strings (`"449.00"`). Numbers are accepted too.
fn de_amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().ok_or_else(|| D::Error::custom(format!("{n} is not a valid amount"))),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => {
            s.trim().parse::<f64>().map_err(|e| D::Error::custom(format!("'{s}' is not an amount. {e}")))
        },
        Value::Null => Ok(0.0),
        other => Err(D::Error::custom(format!("{other} is not a valid amount"))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefurbedAddress {
    pub first_name: String,
    pub family_name: String,
    pub company_name: String,
    pub company_vatin: String,
    pub street_name: String,
    pub house_no: String,
    pub supplement: String,
    pub post_code: String,
    pub town: String,
    pub country_code: String,
    pub phone_number: String,
}

impl RefurbedAddress {
    /// Street name, house number and supplement on a single line.
    pub fn street_line(&self) -> String {
        [self.street_name.as_str(), self.house_no.as_str(), self.supplement.as_str()]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.family_name.trim()).trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferData {
    pub offer_grading: String,
    pub battery_condition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefurbedOrderItem {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub sku: String,
    pub state: String,
    #[serde(deserialize_with = "de_amount")]
    pub total_charged: f64,
    pub offer_data: Option<OfferData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefurbedOrder {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub state: String,
    pub shipping_address: RefurbedAddress,
    pub invoice_address: RefurbedAddress,
    pub customer_email: String,
    pub settlement_currency_code: String,
    #[serde(deserialize_with = "de_amount")]
    pub settlement_total_paid: f64,
    #[serde(deserialize_with = "de_amount")]
    pub total_charged: f64,
    pub released_at: Option<DateTime<Utc>>,
    pub items: Vec<RefurbedOrderItem>,
    /// The order exactly as Refurbed sent it
    #[serde(skip)]
    pub raw: Value,
}

impl RefurbedOrder {
    pub fn from_value(value: Value) -> Result<Self, RefurbedApiError> {
        let mut order = serde_json::from_value::<Self>(value.clone())
            .map_err(|e| RefurbedApiError::JsonError(format!("Invalid order: {e}")))?;
        order.raw = value;
        Ok(order)
    }

    pub fn first_item(&self) -> Option<&RefurbedOrderItem> {
        self.items.first()
    }

    /// The number of items in the order.
    ///
    /// Some responses only list the first item. A total that differs from the first item's charge still reveals
    /// that there are more, in which case at least 2 is returned.
    pub fn item_count(&self) -> u32 {
        let listed = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        match self.first_item() {
            Some(item) if listed == 1 && (item.total_charged - self.total_charged).abs() > 0.005 => 2,
            _ => listed,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersResponse {
    #[serde(default)]
    pub orders: Vec<Value>,
}
