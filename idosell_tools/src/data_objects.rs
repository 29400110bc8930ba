use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::IdosellApiError;

/// IdoSell ids are integers in some responses and strings in others. They are kept as text here.
pub fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// The part of an IdoSell order the synchronizer cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdosellOrderStatus {
    pub serial_number: String,
    /// The raw `orderStatus`, e.g. `on_order`, `finished` or `canceled`
    pub status: String,
    pub delivery_package_id: Option<String>,
    pub courier: Option<String>,
}

impl IdosellOrderStatus {
    /// Reads one entry of a `Results` array from the orders endpoints.
    pub fn from_result(result: &Value) -> Result<Self, IdosellApiError> {
        let serial_number = id_text(&result["orderSerialNumber"])
            .ok_or_else(|| IdosellApiError::JsonError("Order result has no orderSerialNumber".to_string()))?;
        let details = &result["orderDetails"];
        let status = details["orderStatus"]
            .as_str()
            .ok_or_else(|| IdosellApiError::JsonError(format!("Order {serial_number} has no orderStatus")))?
            .to_string();
        let delivery_package_id = id_text(&details["dispatch"]["deliveryPackageId"]);
        let courier = details["dispatch"]["courierName"].as_str().map(|s| s.to_string()).filter(|s| !s.is_empty());
        Ok(Self { serial_number, status, delivery_package_id, courier })
    }
}

/// The external reference an order was created with, read from its note to the shop.
pub fn external_ref_of(result: &Value) -> Option<&str> {
    result["orderDetails"]["clientNoteToOrder"].as_str().or_else(|| result["clientNoteToOrder"].as_str())
}

/// One product of a bundle, as listed under `productBundleItems`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleItem {
    pub product_id: String,
    /// The visible item of a bundle is its parent product
    pub shown: bool,
}

impl BundleItem {
    /// Reads the bundle items of a product from the products endpoint. A product that is not a bundle has none.
    pub fn list(product: &Value) -> Vec<Self> {
        let Some(items) = product["productBundleItems"].as_array() else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| {
                let product_id = id_text(&item["productId"])?;
                Some(Self { product_id, shown: item["isBundleShown"].as_bool().unwrap_or(false) })
            })
            .collect()
    }
}

/// The parent product of a bundle.
pub fn bundle_parent(items: &[BundleItem]) -> Option<&str> {
    items.iter().find(|i| i.shown).map(|i| i.product_id.as_str())
}

/// A follow-up change to an order that was just created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderEdit {
    pub serial_number: String,
    pub status: String,
    pub note: String,
}
