//! IdoSell-specific conventions for order bodies.
use serde_json::{json, Value};

use crate::BundleItem;

pub const STATUS_ON_ORDER: &str = "on_order";
pub const STATUS_WAIT_FOR_PACKAGING: &str = "wait_for_packaging";

/// Country names as the Polish IdoSell panel expects them.
pub const COUNTRY_NAMES: [(&str, &str); 27] = [
    ("AT", "Austria"),
    ("BE", "Belgia"),
    ("BG", "Bułgaria"),
    ("HR", "Chorwacja"),
    ("CY", "Cypr"),
    ("CZ", "Czechy"),
    ("DK", "Dania"),
    ("EE", "Estonia"),
    ("FI", "Finlandia"),
    ("FR", "Francja"),
    ("GR", "Grecja"),
    ("DE", "Niemcy"),
    ("ES", "Hiszpania"),
    ("NL", "Holandia"),
    ("IE", "Irlandia"),
    ("LU", "Luksemburg"),
    ("LT", "Litwa"),
    ("LV", "Łotwa"),
    ("MT", "Malta"),
    ("PL", "Polska"),
    ("PT", "Portugalia"),
    ("RO", "Rumunia"),
    ("SK", "Słowacja"),
    ("SI", "Słowenia"),
    ("SE", "Szwecja"),
    ("HU", "Węgry"),
    ("IT", "Włochy"),
];

const LANG_IDS: [(&str, &str); 5] = [("PL", "pol"), ("DE", "ger"), ("FR", "fre"), ("IT", "ita"), ("ES", "spa")];
const DEFAULT_LANG_ID: &str = "eng";

pub fn country_name(code: &str) -> Option<&'static str> {
    COUNTRY_NAMES.iter().find(|(c, _)| c.eq_ignore_ascii_case(code.trim())).map(|(_, name)| *name)
}

pub fn lang_id(country_code: &str) -> &'static str {
    LANG_IDS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(country_code.trim()))
        .map(|(_, lang)| *lang)
        .unwrap_or(DEFAULT_LANG_ID)
}

/// The status a freshly created order is moved to. Margin-taxed phones skip straight to packaging.
pub fn initial_status(margin_taxed: bool) -> &'static str {
    if margin_taxed {
        STATUS_WAIT_FOR_PACKAGING
    } else {
        STATUS_ON_ORDER
    }
}

/// Replaces country codes in a filled create body with the names and language ids IdoSell expects.
///
/// Codes without a known name are left as they are.
pub fn localize_create_body(body: &mut Value) {
    let Some(orders) = body.pointer_mut("/params/orders").and_then(Value::as_array_mut) else {
        return;
    };
    for order in orders {
        if let Some(client) = order.get_mut("clientWithoutAccountData").and_then(Value::as_object_mut) {
            if let Some(code) = client.get("clientCountry").and_then(Value::as_str).map(str::to_string) {
                if let Some(name) = country_name(&code) {
                    client.insert("clientCountry".to_string(), Value::from(name));
                }
                client.insert("langId".to_string(), Value::from(lang_id(&code)));
            }
        }
        if let Some(delivery) = order.get_mut("clientDeliveryAddress").and_then(Value::as_object_mut) {
            let code = delivery.get("clientDeliveryAddressCountry").and_then(Value::as_str).map(str::to_string);
            if let Some(name) = code.as_deref().and_then(country_name) {
                delivery.insert("clientDeliveryAddressCountry".to_string(), Value::from(name));
            }
        }
    }
}

/// Lists the bundle's items on the first product line of each order. Bodies are left alone for products that are
/// not bundles.
pub fn add_bundle_items(body: &mut Value, items: &[BundleItem]) {
    if items.is_empty() {
        return;
    }
    let Some(orders) = body.pointer_mut("/params/orders").and_then(Value::as_array_mut) else {
        return;
    };
    let bundle = items.iter().map(|i| json!({ "productId": serial_or_text(&i.product_id), "sizeId": "uniw" }));
    let bundle = Value::Array(bundle.collect());
    for order in orders {
        let product = order.pointer_mut("/products/0").and_then(Value::as_object_mut);
        if let Some(product) = product {
            product.insert("productBundleItems".to_string(), bundle.clone());
        }
    }
}

fn serial_or_text(id: &str) -> Value {
    id.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::from(id))
}

/// The disk size in a Refurbed item name such as `MacBook Air | 8 GB | 256 GB SSD | DE`.
fn disk_size(item_name: &str) -> Option<String> {
    item_name.split('|').map(str::trim).find_map(|part| {
        let is_disk = ["GB SSD", "TB SSD", "GB HDD", "TB HDD"].iter().any(|d| part.contains(d));
        is_disk.then(|| part.replace("SSD", "").replace("HDD", "").trim().to_string())
    })
}

/// The keyboard layout is the last `|`-separated part of a laptop's item name.
fn keyboard_layout(item_name: &str) -> String {
    item_name.rsplit('|').next().map(str::trim).unwrap_or_default().to_string()
}

/// The warehouse note attached to the product line.
///
/// Laptops list the bundle's parent product, grade, disk and keyboard layout. Phones only note a battery swap.
pub fn product_note(
    item_name: &str,
    grading: &str,
    battery_replacement: bool,
    margin_taxed: bool,
    parent_id: Option<&str>,
) -> String {
    if margin_taxed {
        return if battery_replacement { "Wymiana baterii na 100%".to_string() } else { String::default() };
    }
    let mut note = parent_id.map(|id| format!("ID matki: {id}\n")).unwrap_or_default();
    note.push_str(&format!("Klasa {grading}\n"));
    note.push_str(&format!("Dysk: {}\n", disk_size(item_name).unwrap_or_default()));
    note.push_str(&format!("Klawiatura: {}\n", keyboard_layout(item_name)));
    if battery_replacement {
        note.push_str("Wymiana baterii\n");
    }
    note
}
