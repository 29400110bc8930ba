//! Business rules for turning Refurbed orders into warehouse orders.

/// Standard VAT rates, in percent, of the EU countries Refurbed sells to.
pub const VAT_RATES: [(&str, f64); 27] = [
    ("AT", 20.0),
    ("BE", 21.0),
    ("BG", 20.0),
    ("HR", 25.0),
    ("CY", 19.0),
    ("CZ", 21.0),
    ("DK", 25.0),
    ("EE", 22.0),
    ("FI", 25.5),
    ("FR", 20.0),
    ("GR", 24.0),
    ("DE", 19.0),
    ("ES", 21.0),
    ("NL", 21.0),
    ("IE", 23.0),
    ("LU", 17.0),
    ("LT", 21.0),
    ("LV", 21.0),
    ("MT", 18.0),
    ("PL", 23.0),
    ("PT", 23.0),
    ("RO", 19.0),
    ("SK", 23.0),
    ("SI", 22.0),
    ("SE", 25.0),
    ("HU", 27.0),
    ("IT", 22.0),
];

/// VAT marker for goods sold under the margin scheme.
pub const MARGIN_VAT: f64 = -1.0;

/// The seller's home country. Business buyers from here are always charged VAT.
pub const DOMESTIC_COUNTRY: &str = "PL";

pub fn standard_vat_rate(country_code: &str) -> Option<f64> {
    VAT_RATES.iter().find(|(c, _)| c.eq_ignore_ascii_case(country_code.trim())).map(|(_, rate)| *rate)
}

pub fn is_iphone(item_name: &str) -> bool {
    item_name.to_lowercase().contains("iphone")
}

/// The VAT rate to invoice.
///
/// Phones are margin-taxed. Other goods pay the destination country's rate, except that business buyers with a VAT
/// id pay none, unless they buy domestically. Countries outside the table get 0.
pub fn vat_rate(country_code: &str, company_vatin: Option<&str>, item_name: &str) -> f64 {
    if is_iphone(item_name) {
        return MARGIN_VAT;
    }
    let Some(rate) = standard_vat_rate(country_code) else {
        return 0.0;
    };
    let is_business = company_vatin.map(|v| !v.trim().is_empty()).unwrap_or(false);
    match (is_business, country_code.trim().eq_ignore_ascii_case(DOMESTIC_COUNTRY)) {
        (false, _) => rate,
        (true, true) => rate,
        (true, false) => 0.0,
    }
}

/// Maps Refurbed's offer grading onto the warehouse's grade names. Phones are not graded.
pub fn grading(offer_grading: &str, item_name: &str) -> String {
    if is_iphone(item_name) {
        return String::default();
    }
    match offer_grading.trim() {
        "B" => "A 2".to_string(),
        "C" => "A-".to_string(),
        other => other.to_string(),
    }
}

pub fn needs_battery_replacement(battery_condition: &str) -> bool {
    battery_condition.trim().eq_ignore_ascii_case("NEW")
}

/// Fills `{tracking_number}` in a carrier tracking URL template.
pub fn tracking_url(template: &str, tracking_number: &str) -> String {
    template.replace("{tracking_number}", tracking_number.trim())
}
