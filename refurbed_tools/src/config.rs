use log::*;
use osync_common::Secret;

pub const DEFAULT_BASE_URL: &str = "https://api.refurbed.com";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TRACKING_URL_TEMPLATE: &str = "https://www.ups.com/track?loc=en_GB&trackingNumber={tracking_number}";

#[derive(Debug, Clone)]
pub struct RefurbedConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    /// Orders requested per `ListOrders` page. The API caps this at 100.
    pub page_size: u32,
    /// `{tracking_number}` is replaced with the carrier's tracking number
    pub tracking_url_template: String,
}

impl Default for RefurbedConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            tracking_url_template: DEFAULT_TRACKING_URL_TEMPLATE.to_string(),
        }
    }
}

impl RefurbedConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_key = Secret::new(std::env::var("OSYNC_REFURBED_API_KEY").unwrap_or_else(|_| {
            warn!("OSYNC_REFURBED_API_KEY not set. Every request to Refurbed will be refused.");
            String::default()
        }));
        let base_url = std::env::var("OSYNC_REFURBED_BASE_URL").unwrap_or_else(|_| {
            info!("OSYNC_REFURBED_BASE_URL not set, using {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        let page_size = std::env::var("OSYNC_REFURBED_PAGE_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("Invalid OSYNC_REFURBED_PAGE_SIZE '{s}': {e}. Using the default."))
                    .ok()
            })
            .filter(|n| (1..=DEFAULT_PAGE_SIZE).contains(n))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let tracking_url_template = std::env::var("OSYNC_TRACKING_URL_TEMPLATE").unwrap_or_else(|_| {
            info!("OSYNC_TRACKING_URL_TEMPLATE not set, linking tracking numbers to UPS");
            DEFAULT_TRACKING_URL_TEMPLATE.to_string()
        });
        Self { api_key, base_url, page_size, tracking_url_template }
    }
}
