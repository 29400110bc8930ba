use log::*;
use osync_common::Secret;

pub const DEFAULT_BASE_URL: &str = "https://vedion.pl/api/admin/v5";

#[derive(Debug, Clone, Default)]
pub struct IdosellConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    /// Bank account advance payments are booked against
    pub payment_account: String,
}

impl IdosellConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_key = Secret::new(std::env::var("OSYNC_IDOSELL_API_KEY").unwrap_or_else(|_| {
            warn!("OSYNC_IDOSELL_API_KEY not set. Every request to IdoSell will be refused.");
            String::default()
        }));
        let base_url = std::env::var("OSYNC_IDOSELL_BASE_URL").unwrap_or_else(|_| {
            info!("OSYNC_IDOSELL_BASE_URL not set, using {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        let payment_account = std::env::var("OSYNC_IDOSELL_PAYMENT_ACCOUNT").unwrap_or_else(|_| {
            warn!("OSYNC_IDOSELL_PAYMENT_ACCOUNT not set. Payments will be booked without an account.");
            String::default()
        });
        Self { api_key, base_url, payment_account }
    }
}
