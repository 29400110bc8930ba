use std::env;

use chrono::Duration;
use idosell_tools::IdosellConfig;
use log::*;
use order_sync_engine::sync_objects::{ErrorRetryPolicy, SyncPolicy};
use refurbed_tools::RefurbedConfig;

const DEFAULT_OSYNC_HOST: &str = "127.0.0.1";
const DEFAULT_OSYNC_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/order_sync.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub policy: SyncPolicy,
    /// Replaces the built-in IdoSell create-order body
    pub create_template: Option<String>,
    /// Replaces the built-in IdoSell edit-order body
    pub edit_template: Option<String>,
    pub refurbed: RefurbedConfig,
    pub idosell: IdosellConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OSYNC_HOST.to_string(),
            port: DEFAULT_OSYNC_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            policy: SyncPolicy::default(),
            create_template: None,
            edit_template: None,
            refurbed: RefurbedConfig::default(),
            idosell: IdosellConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OSYNC_HOST").ok().unwrap_or_else(|| DEFAULT_OSYNC_HOST.into());
        let port = env::var("OSYNC_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OSYNC_PORT. {e} Using the default, {DEFAULT_OSYNC_PORT}, \
                         instead."
                    );
                    DEFAULT_OSYNC_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OSYNC_PORT);
        let database_url = env::var("OSYNC_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ OSYNC_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let policy = policy_from_env();
        let create_template = env::var("OSYNC_CREATE_TEMPLATE").ok().filter(|s| !s.trim().is_empty());
        let edit_template = env::var("OSYNC_EDIT_TEMPLATE").ok().filter(|s| !s.trim().is_empty());
        let refurbed = RefurbedConfig::new_from_env_or_default();
        let idosell = IdosellConfig::new_from_env_or_default();
        Self { host, port, database_url, policy, create_template, edit_template, refurbed, idosell }
    }
}

fn policy_from_env() -> SyncPolicy {
    let default = SyncPolicy::default();
    let error_retry = env::var("OSYNC_ERROR_RETRY")
        .map(|s| {
            s.parse::<ErrorRetryPolicy>().unwrap_or_else(|e| {
                error!("🪛️ {e}. Using the default, {}, instead.", default.error_retry);
                default.error_retry
            })
        })
        .unwrap_or(default.error_retry);
    let archive_min_age = env::var("OSYNC_ARCHIVE_MIN_AGE_HOURS").ok().and_then(|s| match s.trim().parse::<i64>() {
        Ok(hours) if hours > 0 => Some(Duration::hours(hours)),
        Ok(_) => None,
        Err(e) => {
            error!(
                "🪛️ {s} is not a valid number of hours for OSYNC_ARCHIVE_MIN_AGE_HOURS. {e} Archiving without a \
                 minimum age."
            );
            None
        },
    });
    let accept_on_send =
        env::var("OSYNC_ACCEPT_ON_SEND").map(|s| &s != "0" && &s != "false").unwrap_or(default.accept_on_send);
    SyncPolicy { error_retry, archive_min_age, accept_on_send }
}
