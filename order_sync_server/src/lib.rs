//! # Order sync server
//! Hosts the order synchronization engine behind a small HTTP API. Refurbed is the marketplace and IdoSell the
//! fulfillment system; both are wired in through the adapters in [integrations].
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/fetch_orders`, `/run_task`, `/update_states`, `/process_orders`, `/process_cancelled`, `/archive_orders`: the
//!   sync actions. Each runs one batch and returns its log as plain text.
//! * `/select/{marketplace_id}`: marks an order for the next `/run_task`.

pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
