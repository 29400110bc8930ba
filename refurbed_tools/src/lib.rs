mod api;
mod config;
mod data_objects;
mod error;

pub mod helpers;

pub use api::RefurbedApi;
pub use config::RefurbedConfig;
pub use data_objects::{OfferData, RefurbedAddress, RefurbedOrder, RefurbedOrderItem};
pub use error::RefurbedApiError;
