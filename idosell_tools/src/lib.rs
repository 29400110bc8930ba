mod api;
mod config;
mod data_objects;
mod error;

pub mod helpers;
pub mod templates;

pub use api::IdosellApi;
pub use config::IdosellConfig;
pub use data_objects::{bundle_parent, BundleItem, IdosellOrderStatus, NewOrderEdit};
pub use error::IdosellApiError;
