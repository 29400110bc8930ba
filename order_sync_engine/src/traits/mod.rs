//! Capability interfaces for the two remote systems.
//!
//! The synchronizer is generic over these traits. The server wires in HTTP implementations; tests substitute doubles.
mod clients;

pub use clients::{ClientError, CreateOrderRequest, FulfillmentClient, FulfillmentStatus, MarketplaceClient};
