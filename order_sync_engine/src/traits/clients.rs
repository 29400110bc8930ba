use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::db_types::{ErpId, MarketplaceId, MarketplaceOrder, MarketplaceStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Network failure, timeout or a 5xx response. Worth retrying later.
    #[error("Remote service is unavailable. {0}")]
    Unavailable(String),
    /// The remote system refused the request. Retrying the same request will not help.
    #[error("Remote service rejected the request. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

impl ClientError {
    /// Classifies an HTTP error status.
    pub fn from_status(status: u16, message: String) -> Self {
        if status >= 500 || status == 429 || status == 408 {
            Self::Unavailable(format!("Error {status}. {message}"))
        } else {
            Self::Rejected { status, message }
        }
    }
}

/// A request to create an order in the fulfillment system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub marketplace_id: MarketplaceId,
    /// Stable reference stored with the ERP order. See [`MarketplaceId::external_ref`].
    pub external_ref: String,
    /// The filled create-order template
    pub body: Value,
    /// The values the template was filled from, for follow-up requests
    pub fields: Map<String, Value>,
}

/// The fulfillment system's raw view of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentStatus {
    pub status: String,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
}

/// The upstream marketplace.
#[allow(async_fn_in_trait)]
pub trait MarketplaceClient {
    /// All orders placed after `after`, oldest first. Pagination is handled internally. If any page fails, the whole
    /// call fails.
    async fn fetch_new(&self, after: Option<MarketplaceId>) -> Result<Vec<MarketplaceOrder>, ClientError>;

    /// Pushes a status, with tracking for shipments, to the marketplace.
    async fn push_status(
        &self,
        id: &MarketplaceId,
        status: MarketplaceStatus,
        tracking: Option<String>,
    ) -> Result<(), ClientError>;

    async fn list_cancelled(&self) -> Result<HashSet<MarketplaceId>, ClientError>;
}

/// The downstream fulfillment/ERP system.
#[allow(async_fn_in_trait)]
pub trait FulfillmentClient {
    /// Creates the order and returns its ERP id.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<ErpId, ClientError>;

    async fn get_status(&self, id: &ErpId) -> Result<FulfillmentStatus, ClientError>;

    async fn list_cancelled(&self) -> Result<HashSet<ErpId>, ClientError>;
}
