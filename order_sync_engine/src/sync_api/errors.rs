use osync_common::TemplateError;
use thiserror::Error;

use crate::{
    db::traits::OrderStoreError,
    db_types::MarketplaceId,
    state_mapper::InvalidTransition,
    traits::ClientError,
};

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Remote system unavailable. {0}")]
    RemoteUnavailable(String),
    #[error("Remote system rejected the request. {0}")]
    RemoteRejected(String),
    #[error("Order cannot be sent. {0}")]
    InvalidOrder(String),
    #[error("Order {0} was changed concurrently. It will be retried on the next run")]
    Conflict(MarketplaceId),
    #[error("{0}")]
    InvalidTransition(#[from] InvalidTransition),
    #[error("Could not write the backup snapshot, so the order was not archived. {0}")]
    SnapshotFailure(String),
    #[error("Could not build the request body. {0}")]
    Template(#[from] TemplateError),
    #[error("Order {0} does not exist")]
    NotFound(MarketplaceId),
    #[error("The order store is unavailable. {0}")]
    StoreUnavailable(String),
}

impl SyncError {
    /// Errors that put an order into the `ERROR` state, because retrying without an operator will not help.
    pub fn needs_operator(&self) -> bool {
        matches!(self, Self::RemoteRejected(_) | Self::InvalidOrder(_) | Self::Template(_))
    }
}

impl From<OrderStoreError> for SyncError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::Conflict(id) => Self::Conflict(id),
            OrderStoreError::NotFound(id) => Self::NotFound(id),
            OrderStoreError::DatabaseError(s) => Self::StoreUnavailable(s),
        }
    }
}

impl From<ClientError> for SyncError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Unavailable(s) => Self::RemoteUnavailable(s),
            ClientError::Rejected { status, message } => Self::RemoteRejected(format!("Error {status}. {message}")),
        }
    }
}
