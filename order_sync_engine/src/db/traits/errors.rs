use thiserror::Error;

use crate::db_types::MarketplaceId;

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Order {0} was modified by another writer")]
    Conflict(MarketplaceId),
    #[error("Order {0} does not exist")]
    NotFound(MarketplaceId),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
