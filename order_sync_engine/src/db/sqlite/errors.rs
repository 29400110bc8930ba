use thiserror::Error;

use crate::{db::traits::OrderStoreError, db_types::MarketplaceId};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Order {0} was modified by another writer")]
    StaleOrder(MarketplaceId),
    #[error("Cannot insert duplicate order {0}")]
    DuplicateOrder(MarketplaceId),
    #[error("Order {0} does not exist")]
    OrderNotFound(MarketplaceId),
    #[error("Could not serialize order data: {0}")]
    SerializationError(String),
}

impl From<SqliteDatabaseError> for OrderStoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::StaleOrder(id) | SqliteDatabaseError::DuplicateOrder(id) => Self::Conflict(id),
            SqliteDatabaseError::OrderNotFound(id) => Self::NotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
