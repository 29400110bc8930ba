use crate::{
    db::traits::OrderStoreError,
    db_types::{MarketplaceId, Order, OrderState},
};

/// Active order rows plus the archive partition.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Orders in insertion order, optionally restricted to a single state.
    async fn list_orders(&self, state: Option<OrderState>) -> Result<Vec<Order>, OrderStoreError>;

    async fn fetch_order(&self, id: &MarketplaceId) -> Result<Option<Order>, OrderStoreError>;

    /// Inserts an unstored order or updates a stored one in place.
    ///
    /// Fails with [`OrderStoreError::Conflict`] if the order's row position is stale, or if an unstored order's
    /// marketplace id already exists. The stored row, with its new position, is returned.
    async fn upsert_order(&self, order: Order) -> Result<Order, OrderStoreError>;

    /// Moves the order into the archive partition with state `ARCHIVED` and returns the archived row.
    async fn move_to_archive(&self, id: &MarketplaceId) -> Result<Order, OrderStoreError>;

    async fn is_archived(&self, id: &MarketplaceId) -> Result<bool, OrderStoreError>;

    async fn fetch_archived(&self, id: &MarketplaceId) -> Result<Option<Order>, OrderStoreError>;

    async fn list_archived(&self) -> Result<Vec<Order>, OrderStoreError>;
}
