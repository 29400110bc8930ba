use crate::{
    db::traits::OrderStoreError,
    db_types::{MarketplaceId, Order, Snapshot},
};

/// Append-only backups of order rows.
#[allow(async_fn_in_trait)]
pub trait SnapshotStore {
    /// Writes a full copy of `order` and returns the snapshot id.
    async fn write_snapshot(&self, order: &Order, reason: &str) -> Result<i64, OrderStoreError>;

    async fn snapshots_for(&self, id: &MarketplaceId) -> Result<Vec<Snapshot>, OrderStoreError>;
}
