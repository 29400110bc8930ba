use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{OrderStore, SnapshotStore},
    db_types::Order,
    state_mapper::{self, Trigger},
    sync_api::errors::SyncError,
};

pub const ARCHIVE_SNAPSHOT_REASON: &str = "archive";

/// Relocates terminal orders into the archive partition.
///
/// A snapshot of the full row is always written first. If that write fails, the order stays where it is and the
/// sweep moves on to the next one.
pub struct Archiver<B> {
    db: B,
}

impl<B> Debug for Archiver<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Archiver")
    }
}

impl<B> Archiver<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> Archiver<B>
where B: OrderStore + SnapshotStore
{

    /// Snapshots and archives a single order, returning the archived row.
    pub async fn archive(&self, order: &Order) -> Result<Order, SyncError> {
        let id = &order.marketplace_id;
        state_mapper::next_state(order.state, Trigger::ArchiveSweep)?;
        let snapshot_id = self.db.write_snapshot(order, ARCHIVE_SNAPSHOT_REASON).await.map_err(|e| {
            error!("🗄️ Could not snapshot order {id}. It will not be archived. {e}");
            SyncError::SnapshotFailure(e.to_string())
        })?;
        trace!("🗄️ Snapshot #{snapshot_id} written for order {id}");
        let archived = self.db.move_to_archive(id).await?;
        info!("🗄️ Order {id} archived from state {}", order.state);
        Ok(archived)
    }
}
