use crate::db::traits::{OrderStore, SnapshotStore, SyncSettings};

/// Everything the synchronizer needs from a backend.
pub trait SyncDatabase: OrderStore + SnapshotStore + SyncSettings + Clone {
    /// The URL of the database
    fn url(&self) -> &str;
}
