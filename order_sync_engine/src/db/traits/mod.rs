//! # Order store contracts
//!
//! The synchronizer never talks to a database directly. Backends implement these traits:
//!
//! * [`OrderStore`] holds the active order rows and the archive partition. Writes carry the row's
//!   [`RowPosition`](crate::db_types::RowPosition) and fail with a conflict when the row changed underneath them.
//! * [`SnapshotStore`] is the append-only backup partition written before destructive mutations.
//! * [`SyncSettings`] is a small key/value area for state such as the marketplace fetch cursor.
//! * [`SyncDatabase`] bundles the three for the synchronizer.
mod errors;
mod order_store;
mod snapshot_store;
mod sync_database;
mod sync_settings;

pub use errors::OrderStoreError;
pub use order_store::OrderStore;
pub use snapshot_store::SnapshotStore;
pub use sync_database::SyncDatabase;
pub use sync_settings::{SyncSettings, FETCH_CURSOR_KEY};
