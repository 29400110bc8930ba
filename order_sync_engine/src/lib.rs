//! Order Sync Engine
//!
//! Keeps a marketplace (upstream, where customers buy) and a fulfillment ERP (downstream, where orders are packed and
//! shipped) in agreement about every order. A shared order store holds one row per marketplace order and records
//! where that order is in its lifecycle.
//!
//! The library is divided into these sections:
//! 1. The order store ([`mod@db`]). Sqlite is the supported backend. Backends implement the traits in
//!    [`db::traits`](crate::OrderStore) so that the synchronizer never depends on a particular database.
//! 2. The lifecycle rules ([`state_mapper`]). A pure transition table, plus the mapping between local states and the
//!    status vocabularies of the two remote systems.
//! 3. The remote system contracts ([`traits`]). HTTP clients for specific vendors live in their own crates and
//!    implement these.
//! 4. The synchronizer itself ([`OrderSyncApi`]), whose operations run as batches over the store.
mod db;

pub mod db_types;
pub mod state_mapper;
pub mod sync_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{OrderStore, OrderStoreError, SnapshotStore, SyncDatabase, SyncSettings, FETCH_CURSOR_KEY};
pub use sync_api::{
    archiver::Archiver,
    errors::SyncError,
    order_sync_api::{template_fields, OrderSyncApi},
    sync_objects,
};
