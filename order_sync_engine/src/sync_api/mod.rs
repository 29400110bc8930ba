//! # Synchronizer public API
//!
//! [`OrderSyncApi`] is the entry point. It is created from a store backend implementing
//! [`SyncDatabase`](crate::SyncDatabase), a [`MarketplaceClient`](crate::traits::MarketplaceClient) and a
//! [`FulfillmentClient`](crate::traits::FulfillmentClient):
//!
//! ```rust,ignore
//! use order_sync_engine::{OrderSyncApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/order_sync.db", 5).await?;
//! let api = OrderSyncApi::new(db, marketplace, erp, template);
//! let summary = api.fetch_new().await?;
//! println!("{summary}");
//! ```
//!
//! Each operation returns a [`sync_objects::BatchSummary`] describing what happened to every row it touched.
//! [`archiver`] handles the snapshot-then-move step of the archive sweep.
pub mod archiver;
pub mod errors;
pub mod order_sync_api;
pub mod sync_objects;
