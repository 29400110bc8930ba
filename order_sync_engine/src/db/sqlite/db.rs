use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::{archive, db_url, new_pool, orders, settings, snapshots, SqliteDatabaseError};
use crate::{
    db::traits::{OrderStore, OrderStoreError, SnapshotStore, SyncDatabase, SyncSettings},
    db_types::{MarketplaceId, Order, OrderState, Snapshot},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `OSYNC_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Creates a new database API object. The database file is created if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SyncDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl OrderStore for SqliteDatabase {
    async fn list_orders(&self, state: Option<OrderState>) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders(state, &mut conn).await?)
    }

    async fn fetch_order(&self, id: &MarketplaceId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_marketplace_id(id, &mut conn).await?)
    }

    async fn upsert_order(&self, order: Order) -> Result<Order, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = if order.is_stored() {
            orders::update_order(order, &mut conn).await?
        } else {
            orders::insert_order(order, &mut conn).await?
        };
        Ok(result)
    }

    async fn move_to_archive(&self, id: &MarketplaceId) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let archived = archive::move_to_archive(id, &mut tx).await?;
        tx.commit().await?;
        Ok(archived)
    }

    async fn is_archived(&self, id: &MarketplaceId) -> Result<bool, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(archive::is_archived(id, &mut conn).await?)
    }

    async fn fetch_archived(&self, id: &MarketplaceId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(archive::fetch_archived_order(id, &mut conn).await?)
    }

    async fn list_archived(&self) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(archive::fetch_archived_orders(&mut conn).await?)
    }
}

impl SnapshotStore for SqliteDatabase {
    async fn write_snapshot(&self, order: &Order, reason: &str) -> Result<i64, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(snapshots::insert_snapshot(order, reason, &mut conn).await?)
    }

    async fn snapshots_for(&self, id: &MarketplaceId) -> Result<Vec<Snapshot>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(snapshots::fetch_snapshots(id, &mut conn).await?)
    }
}

impl SyncSettings for SqliteDatabase {
    async fn fetch_setting(&self, key: &str) -> Result<Option<String>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settings::fetch_setting(key, &mut conn).await?)
    }

    async fn store_setting(&self, key: &str, value: &str) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        settings::upsert_setting(key, value, &mut conn).await?;
        Ok(())
    }
}
