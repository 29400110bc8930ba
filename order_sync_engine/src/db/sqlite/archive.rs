use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::{orders::ORDER_COLUMNS, SqliteDatabaseError},
    db_types::{MarketplaceId, Order},
};

/// Copies the order into `archived_orders` with state `ARCHIVED` and deletes it from `orders`.
///
/// Both statements must succeed together, so always call this inside a transaction.
pub async fn move_to_archive(id: &MarketplaceId, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let copied = sqlx::query(
        r#"
        INSERT INTO archived_orders (
            marketplace_id, erp_id, state, selected, tracking_number, carrier, marketplace_synced, last_error,
            details, payload_snapshot, version, created_at, updated_at
        )
        SELECT
            marketplace_id, erp_id, 'ARCHIVED', 0, tracking_number, carrier, marketplace_synced, last_error,
            details, payload_snapshot, version, created_at, CURRENT_TIMESTAMP
        FROM orders
        WHERE marketplace_id = $1
        "#,
    )
    .bind(id.as_str())
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if copied == 0 {
        return Err(SqliteDatabaseError::OrderNotFound(id.clone()));
    }
    sqlx::query("DELETE FROM orders WHERE marketplace_id = $1").bind(id.as_str()).execute(&mut *conn).await?;
    debug!("🗃️ Order {id} moved to the archive");
    fetch_archived_order(id, conn).await?.ok_or_else(|| SqliteDatabaseError::OrderNotFound(id.clone()))
}

pub async fn fetch_archived_order(
    id: &MarketplaceId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM archived_orders WHERE marketplace_id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_archived_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM archived_orders ORDER BY id ASC");
    let orders = sqlx::query_as::<_, Order>(&sql).fetch_all(conn).await?;
    Ok(orders)
}

pub async fn is_archived(id: &MarketplaceId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM archived_orders WHERE marketplace_id = $1")
        .bind(id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}
