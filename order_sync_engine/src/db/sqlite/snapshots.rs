use log::trace;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{MarketplaceId, Order, Snapshot},
};

pub async fn insert_snapshot(
    order: &Order,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let payload =
        serde_json::to_value(order).map_err(|e| SqliteDatabaseError::SerializationError(e.to_string()))?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_snapshots (marketplace_id, reason, payload) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(order.marketplace_id.as_str())
    .bind(reason)
    .bind(Json(payload))
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Snapshot #{id} written for order {} ({reason})", order.marketplace_id);
    Ok(id)
}

pub async fn fetch_snapshots(
    id: &MarketplaceId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Snapshot>, SqliteDatabaseError> {
    let snapshots = sqlx::query_as::<_, Snapshot>(
        "SELECT id, marketplace_id, taken_at, reason, payload FROM order_snapshots WHERE marketplace_id = $1 ORDER BY \
         id ASC",
    )
    .bind(id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(snapshots)
}
