use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{MarketplaceId, Order, OrderState},
};

pub(crate) const ORDER_COLUMNS: &str = "id, marketplace_id, erp_id, state, selected, tracking_number, carrier, \
                                        marketplace_synced, last_error, details, payload_snapshot, version, \
                                        created_at, updated_at";

/// Fetches orders, optionally filtered by state. Results are in insertion order.
pub async fn fetch_orders(
    state: Option<OrderState>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
    if let Some(state) = state {
        builder.push(" WHERE state = ");
        builder.push_bind(state);
    }
    builder.push(" ORDER BY id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_orders: {}", orders.len());
    Ok(orders)
}

pub async fn fetch_order_by_marketplace_id(
    id: &MarketplaceId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE marketplace_id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn order_exists(id: &MarketplaceId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE marketplace_id = $1")
        .bind(id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Inserts a new order row. The marketplace id must not exist yet.
///
/// This is not atomic. Embed the call inside a transaction if you need atomicity, and pass `&mut tx` as the connection.
pub async fn insert_order(order: Order, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let id = order.marketplace_id.clone();
    let sql = format!(
        r#"
        INSERT INTO orders (
            marketplace_id,
            erp_id,
            state,
            selected,
            tracking_number,
            carrier,
            marketplace_synced,
            last_error,
            details,
            payload_snapshot
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {ORDER_COLUMNS}
        "#
    );
    let result = sqlx::query_as::<_, Order>(&sql)
        .bind(order.marketplace_id)
        .bind(order.erp_id)
        .bind(order.state)
        .bind(order.selected)
        .bind(order.tracking_number)
        .bind(order.carrier)
        .bind(order.marketplace_synced)
        .bind(order.last_error)
        .bind(order.details)
        .bind(order.payload_snapshot)
        .fetch_one(conn)
        .await;
    match result {
        Ok(order) => {
            debug!("🗃️ Order {id} has been saved in the DB with id {}", order.id);
            Ok(order)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(SqliteDatabaseError::DuplicateOrder(id)),
        Err(e) => Err(e.into()),
    }
}

/// Overwrites a stored order, provided nobody else has written it since it was read.
///
/// The row's version is compared with the order's row position. On a match the row is updated and its version
/// incremented. Otherwise nothing is written and [`SqliteDatabaseError::StaleOrder`] is returned.
pub async fn update_order(order: Order, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let id = order.marketplace_id.clone();
    let position = order.row_position;
    let sql = format!(
        r#"
        UPDATE orders SET
            erp_id = $1,
            state = $2,
            selected = $3,
            tracking_number = $4,
            carrier = $5,
            marketplace_synced = $6,
            last_error = $7,
            details = $8,
            payload_snapshot = $9,
            version = version + 1,
            updated_at = CURRENT_TIMESTAMP
        WHERE marketplace_id = $10 AND version = $11
        RETURNING {ORDER_COLUMNS}
        "#
    );
    let updated = sqlx::query_as::<_, Order>(&sql)
        .bind(order.erp_id)
        .bind(order.state)
        .bind(order.selected)
        .bind(order.tracking_number)
        .bind(order.carrier)
        .bind(order.marketplace_synced)
        .bind(order.last_error)
        .bind(order.details)
        .bind(order.payload_snapshot)
        .bind(id.as_str())
        .bind(position)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(order) = updated else {
        if order_exists(&id, conn).await? {
            debug!("🗃️ Order {id} was not updated. Position {position} is stale.");
            return Err(SqliteDatabaseError::StaleOrder(id));
        }
        return Err(SqliteDatabaseError::OrderNotFound(id));
    };
    trace!("🗃️ Order {id} updated to {} ({})", order.state, order.row_position);
    Ok(order)
}
