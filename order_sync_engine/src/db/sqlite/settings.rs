use sqlx::SqliteConnection;

use crate::db::sqlite::SqliteDatabaseError;

pub async fn fetch_setting(key: &str, conn: &mut SqliteConnection) -> Result<Option<String>, SqliteDatabaseError> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM sync_settings WHERE key = $1")
        .bind(key)
        .fetch_optional(conn)
        .await?;
    Ok(value)
}

pub async fn upsert_setting(key: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO sync_settings (key, value) VALUES ($1, $2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}
