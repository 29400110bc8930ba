use crate::db::traits::OrderStoreError;

/// The marketplace id of the most recently imported order.
pub const FETCH_CURSOR_KEY: &str = "last_fetched_id";

#[allow(async_fn_in_trait)]
pub trait SyncSettings {
    async fn fetch_setting(&self, key: &str) -> Result<Option<String>, OrderStoreError>;

    async fn store_setting(&self, key: &str, value: &str) -> Result<(), OrderStoreError>;
}
