#![allow(dead_code)]
//! In-memory stand-ins for the two remote systems, and a store wrapper that injects faults.
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use log::*;
use order_sync_engine::{
    db_types::{ErpId, MarketplaceId, MarketplaceOrder, MarketplaceStatus, Order, OrderDetails, OrderState, Snapshot},
    traits::{ClientError, CreateOrderRequest, FulfillmentClient, FulfillmentStatus, MarketplaceClient},
    OrderStore,
    OrderStoreError,
    OrderSyncApi,
    SnapshotStore,
    SqliteDatabase,
    SyncDatabase,
    SyncSettings,
};
use osync_common::RequestTemplate;
use serde_json::json;

pub type TestApi = OrderSyncApi<SqliteDatabase, FakeMarketplace, FakeFulfillment>;
pub type FaultyApi = OrderSyncApi<FaultyStore<SqliteDatabase>, FakeMarketplace, FakeFulfillment>;

pub fn random_db_url() -> String {
    format!("sqlite://{}/osync_it_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn new_db_at(url: &str) -> SqliteDatabase {
    let _ = env_logger::try_init();
    let db = SqliteDatabase::new_with_url(url, 1).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub async fn new_db() -> SqliteDatabase {
    new_db_at(&random_db_url()).await
}

pub fn create_template() -> RequestTemplate {
    RequestTemplate::new(json!({
        "params": {
            "orders": [{
                "orderId": "{{external_ref}}",
                "clientNote": "Order {{marketplace_id}}",
                "country": "{{country}}",
                "currency": "{{currency}}",
                "total": "{{total_paid}}",
                "productVat": "{{product_vat}}",
                "sku": "{{sku}}"
            }]
        }
    }))
}

pub async fn new_api() -> TestApi {
    let db = new_db().await;
    OrderSyncApi::new(db, FakeMarketplace::default(), FakeFulfillment::default(), create_template())
}

pub fn marketplace_order(id: &str) -> MarketplaceOrder {
    let details = OrderDetails {
        country: "DE".into(),
        currency: "EUR".into(),
        total_paid: 449.0,
        vat_rate: 19.0,
        grading: "A 2".into(),
        sku: "IPAD-9-64".into(),
        item_name: "iPad 9 64GB".into(),
        item_count: 1,
        customer_name: "Erika Mustermann".into(),
        email: "erika@example.com".into(),
        ..Default::default()
    };
    MarketplaceOrder {
        marketplace_id: id.into(),
        state: "ACCEPTED".into(),
        details,
        payload: json!({"id": id, "state": "ACCEPTED", "released_at": "2024-06-01T10:00:00Z"}),
    }
}

/// An API over a fresh database whose store faults can be switched on through `api.db()`.
pub async fn new_faulty_api() -> FaultyApi {
    let db = FaultyStore::new(new_db().await);
    OrderSyncApi::new(db, FakeMarketplace::default(), FakeFulfillment::default(), create_template())
}

pub async fn order<B: SyncDatabase, M, F>(api: &OrderSyncApi<B, M, F>, id: &str) -> Order {
    api.db().fetch_order(&id.into()).await.expect("Store error").expect("Order is not in the active store")
}

//--------------------------------------    FakeMarketplace    ---------------------------------------------------------
#[derive(Debug, Default)]
pub struct MarketplaceState {
    /// Orders in the order the marketplace returns them
    pub orders: Vec<MarketplaceOrder>,
    pub cancelled: HashSet<MarketplaceId>,
    pub pushes: Vec<(MarketplaceId, MarketplaceStatus, Option<String>)>,
    pub fetch_cursors: Vec<Option<MarketplaceId>>,
    pub fail_fetch: bool,
    pub fail_push: bool,
    pub fail_cancel_list: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeMarketplace {
    state: Arc<Mutex<MarketplaceState>>,
}

impl FakeMarketplace {
    pub fn state(&self) -> MutexGuard<'_, MarketplaceState> {
        self.state.lock().expect("Poisoned marketplace state")
    }

    pub fn add_order(&self, order: MarketplaceOrder) {
        self.state().orders.push(order);
    }

    pub fn pushes_of(&self, status: MarketplaceStatus) -> Vec<(MarketplaceId, Option<String>)> {
        self.state().pushes.iter().filter(|(_, s, _)| *s == status).map(|(id, _, t)| (id.clone(), t.clone())).collect()
    }
}

impl MarketplaceClient for FakeMarketplace {
    async fn fetch_new(&self, after: Option<MarketplaceId>) -> Result<Vec<MarketplaceOrder>, ClientError> {
        let mut state = self.state();
        state.fetch_cursors.push(after.clone());
        if state.fail_fetch {
            return Err(ClientError::Unavailable("marketplace is down".into()));
        }
        let start = match after {
            Some(id) => state.orders.iter().position(|o| o.marketplace_id == id).map(|i| i + 1).unwrap_or(0),
            None => 0,
        };
        Ok(state.orders[start..].to_vec())
    }

    async fn push_status(
        &self,
        id: &MarketplaceId,
        status: MarketplaceStatus,
        tracking: Option<String>,
    ) -> Result<(), ClientError> {
        let mut state = self.state();
        if state.fail_push {
            return Err(ClientError::Unavailable("marketplace is down".into()));
        }
        state.pushes.push((id.clone(), status, tracking));
        Ok(())
    }

    async fn list_cancelled(&self) -> Result<HashSet<MarketplaceId>, ClientError> {
        let state = self.state();
        if state.fail_cancel_list {
            return Err(ClientError::Unavailable("marketplace is down".into()));
        }
        Ok(state.cancelled.clone())
    }
}

//--------------------------------------    FakeFulfillment    ---------------------------------------------------------
#[derive(Debug, Default)]
pub struct FulfillmentState {
    pub created: Vec<CreateOrderRequest>,
    /// ERP ids by the external reference written into each order
    pub by_external_ref: HashMap<String, ErpId>,
    pub create_calls: usize,
    /// Orders that will be rejected with the given status and message
    pub rejections: HashMap<MarketplaceId, (u16, String)>,
    pub statuses: HashMap<ErpId, FulfillmentStatus>,
    pub cancelled: HashSet<ErpId>,
    pub unavailable: bool,
    pub fail_cancel_list: bool,
}

/// Hands out ERP ids E-900, E-901, ... in creation order. A request whose external reference is already known returns
/// the existing order instead of creating another one.
#[derive(Debug, Clone, Default)]
pub struct FakeFulfillment {
    state: Arc<Mutex<FulfillmentState>>,
}

impl FakeFulfillment {
    pub fn state(&self) -> MutexGuard<'_, FulfillmentState> {
        self.state.lock().expect("Poisoned fulfillment state")
    }

    pub fn reject(&self, id: &str, status: u16, message: &str) {
        self.state().rejections.insert(id.into(), (status, message.into()));
    }

    pub fn ship(&self, erp_id: &str, tracking: &str) {
        let status = FulfillmentStatus {
            status: "finished".into(),
            tracking_number: Some(tracking.into()),
            carrier: Some("UPS".into()),
        };
        self.state().statuses.insert(erp_id.into(), status);
    }

    pub fn created_count(&self) -> usize {
        self.state().created.len()
    }
}

impl FulfillmentClient for FakeFulfillment {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<ErpId, ClientError> {
        let mut state = self.state();
        state.create_calls += 1;
        if state.unavailable {
            return Err(ClientError::Unavailable("ERP timed out".into()));
        }
        if let Some((status, message)) = state.rejections.get(&request.marketplace_id) {
            return Err(ClientError::Rejected { status: *status, message: message.clone() });
        }
        if let Some(erp_id) = state.by_external_ref.get(&request.external_ref) {
            debug!("🚀️ {} already exists as {erp_id}", request.external_ref);
            return Ok(erp_id.clone());
        }
        let erp_id = ErpId::from(format!("E-{}", 900 + state.created.len()));
        state.by_external_ref.insert(request.external_ref.clone(), erp_id.clone());
        state.created.push(request);
        Ok(erp_id)
    }

    async fn get_status(&self, id: &ErpId) -> Result<FulfillmentStatus, ClientError> {
        let state = self.state();
        if state.unavailable {
            return Err(ClientError::Unavailable("ERP timed out".into()));
        }
        let status = state
            .statuses
            .get(id)
            .cloned()
            .unwrap_or_else(|| FulfillmentStatus { status: "on_order".into(), ..Default::default() });
        Ok(status)
    }

    async fn list_cancelled(&self) -> Result<HashSet<ErpId>, ClientError> {
        let state = self.state();
        if state.fail_cancel_list {
            return Err(ClientError::Unavailable("ERP timed out".into()));
        }
        Ok(state.cancelled.clone())
    }
}

//--------------------------------------      FaultyStore      ---------------------------------------------------------
#[derive(Debug, Default)]
pub struct StoreFaults {
    /// The next write of this order into this state fails
    pub fail_write: Option<(MarketplaceId, OrderState)>,
    /// Just before the next write of this order into this state, another writer changes the row
    pub race_write: Option<(MarketplaceId, OrderState)>,
    pub fail_snapshots: bool,
}

/// Delegates everything to the wrapped store, apart from the faults switched on in [`StoreFaults`].
#[derive(Debug, Clone)]
pub struct FaultyStore<B> {
    inner: B,
    faults: Arc<Mutex<StoreFaults>>,
}

pub const CONCURRENT_NOTE: &str = "changed by another writer";

impl<B> FaultyStore<B> {
    pub fn new(inner: B) -> Self {
        Self { inner, faults: Arc::new(Mutex::new(StoreFaults::default())) }
    }

    pub fn faults(&self) -> MutexGuard<'_, StoreFaults> {
        self.faults.lock().expect("Poisoned store faults")
    }

    fn take_if_matches(slot: &mut Option<(MarketplaceId, OrderState)>, order: &Order) -> bool {
        let hit = matches!(slot, Some((id, state)) if *id == order.marketplace_id && *state == order.state);
        if hit {
            *slot = None;
        }
        hit
    }
}

impl<B: OrderStore> OrderStore for FaultyStore<B> {
    async fn list_orders(&self, state: Option<OrderState>) -> Result<Vec<Order>, OrderStoreError> {
        self.inner.list_orders(state).await
    }

    async fn fetch_order(&self, id: &MarketplaceId) -> Result<Option<Order>, OrderStoreError> {
        self.inner.fetch_order(id).await
    }

    async fn upsert_order(&self, order: Order) -> Result<Order, OrderStoreError> {
        let (fail, race) = {
            let mut faults = self.faults();
            let fail = Self::take_if_matches(&mut faults.fail_write, &order);
            let race = Self::take_if_matches(&mut faults.race_write, &order);
            (fail, race)
        };
        if fail {
            debug!("🚀️ Failing the write of {} as {}", order.marketplace_id, order.state);
            return Err(OrderStoreError::DatabaseError("database is locked".into()));
        }
        if race {
            if let Some(mut current) = self.inner.fetch_order(&order.marketplace_id).await? {
                debug!("🚀️ Changing {} before the write lands", order.marketplace_id);
                current.details.notes = Some(CONCURRENT_NOTE.into());
                self.inner.upsert_order(current).await?;
            }
        }
        self.inner.upsert_order(order).await
    }

    async fn move_to_archive(&self, id: &MarketplaceId) -> Result<Order, OrderStoreError> {
        self.inner.move_to_archive(id).await
    }

    async fn is_archived(&self, id: &MarketplaceId) -> Result<bool, OrderStoreError> {
        self.inner.is_archived(id).await
    }

    async fn fetch_archived(&self, id: &MarketplaceId) -> Result<Option<Order>, OrderStoreError> {
        self.inner.fetch_archived(id).await
    }

    async fn list_archived(&self) -> Result<Vec<Order>, OrderStoreError> {
        self.inner.list_archived().await
    }
}

impl<B: SnapshotStore> SnapshotStore for FaultyStore<B> {
    async fn write_snapshot(&self, order: &Order, reason: &str) -> Result<i64, OrderStoreError> {
        if self.faults().fail_snapshots {
            return Err(OrderStoreError::DatabaseError("disk full".into()));
        }
        self.inner.write_snapshot(order, reason).await
    }

    async fn snapshots_for(&self, id: &MarketplaceId) -> Result<Vec<Snapshot>, OrderStoreError> {
        self.inner.snapshots_for(id).await
    }
}

impl<B: SyncSettings> SyncSettings for FaultyStore<B> {
    async fn fetch_setting(&self, key: &str) -> Result<Option<String>, OrderStoreError> {
        self.inner.fetch_setting(key).await
    }

    async fn store_setting(&self, key: &str, value: &str) -> Result<(), OrderStoreError> {
        self.inner.store_setting(key, value).await
    }
}

impl<B: SyncDatabase> SyncDatabase for FaultyStore<B> {
    fn url(&self) -> &str {
        self.inner.url()
    }
}
