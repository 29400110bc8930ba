use cucumber::World;
use log::*;
use order_sync_engine::{
    db_types::{Order, OrderState},
    sync_objects::BatchSummary,
    OrderStore,
    OrderSyncApi,
};

use crate::support::{create_template, new_db_at, random_db_url, FakeFulfillment, FakeMarketplace, TestApi};

#[derive(Default, Debug, World)]
pub struct SyncWorld {
    pub system: Option<SyncSystem>,
}

#[derive(Debug)]
pub struct SyncSystem {
    pub db_path: String,
    pub api: TestApi,
    pub last_summary: Option<BatchSummary>,
}

impl SyncSystem {
    pub async fn new() -> Self {
        let url = random_db_url();
        let db = new_db_at(&url).await;
        debug!("🚀️ Created database: {url}");
        let api = OrderSyncApi::new(db, FakeMarketplace::default(), FakeFulfillment::default(), create_template());
        Self { db_path: url, api, last_summary: None }
    }
}

impl SyncWorld {
    pub async fn system(&mut self) -> &mut SyncSystem {
        if self.system.is_none() {
            self.system = Some(SyncSystem::new().await);
        }
        self.system.as_mut().expect("System was just initialised")
    }

    pub async fn api(&mut self) -> &TestApi {
        &self.system().await.api
    }

    pub fn record(&mut self, summary: BatchSummary) {
        info!("🚀️ {summary}");
        if let Some(sys) = self.system.as_mut() {
            sys.last_summary = Some(summary);
        }
    }

    pub fn last_summary(&self) -> &BatchSummary {
        self.system.as_ref().and_then(|s| s.last_summary.as_ref()).expect("No batch has run yet")
    }

    pub async fn order(&mut self, id: &str) -> Order {
        let api = self.api().await;
        api.db().fetch_order(&id.into()).await.expect("Store error").expect("Order is not in the active store")
    }

    pub async fn state_of(&mut self, id: &str) -> OrderState {
        self.order(id).await.state
    }
}
