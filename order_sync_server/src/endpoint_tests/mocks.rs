use std::collections::HashSet;

use mockall::mock;
use order_sync_engine::{
    db_types::{ErpId, MarketplaceId, MarketplaceOrder, MarketplaceStatus},
    traits::{ClientError, CreateOrderRequest, FulfillmentClient, FulfillmentStatus, MarketplaceClient},
};

mock! {
    pub Marketplace {}
    impl MarketplaceClient for Marketplace {
        async fn fetch_new(&self, after: Option<MarketplaceId>) -> Result<Vec<MarketplaceOrder>, ClientError>;
        async fn push_status(&self, id: &MarketplaceId, status: MarketplaceStatus, tracking: Option<String>) -> Result<(), ClientError>;
        async fn list_cancelled(&self) -> Result<HashSet<MarketplaceId>, ClientError>;
    }
}

mock! {
    pub Fulfillment {}
    impl FulfillmentClient for Fulfillment {
        async fn create_order(&self, request: CreateOrderRequest) -> Result<ErpId, ClientError>;
        async fn get_status(&self, id: &ErpId) -> Result<FulfillmentStatus, ClientError>;
        async fn list_cancelled(&self) -> Result<HashSet<ErpId>, ClientError>;
    }
}
