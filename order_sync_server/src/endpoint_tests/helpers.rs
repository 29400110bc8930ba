use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use order_sync_engine::{
    db_types::{MarketplaceOrder, OrderDetails},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    OrderSyncApi,
    SqliteDatabase,
};
use serde_json::json;

use super::mocks::{MockFulfillment, MockMarketplace};
use crate::{routes::health, server::sync_routes};

pub type TestApi = OrderSyncApi<SqliteDatabase, MockMarketplace, MockFulfillment>;

pub async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub fn new_api(db: SqliteDatabase, marketplace: MockMarketplace, fulfillment: MockFulfillment) -> TestApi {
    let template = idosell_tools::templates::default_create_template().expect("Built-in template is invalid");
    OrderSyncApi::new(db, marketplace, fulfillment, template)
}

pub fn marketplace_order(id: &str) -> MarketplaceOrder {
    MarketplaceOrder {
        marketplace_id: id.into(),
        state: "NEW".to_string(),
        details: OrderDetails {
            country: "DE".to_string(),
            currency: "EUR".to_string(),
            total_paid: 449.0,
            vat_rate: 19.0,
            grading: "A 2".to_string(),
            item_name: "MacBook Air 13\" | 8 GB | 256 GB SSD | DE".to_string(),
            item_count: 1,
            customer_name: "Erika Mustermann".to_string(),
            ..OrderDetails::default()
        },
        payload: json!({ "id": id, "state": "NEW" }),
    }
}

/// Sends each request in turn to one app instance and collects the responses.
pub async fn send_all(api: TestApi, requests: &[(&str, &str)]) -> Vec<(StatusCode, String)> {
    let app = App::new()
        .app_data(web::Data::new(api))
        .service(health)
        .configure(sync_routes::<SqliteDatabase, MockMarketplace, MockFulfillment>);
    let service = test::init_service(app).await;
    let mut responses = Vec::with_capacity(requests.len());
    for (method, path) in requests {
        let req = match *method {
            "GET" => TestRequest::get(),
            _ => TestRequest::post(),
        };
        let res = test::call_service(&service, req.uri(path).to_request()).await;
        let status = res.status();
        let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
        debug!("🚀️ {method} {path} returned {status}\n{body}");
        responses.push((status, body));
    }
    responses
}

pub async fn post(api: TestApi, path: &str) -> (StatusCode, String) {
    send_all(api, &[("POST", path)]).await.remove(0)
}
