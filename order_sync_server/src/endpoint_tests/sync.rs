use std::collections::HashSet;

use actix_web::http::StatusCode;
use order_sync_engine::{
    db_types::{ErpId, MarketplaceStatus, OrderState},
    traits::{ClientError, FulfillmentStatus},
    OrderStore,
};

use super::{
    helpers::{marketplace_order, new_api, new_db, post, send_all},
    mocks::{MockFulfillment, MockMarketplace},
};

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let api = new_api(new_db().await, MockMarketplace::new(), MockFulfillment::new());
    let responses = send_all(api, &[("GET", "/health")]).await;
    assert_eq!(responses[0], (StatusCode::OK, "👍️\n".to_string()));
}

#[actix_web::test]
async fn order_lifecycle_over_http() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_new().times(1).returning(|_| Ok(vec![marketplace_order("M-100")]));
    marketplace
        .expect_push_status()
        .withf(|id, status, tracking| {
            id.as_str() == "M-100" && *status == MarketplaceStatus::Accepted && tracking.is_none()
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    marketplace
        .expect_push_status()
        .withf(|id, status, tracking| {
            id.as_str() == "M-100" && *status == MarketplaceStatus::Shipped && tracking.as_deref() == Some("1Z999")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    let mut fulfillment = MockFulfillment::new();
    fulfillment
        .expect_create_order()
        .withf(|request| {
            request.marketplace_id.as_str() == "M-100"
                && request.body["params"]["orders"][0]["clientNoteToOrder"] == "[refurbed-api-id:M-100]"
        })
        .times(1)
        .returning(|_| Ok(ErpId::from("E-900")));
    fulfillment.expect_get_status().times(1).returning(|_| {
        Ok(FulfillmentStatus {
            status: "finished".to_string(),
            tracking_number: Some("1Z999".to_string()),
            carrier: Some("UPS".to_string()),
        })
    });
    let api = new_api(db.clone(), marketplace, fulfillment);
    let responses = send_all(api, &[
        ("POST", "/fetch_orders"),
        ("POST", "/select/M-100"),
        ("POST", "/run_task"),
        ("POST", "/update_states"),
        ("POST", "/archive_orders"),
    ])
    .await;
    assert!(responses.iter().all(|(status, _)| *status == StatusCode::OK), "{responses:?}");
    assert!(responses[0].1.starts_with("fetch_new: 1 attempted, 1 succeeded, 0 skipped, 0 failed\n"));
    assert!(responses[1].1.starts_with("select_orders: 1 attempted, 1 succeeded"));
    assert!(responses[2].1.starts_with("send_selected: 1 attempted, 1 succeeded, 0 skipped, 0 failed\n"));
    assert!(responses[2].1.contains("M-100"));
    assert!(responses[3].1.starts_with("update_states: 1 attempted, 1 succeeded"));
    assert!(responses[4].1.starts_with("archive_completed: 1 attempted, 1 succeeded"));
    assert!(db.fetch_order(&"M-100".into()).await.unwrap().is_none());
    let archived = db.fetch_archived(&"M-100".into()).await.unwrap().expect("Order was not archived");
    assert_eq!(archived.erp_id, Some(ErpId::from("E-900")));
    assert_eq!(archived.tracking_number.as_deref(), Some("1Z999"));
}

#[actix_web::test]
async fn selecting_an_unknown_order() {
    let _ = env_logger::try_init().ok();
    let api = new_api(new_db().await, MockMarketplace::new(), MockFulfillment::new());
    let (status, body) = post(api, "/select/M-404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "The data was not found. Order M-404 does not exist\n");
}

#[actix_web::test]
async fn selecting_a_sent_order_is_refused() {
    let _ = env_logger::try_init().ok();
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_new().returning(|_| Ok(vec![marketplace_order("M-100")]));
    marketplace.expect_push_status().returning(|_, _, _| Ok(()));
    let mut fulfillment = MockFulfillment::new();
    fulfillment.expect_create_order().times(1).returning(|_| Ok(ErpId::from("E-900")));
    let db = new_db().await;
    let api = new_api(db.clone(), marketplace, fulfillment);
    let responses = send_all(api, &[
        ("POST", "/fetch_orders"),
        ("POST", "/select/M-100"),
        ("POST", "/run_task"),
        ("POST", "/select/M-100"),
    ])
    .await;
    assert_eq!(responses[3].0, StatusCode::CONFLICT);
    let order = db.fetch_order(&"M-100".into()).await.unwrap().unwrap();
    assert_eq!(order.state, OrderState::SentToErp);
}

#[actix_web::test]
async fn unreachable_marketplace_fails_the_fetch() {
    let _ = env_logger::try_init().ok();
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_new().returning(|_| Err(ClientError::Unavailable("connection refused".into())));
    let db = new_db().await;
    let api = new_api(db.clone(), marketplace, MockFulfillment::new());
    let (status, body) = post(api, "/fetch_orders").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("connection refused"), "{body}");
    assert!(db.list_orders(None).await.unwrap().is_empty());
}

#[actix_web::test]
async fn erp_rejections_are_reported_per_order() {
    let _ = env_logger::try_init().ok();
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_new().returning(|_| Ok(vec![marketplace_order("M-100"), marketplace_order("M-101")]));
    marketplace.expect_push_status().times(1).returning(|_, _, _| Ok(()));
    let mut fulfillment = MockFulfillment::new();
    fulfillment.expect_create_order().times(2).returning(|request| match request.marketplace_id.as_str() {
        "M-100" => Err(ClientError::Rejected { status: 422, message: "Unknown product".into() }),
        _ => Ok(ErpId::from("E-901")),
    });
    let db = new_db().await;
    let api = new_api(db.clone(), marketplace, fulfillment);
    let responses = send_all(api, &[
        ("POST", "/fetch_orders"),
        ("POST", "/select/M-100"),
        ("POST", "/select/M-101"),
        ("POST", "/run_task"),
    ])
    .await;
    let (status, body) = &responses[3];
    assert_eq!(*status, StatusCode::OK);
    assert!(body.starts_with("send_selected: 2 attempted, 1 succeeded, 0 skipped, 1 failed\n"), "{body}");
    assert!(body.contains("Unknown product"));
    let failed = db.fetch_order(&"M-100".into()).await.unwrap().unwrap();
    assert_eq!(failed.state, OrderState::Error);
    let sent = db.fetch_order(&"M-101".into()).await.unwrap().unwrap();
    assert_eq!(sent.state, OrderState::SentToErp);
}

#[actix_web::test]
async fn cancellation_lookup_with_both_systems_down() {
    let _ = env_logger::try_init().ok();
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_list_cancelled().returning(|| Err(ClientError::Unavailable("marketplace down".into())));
    let mut fulfillment = MockFulfillment::new();
    fulfillment.expect_list_cancelled().returning(|| Err(ClientError::Unavailable("erp down".into())));
    let api = new_api(new_db().await, marketplace, fulfillment);
    let (status, body) = post(api, "/process_cancelled").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("erp down"), "{body}");
}

#[actix_web::test]
async fn cancellation_with_one_system_down() {
    let _ = env_logger::try_init().ok();
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_list_cancelled().returning(|| Err(ClientError::Unavailable("marketplace down".into())));
    let mut fulfillment = MockFulfillment::new();
    fulfillment.expect_list_cancelled().returning(|| Ok(HashSet::new()));
    let api = new_api(new_db().await, marketplace, fulfillment);
    let (status, body) = post(api, "/process_cancelled").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("process_cancelled: 0 attempted"), "{body}");
    assert!(body.contains("warning: Marketplace cancellations could not be fetched"), "{body}");
}
