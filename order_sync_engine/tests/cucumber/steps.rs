use std::str::FromStr;

use cucumber::{given, then, when};
use order_sync_engine::{db_types::OrderState, OrderStore};

use crate::{cucumber::SyncWorld, support::marketplace_order};

//--------------------------------------        Given          ---------------------------------------------------------
#[given(expr = "the marketplace has an order {word}")]
async fn marketplace_has_order(world: &mut SyncWorld, id: String) {
    world.api().await.marketplace().add_order(marketplace_order(&id));
}

#[given(expr = "the marketplace has a {word} order {word}")]
async fn marketplace_has_order_in_state(world: &mut SyncWorld, state: String, id: String) {
    let mut order = marketplace_order(&id);
    order.state = state;
    world.api().await.marketplace().add_order(order);
}

#[given(expr = "the marketplace has an order {word} with {int} items")]
async fn marketplace_has_multi_item_order(world: &mut SyncWorld, id: String, items: u32) {
    let mut order = marketplace_order(&id);
    order.details.item_count = items;
    world.api().await.marketplace().add_order(order);
}

#[given(expr = "the ERP rejects order {word} with status {int} and message {string}")]
async fn erp_rejects(world: &mut SyncWorld, id: String, status: u16, message: String) {
    world.api().await.fulfillment().reject(&id, status, &message);
}

#[given("the ERP is unavailable")]
async fn erp_unavailable(world: &mut SyncWorld) {
    world.api().await.fulfillment().state().unavailable = true;
}

#[given("the ERP is available again")]
async fn erp_available(world: &mut SyncWorld) {
    world.api().await.fulfillment().state().unavailable = false;
}

#[given("the marketplace rejects status updates")]
async fn marketplace_push_fails(world: &mut SyncWorld) {
    world.api().await.marketplace().state().fail_push = true;
}

#[given("the marketplace accepts status updates again")]
async fn marketplace_push_recovers(world: &mut SyncWorld) {
    world.api().await.marketplace().state().fail_push = false;
}

//--------------------------------------         When          ---------------------------------------------------------
#[when("I fetch new orders")]
async fn fetch_new(world: &mut SyncWorld) {
    let summary = world.api().await.fetch_new().await.expect("fetch_new failed");
    world.record(summary);
}

#[when(expr = "I select order {word}")]
async fn select_order(world: &mut SyncWorld, id: String) {
    let summary = world.api().await.select_orders(&[id.into()]).await.expect("select_orders failed");
    world.record(summary);
}

#[when("I send the selected orders")]
async fn send_selected(world: &mut SyncWorld) {
    let summary = world.api().await.send_selected().await.expect("send_selected failed");
    world.record(summary);
}

#[when(expr = "the ERP ships {word} with tracking {word}")]
async fn erp_ships(world: &mut SyncWorld, erp_id: String, tracking: String) {
    world.api().await.fulfillment().ship(&erp_id, &tracking);
}

#[when(expr = "the ERP cancels {word}")]
async fn erp_cancels(world: &mut SyncWorld, erp_id: String) {
    world.api().await.fulfillment().state().cancelled.insert(erp_id.into());
}

#[when(expr = "the marketplace cancels {word}")]
async fn marketplace_cancels(world: &mut SyncWorld, id: String) {
    world.api().await.marketplace().state().cancelled.insert(id.into());
}

#[when("I update order states")]
async fn update_states(world: &mut SyncWorld) {
    let summary = world.api().await.update_states().await.expect("update_states failed");
    world.record(summary);
}

#[when("I process shipped orders")]
async fn process_shipped(world: &mut SyncWorld) {
    let summary = world.api().await.process_shipped().await.expect("process_shipped failed");
    world.record(summary);
}

#[when("I process cancelled orders")]
async fn process_cancelled(world: &mut SyncWorld) {
    let summary = world.api().await.process_cancelled().await.expect("process_cancelled failed");
    world.record(summary);
}

#[when("I archive completed orders")]
async fn archive_completed(world: &mut SyncWorld) {
    let summary = world.api().await.archive_completed().await.expect("archive_completed failed");
    world.record(summary);
}

//--------------------------------------         Then          ---------------------------------------------------------
#[then(expr = "order {word} is in state {word}")]
async fn order_in_state(world: &mut SyncWorld, id: String, state: String) {
    let expected = OrderState::from_str(&state).expect("Not a valid order state");
    assert_eq!(world.state_of(&id).await, expected);
}

#[then(expr = "order {word} has ERP id {word}")]
async fn order_has_erp_id(world: &mut SyncWorld, id: String, erp_id: String) {
    let order = world.order(&id).await;
    assert_eq!(order.erp_id.map(|e| e.to_string()), Some(erp_id));
}

#[then(expr = "order {word} has tracking number {word}")]
async fn order_has_tracking(world: &mut SyncWorld, id: String, tracking: String) {
    let order = world.order(&id).await;
    assert_eq!(order.tracking_number, Some(tracking));
}

#[then(expr = "order {word} has an error containing {string}")]
async fn order_has_error(world: &mut SyncWorld, id: String, text: String) {
    let order = world.order(&id).await;
    let reason = order.last_error.expect("Order has no error recorded");
    assert!(reason.contains(&text), "'{reason}' does not contain '{text}'");
}

#[then(expr = "order {word} has been archived")]
async fn order_archived(world: &mut SyncWorld, id: String) {
    let db = world.api().await.db();
    assert!(db.fetch_order(&id.as_str().into()).await.unwrap().is_none());
    let archived = db.fetch_archived(&id.into()).await.unwrap().expect("Order is not in the archive");
    assert_eq!(archived.state, OrderState::Archived);
}

#[then(expr = "there are {int} active orders")]
async fn active_orders(world: &mut SyncWorld, count: usize) {
    let orders = world.api().await.db().list_orders(None).await.unwrap();
    assert_eq!(orders.len(), count);
}

#[then(expr = "the ERP has received {int} order(s)")]
async fn erp_order_count(world: &mut SyncWorld, count: usize) {
    assert_eq!(world.api().await.fulfillment().created_count(), count);
}

#[then(expr = "the marketplace was told {word} is {word}")]
async fn marketplace_told(world: &mut SyncWorld, id: String, status: String) {
    let pushes = world.api().await.marketplace().state().pushes.clone();
    let found = pushes.iter().filter(|(i, s, _)| i.as_str() == id && s.to_string() == status).count();
    assert_eq!(found, 1, "Expected exactly one {status} push for {id}. Got {pushes:?}");
}

#[then(expr = "the marketplace was told {word} shipped with tracking {word}")]
async fn marketplace_told_tracking(world: &mut SyncWorld, id: String, tracking: String) {
    let pushes = world.api().await.marketplace().state().pushes.clone();
    let found = pushes
        .iter()
        .filter(|(i, s, t)| i.as_str() == id && s.to_string() == "SHIPPED" && t.as_deref() == Some(tracking.as_str()))
        .count();
    assert_eq!(found, 1, "Expected exactly one shipment push for {id}. Got {pushes:?}");
}

#[then(expr = "the marketplace was not told {word} is {word}")]
async fn marketplace_not_told(world: &mut SyncWorld, id: String, status: String) {
    let pushes = world.api().await.marketplace().state().pushes.clone();
    assert!(!pushes.iter().any(|(i, s, _)| i.as_str() == id && s.to_string() == status));
}

#[then(expr = "the last batch had {int} succeeded, {int} skipped and {int} failed")]
async fn last_batch(world: &mut SyncWorld, succeeded: usize, skipped: usize, failed: usize) {
    let summary = world.last_summary();
    assert_eq!(summary.succeeded(), succeeded, "{summary}");
    assert_eq!(summary.skipped(), skipped, "{summary}");
    assert_eq!(summary.failed(), failed, "{summary}");
}
