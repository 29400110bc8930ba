use std::{collections::HashSet, fmt::Debug};

use chrono::Utc;
use log::*;
use osync_common::RequestTemplate;
use serde_json::{json, Map, Value};

use crate::{
    db::traits::{OrderStoreError, SyncDatabase, FETCH_CURSOR_KEY},
    db_types::{ErpId, MarketplaceId, MarketplaceOrder, MarketplaceStatus, Order, OrderState, PostalAddress},
    state_mapper::{self, ErpOrderState, Trigger},
    sync_api::{
        archiver::Archiver,
        errors::SyncError,
        sync_objects::{BatchSummary, ErrorRetryPolicy, RowOutcome, SyncOperation, SyncPolicy},
    },
    traits::{CreateOrderRequest, FulfillmentClient, MarketplaceClient},
};

/// `OrderSyncApi` reconciles the order store with the marketplace and the fulfillment system.
///
/// Every operation is a batch over a filtered set of order rows. Rows are processed one at a time and independently:
/// a failure on one row is recorded in the returned [`BatchSummary`] and the batch carries on. Only a failure to read
/// the store at all aborts a batch.
///
/// Per-row transitions are committed as they happen, so an interrupted batch leaves every row it finished in its new
/// state. Running any operation again is safe.
pub struct OrderSyncApi<B, M, F> {
    db: B,
    marketplace: M,
    fulfillment: F,
    archiver: Archiver<B>,
    policy: SyncPolicy,
    create_template: RequestTemplate,
}

impl<B, M, F> Debug for OrderSyncApi<B, M, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderSyncApi ({:?})", self.policy)
    }
}

impl<B: Clone, M, F> OrderSyncApi<B, M, F> {
    pub fn new(db: B, marketplace: M, fulfillment: F, create_template: RequestTemplate) -> Self {
        let archiver = Archiver::new(db.clone());
        Self { db, marketplace, fulfillment, archiver, policy: SyncPolicy::default(), create_template }
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn marketplace(&self) -> &M {
        &self.marketplace
    }

    pub fn fulfillment(&self) -> &F {
        &self.fulfillment
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }
}

impl<B, M, F> OrderSyncApi<B, M, F>
where
    B: SyncDatabase,
    M: MarketplaceClient,
    F: FulfillmentClient,
{
    //------------------------------------------   fetch_new   ---------------------------------------------------
    /// Imports marketplace orders placed after the stored fetch cursor as `NEW` rows.
    ///
    /// Orders that already exist, either active or archived, are skipped, as are orders the marketplace already
    /// reports as returned or cancelled. The cursor is advanced to the last order the marketplace returned, but never past
    /// an order that failed to import. If the marketplace call fails, nothing is imported and the cursor is left alone.
    pub async fn fetch_new(&self) -> Result<BatchSummary, SyncError> {
        let mut summary = BatchSummary::new(SyncOperation::FetchNew);
        let cursor = self.db.fetch_setting(FETCH_CURSOR_KEY).await?.filter(|s| !s.trim().is_empty());
        let cursor = cursor.map(MarketplaceId::from);
        debug!(
            "🔄️📥️ Fetching marketplace orders after {}",
            cursor.as_ref().map(|c| c.as_str()).unwrap_or("the first order")
        );
        let orders = self.marketplace.fetch_new(cursor).await.map_err(|e| {
            warn!("🔄️📥️ Could not fetch orders from the marketplace. {e}");
            SyncError::from(e)
        })?;
        // The cursor never passes a failed import
        let mut last_seen = None;
        let mut cursor_held = false;
        for order in orders {
            let id = order.marketplace_id.clone();
            let outcome = self.import_order(order).await;
            if outcome.is_failure() {
                cursor_held = true;
            } else if !cursor_held {
                last_seen = Some(id);
            }
            summary.record(outcome);
        }
        if cursor_held {
            debug!("🔄️📥️ Not every order was imported. The fetch cursor stops before the first failure.");
        }
        if let Some(id) = last_seen {
            if let Err(e) = self.db.store_setting(FETCH_CURSOR_KEY, id.as_str()).await {
                warn!("🔄️📥️ Could not move the fetch cursor to {id}. {e}");
                summary.warn(format!("The fetch cursor could not be moved to {id}. {e}"));
            }
        }
        info!("🔄️📥️ Fetch complete. {} of {} orders imported", summary.succeeded(), summary.attempted());
        Ok(summary)
    }

    async fn import_order(&self, order: MarketplaceOrder) -> RowOutcome {
        let id = order.marketplace_id.clone();
        if !state_mapper::should_import(&order.state) {
            return RowOutcome::skipped(&id, format!("marketplace state is {}", order.state));
        }
        match self.db.fetch_order(&id).await {
            Ok(Some(_)) => return RowOutcome::skipped(&id, "already imported"),
            Ok(None) => {},
            Err(e) => return RowOutcome::failed(&id, e.into()),
        }
        match self.db.is_archived(&id).await {
            Ok(true) => return RowOutcome::skipped(&id, "already archived"),
            Ok(false) => {},
            Err(e) => return RowOutcome::failed(&id, e.into()),
        }
        match self.db.upsert_order(Order::from(order)).await {
            Ok(stored) => {
                debug!("🔄️📥️ Order {id} imported");
                RowOutcome::succeeded(&id, format!("imported as {}", stored.state))
            },
            Err(OrderStoreError::Conflict(_)) => RowOutcome::skipped(&id, "imported concurrently by another run"),
            Err(e) => RowOutcome::failed(&id, e.into()),
        }
    }

    //----------------------------------------   select_orders   -------------------------------------------------
    /// The operator action: moves `NEW` or `ERROR` orders to `SELECTED`.
    ///
    /// This is the only way an order in `ERROR` gets retried under the manual retry policy.
    pub async fn select_orders(&self, ids: &[MarketplaceId]) -> Result<BatchSummary, SyncError> {
        let mut summary = BatchSummary::new(SyncOperation::SelectOrders);
        for id in ids {
            let outcome = match self.db.fetch_order(id).await? {
                None => RowOutcome::failed(id, SyncError::NotFound(id.clone())),
                Some(order) => {
                    let from = order.state;
                    match self.promote(order).await {
                        Ok(_) => RowOutcome::succeeded(id, format!("selected (was {from})")),
                        Err(e) => RowOutcome::failed(id, e),
                    }
                },
            };
            summary.record(outcome);
        }
        Ok(summary)
    }

    async fn promote(&self, mut order: Order) -> Result<Order, SyncError> {
        state_mapper::apply(&mut order, Trigger::OperatorSelect)?;
        order.selected = true;
        order.last_error = None;
        let order = self.db.upsert_order(order).await?;
        trace!("🔄️✅️ Order {} selected", order.marketplace_id);
        Ok(order)
    }

    //----------------------------------------   send_selected   -------------------------------------------------
    /// Creates every `SELECTED` order in the fulfillment system.
    ///
    /// Rows flagged by an operator are promoted to `SELECTED` first. Under [`ErrorRetryPolicy::Automatic`], all
    /// `ERROR` rows are promoted too.
    ///
    /// An order that already carries an ERP id is never created again; it is only moved on to `SENT_TO_ERP`.
    /// Rejections put the order into `ERROR`. When the fulfillment system is unreachable, the order stays `SELECTED` and
    /// is retried on the next run.
    pub async fn send_selected(&self) -> Result<BatchSummary, SyncError> {
        let mut summary = BatchSummary::new(SyncOperation::SendSelected);
        let flagged = self.orders_in(&[OrderState::New, OrderState::Error]).await?;
        for order in flagged.into_iter().filter(|o| self.is_promotable(o)) {
            let id = order.marketplace_id.clone();
            if let Err(e) = self.promote(order).await {
                warn!("🔄️📦️ Could not select order {id}. {e}");
                summary.record(RowOutcome::failed(&id, e));
            }
        }
        let selected = self.db.list_orders(Some(OrderState::Selected)).await?;
        debug!("🔄️📦️ Sending {} selected orders to the ERP", selected.len());
        let mut bundles = HashSet::new();
        for order in selected {
            let outcome = self.send_one(order, &mut bundles).await;
            summary.record(outcome);
        }
        info!(
            "🔄️📦️ Send complete. {} sent, {} skipped, {} failed",
            summary.succeeded(),
            summary.skipped(),
            summary.failed()
        );
        Ok(summary)
    }

    fn is_promotable(&self, order: &Order) -> bool {
        match order.state {
            OrderState::New => order.selected,
            OrderState::Error => order.selected || self.policy.error_retry == ErrorRetryPolicy::Automatic,
            _ => false,
        }
    }

    async fn send_one(&self, mut order: Order, bundles: &mut HashSet<String>) -> RowOutcome {
        let id = order.marketplace_id.clone();
        if let Some(erp_id) = order.erp_id.clone() {
            debug!("🔄️📦️ Order {id} already exists in the ERP as {erp_id}. It will not be created again.");
            return match self.record_creation(order, erp_id.clone()).await {
                Ok(_) => RowOutcome::succeeded(&id, format!("already created in ERP as {erp_id}")),
                Err(e) => RowOutcome::failed(&id, e),
            };
        }
        if let Some(bundle) = order.details.bundle_id.clone().filter(|b| !b.trim().is_empty()) {
            if !bundles.insert(bundle.clone()) {
                return RowOutcome::skipped(&id, format!("bundle {bundle} is already used by another order in this batch"));
            }
        }
        let request = match self.build_create_request(&order) {
            Ok(r) => r,
            Err(e) => return self.fail_send(order, e).await,
        };
        match self.fulfillment.create_order(request).await {
            Ok(erp_id) => {
                info!("🔄️📦️ Order {id} created in the ERP as {erp_id}");
                match self.record_creation(order, erp_id.clone()).await {
                    Ok(order) => {
                        let detail = format!("created in ERP as {erp_id}");
                        if !self.policy.accept_on_send {
                            return RowOutcome::succeeded(&id, detail);
                        }
                        // The ERP order exists, so a failed acceptance only warns. update_states sends it again.
                        match self.push_status(order, MarketplaceStatus::Accepted).await {
                            Ok(_) => RowOutcome::succeeded(&id, detail),
                            Err(e) => RowOutcome::succeeded(
                                &id,
                                format!("{detail}. warning: the marketplace was not told it was accepted. {e}"),
                            ),
                        }
                    },
                    Err(e) => {
                        error!("🔄️📦️ Order {id} was created in the ERP as {erp_id}, but this could not be saved. {e}");
                        RowOutcome::failed_with(&id, e.clone(), format!("created in ERP as {erp_id}, but not saved. {e}"))
                    },
                }
            },
            Err(e) => {
                let e = SyncError::from(e);
                if e.needs_operator() {
                    return self.fail_send(order, e).await;
                }
                warn!("🔄️📦️ Order {id} could not be sent and will be retried. {e}");
                order.record_error(e.to_string());
                if let Err(se) = self.db.upsert_order(order).await {
                    warn!("🔄️📦️ Could not record the error on order {id}. {se}");
                }
                RowOutcome::failed(&id, e)
            },
        }
    }

    fn build_create_request(&self, order: &Order) -> Result<CreateOrderRequest, SyncError> {
        if order.details.item_count > 1 {
            return Err(SyncError::InvalidOrder(format!(
                "the order has {} items. Only single-item orders can be sent",
                order.details.item_count
            )));
        }
        let fields = template_fields(order);
        let body = self.create_template.fill(&fields)?;
        Ok(CreateOrderRequest {
            marketplace_id: order.marketplace_id.clone(),
            external_ref: order.marketplace_id.external_ref(),
            body,
            fields,
        })
    }

    /// Stores the ERP id and moves the order to `SENT_TO_ERP`.
    ///
    /// The ERP order exists at this point, so a lost optimistic-concurrency race is retried once against the fresh
    /// row instead of being dropped.
    async fn record_creation(&self, order: Order, erp_id: ErpId) -> Result<Order, SyncError> {
        let id = order.marketplace_id.clone();
        match self.db.upsert_order(mark_sent(order, &erp_id)?).await {
            Ok(order) => Ok(order),
            Err(OrderStoreError::Conflict(_)) => {
                debug!("🔄️📦️ Order {id} changed while it was being sent. Retrying with the current row.");
                let fresh = self.db.fetch_order(&id).await?.ok_or_else(|| SyncError::NotFound(id.clone()))?;
                if fresh.state == OrderState::SentToErp && fresh.erp_id.as_ref() == Some(&erp_id) {
                    return Ok(fresh);
                }
                Ok(self.db.upsert_order(mark_sent(fresh, &erp_id)?).await?)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn fail_send(&self, mut order: Order, e: SyncError) -> RowOutcome {
        let id = order.marketplace_id.clone();
        warn!("🔄️📦️ Order {id} was not sent. It needs an operator. {e}");
        if let Err(te) = state_mapper::apply(&mut order, Trigger::SendFailed) {
            return RowOutcome::failed(&id, te.into());
        }
        order.selected = false;
        order.record_error(e.to_string());
        match self.db.upsert_order(order).await {
            Ok(_) => RowOutcome::failed(&id, e),
            Err(se) => {
                warn!("🔄️📦️ Could not record the error on order {id}. {se}");
                let detail = format!("{e} The error could not be recorded. {se}");
                RowOutcome::failed_with(&id, e, detail)
            },
        }
    }

    //----------------------------------------   update_states   -------------------------------------------------
    /// Polls the fulfillment system for every order it holds and records shipments.
    ///
    /// When the ERP reports an order shipped with a tracking number, the row moves to `SHIPPED` and the tracking
    /// number is pushed to the marketplace. A failed push is recorded on the row, and the local state is kept;
    /// [`Self::process_shipped`] retries it.
    pub async fn update_states(&self) -> Result<BatchSummary, SyncError> {
        let mut summary = BatchSummary::new(SyncOperation::UpdateStates);
        let orders = self.orders_in(&[OrderState::SentToErp, OrderState::Shipped]).await?;
        for order in orders {
            let outcome = self.update_one(order).await;
            summary.record(outcome);
        }
        info!("🔄️🚚️ State update complete. {} orders changed", summary.succeeded());
        Ok(summary)
    }

    async fn update_one(&self, mut order: Order) -> RowOutcome {
        let id = order.marketplace_id.clone();
        let Some(erp_id) = order.erp_id.clone() else {
            let e = SyncError::InvalidOrder(format!("the order is {} but has no ERP id", order.state));
            return RowOutcome::failed(&id, e);
        };
        let status = match self.fulfillment.get_status(&erp_id).await {
            Ok(status) => status,
            Err(e) => {
                debug!("🔄️🚚️ Could not fetch the ERP status of order {id} ({erp_id}). {e}");
                return RowOutcome::failed(&id, e.into());
            },
        };
        match state_mapper::erp_state(&status.status) {
            ErpOrderState::Shipped => {
                let Some(tracking) = status.tracking_number.filter(|t| !t.trim().is_empty()) else {
                    return RowOutcome::skipped(&id, format!("ERP order {erp_id} is finished but has no tracking yet"));
                };
                if order.state == OrderState::Shipped && order.tracking_number.as_deref() == Some(tracking.as_str()) {
                    return RowOutcome::skipped(&id, format!("already shipped with tracking {tracking}"));
                }
                let detail = if order.state == OrderState::Shipped {
                    format!("tracking changed to {tracking}")
                } else {
                    format!("shipped with tracking {tracking}")
                };
                if order.state == OrderState::SentToErp {
                    if let Err(e) = state_mapper::apply(&mut order, Trigger::Shipped) {
                        return RowOutcome::failed(&id, e.into());
                    }
                }
                order.tracking_number = Some(tracking);
                order.carrier = status.carrier;
                order.marketplace_synced = false;
                order.last_error = None;
                let order = match self.db.upsert_order(order).await {
                    Ok(order) => order,
                    Err(e) => return RowOutcome::failed(&id, e.into()),
                };
                info!("🔄️🚚️ Order {id} {detail}");
                self.push_outcome(order, MarketplaceStatus::Shipped, detail).await
            },
            ErpOrderState::Cancelled => {
                RowOutcome::skipped(&id, format!("ERP order {erp_id} is cancelled. Run process_cancelled"))
            },
            ErpOrderState::InProgress(raw) => {
                let unaccepted = order.state == OrderState::SentToErp && !order.marketplace_synced;
                if unaccepted && self.policy.accept_on_send {
                    let detail = format!("ERP status is {raw}. Acceptance sent to the marketplace again");
                    return self.push_outcome(order, MarketplaceStatus::Accepted, detail).await;
                }
                RowOutcome::skipped(&id, format!("ERP status is {raw}"))
            },
        }
    }

    //----------------------------------------  process_shipped  -------------------------------------------------
    /// Retries the marketplace push for shipped orders the marketplace has not confirmed yet.
    pub async fn process_shipped(&self) -> Result<BatchSummary, SyncError> {
        let mut summary = BatchSummary::new(SyncOperation::ProcessShipped);
        let orders = self.orders_in(&[OrderState::Shipped]).await?;
        for order in orders.into_iter().filter(|o| !o.marketplace_synced) {
            let Some(tracking) = order.tracking_number.clone() else {
                continue;
            };
            let outcome =
                self.push_outcome(order, MarketplaceStatus::Shipped, format!("tracking {tracking} sent")).await;
            summary.record(outcome);
        }
        info!("🔄️🚚️ {} shipments confirmed with the marketplace", summary.succeeded());
        Ok(summary)
    }

    //---------------------------------------- process_cancelled -------------------------------------------------
    /// Cancels orders that were cancelled in either remote system.
    ///
    /// Cancellations that started in the ERP are pushed to the marketplace. A cancellation is honored even after the
    /// order shipped. If only one of the two remote systems can be reached, the other one's cancellations are still
    /// processed.
    pub async fn process_cancelled(&self) -> Result<BatchSummary, SyncError> {
        let mut summary = BatchSummary::new(SyncOperation::ProcessCancelled);
        let erp_cancelled = self.fulfillment.list_cancelled().await;
        let marketplace_cancelled = self.marketplace.list_cancelled().await;
        let (erp_cancelled, marketplace_cancelled) = match (erp_cancelled, marketplace_cancelled) {
            (Err(e), Err(me)) => {
                warn!("🔄️❌️ Neither remote system returned its cancelled orders. {e}. {me}");
                return Err(e.into());
            },
            (erp, marketplace) => {
                let erp = erp.unwrap_or_else(|e| {
                    summary.warn(format!("ERP cancellations could not be fetched. {e}"));
                    HashSet::new()
                });
                let marketplace = marketplace.unwrap_or_else(|e| {
                    summary.warn(format!("Marketplace cancellations could not be fetched. {e}"));
                    HashSet::new()
                });
                (erp, marketplace)
            },
        };
        let orders = self.orders_in(&[OrderState::SentToErp, OrderState::Shipped, OrderState::Cancelled]).await?;
        for order in orders {
            match order.state {
                OrderState::SentToErp | OrderState::Shipped => {
                    let in_erp = order.erp_id.as_ref().map(|e| erp_cancelled.contains(e)).unwrap_or(false);
                    let in_marketplace = marketplace_cancelled.contains(&order.marketplace_id);
                    if in_erp || in_marketplace {
                        let outcome = self.cancel_one(order, in_marketplace).await;
                        summary.record(outcome);
                    }
                },
                OrderState::Cancelled if !order.marketplace_synced => {
                    let outcome =
                        self.push_outcome(order, MarketplaceStatus::Cancelled, "cancellation sent again".into()).await;
                    summary.record(outcome);
                },
                _ => {},
            }
        }
        info!("🔄️❌️ Cancellation processing complete. {} orders updated", summary.succeeded());
        Ok(summary)
    }

    async fn cancel_one(&self, mut order: Order, known_to_marketplace: bool) -> RowOutcome {
        let id = order.marketplace_id.clone();
        let from = order.state;
        if let Err(e) = state_mapper::apply(&mut order, Trigger::CancellationDetected) {
            return RowOutcome::failed(&id, e.into());
        }
        order.marketplace_synced = known_to_marketplace;
        order.last_error = None;
        let order = match self.db.upsert_order(order).await {
            Ok(order) => order,
            Err(e) => return RowOutcome::failed(&id, e.into()),
        };
        info!("🔄️❌️ Order {id} cancelled (was {from})");
        if known_to_marketplace {
            RowOutcome::succeeded(&id, format!("cancelled in the marketplace (was {from})"))
        } else {
            self.push_outcome(order, MarketplaceStatus::Cancelled, format!("cancelled in the ERP (was {from})")).await
        }
    }

    //---------------------------------------- archive_completed -------------------------------------------------
    /// Moves `SHIPPED` and `CANCELLED` orders into the archive, snapshotting each one first.
    pub async fn archive_completed(&self) -> Result<BatchSummary, SyncError> {
        let mut summary = BatchSummary::new(SyncOperation::ArchiveCompleted);
        let orders = self.orders_in(&[OrderState::Shipped, OrderState::Cancelled]).await?;
        let now = Utc::now();
        for order in orders {
            let id = order.marketplace_id.clone();
            if let Some(min_age) = self.policy.archive_min_age {
                if now - order.updated_at < min_age {
                    let detail = format!("last changed less than {} hours ago", min_age.num_hours());
                    summary.record(RowOutcome::skipped(&id, detail));
                    continue;
                }
            }
            let outcome = match self.archiver.archive(&order).await {
                Ok(_) => RowOutcome::succeeded(&id, format!("archived from {}", order.state)),
                Err(e) => RowOutcome::failed(&id, e),
            };
            summary.record(outcome);
        }
        info!("🔄️🗄️ Archive sweep complete. {} orders archived", summary.succeeded());
        Ok(summary)
    }

    //----------------------------------------      helpers      -------------------------------------------------
    /// The rows in any of `states`, grouped by state in the order given.
    async fn orders_in(&self, states: &[OrderState]) -> Result<Vec<Order>, SyncError> {
        let mut orders = Vec::new();
        for state in states {
            let rows = self.db.list_orders(Some(*state)).await.map_err(|e| {
                error!("🔄️ Could not read {state} orders from the store. {e}");
                SyncError::from(e)
            })?;
            orders.extend(rows);
        }
        Ok(orders)
    }

    /// Pushes `status` to the marketplace and records the result on the row.
    async fn push_status(&self, mut order: Order, status: MarketplaceStatus) -> Result<Order, SyncError> {
        let id = order.marketplace_id.clone();
        let tracking = match status {
            MarketplaceStatus::Shipped => order.tracking_number.clone(),
            _ => None,
        };
        match self.marketplace.push_status(&id, status, tracking).await {
            Ok(()) => {
                order.marketplace_synced = true;
                order.last_error = None;
                trace!("🔄️📤️ Marketplace confirmed {status} for order {id}");
                Ok(self.db.upsert_order(order).await?)
            },
            Err(e) => {
                let e = SyncError::from(e);
                warn!("🔄️📤️ Could not push {status} for order {id} to the marketplace. {e}");
                order.marketplace_synced = false;
                order.record_error(format!("Marketplace {status} update failed. {e}"));
                if let Err(se) = self.db.upsert_order(order).await {
                    warn!("🔄️📤️ Could not record the push failure on order {id}. {se}");
                }
                Err(e)
            },
        }
    }

    async fn push_outcome(&self, order: Order, status: MarketplaceStatus, detail: String) -> RowOutcome {
        let id = order.marketplace_id.clone();
        match self.push_status(order, status).await {
            Ok(_) => RowOutcome::succeeded(&id, detail),
            Err(e) => {
                let detail = format!("{detail}, but the marketplace was not updated. {e}");
                RowOutcome::failed_with(&id, e, detail)
            },
        }
    }
}

fn mark_sent(mut order: Order, erp_id: &ErpId) -> Result<Order, SyncError> {
    state_mapper::apply(&mut order, Trigger::SendSucceeded)?;
    order.erp_id = Some(erp_id.clone());
    order.selected = false;
    order.last_error = None;
    order.marketplace_synced = false;
    Ok(order)
}

/// The values available to `{{field}}` placeholders in the create-order template.
pub fn template_fields(order: &Order) -> Map<String, Value> {
    let d = &order.details;
    let product_vat = if d.is_margin_taxed() { 0.0 } else { d.vat_rate };
    let purchase_date = order.payload_snapshot.0["released_at"]
        .as_str()
        .and_then(|s| s.split('T').next())
        .map(|s| s.to_string())
        .unwrap_or_else(|| order.created_at.format("%Y-%m-%d").to_string());
    let stock_id = d.warehouse.as_deref().map(|w| w.trim_start_matches('M').to_string()).unwrap_or_default();
    let fields = json!({
        "marketplace_id": order.marketplace_id.as_str(),
        "external_ref": order.marketplace_id.external_ref(),
        "country": d.country,
        "currency": d.currency,
        "total_paid": d.total_paid,
        "vat_rate": d.vat_rate,
        "product_vat": product_vat,
        "margin_taxed": d.is_margin_taxed(),
        "grading": d.grading,
        "battery_replacement": d.battery_replacement,
        "sku": d.sku,
        "item_name": d.item_name,
        "customer_name": d.customer_name,
        "email": d.email,
        "phone": d.phone,
        "company_vat_id": d.company_vat_id.clone().unwrap_or_default(),
        "bundle_id": d.bundle_id.clone().unwrap_or_default(),
        "stock_id": stock_id,
        "notes": d.notes.clone().unwrap_or_default(),
        "purchase_date": purchase_date,
    });
    let mut fields = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    add_address(&mut fields, "shipping", &d.shipping_address);
    add_address(&mut fields, "invoice", &d.invoice_address);
    fields
}

fn add_address(fields: &mut Map<String, Value>, prefix: &str, address: &PostalAddress) {
    let parts = [
        ("first_name", &address.first_name),
        ("last_name", &address.last_name),
        ("company_name", &address.company_name),
        ("street", &address.street),
        ("post_code", &address.post_code),
        ("city", &address.city),
        ("country_code", &address.country_code),
        ("phone", &address.phone),
    ];
    for (name, value) in parts {
        fields.insert(format!("{prefix}_{name}"), Value::String(value.clone()));
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::db_types::OrderDetails;

    #[test]
    fn template_fields_for_a_margin_taxed_order() {
        let details = OrderDetails {
            country: "FR".into(),
            vat_rate: OrderDetails::MARGIN_VAT,
            warehouse: Some("M12".into()),
            shipping_address: PostalAddress { city: "Lyon".into(), country_code: "FR".into(), ..Default::default() },
            ..Default::default()
        };
        let order = Order::new("M-7".into(), details, json!({"released_at": "2024-05-30T08:15:00Z"}));
        let fields = template_fields(&order);
        assert_eq!(fields["external_ref"], "[refurbed-api-id:M-7]");
        assert_eq!(fields["vat_rate"], -1.0);
        assert_eq!(fields["product_vat"], 0.0);
        assert_eq!(fields["margin_taxed"], true);
        assert_eq!(fields["stock_id"], "12");
        assert_eq!(fields["purchase_date"], "2024-05-30");
        assert_eq!(fields["shipping_city"], "Lyon");
        assert_eq!(fields["invoice_city"], "");
        assert_eq!(fields["company_vat_id"], "");
    }
}
