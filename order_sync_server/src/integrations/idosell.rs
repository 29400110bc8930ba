use std::collections::HashSet;

use idosell_tools::{
    bundle_parent,
    helpers::{add_bundle_items, localize_create_body, product_note},
    IdosellApi,
    IdosellApiError,
    IdosellOrderStatus,
};
use log::*;
use order_sync_engine::{
    db_types::ErpId,
    traits::{ClientError, CreateOrderRequest, FulfillmentClient, FulfillmentStatus},
};
use serde_json::{Map, Value};

const CANCELLED_STATUSES: [&str; 1] = ["canceled"];

/// The IdoSell admin API as the engine's fulfillment system.
#[derive(Clone)]
pub struct IdosellFulfillment {
    api: IdosellApi,
}

impl IdosellFulfillment {
    pub fn new(api: IdosellApi) -> Self {
        Self { api }
    }
}

impl FulfillmentClient for IdosellFulfillment {
    /// Creates the order unless IdoSell already holds one with the same external reference.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<ErpId, ClientError> {
        let existing = self.api.find_order_by_external_ref(&request.external_ref).await.map_err(client_error)?;
        if let Some(serial) = existing {
            info!("🔄️ {} is already IdoSell order {serial}. It will not be created again.", request.marketplace_id);
            return Ok(ErpId::from(serial));
        }
        let fields = &request.fields;
        let bundle_id = text(fields, "bundle_id").trim();
        let bundle = if bundle_id.is_empty() {
            Vec::new()
        } else {
            self.api.bundle_items(bundle_id).await.map_err(client_error)?
        };
        let margin_taxed = fields.get("margin_taxed").and_then(Value::as_bool).unwrap_or(false);
        let note = product_note(
            text(fields, "item_name"),
            text(fields, "grading"),
            fields.get("battery_replacement").and_then(Value::as_bool).unwrap_or(false),
            margin_taxed,
            bundle_parent(&bundle),
        );
        let mut body = request.body;
        localize_create_body(&mut body);
        add_bundle_items(&mut body, &bundle);
        add_product_note(&mut body, &note);
        let value = fields.get("total_paid").and_then(Value::as_f64).unwrap_or_default();
        debug!("🔄️ Creating IdoSell order for {}", request.marketplace_id);
        let serial = self.api.create_and_process(&body, &note, margin_taxed, value).await.map_err(client_error)?;
        Ok(ErpId::from(serial))
    }

    async fn get_status(&self, id: &ErpId) -> Result<FulfillmentStatus, ClientError> {
        let order = self.api.get_order(id.as_str()).await.map_err(client_error)?;
        Ok(fulfillment_status(order))
    }

    async fn list_cancelled(&self) -> Result<HashSet<ErpId>, ClientError> {
        let orders = self.api.search_orders_by_status(&CANCELLED_STATUSES).await.map_err(client_error)?;
        Ok(orders.into_iter().map(|o| ErpId::from(o.serial_number)).collect())
    }
}

fn text<'a>(fields: &'a Map<String, Value>, name: &str) -> &'a str {
    fields.get(name).and_then(Value::as_str).unwrap_or_default()
}

/// Puts the warehouse note in front of whatever remarks the template already carries.
fn add_product_note(body: &mut Value, note: &str) {
    if note.is_empty() {
        return;
    }
    let Some(orders) = body.pointer_mut("/params/orders").and_then(Value::as_array_mut) else {
        return;
    };
    let products = orders
        .iter_mut()
        .filter_map(|o| o.get_mut("products").and_then(Value::as_array_mut))
        .flat_map(|p| p.iter_mut())
        .filter_map(Value::as_object_mut);
    for product in products {
        let remarks = product.get("remarksToProduct").and_then(Value::as_str).unwrap_or_default().trim().to_string();
        let remarks = if remarks.is_empty() { note.to_string() } else { format!("{note}{remarks}") };
        product.insert("remarksToProduct".to_string(), Value::from(remarks));
    }
}

fn fulfillment_status(order: IdosellOrderStatus) -> FulfillmentStatus {
    FulfillmentStatus { status: order.status, tracking_number: order.delivery_package_id, carrier: order.courier }
}

pub fn client_error(e: IdosellApiError) -> ClientError {
    match e {
        IdosellApiError::QueryError { status, message } => ClientError::from_status(status, message),
        IdosellApiError::OrderFault { .. } | IdosellApiError::ProductNotFound(_) | IdosellApiError::Template(_) => {
            ClientError::Rejected { status: 422, message: e.to_string() }
        },
        IdosellApiError::OrderNotFound(_) => ClientError::Rejected { status: 404, message: e.to_string() },
        e => ClientError::Unavailable(e.to_string()),
    }
}
