use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::{
    config::RefurbedConfig,
    data_objects::ListOrdersResponse,
    helpers::tracking_url,
    RefurbedApiError,
    RefurbedOrder,
};

const LIST_ORDERS: &str = "refb.merchant.v1.OrderService/ListOrders";
const UPDATE_ORDER_ITEM_STATE: &str = "refb.merchant.v1.OrderItemService/UpdateOrderItemState";
/// Orders in these states are never imported.
pub const EXCLUDED_STATES: [&str; 2] = ["RETURNED", "CANCELLED"];

/// Client for the Refurbed merchant API.
///
/// The API is RPC-style: every call is a `POST` of a JSON message to `{base_url}/{service}/{method}`.
#[derive(Clone)]
pub struct RefurbedApi {
    config: RefurbedConfig,
    client: Arc<Client>,
}

impl RefurbedApi {
    pub fn new(config: RefurbedConfig) -> Result<Self, RefurbedApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(format!("Plain {}", config.api_key.reveal()).as_str())
            .map_err(|e| RefurbedApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RefurbedApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &RefurbedConfig {
        &self.config
    }

    pub fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.config.base_url.trim_end_matches('/'))
    }

    pub async fn rpc<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T, RefurbedApiError> {
        let url = self.url(method);
        trace!("Sending RPC: {url}");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| RefurbedApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("RPC successful. {}", response.status());
            response.json::<T>().await.map_err(|e| RefurbedApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RefurbedApiError::RestResponseError(e.to_string()))?;
            Err(RefurbedApiError::QueryError { status, message })
        }
    }

    /// Fetches a single page of orders matching `filter`, in ascending id order.
    pub async fn list_orders_page(
        &self,
        filter: &Value,
        starting_after: Option<&str>,
    ) -> Result<Vec<RefurbedOrder>, RefurbedApiError> {
        let mut pagination = json!({ "limit": self.config.page_size });
        if let Some(after) = starting_after {
            pagination["starting_after"] = json!(after);
        }
        let body = json!({
            "filter": filter,
            "pagination": pagination,
            "sort": { "field": "id", "order": "ASC" },
        });
        let response = self.rpc::<ListOrdersResponse, Value>(LIST_ORDERS, &body).await?;
        response.orders.into_iter().map(RefurbedOrder::from_value).collect()
    }

    /// Fetches every order matching `filter` placed after `after`, following pagination to the end.
    ///
    /// A failure on any page fails the whole call.
    pub async fn list_all_orders(
        &self,
        filter: &Value,
        after: Option<String>,
    ) -> Result<Vec<RefurbedOrder>, RefurbedApiError> {
        let mut orders = Vec::new();
        let mut cursor = after;
        loop {
            let page = self.list_orders_page(filter, cursor.as_deref()).await?;
            let page_len = page.len();
            debug!("Fetched a page of {page_len} orders after {}", cursor.as_deref().unwrap_or("the first order"));
            cursor = page.last().map(|o| o.id.clone()).or(cursor);
            orders.extend(page);
            if page_len < self.config.page_size as usize {
                break;
            }
        }
        Ok(orders)
    }

    /// Orders placed after `after` that have not been returned or cancelled.
    pub async fn fetch_orders_after(&self, after: Option<String>) -> Result<Vec<RefurbedOrder>, RefurbedApiError> {
        let filter = json!({ "state": { "none_of": EXCLUDED_STATES } });
        let orders = self.list_all_orders(&filter, after).await?;
        info!("Fetched {} new orders from Refurbed", orders.len());
        Ok(orders)
    }

    pub async fn fetch_cancelled_orders(&self) -> Result<Vec<RefurbedOrder>, RefurbedApiError> {
        let filter = json!({ "state": { "any_of": ["CANCELLED"] } });
        self.list_all_orders(&filter, None).await
    }

    pub async fn fetch_order(&self, order_id: &str) -> Result<RefurbedOrder, RefurbedApiError> {
        let filter = json!({ "id": { "any_of": [order_id] } });
        let orders = self.list_orders_page(&filter, None).await?;
        orders
            .into_iter()
            .find(|o| o.id == order_id)
            .ok_or_else(|| RefurbedApiError::OrderNotFound(order_id.to_string()))
    }

    /// Sets the state of one order item. Shipments carry a parcel tracking link.
    pub async fn update_item_state(
        &self,
        item_id: &str,
        state: &str,
        tracking_number: Option<&str>,
    ) -> Result<(), RefurbedApiError> {
        let mut body = json!({ "id": item_id, "state": state });
        if let Some(tn) = tracking_number {
            body["parcel_tracking_url"] = json!(tracking_url(&self.config.tracking_url_template, tn));
        }
        let _ = self.rpc::<Value, Value>(UPDATE_ORDER_ITEM_STATE, &body).await?;
        info!("Refurbed order item {item_id} set to {state}");
        Ok(())
    }

    /// Sets every item of an order to `state`. Refurbed has no order-level state update.
    pub async fn update_order_state(
        &self,
        order_id: &str,
        state: &str,
        tracking_number: Option<&str>,
    ) -> Result<usize, RefurbedApiError> {
        let order = self.fetch_order(order_id).await?;
        for item in &order.items {
            self.update_item_state(&item.id, state, tracking_number).await?;
        }
        debug!("Refurbed order {order_id}: {} items set to {state}", order.items.len());
        Ok(order.items.len())
    }
}
