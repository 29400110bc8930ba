use std::sync::Arc;

use log::*;
use osync_common::RequestTemplate;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    config::IdosellConfig,
    data_objects::{external_ref_of, id_text},
    helpers::{initial_status, STATUS_ON_ORDER},
    templates::default_edit_template,
    BundleItem,
    IdosellApiError,
    IdosellOrderStatus,
    NewOrderEdit,
};

const SEARCH_PAGE_SIZE: u32 = 100;
/// Statuses an order can be in shortly after it was created
const OPEN_STATUSES: [&str; 6] = ["new", "payment_waiting", "on_order", "wait_for_packaging", "packed", "ready"];

/// Client for the IdoSell admin REST API.
#[derive(Clone)]
pub struct IdosellApi {
    config: IdosellConfig,
    client: Arc<Client>,
    edit_template: RequestTemplate,
}

impl IdosellApi {
    pub fn new(config: IdosellConfig) -> Result<Self, IdosellApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| IdosellApiError::Initialization(e.to_string()))?;
        headers.insert("X-API-KEY", val);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| IdosellApiError::Initialization(e.to_string()))?;
        let edit_template = default_edit_template()?;
        Ok(Self { config, client: Arc::new(client), edit_template })
    }

    /// Replaces the built-in body used for status and note edits.
    pub fn with_edit_template(mut self, template: RequestTemplate) -> Self {
        self.edit_template = template;
        self
    }

    pub fn config(&self) -> &IdosellConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, IdosellApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| IdosellApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| IdosellApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| IdosellApiError::RestResponseError(e.to_string()))?;
            Err(IdosellApiError::QueryError { status, message })
        }
    }

    /// Creates an order from a filled create body and returns its serial number.
    pub async fn create_order(&self, body: &Value) -> Result<String, IdosellApiError> {
        let result = self.rest_query::<Value, &Value>(Method::POST, "/orders/orders", &[], Some(body)).await?;
        let order = first_order_result(&result, "new order")?;
        let serial = id_text(&order["orderSerialNumber"])
            .ok_or_else(|| IdosellApiError::JsonError(format!("No orderSerialNumber in {result}")))?;
        info!("Created IdoSell order {serial}");
        Ok(serial)
    }

    pub async fn edit_order(&self, edit: &NewOrderEdit) -> Result<(), IdosellApiError> {
        let mut fields = Map::new();
        let serial = serial_value(&edit.serial_number);
        fields.insert("order_serial_number".to_string(), serial);
        fields.insert("order_status".to_string(), Value::from(edit.status.as_str()));
        fields.insert("order_note".to_string(), Value::from(edit.note.as_str()));
        let body = self.edit_template.fill(&fields)?;
        let result = self.rest_query::<Value, Value>(Method::PUT, "/orders/orders", &[], Some(body)).await?;
        first_order_result(&result, &edit.serial_number)?;
        debug!("IdoSell order {} set to {}", edit.serial_number, edit.status);
        Ok(())
    }

    /// Books an advance payment of `value` against the order.
    pub async fn add_payment(&self, serial_number: &str, value: f64) -> Result<(), IdosellApiError> {
        let body = json!({
            "params": {
                "sourceId": serial_value(serial_number),
                "sourceType": "order",
                "value": value,
                "account": self.config.payment_account,
                "type": "advance",
                "paymentFormId": 1,
            },
            "settings": { "sendMail": false, "sendSms": false },
        });
        let result = self.rest_query::<Value, Value>(Method::POST, "/payments/payments", &[], Some(body)).await?;
        check_fault(&result, serial_number)?;
        debug!("Added a payment of {value:.2} to IdoSell order {serial_number}");
        Ok(())
    }

    /// Confirms the first payment booked on the order.
    pub async fn confirm_payment(&self, serial_number: &str) -> Result<(), IdosellApiError> {
        let body = json!({
            "params": { "sourceType": "order", "paymentNumber": format!("{serial_number}-1") },
        });
        let result = self.rest_query::<Value, Value>(Method::PUT, "/payments/confirm", &[], Some(body)).await?;
        check_fault(&result, serial_number)?;
        debug!("Confirmed the payment on IdoSell order {serial_number}");
        Ok(())
    }

    pub async fn get_order(&self, serial_number: &str) -> Result<IdosellOrderStatus, IdosellApiError> {
        let params = [("ordersSerialNumbers", serial_number)];
        let result = self.rest_query::<Value, ()>(Method::GET, "/orders/orders", &params, None).await?;
        match result["Results"].as_array().and_then(|r| r.first()) {
            Some(order) => IdosellOrderStatus::from_result(order),
            None => Err(IdosellApiError::OrderNotFound(serial_number.to_string())),
        }
    }

    /// Every order currently in one of `statuses`. All result pages are read. A failure on any page fails the call.
    pub async fn search_orders_by_status(&self, statuses: &[&str]) -> Result<Vec<IdosellOrderStatus>, IdosellApiError> {
        let results = self.search_orders(statuses).await?;
        let orders = results.iter().map(IdosellOrderStatus::from_result).collect::<Result<Vec<_>, _>>()?;
        debug!("Found {} IdoSell orders with status {statuses:?}", orders.len());
        Ok(orders)
    }

    /// The serial number of an open order created with `external_ref` in its note, if there is one.
    pub async fn find_order_by_external_ref(&self, external_ref: &str) -> Result<Option<String>, IdosellApiError> {
        let results = self.search_orders(&OPEN_STATUSES).await?;
        let serial = serial_with_external_ref(&results, external_ref);
        if let Some(serial) = &serial {
            debug!("{external_ref} already exists in IdoSell as order {serial}");
        }
        Ok(serial)
    }

    async fn search_orders(&self, statuses: &[&str]) -> Result<Vec<Value>, IdosellApiError> {
        let mut orders = Vec::new();
        let mut page = 0u32;
        loop {
            let body = json!({
                "params": { "ordersStatuses": statuses, "resultsPage": page, "resultsLimit": SEARCH_PAGE_SIZE },
            });
            let result =
                self.rest_query::<Value, Value>(Method::POST, "/orders/orders/search", &[], Some(body)).await?;
            let results = result["Results"].as_array().cloned().unwrap_or_default();
            let done = results.is_empty();
            orders.extend(results);
            let pages = result["resultsNumberPage"].as_u64().unwrap_or(1);
            page += 1;
            if done || u64::from(page) >= pages {
                break;
            }
        }
        Ok(orders)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Value, IdosellApiError> {
        let params = [("productIds", product_id)];
        let result = self.rest_query::<Value, ()>(Method::GET, "/products/products", &params, None).await?;
        match result["results"].as_array().and_then(|r| r.first()) {
            Some(product) => Ok(product.clone()),
            None => Err(IdosellApiError::ProductNotFound(product_id.to_string())),
        }
    }

    /// The items of the bundle `product_id`. Empty when the product is not a bundle.
    pub async fn bundle_items(&self, product_id: &str) -> Result<Vec<BundleItem>, IdosellApiError> {
        let product = self.get_product(product_id).await?;
        let items = BundleItem::list(&product);
        trace!("Product {product_id} has {} bundle items", items.len());
        Ok(items)
    }

    /// Creates the order, then brings it to its starting state: status and note, a confirmed prepayment, and for
    /// margin-taxed goods the packaging status.
    ///
    /// Once the order exists this always returns its serial number. Failed follow-up steps are logged for an
    /// operator to finish by hand, since reporting them as errors would get the order created a second time.
    pub async fn create_and_process(
        &self,
        body: &Value,
        note: &str,
        margin_taxed: bool,
        value: f64,
    ) -> Result<String, IdosellApiError> {
        let serial_number = self.create_order(body).await?;
        let edit =
            NewOrderEdit { serial_number: serial_number.clone(), status: STATUS_ON_ORDER.to_string(), note: note.into() };
        if let Err(e) = self.edit_order(&edit).await {
            warn!("IdoSell order {serial_number} was created, but its status could not be set. {e}");
        }
        if let Err(e) = self.add_payment(&serial_number, value).await {
            warn!("IdoSell order {serial_number} was created, but the payment could not be added. {e}");
        } else if let Err(e) = self.confirm_payment(&serial_number).await {
            warn!("IdoSell order {serial_number} was created, but the payment could not be confirmed. {e}");
        }
        if margin_taxed {
            let edit = NewOrderEdit { status: initial_status(true).to_string(), ..edit };
            if let Err(e) = self.edit_order(&edit).await {
                warn!("IdoSell order {serial_number} could not be moved to {}. {e}", edit.status);
            }
        }
        Ok(serial_number)
    }
}

fn serial_with_external_ref(results: &[Value], external_ref: &str) -> Option<String> {
    results
        .iter()
        .find(|r| external_ref_of(r).map(|note| note.contains(external_ref)).unwrap_or(false))
        .and_then(|r| id_text(&r["orderSerialNumber"]))
}

/// Serial numbers go out as numbers when they look like one.
fn serial_value(serial_number: &str) -> Value {
    serial_number.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::from(serial_number))
}

fn fault(entry: &Value) -> Option<String> {
    let code = entry["faultCode"].as_i64().unwrap_or(0);
    (code != 0).then(|| format!("Fault {code}. {}", entry["faultString"].as_str().unwrap_or_default()))
}

/// IdoSell answers 200 even when an operation fails, with the failure in a `faultCode`.
fn check_fault(result: &Value, order: &str) -> Result<(), IdosellApiError> {
    match fault(&result["errors"]).or_else(|| fault(&result["results"])) {
        Some(message) => Err(IdosellApiError::OrderFault { order: order.to_string(), message }),
        None => Ok(()),
    }
}

fn first_order_result<'a>(result: &'a Value, order: &str) -> Result<&'a Value, IdosellApiError> {
    check_fault(result, order)?;
    let entry = result["results"]["ordersResults"]
        .as_array()
        .and_then(|r| r.first())
        .ok_or_else(|| IdosellApiError::JsonError(format!("No ordersResults in {result}")))?;
    match fault(entry) {
        Some(message) => Err(IdosellApiError::OrderFault { order: order.to_string(), message }),
        None => Ok(entry),
    }
}
