use std::collections::HashSet;

use log::*;
use order_sync_engine::{
    db_types::{MarketplaceId, MarketplaceOrder, MarketplaceStatus, OrderDetails, PostalAddress},
    traits::{ClientError, MarketplaceClient},
};
use refurbed_tools::{
    helpers::{grading, needs_battery_replacement, vat_rate},
    RefurbedAddress,
    RefurbedApi,
    RefurbedApiError,
    RefurbedOrder,
};

/// The Refurbed merchant API as the engine's marketplace.
#[derive(Clone)]
pub struct RefurbedMarketplace {
    api: RefurbedApi,
}

impl RefurbedMarketplace {
    pub fn new(api: RefurbedApi) -> Self {
        Self { api }
    }
}

impl MarketplaceClient for RefurbedMarketplace {
    async fn fetch_new(&self, after: Option<MarketplaceId>) -> Result<Vec<MarketplaceOrder>, ClientError> {
        let orders = self.api.fetch_orders_after(after.map(|id| id.0)).await.map_err(client_error)?;
        Ok(orders.into_iter().map(marketplace_order).collect())
    }

    async fn push_status(
        &self,
        id: &MarketplaceId,
        status: MarketplaceStatus,
        tracking: Option<String>,
    ) -> Result<(), ClientError> {
        let state = status.to_string();
        let items =
            self.api.update_order_state(id.as_str(), &state, tracking.as_deref()).await.map_err(client_error)?;
        debug!("🔄️ Refurbed order {id}: {items} items set to {state}");
        Ok(())
    }

    async fn list_cancelled(&self) -> Result<HashSet<MarketplaceId>, ClientError> {
        let orders = self.api.fetch_cancelled_orders().await.map_err(client_error)?;
        Ok(orders.into_iter().map(|o| MarketplaceId::from(o.id)).collect())
    }
}

pub fn client_error(e: RefurbedApiError) -> ClientError {
    match e {
        RefurbedApiError::QueryError { status, message } => ClientError::from_status(status, message),
        RefurbedApiError::OrderNotFound(id) => {
            ClientError::Rejected { status: 404, message: format!("Order {id} does not exist in Refurbed") }
        },
        e => ClientError::Unavailable(e.to_string()),
    }
}

fn postal_address(address: &RefurbedAddress) -> PostalAddress {
    PostalAddress {
        first_name: address.first_name.trim().to_string(),
        last_name: address.family_name.trim().to_string(),
        company_name: address.company_name.trim().to_string(),
        street: address.street_line(),
        post_code: address.post_code.trim().to_string(),
        city: address.town.trim().to_string(),
        country_code: address.country_code.trim().to_uppercase(),
        phone: address.phone_number.trim().to_string(),
    }
}

fn first_non_empty(a: String, b: String) -> String {
    if a.trim().is_empty() {
        b
    } else {
        a
    }
}

/// Projects a Refurbed order onto the fields operators and the ERP work with.
///
/// Only the first item is projected. Orders with more than one item are refused when they are sent.
pub fn marketplace_order(order: RefurbedOrder) -> MarketplaceOrder {
    let item = order.first_item().cloned().unwrap_or_default();
    let offer = item.offer_data.clone().unwrap_or_default();
    let shipping = &order.shipping_address;
    let invoice = &order.invoice_address;
    let country = first_non_empty(shipping.country_code.trim().to_uppercase(), invoice.country_code.to_uppercase());
    let company_vat_id = Some(invoice.company_vatin.trim().to_string()).filter(|v| !v.is_empty());
    let total_paid =
        if order.settlement_total_paid > 0.0 { order.settlement_total_paid } else { order.total_charged };
    let details = OrderDetails {
        vat_rate: vat_rate(&country, company_vat_id.as_deref(), &item.name),
        grading: grading(&offer.offer_grading, &item.name),
        battery_replacement: needs_battery_replacement(&offer.battery_condition),
        currency: order.settlement_currency_code.trim().to_uppercase(),
        total_paid,
        sku: item.sku.clone(),
        item_name: item.name.clone(),
        item_count: order.item_count(),
        customer_name: first_non_empty(invoice.full_name(), shipping.full_name()),
        email: order.customer_email.trim().to_string(),
        phone: first_non_empty(shipping.phone_number.trim().to_string(), invoice.phone_number.trim().to_string()),
        company_vat_id,
        shipping_address: postal_address(shipping),
        invoice_address: postal_address(invoice),
        country,
        ..OrderDetails::default()
    };
    trace!("🔄️ Projected Refurbed order {} as {details:?}", order.id);
    MarketplaceOrder { marketplace_id: MarketplaceId::from(order.id), state: order.state, details, payload: order.raw }
}
