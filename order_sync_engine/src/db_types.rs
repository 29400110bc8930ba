use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

//--------------------------------------    MarketplaceId      ---------------------------------------------------------
/// The order id assigned by the marketplace. Unique and immutable once set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MarketplaceId(pub String);

impl FromStr for MarketplaceId {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for MarketplaceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MarketplaceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for MarketplaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl MarketplaceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reference stored with the order in the fulfillment system, so that an ERP order can always be traced back
    /// to the marketplace order that created it.
    pub fn external_ref(&self) -> String {
        format!("[refurbed-api-id:{}]", self.0)
    }
}

//--------------------------------------        ErpId          ---------------------------------------------------------
/// The order id assigned by the fulfillment system when the order is created there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ErpId(pub String);

impl From<String> for ErpId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ErpId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for ErpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ErpId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     RowPosition       ---------------------------------------------------------
/// Optimistic-concurrency token for an order row.
///
/// Every successful write increments the position. A write carrying a stale position is refused with a conflict
/// instead of overwriting a concurrent edit. Orders that have never been stored carry [`RowPosition::UNSTORED`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct RowPosition(i64);

impl RowPosition {
    pub const UNSTORED: RowPosition = RowPosition(0);

    pub fn is_stored(&self) -> bool {
        self.0 > 0
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RowPosition {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for RowPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

//--------------------------------------      OrderState       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Imported from the marketplace and waiting for an operator.
    New,
    /// Marked by an operator for the next send-to-ERP batch.
    Selected,
    /// Created in the fulfillment system.
    SentToErp,
    /// Shipped by the fulfillment system, with tracking.
    Shipped,
    /// Cancelled in the marketplace or the fulfillment system.
    Cancelled,
    /// The last attempt to create the order downstream was rejected. Requires an operator.
    Error,
    /// Moved to the archive partition. Never synchronized again.
    Archived,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Shipped | Self::Cancelled)
    }
}

impl Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "NEW",
            Self::Selected => "SELECTED",
            Self::SentToErp => "SENT_TO_ERP",
            Self::Shipped => "SHIPPED",
            Self::Cancelled => "CANCELLED",
            Self::Error => "ERROR",
            Self::Archived => "ARCHIVED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order state: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderState {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "SELECTED" => Ok(Self::Selected),
            "SENT_TO_ERP" => Ok(Self::SentToErp),
            "SHIPPED" => Ok(Self::Shipped),
            "CANCELLED" => Ok(Self::Cancelled),
            "ERROR" => Ok(Self::Error),
            "ARCHIVED" => Ok(Self::Archived),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderState {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order state: {value}. But this conversion cannot fail. Defaulting to ERROR");
            OrderState::Error
        })
    }
}

//--------------------------------------  MarketplaceStatus    ---------------------------------------------------------
/// The statuses the engine pushes back to the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketplaceStatus {
    Accepted,
    Shipped,
    Cancelled,
}

impl Display for MarketplaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => f.write_str("ACCEPTED"),
            Self::Shipped => f.write_str("SHIPPED"),
            Self::Cancelled => f.write_str("CANCELLED"),
        }
    }
}

//--------------------------------------     OrderDetails      ---------------------------------------------------------
/// The operator-facing projection of a marketplace order.
///
/// `bundle_id`, `warehouse` and `notes` are filled in by an operator before the order is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDetails {
    pub country: String,
    pub currency: String,
    pub total_paid: f64,
    /// VAT rate in percent. Margin-taxed goods carry [`OrderDetails::MARGIN_VAT`].
    pub vat_rate: f64,
    pub grading: String,
    pub battery_replacement: bool,
    pub sku: String,
    pub item_name: String,
    pub item_count: u32,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub company_vat_id: Option<String>,
    pub shipping_address: PostalAddress,
    pub invoice_address: PostalAddress,
    pub bundle_id: Option<String>,
    pub warehouse: Option<String>,
    pub notes: Option<String>,
}

impl OrderDetails {
    pub const MARGIN_VAT: f64 = -1.0;

    pub fn is_margin_taxed(&self) -> bool {
        self.vat_rate < 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalAddress {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    /// Street, house number and any supplement on one line
    pub street: String,
    pub post_code: String,
    pub city: String,
    /// ISO 3166-1 alpha-2
    pub country_code: String,
    pub phone: String,
}

//--------------------------------------   MarketplaceOrder    ---------------------------------------------------------
/// An order as delivered by the marketplace client, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceOrder {
    pub marketplace_id: MarketplaceId,
    /// The order state in the marketplace's own vocabulary
    pub state: String,
    pub details: OrderDetails,
    /// The raw marketplace representation
    pub payload: Value,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub marketplace_id: MarketplaceId,
    pub erp_id: Option<ErpId>,
    pub state: OrderState,
    pub selected: bool,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    /// True once the marketplace has confirmed the status matching `state`
    pub marketplace_synced: bool,
    pub last_error: Option<String>,
    pub details: Json<OrderDetails>,
    pub payload_snapshot: Json<Value>,
    #[sqlx(rename = "version")]
    pub row_position: RowPosition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A fresh, unstored order in the `NEW` state.
    pub fn new(marketplace_id: MarketplaceId, details: OrderDetails, payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            marketplace_id,
            erp_id: None,
            state: OrderState::New,
            selected: false,
            tracking_number: None,
            carrier: None,
            marketplace_synced: false,
            last_error: None,
            details: Json(details),
            payload_snapshot: Json(payload),
            row_position: RowPosition::UNSTORED,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.row_position.is_stored()
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn record_error<S: Into<String>>(&mut self, reason: S) {
        self.last_error = Some(reason.into());
    }
}

impl From<MarketplaceOrder> for Order {
    fn from(value: MarketplaceOrder) -> Self {
        Order::new(value.marketplace_id, value.details, value.payload)
    }
}

//--------------------------------------       Snapshot        ---------------------------------------------------------
/// An immutable copy of an order row, written before any destructive mutation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Snapshot {
    pub id: i64,
    pub marketplace_id: MarketplaceId,
    pub taken_at: DateTime<Utc>,
    pub reason: String,
    pub payload: Json<Value>,
}
