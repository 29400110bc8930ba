//! Status vocabularies and the order lifecycle.
//!
//! Everything in here is pure. The synchronizer asks the mapper what the next state is before it touches the store, so
//! a transition that is not in the table below is refused and the row is left exactly as it was.
//!
//! | Current               | Trigger                | Next          |
//! |-----------------------|------------------------|---------------|
//! | NEW, ERROR            | `OperatorSelect`       | SELECTED      |
//! | SELECTED              | `SendSucceeded`        | SENT_TO_ERP   |
//! | SELECTED              | `SendFailed`           | ERROR         |
//! | SENT_TO_ERP           | `Shipped`              | SHIPPED       |
//! | SENT_TO_ERP, SHIPPED  | `CancellationDetected` | CANCELLED     |
//! | SHIPPED, CANCELLED    | `ArchiveSweep`         | ARCHIVED      |
use std::fmt::Display;

use thiserror::Error;

use crate::db_types::{MarketplaceStatus, Order, OrderState};

/// The events that move an order through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    OperatorSelect,
    SendSucceeded,
    SendFailed,
    Shipped,
    CancellationDetected,
    ArchiveSweep,
}

impl Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OperatorSelect => "operator select",
            Self::SendSucceeded => "send succeeded",
            Self::SendFailed => "send failed",
            Self::Shipped => "shipped",
            Self::CancellationDetected => "cancellation detected",
            Self::ArchiveSweep => "archive sweep",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Transition from {from} on '{trigger}' is not allowed")]
pub struct InvalidTransition {
    pub from: OrderState,
    pub trigger: Trigger,
}

/// Looks up the transition table.
pub fn next_state(current: OrderState, trigger: Trigger) -> Result<OrderState, InvalidTransition> {
    use OrderState::*;
    match (current, trigger) {
        (New | Error, Trigger::OperatorSelect) => Ok(Selected),
        (Selected, Trigger::SendSucceeded) => Ok(SentToErp),
        (Selected, Trigger::SendFailed) => Ok(Error),
        (SentToErp, Trigger::Shipped) => Ok(Shipped),
        (SentToErp | Shipped, Trigger::CancellationDetected) => Ok(Cancelled),
        (Shipped | Cancelled, Trigger::ArchiveSweep) => Ok(Archived),
        (from, trigger) => Err(InvalidTransition { from, trigger }),
    }
}

/// Applies `trigger` to the order. On failure the order is not modified.
pub fn apply(order: &mut Order, trigger: Trigger) -> Result<OrderState, InvalidTransition> {
    let next = next_state(order.state, trigger)?;
    order.state = next;
    Ok(next)
}

/// The fulfillment system's view of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErpOrderState {
    Shipped,
    Cancelled,
    /// Anything else. The raw status is retained for the operator log.
    InProgress(String),
}

pub fn erp_state(raw_status: &str) -> ErpOrderState {
    match raw_status.trim().to_ascii_lowercase().as_str() {
        "finished" | "finished_ext" => ErpOrderState::Shipped,
        "canceled" | "cancelled" => ErpOrderState::Cancelled,
        other => ErpOrderState::InProgress(other.to_string()),
    }
}

/// The marketplace status matching an internal state, if the marketplace has one.
pub fn marketplace_status(state: OrderState) -> Option<MarketplaceStatus> {
    match state {
        OrderState::SentToErp => Some(MarketplaceStatus::Accepted),
        OrderState::Shipped => Some(MarketplaceStatus::Shipped),
        OrderState::Cancelled => Some(MarketplaceStatus::Cancelled),
        _ => None,
    }
}

/// Marketplace orders that were returned or cancelled before they ever reached us are not imported.
pub fn should_import(marketplace_state: &str) -> bool {
    !matches!(marketplace_state.trim().to_ascii_uppercase().as_str(), "RETURNED" | "CANCELLED")
}
