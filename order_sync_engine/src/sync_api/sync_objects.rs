use std::{fmt::Display, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{db_types::MarketplaceId, sync_api::errors::SyncError};

//--------------------------------------     SyncOperation     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    FetchNew,
    SelectOrders,
    SendSelected,
    UpdateStates,
    ProcessShipped,
    ProcessCancelled,
    ArchiveCompleted,
}

impl Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FetchNew => "fetch_new",
            Self::SelectOrders => "select_orders",
            Self::SendSelected => "send_selected",
            Self::UpdateStates => "update_states",
            Self::ProcessShipped => "process_shipped",
            Self::ProcessCancelled => "process_cancelled",
            Self::ArchiveCompleted => "archive_completed",
        };
        f.write_str(s)
    }
}

//--------------------------------------       RowStatus       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub enum RowStatus {
    Succeeded,
    Skipped,
    Failed(SyncError),
}

impl Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => f.write_str("ok"),
            Self::Skipped => f.write_str("skipped"),
            Self::Failed(_) => f.write_str("FAILED"),
        }
    }
}

/// What happened to a single order during a batch.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub marketplace_id: MarketplaceId,
    pub status: RowStatus,
    pub detail: String,
}

impl RowOutcome {
    pub fn succeeded<S: Into<String>>(id: &MarketplaceId, detail: S) -> Self {
        Self { marketplace_id: id.clone(), status: RowStatus::Succeeded, detail: detail.into() }
    }

    pub fn skipped<S: Into<String>>(id: &MarketplaceId, detail: S) -> Self {
        Self { marketplace_id: id.clone(), status: RowStatus::Skipped, detail: detail.into() }
    }

    pub fn failed(id: &MarketplaceId, error: SyncError) -> Self {
        let detail = error.to_string();
        Self { marketplace_id: id.clone(), status: RowStatus::Failed(error), detail }
    }

    pub fn failed_with<S: Into<String>>(id: &MarketplaceId, error: SyncError, detail: S) -> Self {
        Self { marketplace_id: id.clone(), status: RowStatus::Failed(error), detail: detail.into() }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, RowStatus::Failed(_))
    }
}

impl Display for RowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<16} {:<8} {}", self.marketplace_id.as_str(), self.status.to_string(), self.detail)
    }
}

//--------------------------------------     BatchSummary      ---------------------------------------------------------
/// The result of one synchronizer operation.
///
/// Its `Display` implementation is the plain-text log returned to operators.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub operation: SyncOperation,
    pub outcomes: Vec<RowOutcome>,
    /// Problems that did not belong to a single row, e.g. one of two remote lookups failing
    pub warnings: Vec<String>,
}

impl BatchSummary {
    pub fn new(operation: SyncOperation) -> Self {
        Self { operation, outcomes: Vec::new(), warnings: Vec::new() }
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn warn<S: Into<String>>(&mut self, warning: S) {
        self.warnings.push(warning.into());
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, RowStatus::Succeeded)).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, RowStatus::Skipped)).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&MarketplaceId, &SyncError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            RowStatus::Failed(e) => Some((&o.marketplace_id, e)),
            _ => None,
        })
    }

    pub fn outcome_for(&self, id: &MarketplaceId) -> Option<&RowOutcome> {
        self.outcomes.iter().rev().find(|o| &o.marketplace_id == id)
    }
}

impl Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{}: {} attempted, {} succeeded, {} skipped, {} failed",
            self.operation,
            self.attempted(),
            self.succeeded(),
            self.skipped(),
            self.failed()
        )?;
        for warning in &self.warnings {
            writeln!(f, "  warning: {warning}")?;
        }
        for outcome in &self.outcomes {
            writeln!(f, "  {outcome}")?;
        }
        Ok(())
    }
}

//--------------------------------------      SyncPolicy       ---------------------------------------------------------
/// How rows in the `ERROR` state get back into a send batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorRetryPolicy {
    /// An operator has to re-select the order.
    #[default]
    Manual,
    /// Every `send_selected` run retries all `ERROR` rows.
    Automatic,
}

impl FromStr for ErrorRetryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "automatic" | "auto" => Ok(Self::Automatic),
            s => Err(format!("'{s}' is not a retry policy. Use 'manual' or 'automatic'")),
        }
    }
}

impl Display for ErrorRetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Automatic => f.write_str("automatic"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncPolicy {
    pub error_retry: ErrorRetryPolicy,
    /// Terminal orders younger than this are left in place by the archive sweep.
    pub archive_min_age: Option<Duration>,
    /// Push `ACCEPTED` to the marketplace once the ERP order exists.
    pub accept_on_send: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self { error_retry: ErrorRetryPolicy::Manual, archive_min_age: None, accept_on_send: true }
    }
}
