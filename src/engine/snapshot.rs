//! Market snapshot store.
//!
//! Sole owner of the client's market list. A refresh replaces the whole
//! collection atomically; a failed refresh leaves the previous snapshot in
//! place (stale but available).

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::ledger::PredictionLedger;
use crate::types::{Market, MarketId, SessionError};

#[derive(Debug, Default)]
pub struct MarketSnapshotStore {
    markets: Vec<Market>,
    /// Bumped on every successful refresh; views re-render on change.
    revision: u64,
    refreshed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl MarketSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read the open markets and replace the snapshot. Returns the new
    /// market count.
    pub async fn refresh(&mut self, ledger: &dyn PredictionLedger) -> Result<usize, SessionError> {
        match ledger.get_active_predictions().await {
            Ok(markets) => {
                self.markets = markets;
                self.revision += 1;
                self.refreshed_at = Some(Utc::now());
                self.last_error = None;
                debug!(
                    count = self.markets.len(),
                    revision = self.revision,
                    "Market snapshot refreshed"
                );
                Ok(self.markets.len())
            }
            Err(e) => {
                warn!(
                    error = %e,
                    kept = self.markets.len(),
                    "Market refresh failed, keeping previous snapshot"
                );
                let message = e.to_string();
                self.last_error = Some(message.clone());
                Err(SessionError::ReadFailure(message))
            }
        }
    }

    /// The markets in ledger order.
    pub fn current(&self) -> &[Market] {
        &self.markets
    }

    pub fn get(&self, index: usize) -> Option<&Market> {
        self.markets.get(index)
    }

    pub fn find(&self, id: MarketId) -> Option<&Market> {
        self.markets.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Error of the most recent refresh, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
