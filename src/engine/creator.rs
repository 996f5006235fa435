//! Market creation.
//!
//! Validates a new question locally before dispatching
//! `createPrediction`; the contract stays the authority on everything else.

use tracing::info;

use super::{confirm, tx_error};
use crate::ledger::PredictionLedger;
use crate::types::{Identity, SessionError, TxHandle};

/// Longest betting window accepted (90 days).
pub const MAX_BETTING_HOURS: u64 = 2160;

const SECONDS_PER_HOUR: u64 = 3600;

const IMAGE_SCHEMES: &[&str] = &["http://", "https://", "ipfs://"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrediction {
    pub question: String,
    pub image_uri: String,
    pub betting_hours: u64,
    pub resolution_hours: u64,
}

impl Default for NewPrediction {
    fn default() -> Self {
        Self {
            question: String::new(),
            image_uri: String::new(),
            betting_hours: 24,
            resolution_hours: 72,
        }
    }
}

impl NewPrediction {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.question.trim().is_empty() {
            return Err(invalid("question must not be empty"));
        }
        if !(1..=MAX_BETTING_HOURS).contains(&self.betting_hours) {
            return Err(invalid(format!(
                "betting duration must be between 1 and {MAX_BETTING_HOURS} hours"
            )));
        }
        if self.resolution_hours <= self.betting_hours {
            return Err(invalid("resolution must come after betting closes"));
        }
        let uri = self.image_uri.trim();
        if !uri.is_empty() && !IMAGE_SCHEMES.iter().any(|s| uri.starts_with(s)) {
            return Err(invalid("image URL must start with http://, https:// or ipfs://"));
        }
        Ok(())
    }

    pub fn betting_duration_secs(&self) -> u64 {
        self.betting_hours.saturating_mul(SECONDS_PER_HOUR)
    }

    pub fn resolution_duration_secs(&self) -> u64 {
        self.resolution_hours.saturating_mul(SECONDS_PER_HOUR)
    }
}

fn invalid(msg: impl Into<String>) -> SessionError {
    SessionError::InvalidInput(msg.into())
}

/// Validate, dispatch and confirm a new market.
pub async fn submit(
    ledger: &dyn PredictionLedger,
    identity: &Identity,
    prediction: &NewPrediction,
) -> Result<TxHandle, SessionError> {
    prediction.validate()?;

    let handle = ledger
        .create_prediction(
            prediction.question.trim(),
            prediction.image_uri.trim(),
            prediction.betting_duration_secs(),
            prediction.resolution_duration_secs(),
            identity,
        )
        .await
        .map_err(tx_error)?;
    confirm(ledger, &handle).await?;

    info!(
        question = %prediction.question.trim(),
        betting_hours = prediction.betting_hours,
        resolution_hours = prediction.resolution_hours,
        %handle,
        "Prediction created"
    );
    Ok(handle)
}
