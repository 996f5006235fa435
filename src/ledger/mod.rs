//! Escrow ledger integration.
//!
//! Defines the `PredictionLedger` trait: the read and write surface of the
//! on-chain escrow contract the client consumes. The contract itself
//! (balance book, market creation, resolution, payout) lives elsewhere.
//! `memory` provides a deterministic in-process implementation.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{BaseUnits, Identity, Market, MarketId, PlacedBet, Receipt, Side, TxHandle};

/// Abstraction over the prediction-market escrow contract.
///
/// Reads are eventually consistent snapshots. Writes return a transaction
/// handle as soon as the transaction is dispatched; its outcome is only
/// known through `await_receipt`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionLedger: Send + Sync {
    /// All markets currently open for betting, in contract order.
    async fn get_active_predictions(&self) -> Result<Vec<Market>>;

    /// Escrow balance of `identity`, in base units.
    async fn get_balance(&self, identity: &Identity) -> Result<BaseUnits>;

    /// Dispatch a wager of `amount` base units on `side`.
    async fn place_bet(
        &self,
        market_id: MarketId,
        side: Side,
        amount: BaseUnits,
        identity: &Identity,
    ) -> Result<TxHandle>;

    /// Wait until the transaction is mined and report its status.
    async fn await_receipt(&self, handle: &TxHandle) -> Result<Receipt>;

    /// Move funds from the wallet into escrow.
    async fn deposit(&self, amount: BaseUnits, identity: &Identity) -> Result<TxHandle>;

    /// Move funds from escrow back to the wallet.
    async fn withdraw(&self, amount: BaseUnits, identity: &Identity) -> Result<TxHandle>;

    /// Markets `identity` has wagered on, paired with its wager.
    async fn get_user_bets(&self, identity: &Identity) -> Result<Vec<(Market, PlacedBet)>>;

    /// Markets created by `identity`.
    async fn get_user_created_predictions(&self, identity: &Identity) -> Result<Vec<Market>>;

    /// Dispatch creation of a new market. Durations are seconds from the
    /// moment the transaction is mined.
    async fn create_prediction(
        &self,
        question: &str,
        image_uri: &str,
        betting_duration_secs: u64,
        resolution_duration_secs: u64,
        identity: &Identity,
    ) -> Result<TxHandle>;
}
