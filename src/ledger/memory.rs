//! In-process escrow ledger.
//!
//! A deterministic stand-in for the on-chain contract: keeps balances,
//! markets and wagers in memory and applies each transaction when its
//! receipt is awaited, the way a contract call takes effect once mined.
//! Failure hooks let callers simulate wallet rejections, reverts and
//! network drops.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::PredictionLedger;
use crate::config::LedgerConfig;
use crate::currency::Currency;
use crate::types::{
    BaseUnits, Identity, Market, MarketId, PlacedBet, Receipt, Side, TxHandle, TxStatus,
};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum PendingTx {
    Bet {
        identity: Identity,
        market_id: MarketId,
        side: Side,
        amount: BaseUnits,
    },
    Deposit {
        identity: Identity,
        amount: BaseUnits,
    },
    Withdraw {
        identity: Identity,
        amount: BaseUnits,
    },
    Create {
        identity: Identity,
        question: String,
        image_uri: String,
        betting_duration_secs: u64,
        resolution_duration_secs: u64,
    },
}

#[derive(Debug, Default)]
struct LedgerState {
    next_market_id: u64,
    markets: Vec<Market>,
    balances: HashMap<Identity, BaseUnits>,
    bets: Vec<(Identity, MarketId, PlacedBet)>,
    pending: HashMap<TxHandle, PendingTx>,
    dispatched: u64,
    reject_next_dispatch: Option<String>,
    fail_next_receipt: Option<String>,
    read_failure: Option<String>,
}

impl LedgerState {
    fn check_reads(&self) -> Result<()> {
        match &self.read_failure {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, tx: PendingTx) -> Result<TxHandle> {
        if let Some(msg) = self.reject_next_dispatch.take() {
            bail!("{msg}");
        }
        let handle = TxHandle(format!("0x{}", Uuid::new_v4().simple()));
        self.pending.insert(handle.clone(), tx);
        self.dispatched += 1;
        Ok(handle)
    }

    fn balance_mut(&mut self, identity: &Identity) -> &mut BaseUnits {
        self.balances.entry(identity.clone()).or_insert(0)
    }

    /// Apply a mined transaction. Returns the revert reason on failure.
    fn apply(&mut self, tx: PendingTx) -> std::result::Result<(), String> {
        match tx {
            PendingTx::Bet {
                identity,
                market_id,
                side,
                amount,
            } => {
                let now = Utc::now();
                let market = self
                    .markets
                    .iter_mut()
                    .find(|m| m.id == market_id)
                    .ok_or_else(|| format!("market {market_id} does not exist"))?;
                if !market.is_betting_open(now) {
                    return Err(format!("betting closed for market {market_id}"));
                }
                if amount == 0 {
                    return Err("bet amount must be positive".to_string());
                }
                let balance = self
                    .balances
                    .get_mut(&identity)
                    .filter(|b| **b >= amount)
                    .ok_or_else(|| "insufficient escrow balance".to_string())?;
                *balance -= amount;
                match side {
                    Side::Yes => market.total_yes_amount += amount,
                    Side::No => market.total_no_amount += amount,
                }
                self.bets.push((identity, market_id, PlacedBet { amount, choice: side }));
                Ok(())
            }
            PendingTx::Deposit { identity, amount } => {
                *self.balance_mut(&identity) += amount;
                Ok(())
            }
            PendingTx::Withdraw { identity, amount } => {
                let balance = self.balance_mut(&identity);
                if *balance < amount {
                    return Err("insufficient escrow balance".to_string());
                }
                *balance -= amount;
                Ok(())
            }
            PendingTx::Create {
                identity,
                question,
                image_uri,
                betting_duration_secs,
                resolution_duration_secs,
            } => {
                if betting_duration_secs >= resolution_duration_secs {
                    return Err("betting must end before resolution".to_string());
                }
                self.push_market(
                    identity,
                    question,
                    image_uri,
                    betting_duration_secs,
                    resolution_duration_secs,
                );
                Ok(())
            }
        }
    }

    fn push_market(
        &mut self,
        creator: Identity,
        question: String,
        image_uri: String,
        betting_duration_secs: u64,
        resolution_duration_secs: u64,
    ) -> MarketId {
        self.next_market_id += 1;
        let id = MarketId(self.next_market_id);
        let now = Utc::now();
        self.markets.push(Market {
            id,
            creator,
            question,
            image_uri,
            total_yes_amount: 0,
            total_no_amount: 0,
            betting_end_time: now + secs(betting_duration_secs),
            resolution_time: now + secs(resolution_duration_secs),
            is_resolved: false,
            outcome: None,
        });
        id
    }
}

/// Durations beyond this are clamped so timestamps stay representable.
const MAX_DURATION_SECS: u64 = 1000 * 365 * 24 * 3600;

fn secs(n: u64) -> ChronoDuration {
    ChronoDuration::seconds(n.min(MAX_DURATION_SECS) as i64)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Deterministic in-memory `PredictionLedger`.
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    confirmation_delay: Duration,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            confirmation_delay: Duration::ZERO,
        }
    }

    /// Build a ledger from the `[ledger]` config section, crediting
    /// `identity` with the configured initial balance.
    pub fn from_config(cfg: &LedgerConfig, currency: &Currency, identity: &Identity) -> Result<Self> {
        let mut ledger = Self::new();
        ledger.confirmation_delay = Duration::from_millis(cfg.confirmation_delay_ms);
        let balance = currency
            .to_base_units(cfg.initial_balance)
            .map_err(|e| anyhow!("invalid initial balance: {e}"))?;
        ledger.set_balance(identity, balance);
        for seed in &cfg.markets {
            ledger.seed_market(
                identity,
                &seed.question,
                &seed.image_uri,
                seed.betting_hours.saturating_mul(3600),
                seed.resolution_hours.saturating_mul(3600),
            );
        }
        info!(
            markets = cfg.markets.len(),
            balance = %currency.format(balance),
            "In-memory ledger seeded"
        );
        Ok(ledger)
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the escrow balance of `identity`.
    pub fn set_balance(&self, identity: &Identity, amount: BaseUnits) {
        self.state().balances.insert(identity.clone(), amount);
    }

    /// Escrow balance of `identity` without read-failure simulation.
    pub fn balance_of(&self, identity: &Identity) -> BaseUnits {
        self.state().balances.get(identity).copied().unwrap_or(0)
    }

    /// Create a market directly, bypassing transactions.
    pub fn seed_market(
        &self,
        creator: &Identity,
        question: &str,
        image_uri: &str,
        betting_duration_secs: u64,
        resolution_duration_secs: u64,
    ) -> MarketId {
        self.state().push_market(
            creator.clone(),
            question.to_string(),
            image_uri.to_string(),
            betting_duration_secs,
            resolution_duration_secs,
        )
    }

    /// Snapshot of one market, including closed ones.
    pub fn market(&self, id: MarketId) -> Option<Market> {
        self.state().markets.iter().find(|m| m.id == id).cloned()
    }

    /// Mark a market resolved; it drops out of the active list.
    pub fn resolve_market(&self, id: MarketId, outcome: Side) -> bool {
        let mut state = self.state();
        match state.markets.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                m.is_resolved = true;
                m.outcome = Some(outcome);
                true
            }
            None => false,
        }
    }

    /// Number of transactions dispatched so far.
    pub fn dispatched_count(&self) -> u64 {
        self.state().dispatched
    }

    /// Make the next dispatch fail as if the wallet rejected it.
    pub fn reject_next_dispatch(&self, msg: &str) {
        self.state().reject_next_dispatch = Some(msg.to_string());
    }

    /// Make the next receipt wait fail as if the network dropped. The
    /// transaction is discarded.
    pub fn fail_next_receipt(&self, msg: &str) {
        self.state().fail_next_receipt = Some(msg.to_string());
    }

    /// Make every read fail with `msg` until cleared with `None`.
    pub fn set_read_failure(&self, msg: Option<&str>) {
        self.state().read_failure = msg.map(str::to_string);
    }
}

#[async_trait]
impl PredictionLedger for InMemoryLedger {
    async fn get_active_predictions(&self) -> Result<Vec<Market>> {
        let state = self.state();
        state.check_reads()?;
        let now = Utc::now();
        Ok(state
            .markets
            .iter()
            .filter(|m| m.is_betting_open(now))
            .cloned()
            .collect())
    }

    async fn get_balance(&self, identity: &Identity) -> Result<BaseUnits> {
        let state = self.state();
        state.check_reads()?;
        Ok(state.balances.get(identity).copied().unwrap_or(0))
    }

    async fn place_bet(
        &self,
        market_id: MarketId,
        side: Side,
        amount: BaseUnits,
        identity: &Identity,
    ) -> Result<TxHandle> {
        let handle = self.state().dispatch(PendingTx::Bet {
            identity: identity.clone(),
            market_id,
            side,
            amount,
        })?;
        debug!(%market_id, %side, amount = %amount, %handle, "Bet dispatched");
        Ok(handle)
    }

    async fn await_receipt(&self, handle: &TxHandle) -> Result<Receipt> {
        if !self.confirmation_delay.is_zero() {
            tokio::time::sleep(self.confirmation_delay).await;
        }

        let mut state = self.state();
        let tx = state
            .pending
            .remove(handle)
            .ok_or_else(|| anyhow!("unknown transaction {handle}"))?;

        if let Some(msg) = state.fail_next_receipt.take() {
            warn!(%handle, "Simulated receipt failure");
            bail!("{msg}");
        }

        let status = match state.apply(tx) {
            Ok(()) => TxStatus::Success,
            Err(reason) => {
                warn!(%handle, reason = %reason, "Transaction reverted");
                TxStatus::Reverted
            }
        };
        Ok(Receipt {
            handle: handle.clone(),
            status,
        })
    }

    async fn deposit(&self, amount: BaseUnits, identity: &Identity) -> Result<TxHandle> {
        self.state().dispatch(PendingTx::Deposit {
            identity: identity.clone(),
            amount,
        })
    }

    async fn withdraw(&self, amount: BaseUnits, identity: &Identity) -> Result<TxHandle> {
        self.state().dispatch(PendingTx::Withdraw {
            identity: identity.clone(),
            amount,
        })
    }

    async fn get_user_bets(&self, identity: &Identity) -> Result<Vec<(Market, PlacedBet)>> {
        let state = self.state();
        state.check_reads()?;
        Ok(state
            .bets
            .iter()
            .filter(|(who, _, _)| who == identity)
            .filter_map(|(_, id, bet)| {
                state
                    .markets
                    .iter()
                    .find(|m| m.id == *id)
                    .map(|m| (m.clone(), *bet))
            })
            .collect())
    }

    async fn get_user_created_predictions(&self, identity: &Identity) -> Result<Vec<Market>> {
        let state = self.state();
        state.check_reads()?;
        Ok(state
            .markets
            .iter()
            .filter(|m| &m.creator == identity)
            .cloned()
            .collect())
    }

    async fn create_prediction(
        &self,
        question: &str,
        image_uri: &str,
        betting_duration_secs: u64,
        resolution_duration_secs: u64,
        identity: &Identity,
    ) -> Result<TxHandle> {
        self.state().dispatch(PendingTx::Create {
            identity: identity.clone(),
            question: question.to_string(),
            image_uri: image_uri.to_string(),
            betting_duration_secs,
            resolution_duration_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
