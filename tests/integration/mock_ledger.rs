//! Mock ledger for integration testing.
//!
//! Wraps an `InMemoryLedger` and records every write the session
//! dispatches, so tests can assert what did (and did not) reach the
//! ledger. A forced error makes every operation fail.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

use swipebet::config::AppConfig;
use swipebet::engine::session::{BetSession, SessionSettings};
use swipebet::ledger::memory::InMemoryLedger;
use swipebet::ledger::PredictionLedger;
use swipebet::types::*;

pub const ONE_ETH: BaseUnits = 1_000_000_000_000_000_000;

pub fn alice() -> Identity {
    Identity::new("0xa11ce00000000000000000000000000000000001")
}

/// A write as it reached the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    PlaceBet {
        market_id: MarketId,
        side: Side,
        amount: BaseUnits,
    },
    Deposit(BaseUnits),
    Withdraw(BaseUnits),
    CreatePrediction(String),
}

pub struct MockLedger {
    inner: InMemoryLedger,
    calls: Mutex<Vec<LedgerCall>>,
    /// If set, all operations will return this error.
    force_error: Mutex<Option<String>>,
}

impl MockLedger {
    pub fn new(inner: InMemoryLedger) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            force_error: Mutex::new(None),
        }
    }

    /// `markets` open questions, ids 1..=n, and `balance` for alice.
    pub fn seeded(markets: usize, balance: BaseUnits) -> Self {
        let inner = InMemoryLedger::new();
        inner.set_balance(&alice(), balance);
        for i in 1..=markets {
            inner.seed_market(&alice(), &format!("Will event {i} happen?"), "", 86_400, 172_800);
        }
        Self::new(inner)
    }

    pub fn inner(&self) -> &InMemoryLedger {
        &self.inner
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bets_dispatched(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, LedgerCall::PlaceBet { .. }))
            .count()
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    fn check(&self) -> Result<()> {
        match self.force_error.lock().unwrap().as_ref() {
            Some(err) => Err(anyhow!("{err}")),
            None => Ok(()),
        }
    }

    fn record(&self, call: LedgerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PredictionLedger for MockLedger {
    async fn get_active_predictions(&self) -> Result<Vec<Market>> {
        self.check()?;
        self.inner.get_active_predictions().await
    }

    async fn get_balance(&self, identity: &Identity) -> Result<BaseUnits> {
        self.check()?;
        self.inner.get_balance(identity).await
    }

    async fn place_bet(
        &self,
        market_id: MarketId,
        side: Side,
        amount: BaseUnits,
        identity: &Identity,
    ) -> Result<TxHandle> {
        self.check()?;
        self.record(LedgerCall::PlaceBet {
            market_id,
            side,
            amount,
        });
        self.inner.place_bet(market_id, side, amount, identity).await
    }

    async fn await_receipt(&self, handle: &TxHandle) -> Result<Receipt> {
        self.check()?;
        self.inner.await_receipt(handle).await
    }

    async fn deposit(&self, amount: BaseUnits, identity: &Identity) -> Result<TxHandle> {
        self.check()?;
        self.record(LedgerCall::Deposit(amount));
        self.inner.deposit(amount, identity).await
    }

    async fn withdraw(&self, amount: BaseUnits, identity: &Identity) -> Result<TxHandle> {
        self.check()?;
        self.record(LedgerCall::Withdraw(amount));
        self.inner.withdraw(amount, identity).await
    }

    async fn get_user_bets(&self, identity: &Identity) -> Result<Vec<(Market, PlacedBet)>> {
        self.check()?;
        self.inner.get_user_bets(identity).await
    }

    async fn get_user_created_predictions(&self, identity: &Identity) -> Result<Vec<Market>> {
        self.check()?;
        self.inner.get_user_created_predictions(identity).await
    }

    async fn create_prediction(
        &self,
        question: &str,
        image_uri: &str,
        betting_duration_secs: u64,
        resolution_duration_secs: u64,
        identity: &Identity,
    ) -> Result<TxHandle> {
        self.check()?;
        self.record(LedgerCall::CreatePrediction(question.to_string()));
        self.inner
            .create_prediction(
                question,
                image_uri,
                betting_duration_secs,
                resolution_duration_secs,
                identity,
            )
            .await
    }
}

/// Session settings for alice with the default stake bounds.
pub fn settings() -> SessionSettings {
    let mut cfg = AppConfig::default();
    cfg.session.identity = alice().0;
    SessionSettings::from_config(&cfg).unwrap()
}

/// A loaded session over `ledger`.
pub async fn session(ledger: &Arc<MockLedger>) -> BetSession {
    let mut s = BetSession::new(ledger.clone(), settings());
    s.load().await;
    s
}

pub fn eth(amount: Decimal) -> BaseUnits {
    settings().currency.to_base_units(amount).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_seeded_markets() {
        let ledger = MockLedger::seeded(3, ONE_ETH);
        let markets = ledger.get_active_predictions().await.unwrap();
        assert_eq!(markets.len(), 3);
        assert_eq!(markets[0].id, MarketId(1));
        assert_eq!(markets[0].pool(), 0);
        assert_eq!(ledger.get_balance(&alice()).await.unwrap(), ONE_ETH);
    }

    #[tokio::test]
    async fn test_mock_records_writes() {
        let ledger = MockLedger::seeded(1, ONE_ETH);
        ledger.place_bet(MarketId(1), Side::No, 5, &alice()).await.unwrap();
        ledger.deposit(7, &alice()).await.unwrap();
        assert_eq!(
            ledger.calls(),
            vec![
                LedgerCall::PlaceBet {
                    market_id: MarketId(1),
                    side: Side::No,
                    amount: 5
                },
                LedgerCall::Deposit(7),
            ]
        );
        assert_eq!(ledger.bets_dispatched(), 1);
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let ledger = MockLedger::seeded(1, ONE_ETH);
        ledger.set_error("simulated RPC outage");

        assert!(ledger.get_active_predictions().await.is_err());
        assert!(ledger.get_balance(&alice()).await.is_err());
        assert!(ledger.place_bet(MarketId(1), Side::Yes, 1, &alice()).await.is_err());
        assert!(ledger.calls().is_empty());

        ledger.clear_error();
        assert!(ledger.get_active_predictions().await.is_ok());
    }
}
