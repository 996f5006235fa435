//! Bet session.
//!
//! Owns one user's pass through the deck: the market snapshot, the deck
//! cursor, the stake input, the cached escrow balance and the bet machine.
//! Every failure is caught here and turned into a `Settlement::Failure`
//! plus a user-visible notice; nothing escapes a swipe as an `Err`.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::creator::{self, NewPrediction};
use super::deck::{Deck, TopOfDeck};
use super::guard::BalanceGuard;
use super::machine::{BetMachine, BetPhase, PendingWager, Settlement};
use super::notice::{Notice, NoticeKind};
use super::portfolio::Portfolio;
use super::snapshot::MarketSnapshotStore;
use super::view::{CardView, DepositPromptView, SessionView};
use super::wager_input::{StakeBounds, WagerInput};
use super::{confirm, tx_error};
use crate::config::{AppConfig, DepositConfig, SessionConfig};
use crate::currency::Currency;
use crate::ledger::PredictionLedger;
use crate::types::{
    BaseUnits, Gesture, Identity, Market, MarketId, Receipt, SessionError, Side, TxHandle,
};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub identity: Identity,
    pub currency: Currency,
    pub stake: StakeBounds,
    pub success_notice: Duration,
    pub swipe_notice: Duration,
    /// Amounts offered by the deposit prompt.
    pub deposit_presets: Vec<Decimal>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            identity: Identity::new(session.identity),
            currency: Currency::native(),
            stake: StakeBounds {
                min: session.min_stake,
                step: session.stake_step,
                default: session.default_stake,
            },
            success_notice: Duration::from_millis(session.success_notice_ms),
            swipe_notice: Duration::from_millis(session.swipe_notice_ms),
            deposit_presets: DepositConfig::default().presets,
        }
    }
}

impl SessionSettings {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, SessionError> {
        let s = &cfg.session;
        if s.identity.trim().is_empty() {
            return Err(SessionError::InvalidInput("identity must not be empty".into()));
        }
        if s.min_stake <= Decimal::ZERO {
            return Err(SessionError::InvalidInput("min_stake must be positive".into()));
        }
        if s.stake_step <= Decimal::ZERO {
            return Err(SessionError::InvalidInput("stake_step must be positive".into()));
        }
        Ok(Self {
            identity: Identity::new(s.identity.trim()),
            currency: Currency::new(cfg.currency.symbol.clone(), cfg.currency.decimals)?,
            stake: StakeBounds {
                min: s.min_stake,
                step: s.stake_step,
                default: s.default_stake,
            },
            success_notice: Duration::from_millis(s.success_notice_ms),
            swipe_notice: Duration::from_millis(s.swipe_notice_ms),
            deposit_presets: cfg.deposit.presets.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Events and outcomes
// ---------------------------------------------------------------------------

/// Things a presentation layer may want to react to, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MarketsRefreshed { count: usize, revision: u64 },
    BalanceUpdated(BaseUnits),
    ReadFailed(SessionError),
    WagerDispatched {
        market_id: MarketId,
        side: Side,
        handle: TxHandle,
    },
    WagerSettled(Settlement),
    DeckAdvanced { cursor: usize },
    DepositPromptOpened {
        needed: BaseUnits,
        available: Option<BaseUnits>,
    },
    DepositPromptClosed,
}

/// Result of one gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum SwipeOutcome {
    /// Nothing happened: a wager is in flight or the deck is empty.
    Ignored,
    Passed,
    /// Wager on the ledger, receipt still outstanding.
    Dispatched(TxHandle),
    Settled(Settlement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DepositPrompt {
    needed: BaseUnits,
    available: Option<BaseUnits>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct BetSession {
    ledger: Arc<dyn PredictionLedger>,
    settings: SessionSettings,
    snapshot: MarketSnapshotStore,
    deck: Deck,
    input: WagerInput,
    machine: BetMachine,
    balance: Option<BaseUnits>,
    balance_error: Option<String>,
    feedback: Option<Notice>,
    swipe: Option<Notice>,
    deposit_prompt: Option<DepositPrompt>,
    events: Vec<SessionEvent>,
}

impl BetSession {
    pub fn new(ledger: Arc<dyn PredictionLedger>, settings: SessionSettings) -> Self {
        let input = WagerInput::new(settings.stake.clone());
        Self {
            ledger,
            settings,
            snapshot: MarketSnapshotStore::new(),
            deck: Deck::new(),
            input,
            machine: BetMachine::new(),
            balance: None,
            balance_error: None,
            feedback: None,
            swipe: None,
            deposit_prompt: None,
            events: Vec::new(),
        }
    }

    /// Initial read of markets and balance. Read failures are recorded and
    /// the session starts with whatever could be loaded.
    pub async fn load(&mut self) {
        let markets = self.refresh_markets().await;
        let balance = self.refresh_balance().await;
        info!(
            identity = %self.settings.identity.short(),
            markets = self.snapshot.len(),
            balance_known = self.balance.is_some(),
            ok = markets.is_ok() && balance.is_ok(),
            "Session loaded"
        );
    }

    /// Re-read the open markets. On failure the previous snapshot stays.
    pub async fn refresh_markets(&mut self) -> Result<usize, SessionError> {
        match self.snapshot.refresh(self.ledger.as_ref()).await {
            Ok(count) => {
                self.deck.clamp(count);
                self.events.push(SessionEvent::MarketsRefreshed {
                    count,
                    revision: self.snapshot.revision(),
                });
                Ok(count)
            }
            Err(e) => {
                self.events.push(SessionEvent::ReadFailed(e.clone()));
                Err(e)
            }
        }
    }

    /// Re-read the escrow balance. On failure the last known value stays.
    pub async fn refresh_balance(&mut self) -> Result<BaseUnits, SessionError> {
        match self.ledger.get_balance(&self.settings.identity).await {
            Ok(balance) => {
                debug!(balance = %self.settings.currency.format(balance), "Balance refreshed");
                self.balance = Some(balance);
                self.balance_error = None;
                self.events.push(SessionEvent::BalanceUpdated(balance));
                Ok(balance)
            }
            Err(e) => {
                warn!(error = %e, "Balance read failed, keeping last known value");
                let err = SessionError::ReadFailure(e.to_string());
                self.balance_error = Some(e.to_string());
                self.events.push(SessionEvent::ReadFailed(err.clone()));
                Err(err)
            }
        }
    }

    pub fn top_of_deck(&self) -> TopOfDeck<'_> {
        self.deck.top_of_deck(self.snapshot.current())
    }

    // -- stake input ---------------------------------------------------------

    pub fn stake(&self) -> Decimal {
        self.input.stake()
    }

    pub fn increment_stake(&mut self) -> Decimal {
        self.input.increment();
        self.input.stake()
    }

    pub fn decrement_stake(&mut self) -> Decimal {
        self.input.decrement();
        self.input.stake()
    }

    pub fn set_stake(&mut self, value: Decimal) -> bool {
        self.input.set(value)
    }

    pub fn set_stake_text(&mut self, text: &str) -> bool {
        self.input.set_text(text)
    }

    // -- wagers --------------------------------------------------------------

    /// Commit gesture on the top card: validate and dispatch, without
    /// waiting for the receipt.
    pub async fn commit(&mut self, side: Side) -> SwipeOutcome {
        if self.machine.is_busy() {
            debug!(side = %side, "Commit ignored, wager in flight");
            return SwipeOutcome::Ignored;
        }
        let Some(market_id) = self.top_of_deck().market().map(|m| m.id) else {
            debug!(side = %side, "Commit ignored, deck empty");
            return SwipeOutcome::Ignored;
        };

        let stake = self.input.stake();
        let amount = self.settings.currency.to_base_units_saturating(stake);
        self.swipe = Some(Notice::swipe(side, self.settings.swipe_notice));

        let wager = PendingWager {
            market_id,
            side,
            stake,
            amount,
        };
        if !self.machine.begin(wager) {
            return SwipeOutcome::Ignored;
        }

        if let Err(reason) = BalanceGuard::check(amount, self.balance).into_result() {
            warn!(
                market_id = %market_id,
                stake = %stake,
                balance = ?self.balance.map(|b| self.settings.currency.format(b)),
                "Insufficient balance, opening deposit prompt"
            );
            self.open_deposit_prompt(amount);
            return SwipeOutcome::Settled(self.settle_failure(market_id, side, reason));
        }
        self.dismiss_deposit_prompt();

        let Some(wager) = self.machine.approve() else {
            return SwipeOutcome::Ignored;
        };
        match self
            .ledger
            .place_bet(wager.market_id, wager.side, wager.amount, &self.settings.identity)
            .await
        {
            Ok(handle) => {
                info!(
                    market_id = %market_id,
                    side = %side,
                    stake = %stake,
                    %handle,
                    "Wager dispatched"
                );
                self.machine.dispatched(handle.clone());
                self.events.push(SessionEvent::WagerDispatched {
                    market_id,
                    side,
                    handle: handle.clone(),
                });
                SwipeOutcome::Dispatched(handle)
            }
            Err(e) => {
                warn!(market_id = %market_id, error = %e, "Wager rejected");
                SwipeOutcome::Settled(self.settle_failure(market_id, side, tx_error(e)))
            }
        }
    }

    /// Wait for the in-flight wager's receipt and settle it. `None` when
    /// nothing is awaiting confirmation.
    pub async fn await_confirmation(&mut self) -> Option<Settlement> {
        let handle = self.machine.awaiting()?.clone();
        let result = self.ledger.await_receipt(&handle).await;
        self.apply_receipt(&handle, result).await
    }

    /// Settle the in-flight wager from a receipt delivered by the caller.
    /// Receipts for any other transaction are ignored.
    pub async fn apply_receipt(
        &mut self,
        handle: &TxHandle,
        result: anyhow::Result<Receipt>,
    ) -> Option<Settlement> {
        let (market_id, side) = match self.machine.phase() {
            BetPhase::AwaitingConfirmation { wager, handle: h } if h == handle => {
                (wager.market_id, wager.side)
            }
            _ => {
                debug!(%handle, "Stale receipt ignored");
                return None;
            }
        };

        match result {
            Ok(receipt) if receipt.is_success() => self.settle_success().await,
            Ok(_) => {
                warn!(market_id = %market_id, %handle, "Wager reverted");
                let reason = SessionError::Transaction(format!("transaction {handle} reverted"));
                Some(self.settle_failure(market_id, side, reason))
            }
            Err(e) => {
                warn!(market_id = %market_id, %handle, error = %e, "Wager failed");
                Some(self.settle_failure(market_id, side, tx_error(e)))
            }
        }
    }

    /// Commit and wait for the outcome.
    pub async fn place(&mut self, side: Side) -> SwipeOutcome {
        match self.commit(side).await {
            SwipeOutcome::Dispatched(handle) => match self.await_confirmation().await {
                Some(settlement) => SwipeOutcome::Settled(settlement),
                None => SwipeOutcome::Dispatched(handle),
            },
            other => other,
        }
    }

    /// Skip the top card. No balance check, no transaction. Blocked while a
    /// wager is in flight.
    pub fn pass(&mut self) -> bool {
        if self.machine.is_busy() {
            debug!("Pass ignored, wager in flight");
            return false;
        }
        if !self.deck.advance(self.snapshot.len()) {
            debug!("Pass ignored, deck empty");
            return false;
        }
        self.input.reset();
        info!(cursor = self.deck.cursor(), "Passed");
        self.events.push(SessionEvent::DeckAdvanced {
            cursor: self.deck.cursor(),
        });
        true
    }

    pub async fn swipe(&mut self, gesture: Gesture) -> SwipeOutcome {
        match gesture.side() {
            Some(side) => self.place(side).await,
            None if self.pass() => SwipeOutcome::Passed,
            None => SwipeOutcome::Ignored,
        }
    }

    async fn settle_success(&mut self) -> Option<Settlement> {
        let settlement = self.machine.succeed()?;
        if let Settlement::Success { wager, handle } = &settlement {
            info!(
                market_id = %wager.market_id,
                side = %wager.side,
                stake = %wager.stake,
                %handle,
                "Wager confirmed"
            );
        }

        // Totals only change on the ledger; re-read rather than patch.
        let _ = self.refresh_markets().await;
        if self.deck.advance(self.snapshot.len()) {
            self.events.push(SessionEvent::DeckAdvanced {
                cursor: self.deck.cursor(),
            });
        }
        self.input.reset();
        self.feedback = Some(Notice::success(self.settings.success_notice));
        let _ = self.refresh_balance().await;

        self.events.push(SessionEvent::WagerSettled(settlement.clone()));
        Some(settlement)
    }

    fn settle_failure(&mut self, market_id: MarketId, side: Side, reason: SessionError) -> Settlement {
        self.feedback = Some(Notice::error(reason.to_string()));
        let settlement = self
            .machine
            .fail(reason.clone())
            .unwrap_or(Settlement::Failure {
                market_id,
                side,
                reason,
            });
        self.events.push(SessionEvent::WagerSettled(settlement.clone()));
        settlement
    }

    // -- recovery ------------------------------------------------------------

    fn open_deposit_prompt(&mut self, needed: BaseUnits) {
        let prompt = DepositPrompt {
            needed,
            available: self.balance,
        };
        self.deposit_prompt = Some(prompt);
        self.events.push(SessionEvent::DepositPromptOpened {
            needed: prompt.needed,
            available: prompt.available,
        });
    }

    pub fn deposit_prompt_open(&self) -> bool {
        self.deposit_prompt.is_some()
    }

    pub fn dismiss_deposit_prompt(&mut self) {
        if self.deposit_prompt.take().is_some() {
            self.events.push(SessionEvent::DepositPromptClosed);
        }
    }

    /// Move `amount` into escrow. Closes the deposit prompt on success.
    pub async fn deposit(&mut self, amount: Decimal) -> Result<TxHandle, SessionError> {
        let result = self.try_deposit(amount).await;
        self.report(result)
    }

    async fn try_deposit(&mut self, amount: Decimal) -> Result<TxHandle, SessionError> {
        let units = self.positive_units(amount)?;
        let handle = self
            .ledger
            .deposit(units, &self.settings.identity)
            .await
            .map_err(tx_error)?;
        confirm(self.ledger.as_ref(), &handle).await?;
        info!(amount = %amount, %handle, "Deposit confirmed");

        self.dismiss_deposit_prompt();
        if self.feedback.as_ref().map(|n| n.kind) == Some(NoticeKind::Error) {
            self.feedback = None;
        }
        let _ = self.refresh_balance().await;
        Ok(handle)
    }

    /// Move `amount` out of escrow. Guarded like a wager.
    pub async fn withdraw(&mut self, amount: Decimal) -> Result<TxHandle, SessionError> {
        let result = self.try_withdraw(amount).await;
        self.report(result)
    }

    async fn try_withdraw(&mut self, amount: Decimal) -> Result<TxHandle, SessionError> {
        let units = self.positive_units(amount)?;
        BalanceGuard::check(units, self.balance).into_result()?;
        let handle = self
            .ledger
            .withdraw(units, &self.settings.identity)
            .await
            .map_err(tx_error)?;
        confirm(self.ledger.as_ref(), &handle).await?;
        info!(amount = %amount, %handle, "Withdrawal confirmed");

        let _ = self.refresh_balance().await;
        Ok(handle)
    }

    fn positive_units(&self, amount: Decimal) -> Result<BaseUnits, SessionError> {
        let units = self.settings.currency.to_base_units(amount)?;
        if units == 0 {
            return Err(SessionError::InvalidInput(format!(
                "amount must be positive, got {amount}"
            )));
        }
        Ok(units)
    }

    /// Surface an error as a persistent notice and pass it on.
    fn report<T>(&mut self, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if let Err(e) = &result {
            warn!(error = %e, "Action failed");
            self.feedback = Some(Notice::error(e.to_string()));
        }
        result
    }

    // -- profile -------------------------------------------------------------

    /// Create a market and pick it up in the snapshot.
    pub async fn create_prediction(
        &mut self,
        prediction: &NewPrediction,
    ) -> Result<TxHandle, SessionError> {
        let result = creator::submit(self.ledger.as_ref(), &self.settings.identity, prediction).await;
        let handle = self.report(result)?;
        let _ = self.refresh_markets().await;
        Ok(handle)
    }

    pub async fn portfolio(&self) -> Result<Portfolio, SessionError> {
        Portfolio::load(self.ledger.as_ref(), &self.settings.identity, &self.settings.currency).await
    }

    // -- view ----------------------------------------------------------------

    pub fn dismiss_notice(&mut self) {
        self.feedback = None;
    }

    /// The feedback notice, if still showing.
    pub fn feedback(&self) -> Option<&Notice> {
        self.feedback.as_ref().filter(|n| n.is_active())
    }

    pub fn view(&self) -> SessionView {
        let now = Instant::now();
        let currency = &self.settings.currency;
        let markets = self.snapshot.current();
        let card = self
            .deck
            .top_of_deck(markets)
            .market()
            .map(|m| CardView::new(m, self.input.stake(), currency));

        SessionView {
            identity: self.settings.identity.short(),
            card,
            position: self.deck.cursor(),
            total: markets.len(),
            phase: self.machine.phase().name(),
            balance: self.balance.map(|b| currency.format(b)),
            currency: currency.symbol().to_string(),
            feedback: self
                .feedback
                .as_ref()
                .filter(|n| n.is_active_at(now))
                .map(Notice::view),
            swipe: self
                .swipe
                .as_ref()
                .filter(|n| n.is_active_at(now))
                .map(Notice::view),
            deposit_prompt: self.deposit_prompt.map(|p| DepositPromptView {
                presets: self.settings.deposit_presets.clone(),
                needed: currency.format(p.needed),
                available: p.available.map(|a| currency.format(a)),
            }),
            read_error: self.read_error().map(str::to_string),
        }
    }

    /// Most recent read failure, market list first.
    pub fn read_error(&self) -> Option<&str> {
        self.snapshot
            .last_error()
            .or(self.balance_error.as_deref())
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> &BetPhase {
        self.machine.phase()
    }

    pub fn is_busy(&self) -> bool {
        self.machine.is_busy()
    }

    pub fn pending(&self) -> Option<&PendingWager> {
        self.machine.pending()
    }

    pub fn cursor(&self) -> usize {
        self.deck.cursor()
    }

    pub fn markets(&self) -> &[Market] {
        self.snapshot.current()
    }

    pub fn balance(&self) -> Option<BaseUnits> {
        self.balance
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
