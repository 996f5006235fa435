//! Bet submission state machine.
//!
//! `Idle -> Validating -> Submitting -> AwaitingConfirmation -> Settled`.
//! Only one wager is in flight at a time: `begin` refuses while the
//! machine is between `Validating` and `AwaitingConfirmation`. The pending
//! wager lives inside the in-flight states and is gone once settled.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::types::{BaseUnits, MarketId, SessionError, Side, TxHandle};

/// The wager currently being validated or submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWager {
    pub market_id: MarketId,
    pub side: Side,
    /// Stake as entered, in human units.
    pub stake: Decimal,
    /// Stake in base units, as dispatched.
    pub amount: BaseUnits,
}

impl fmt::Display for PendingWager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} on {}", self.stake, self.side, self.market_id)
    }
}

/// How a wager attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Success {
        wager: PendingWager,
        handle: TxHandle,
    },
    Failure {
        market_id: MarketId,
        side: Side,
        reason: SessionError,
    },
}

impl Settlement {
    pub fn is_success(&self) -> bool {
        matches!(self, Settlement::Success { .. })
    }

    pub fn market_id(&self) -> MarketId {
        match self {
            Settlement::Success { wager, .. } => wager.market_id,
            Settlement::Failure { market_id, .. } => *market_id,
        }
    }

    pub fn failure_reason(&self) -> Option<&SessionError> {
        match self {
            Settlement::Success { .. } => None,
            Settlement::Failure { reason, .. } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BetPhase {
    #[default]
    Idle,
    Validating(PendingWager),
    Submitting(PendingWager),
    AwaitingConfirmation {
        wager: PendingWager,
        handle: TxHandle,
    },
    Settled(Settlement),
}

/// Phase name exposed to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    Idle,
    Validating,
    Submitting,
    AwaitingConfirmation,
    SettledSuccess,
    SettledFailure,
}

impl BetPhase {
    pub fn name(&self) -> PhaseName {
        match self {
            BetPhase::Idle => PhaseName::Idle,
            BetPhase::Validating(_) => PhaseName::Validating,
            BetPhase::Submitting(_) => PhaseName::Submitting,
            BetPhase::AwaitingConfirmation { .. } => PhaseName::AwaitingConfirmation,
            BetPhase::Settled(s) if s.is_success() => PhaseName::SettledSuccess,
            BetPhase::Settled(_) => PhaseName::SettledFailure,
        }
    }
}

#[derive(Debug, Default)]
pub struct BetMachine {
    phase: BetPhase,
}

impl BetMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &BetPhase {
        &self.phase
    }

    /// A wager is between validation and settlement.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            BetPhase::Validating(_) | BetPhase::Submitting(_) | BetPhase::AwaitingConfirmation { .. }
        )
    }

    pub fn pending(&self) -> Option<&PendingWager> {
        match &self.phase {
            BetPhase::Validating(w)
            | BetPhase::Submitting(w)
            | BetPhase::AwaitingConfirmation { wager: w, .. } => Some(w),
            BetPhase::Idle | BetPhase::Settled(_) => None,
        }
    }

    /// The awaited transaction, if any.
    pub fn awaiting(&self) -> Option<&TxHandle> {
        match &self.phase {
            BetPhase::AwaitingConfirmation { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// `Idle | Settled -> Validating`. Returns false, leaving everything
    /// untouched, while another wager is in flight.
    pub fn begin(&mut self, wager: PendingWager) -> bool {
        if self.is_busy() {
            return false;
        }
        self.phase = BetPhase::Validating(wager);
        true
    }

    /// `Validating -> Submitting`. Returns the wager to dispatch.
    pub fn approve(&mut self) -> Option<PendingWager> {
        match std::mem::take(&mut self.phase) {
            BetPhase::Validating(wager) => {
                self.phase = BetPhase::Submitting(wager.clone());
                Some(wager)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// `Submitting -> AwaitingConfirmation`.
    pub fn dispatched(&mut self, handle: TxHandle) -> bool {
        match std::mem::take(&mut self.phase) {
            BetPhase::Submitting(wager) => {
                self.phase = BetPhase::AwaitingConfirmation { wager, handle };
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// `AwaitingConfirmation -> Settled(Success)`.
    pub fn succeed(&mut self) -> Option<Settlement> {
        match std::mem::take(&mut self.phase) {
            BetPhase::AwaitingConfirmation { wager, handle } => {
                let settlement = Settlement::Success { wager, handle };
                self.phase = BetPhase::Settled(settlement.clone());
                Some(settlement)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// Any in-flight phase `-> Settled(Failure)`.
    pub fn fail(&mut self, reason: SessionError) -> Option<Settlement> {
        match std::mem::take(&mut self.phase) {
            BetPhase::Validating(wager)
            | BetPhase::Submitting(wager)
            | BetPhase::AwaitingConfirmation { wager, .. } => {
                let settlement = Settlement::Failure {
                    market_id: wager.market_id,
                    side: wager.side,
                    reason,
                };
                self.phase = BetPhase::Settled(settlement.clone());
                Some(settlement)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }
}
