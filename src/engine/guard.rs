//! Balance guard.
//!
//! Runs synchronously before any wager is dispatched: a stake that the
//! cached escrow balance cannot cover never reaches the ledger.

use crate::types::{BaseUnits, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    Ok,
    /// Balance not loaded yet, or lower than the stake.
    Insufficient {
        needed: BaseUnits,
        available: Option<BaseUnits>,
    },
}

impl GuardVerdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, GuardVerdict::Ok)
    }

    pub fn into_result(self) -> Result<(), SessionError> {
        match self {
            GuardVerdict::Ok => Ok(()),
            GuardVerdict::Insufficient { needed, available } => {
                Err(SessionError::InsufficientBalance { needed, available })
            }
        }
    }
}

pub struct BalanceGuard;

impl BalanceGuard {
    /// `Ok` iff the balance is known and covers the stake.
    pub fn check(stake: BaseUnits, balance: Option<BaseUnits>) -> GuardVerdict {
        match balance {
            Some(available) if stake <= available => GuardVerdict::Ok,
            _ => GuardVerdict::Insufficient {
                needed: stake,
                available: balance,
            },
        }
    }
}
