//! Shared types for the SWIPEBET client core.
//!
//! These types form the data model used across all modules. Amounts that
//! travel to and from the ledger are integer base units of the settlement
//! currency; human-readable amounts only exist at the input and display
//! edges (see `currency`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest indivisible unit of the settlement currency.
pub type BaseUnits = u128;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Market identifier assigned by the escrow contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(pub u64);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The acting account (wallet address). Injected by the caller, never
/// looked up from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display: `0x1234...abcd`.
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of a dispatched ledger transaction (its hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHandle(pub String);

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// One yes/no prediction question as last read from the ledger.
///
/// Markets are immutable value snapshots on the client: pooled totals only
/// change when the whole collection is re-read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub creator: Identity,
    pub question: String,
    pub image_uri: String,
    /// Accumulated stake on YES, in base units.
    pub total_yes_amount: BaseUnits,
    /// Accumulated stake on NO, in base units.
    pub total_no_amount: BaseUnits,
    pub betting_end_time: DateTime<Utc>,
    pub resolution_time: DateTime<Utc>,
    pub is_resolved: bool,
    pub outcome: Option<Side>,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.id, self.question, self.odds())
    }
}

impl Market {
    /// Total stake pooled on both sides.
    pub fn pool(&self) -> BaseUnits {
        self.total_yes_amount.saturating_add(self.total_no_amount)
    }

    /// Live odds from the pooled totals.
    pub fn odds(&self) -> Odds {
        crate::engine::odds::odds(self.total_yes_amount, self.total_no_amount)
    }

    /// Pooled stake on one side.
    pub fn total_for(&self, side: Side) -> BaseUnits {
        match side {
            Side::Yes => self.total_yes_amount,
            Side::No => self.total_no_amount,
        }
    }

    /// Whether wagers are still accepted at `now`.
    pub fn is_betting_open(&self, now: DateTime<Utc>) -> bool {
        !self.is_resolved && now < self.betting_end_time
    }

    /// Helper to build a test market with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: u64) -> Self {
        let now = Utc::now();
        Market {
            id: MarketId(id),
            creator: Identity::new("0x00000000000000000000000000000000000000c0"),
            question: format!("Will sample event {id} happen?"),
            image_uri: format!("https://img.example.com/{id}.png"),
            total_yes_amount: 0,
            total_no_amount: 0,
            betting_end_time: now + chrono::Duration::hours(24),
            resolution_time: now + chrono::Duration::hours(72),
            is_resolved: false,
            outcome: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sides and gestures
// ---------------------------------------------------------------------------

/// Wager direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// Contract encoding: `true` means YES.
    pub fn as_bool(self) -> bool {
        matches!(self, Side::Yes)
    }

    pub fn from_bool(choice: bool) -> Self {
        if choice {
            Side::Yes
        } else {
            Side::No
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "YES"),
            Side::No => write!(f, "NO"),
        }
    }
}

/// A swipe on the top card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gesture {
    /// Commit YES.
    Right,
    /// Commit NO.
    Left,
    /// Pass without wagering.
    Up,
}

impl Gesture {
    /// The committed side, or `None` for a pass.
    pub fn side(self) -> Option<Side> {
        match self {
            Gesture::Right => Some(Side::Yes),
            Gesture::Left => Some(Side::No),
            Gesture::Up => None,
        }
    }
}

impl std::str::FromStr for Gesture {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "right" | "yes" | "y" => Ok(Gesture::Right),
            "left" | "no" | "n" => Ok(Gesture::Left),
            "up" | "pass" | "skip" | "p" => Ok(Gesture::Up),
            _ => Err(anyhow::anyhow!("Unknown gesture: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Odds
// ---------------------------------------------------------------------------

/// Implied YES/NO percentages from pooled stake. Always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    pub yes_pct: f64,
    pub no_pct: f64,
}

impl Odds {
    /// Uninformative prior shown for an empty pool.
    pub const EVEN: Odds = Odds {
        yes_pct: 50.0,
        no_pct: 50.0,
    };

    pub fn for_side(&self, side: Side) -> f64 {
        match side {
            Side::Yes => self.yes_pct,
            Side::No => self.no_pct,
        }
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YES {:.2}% | NO {:.2}%", self.yes_pct, self.no_pct)
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Final status of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Reverted,
}

/// Confirmation of a dispatched transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub handle: TxHandle,
    pub status: TxStatus,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}

/// A wager recorded on the ledger for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedBet {
    pub amount: BaseUnits,
    pub choice: Side,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Every failure the client core reports. None of them is fatal: each is
/// local to one wager attempt, one read, or one recovery action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Balance unknown or lower than the stake. Recover by depositing.
    #[error("insufficient balance")]
    InsufficientBalance {
        needed: BaseUnits,
        available: Option<BaseUnits>,
    },

    /// Rejected, reverted, or lost transaction; the ledger's text as-is.
    #[error("{0}")]
    Transaction(String),

    #[error("read failed: {0}")]
    ReadFailure(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("amount conversion failed: {0}")]
    Conversion(String),
}

impl SessionError {
    /// Whether the user should be offered a deposit.
    pub fn wants_deposit(&self) -> bool {
        matches!(self, SessionError::InsufficientBalance { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
