//! Stake input for the card on top of the deck.
//!
//! The stake is a human-unit `Decimal`, kept at two decimal places and
//! never below the configured minimum. It is reset to the default stake
//! whenever the deck advances.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// Stake limits and stepping.
#[derive(Debug, Clone, PartialEq)]
pub struct StakeBounds {
    /// Lower bound; entries below it clamp up to it.
    pub min: Decimal,
    /// Increment/decrement step.
    pub step: Decimal,
    /// Stake every new card starts from.
    pub default: Decimal,
}

impl Default for StakeBounds {
    fn default() -> Self {
        Self {
            min: dec!(0.1),
            step: dec!(0.1),
            default: dec!(0.1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WagerInput {
    bounds: StakeBounds,
    stake: Decimal,
}

impl WagerInput {
    pub fn new(bounds: StakeBounds) -> Self {
        let mut input = Self {
            stake: bounds.min,
            bounds,
        };
        input.reset();
        input
    }

    pub fn stake(&self) -> Decimal {
        self.stake
    }

    pub fn bounds(&self) -> &StakeBounds {
        &self.bounds
    }

    pub fn increment(&mut self) {
        self.stake = self.normalize(self.stake + self.bounds.step);
    }

    pub fn decrement(&mut self) {
        self.stake = self.normalize(self.stake - self.bounds.step);
    }

    /// Direct entry. Negative values are rejected and the previous stake
    /// kept; values below the minimum clamp up to it.
    pub fn set(&mut self, value: Decimal) -> bool {
        if value.is_sign_negative() && !value.is_zero() {
            debug!(%value, "Rejected negative stake");
            return false;
        }
        let next = self.normalize(value);
        if next != value {
            debug!(%value, stake = %next, "Stake clamped");
        }
        self.stake = next;
        true
    }

    /// Direct entry from text. Unparseable input is rejected and the
    /// previous stake kept.
    pub fn set_text(&mut self, text: &str) -> bool {
        match text.trim().parse::<Decimal>() {
            Ok(value) => self.set(value),
            Err(_) => {
                debug!(input = text, "Rejected unparseable stake");
                false
            }
        }
    }

    /// Back to the default stake.
    pub fn reset(&mut self) {
        self.stake = self.normalize(self.bounds.default);
    }

    fn normalize(&self, value: Decimal) -> Decimal {
        let rounded = value.round_dp(2);
        if rounded < self.bounds.min {
            self.bounds.min
        } else {
            rounded
        }
    }
}

impl Default for WagerInput {
    fn default() -> Self {
        Self::new(StakeBounds::default())
    }
}
