//! Settlement currency model.
//!
//! A session uses exactly one currency. Everything the ledger sees is an
//! integer count of base units; `Decimal` human amounts exist only at the
//! input and display edges and are converted exactly here.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{BaseUnits, SessionError};

/// Largest supported decimals (native 18-decimal currencies).
pub const MAX_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    symbol: String,
    decimals: u32,
}

impl Default for Currency {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} decimals)", self.symbol, self.decimals)
    }
}

impl Currency {
    pub fn new(symbol: impl Into<String>, decimals: u32) -> Result<Self, SessionError> {
        if decimals > MAX_DECIMALS {
            return Err(SessionError::InvalidInput(format!(
                "currency decimals {decimals} exceed {MAX_DECIMALS}"
            )));
        }
        Ok(Self {
            symbol: symbol.into(),
            decimals,
        })
    }

    /// Native chain currency, 18 decimals.
    pub fn native() -> Self {
        Self {
            symbol: "ETH".to_string(),
            decimals: MAX_DECIMALS,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Base units per whole unit.
    fn scale(&self) -> u64 {
        10u64.pow(self.decimals)
    }

    /// Convert a human amount to base units, truncating anything below one
    /// base unit.
    pub fn to_base_units(&self, amount: Decimal) -> Result<BaseUnits, SessionError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(SessionError::Conversion(format!(
                "negative amount {amount}"
            )));
        }
        amount
            .checked_mul(Decimal::from(self.scale()))
            .and_then(|scaled| scaled.trunc().to_u128())
            .ok_or_else(|| {
                SessionError::Conversion(format!(
                    "{amount} {} does not fit in base units",
                    self.symbol
                ))
            })
    }

    /// Like `to_base_units`, but never fails: negative amounts map to zero
    /// and amounts too large to represent map to `u128::MAX`.
    pub fn to_base_units_saturating(&self, amount: Decimal) -> BaseUnits {
        if amount.is_sign_negative() {
            return 0;
        }
        self.to_base_units(amount).unwrap_or(BaseUnits::MAX)
    }

    /// Convert base units back to a human amount. `None` when the value is
    /// beyond `Decimal` precision.
    pub fn from_base_units(&self, units: BaseUnits) -> Option<Decimal> {
        let units = i128::try_from(units).ok()?;
        Decimal::try_from_i128_with_scale(units, self.decimals)
            .ok()
            .map(|d| d.normalize())
    }

    /// Render base units with two decimals, e.g. `1.25 ETH`. Digits past the
    /// second decimal are truncated.
    pub fn format(&self, units: BaseUnits) -> String {
        let scale = u128::from(self.scale());
        let whole = units / scale;
        let cents = (units % scale) * 100 / scale;
        format!("{whole}.{cents:02} {}", self.symbol)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
