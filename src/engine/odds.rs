//! Live odds from pooled stake.
//!
//! Ratio-based, so the settlement currency's decimals never matter here.

use crate::types::{BaseUnits, Odds};

/// Implied YES/NO percentages for the given pooled totals.
///
/// An empty pool yields the 50/50 prior. Otherwise
/// `yes_pct = 100 * yes / (yes + no)` and `no_pct` is its exact
/// complement, so the two always sum to 100.
pub fn odds(total_yes: BaseUnits, total_no: BaseUnits) -> Odds {
    // u128 -> f64 keeps the ratio even where the integer sum would overflow.
    let yes = total_yes as f64;
    let no = total_no as f64;
    let total = yes + no;

    if total == 0.0 {
        return Odds::EVEN;
    }

    let yes_pct = 100.0 * yes / total;
    Odds {
        yes_pct,
        no_pct: 100.0 - yes_pct,
    }
}
