//! Profile views: wagers placed and markets created by the identity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::currency::Currency;
use crate::ledger::PredictionLedger;
use crate::types::{BaseUnits, Identity, Market, MarketId, Odds, PlacedBet, SessionError, Side};

#[derive(Debug, Clone, Serialize)]
pub struct PlacedBetView {
    pub market_id: MarketId,
    pub question: String,
    pub amount: BaseUnits,
    pub amount_display: String,
    pub choice: Side,
    /// Current odds of the chosen side.
    pub win_chance_pct: f64,
    pub betting_ends: DateTime<Utc>,
    /// `Some` once the market is resolved.
    pub won: Option<bool>,
}

impl PlacedBetView {
    pub fn new(market: &Market, bet: &PlacedBet, currency: &Currency) -> Self {
        let won = if market.is_resolved {
            Some(market.outcome == Some(bet.choice))
        } else {
            None
        };
        Self {
            market_id: market.id,
            question: market.question.clone(),
            amount: bet.amount,
            amount_display: currency.format(bet.amount),
            choice: bet.choice,
            win_chance_pct: market.odds().for_side(bet.choice),
            betting_ends: market.betting_end_time,
            won,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedMarketView {
    pub market_id: MarketId,
    pub question: String,
    pub image_uri: String,
    pub pool: String,
    pub odds: Odds,
    pub betting_ends: DateTime<Utc>,
}

impl CreatedMarketView {
    pub fn new(market: &Market, currency: &Currency) -> Self {
        Self {
            market_id: market.id,
            question: market.question.clone(),
            image_uri: market.image_uri.clone(),
            pool: currency.format(market.pool()),
            odds: market.odds(),
            betting_ends: market.betting_end_time,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Portfolio {
    pub placed: Vec<PlacedBetView>,
    pub created: Vec<CreatedMarketView>,
}

impl Portfolio {
    /// Read both lists for `identity`.
    pub async fn load(
        ledger: &dyn PredictionLedger,
        identity: &Identity,
        currency: &Currency,
    ) -> Result<Self, SessionError> {
        let placed = ledger
            .get_user_bets(identity)
            .await
            .map_err(|e| read_failure("placed bets", e))?
            .iter()
            .map(|(market, bet)| PlacedBetView::new(market, bet, currency))
            .collect::<Vec<_>>();

        let created = ledger
            .get_user_created_predictions(identity)
            .await
            .map_err(|e| read_failure("created predictions", e))?
            .iter()
            .map(|market| CreatedMarketView::new(market, currency))
            .collect::<Vec<_>>();

        debug!(
            identity = %identity.short(),
            placed = placed.len(),
            created = created.len(),
            "Portfolio loaded"
        );
        Ok(Self { placed, created })
    }

    /// Sum of all placed stakes, in base units.
    pub fn total_staked(&self) -> BaseUnits {
        self.placed
            .iter()
            .fold(0, |acc: BaseUnits, b| acc.saturating_add(b.amount))
    }
}

fn read_failure(what: &str, e: anyhow::Error) -> SessionError {
    warn!(error = %e, "Failed to read {what}");
    SessionError::ReadFailure(e.to_string())
}
