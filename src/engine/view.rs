//! Render-ready snapshot of a session.
//!
//! Everything a presentation layer needs for one frame, already formatted
//! in the session currency. Serializable so a front end can consume it as
//! JSON.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use super::machine::PhaseName;
use super::notice::NoticeView;
use crate::currency::Currency;
use crate::types::{Market, MarketId, Odds};

/// The card on top of the deck.
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub market_id: MarketId,
    pub question: String,
    pub image_uri: String,
    pub odds: Odds,
    pub yes_pool: String,
    pub no_pool: String,
    pub betting_ends: DateTime<Utc>,
    pub stake: Decimal,
}

impl CardView {
    pub fn new(market: &Market, stake: Decimal, currency: &Currency) -> Self {
        Self {
            market_id: market.id,
            question: market.question.clone(),
            image_uri: market.image_uri.clone(),
            odds: market.odds(),
            yes_pool: currency.format(market.total_yes_amount),
            no_pool: currency.format(market.total_no_amount),
            betting_ends: market.betting_end_time,
            stake,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositPromptView {
    pub presets: Vec<Decimal>,
    pub needed: String,
    pub available: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub identity: String,
    /// `None` is the "no active predictions" terminal state.
    pub card: Option<CardView>,
    pub position: usize,
    pub total: usize,
    pub phase: PhaseName,
    /// `None` until the balance has been read once.
    pub balance: Option<String>,
    pub currency: String,
    pub feedback: Option<NoticeView>,
    pub swipe: Option<NoticeView>,
    pub deposit_prompt: Option<DepositPromptView>,
    pub read_error: Option<String>,
}

impl SessionView {
    pub fn is_empty(&self) -> bool {
        self.card.is_none()
    }
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.card {
            Some(card) => {
                writeln!(
                    f,
                    "[{}/{}] {} {}",
                    self.position + 1,
                    self.total,
                    card.market_id,
                    card.question
                )?;
                writeln!(
                    f,
                    "    YES {:.2}% ({})  |  NO {:.2}% ({})",
                    card.odds.yes_pct, card.yes_pool, card.odds.no_pct, card.no_pool
                )?;
                writeln!(
                    f,
                    "    betting ends {}  |  stake {} {}",
                    card.betting_ends.format("%Y-%m-%d %H:%M UTC"),
                    card.stake,
                    self.currency
                )?;
            }
            None => writeln!(f, "No active predictions")?,
        }

        writeln!(
            f,
            "{}  |  balance {}  |  {:?}",
            self.identity,
            self.balance.as_deref().unwrap_or("unknown"),
            self.phase
        )?;

        if let Some(n) = &self.feedback {
            writeln!(f, "{:?}: {}", n.kind, n.message)?;
        }
        if let Some(n) = &self.swipe {
            writeln!(f, "{}", n.message)?;
        }
        if let Some(p) = &self.deposit_prompt {
            let presets: Vec<String> = p.presets.iter().map(|d| d.to_string()).collect();
            writeln!(
                f,
                "Deposit needed: stake {} vs balance {}  (presets: {})",
                p.needed,
                p.available.as_deref().unwrap_or("unknown"),
                presets.join(", ")
            )?;
        }
        if let Some(e) = &self.read_error {
            writeln!(f, "(showing last known data: {e})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_card_view_formats_pools() {
        let mut m = Market::sample(3);
        m.total_yes_amount = 1_500_000_000_000_000_000;
        m.total_no_amount = 500_000_000_000_000_000;
        let card = CardView::new(&m, dec!(0.1), &Currency::native());
        assert_eq!(card.yes_pool, "1.50 ETH");
        assert_eq!(card.no_pool, "0.50 ETH");
        assert_eq!(card.odds.yes_pct, 75.0);
    }

    #[test]
    fn test_empty_view_renders_terminal_state() {
        let view = SessionView {
            identity: "0xabcd...1234".into(),
            card: None,
            position: 2,
            total: 2,
            phase: PhaseName::Idle,
            balance: None,
            currency: "ETH".into(),
            feedback: None,
            swipe: None,
            deposit_prompt: None,
            read_error: None,
        };
        assert!(view.is_empty());
        let text = view.to_string();
        assert!(text.contains("No active predictions"));
        assert!(text.contains("balance unknown"));
    }
}
