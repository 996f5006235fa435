//! Deposit/withdraw recovery, portfolio and market creation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use swipebet::engine::creator::NewPrediction;
use swipebet::engine::notice::NoticeKind;
use swipebet::engine::session::SwipeOutcome;
use swipebet::types::{Gesture, MarketId, SessionError, Side};

use crate::mock_ledger::{alice, eth, session, LedgerCall, MockLedger, ONE_ETH};

#[tokio::test]
async fn test_deposit_recovers_from_insufficient_balance() {
    let ledger = Arc::new(MockLedger::seeded(1, ONE_ETH));
    let mut s = session(&ledger).await;
    s.set_stake(dec!(2));

    assert!(matches!(s.swipe(Gesture::Right).await, SwipeOutcome::Settled(_)));
    assert!(s.deposit_prompt_open());
    let prompt = s.view().deposit_prompt.unwrap();
    assert_eq!(prompt.needed, "2.00 ETH");
    assert_eq!(prompt.available.as_deref(), Some("1.00 ETH"));

    let preset = prompt.presets[0];
    tokio_test::assert_ok!(s.deposit(preset).await);
    assert!(!s.deposit_prompt_open());
    assert!(s.view().feedback.is_none());
    assert_eq!(s.balance(), Some(eth(dec!(6))));

    // The stake survives a failed attempt, so the retry uses it as is.
    assert_eq!(s.stake(), dec!(2));
    let retry = s.swipe(Gesture::Right).await;
    assert!(matches!(retry, SwipeOutcome::Settled(ref st) if st.is_success()));
    assert_eq!(s.balance(), Some(eth(dec!(4))));
    assert_eq!(s.cursor(), 1);
}

#[tokio::test]
async fn test_failed_deposit_leaves_prompt_open() {
    let ledger = Arc::new(MockLedger::seeded(1, 0));
    let mut s = session(&ledger).await;
    s.swipe(Gesture::Left).await;
    assert!(s.deposit_prompt_open());

    ledger.inner().reject_next_dispatch("User denied transaction signature");
    let err = s.deposit(dec!(10)).await.unwrap_err();
    assert_eq!(
        err,
        SessionError::Transaction("User denied transaction signature".into())
    );
    assert!(s.deposit_prompt_open());
    assert_eq!(
        s.feedback().map(|n| n.kind),
        Some(NoticeKind::Error)
    );
    assert_eq!(s.balance(), Some(0));
}

#[tokio::test]
async fn test_deposit_rejects_non_positive_amounts() {
    let ledger = Arc::new(MockLedger::seeded(0, 0));
    let mut s = session(&ledger).await;
    assert!(s.deposit(Decimal::ZERO).await.is_err());
    assert!(matches!(
        s.deposit(dec!(-1)).await,
        Err(SessionError::Conversion(_))
    ));
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn test_withdraw_checks_cached_balance() {
    let ledger = Arc::new(MockLedger::seeded(0, ONE_ETH));
    let mut s = session(&ledger).await;

    let err = s.withdraw(dec!(1.5)).await.unwrap_err();
    assert!(err.wants_deposit());
    assert!(ledger.calls().is_empty());

    tokio_test::assert_ok!(s.withdraw(dec!(0.25)).await);
    assert_eq!(ledger.calls(), vec![LedgerCall::Withdraw(eth(dec!(0.25)))]);
    assert_eq!(s.balance(), Some(eth(dec!(0.75))));
}

#[tokio::test]
async fn test_portfolio_lists_bets_and_created_markets() {
    let ledger = Arc::new(MockLedger::seeded(2, ONE_ETH));
    let mut s = session(&ledger).await;
    s.set_stake(dec!(0.3));
    s.swipe(Gesture::Right).await;
    s.swipe(Gesture::Left).await;

    let portfolio = tokio_test::assert_ok!(s.portfolio().await);
    assert_eq!(portfolio.placed.len(), 2);
    assert_eq!(portfolio.placed[0].market_id, MarketId(1));
    assert_eq!(portfolio.placed[0].choice, Side::Yes);
    assert_eq!(portfolio.placed[0].amount_display, "0.30 ETH");
    assert_eq!(portfolio.placed[1].choice, Side::No);
    assert_eq!(portfolio.placed[1].win_chance_pct, 100.0);
    assert_eq!(portfolio.total_staked(), eth(dec!(0.4)));
    // Seeded markets are attributed to alice.
    assert_eq!(portfolio.created.len(), 2);
    assert_eq!(portfolio.created[0].pool, "0.30 ETH");
}

#[tokio::test]
async fn test_portfolio_read_failure() {
    let ledger = Arc::new(MockLedger::seeded(1, ONE_ETH));
    let s = session(&ledger).await;
    ledger.set_error("rate limited");
    assert_eq!(
        s.portfolio().await.unwrap_err(),
        SessionError::ReadFailure("rate limited".into())
    );
}

#[tokio::test]
async fn test_created_prediction_joins_the_deck() {
    let ledger = Arc::new(MockLedger::seeded(0, 0));
    let mut s = session(&ledger).await;
    assert!(s.view().is_empty());

    let prediction = NewPrediction {
        question: "Will the ferry strike end this week?".into(),
        image_uri: "https://img.example.com/ferry.png".into(),
        betting_hours: 24,
        resolution_hours: 48,
    };
    tokio_test::assert_ok!(s.create_prediction(&prediction).await);

    let card = s.view().card.unwrap();
    assert_eq!(card.question, "Will the ferry strike end this week?");
    assert_eq!(card.odds.yes_pct, 50.0);
    let created = ledger.inner().market(card.market_id).unwrap();
    assert_eq!(created.creator, alice());
    assert!(created.betting_end_time < created.resolution_time);
}

#[tokio::test]
async fn test_invalid_prediction_never_dispatched() {
    let ledger = Arc::new(MockLedger::seeded(0, 0));
    let mut s = session(&ledger).await;
    let prediction = NewPrediction {
        question: "Will it happen?".into(),
        betting_hours: 48,
        resolution_hours: 24,
        ..NewPrediction::default()
    };
    assert!(matches!(
        s.create_prediction(&prediction).await,
        Err(SessionError::InvalidInput(_))
    ));
    assert!(ledger.calls().is_empty());
}
