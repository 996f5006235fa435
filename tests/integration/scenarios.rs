//! Swipe scenarios against a seeded ledger.

use rust_decimal_macros::dec;
use std::sync::Arc;

use swipebet::engine::machine::{PhaseName, Settlement};
use swipebet::engine::session::{SessionEvent, SwipeOutcome};
use swipebet::types::{Gesture, MarketId, SessionError, Side};

use crate::mock_ledger::{alice, eth, session, LedgerCall, MockLedger, ONE_ETH};

#[tokio::test]
async fn test_confirmed_yes_advances_and_refreshes_totals() {
    let ledger = Arc::new(MockLedger::seeded(1, ONE_ETH));
    let mut s = session(&ledger).await;
    assert_eq!(s.stake(), dec!(0.1));

    let outcome = s.swipe(Gesture::Right).await;
    assert!(matches!(outcome, SwipeOutcome::Settled(ref st) if st.is_success()));

    assert_eq!(s.cursor(), 1);
    assert_eq!(s.markets()[0].total_yes_amount, eth(dec!(0.1)));
    assert_eq!(s.markets()[0].odds().yes_pct, 100.0);
    assert_eq!(s.balance(), Some(eth(dec!(0.9))));
    assert_eq!(
        ledger.calls(),
        vec![LedgerCall::PlaceBet {
            market_id: MarketId(1),
            side: Side::Yes,
            amount: eth(dec!(0.1)),
        }]
    );
}

#[tokio::test]
async fn test_insufficient_balance_opens_deposit_prompt() {
    let ledger = Arc::new(MockLedger::seeded(1, ONE_ETH));
    let mut s = session(&ledger).await;
    assert!(s.set_stake(dec!(2.0)));

    let outcome = s.swipe(Gesture::Right).await;
    let SwipeOutcome::Settled(Settlement::Failure { reason, .. }) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(reason.to_string(), "insufficient balance");
    assert_eq!(s.cursor(), 0);
    assert!(s.deposit_prompt_open());
    assert!(ledger.calls().is_empty());
    assert_eq!(s.phase().name(), PhaseName::SettledFailure);
}

#[tokio::test]
async fn test_pass_advances_exactly_one() {
    let ledger = Arc::new(MockLedger::seeded(3, 0));
    let mut s = session(&ledger).await;

    assert_eq!(s.swipe(Gesture::Up).await, SwipeOutcome::Passed);
    assert_eq!(s.cursor(), 1);
    assert_eq!(s.top_of_deck().market().map(|m| m.id), Some(MarketId(2)));
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn test_failed_confirmation_then_retry_succeeds() {
    let ledger = Arc::new(MockLedger::seeded(2, ONE_ETH));
    let mut s = session(&ledger).await;
    ledger.inner().fail_next_receipt("transaction underpriced");

    let outcome = s.swipe(Gesture::Left).await;
    let SwipeOutcome::Settled(settlement) = outcome else {
        panic!("expected settlement, got {outcome:?}");
    };
    assert_eq!(
        settlement.failure_reason(),
        Some(&SessionError::Transaction("transaction underpriced".into()))
    );
    assert_eq!(s.cursor(), 0);
    assert!(s.pending().is_none());
    assert_eq!(
        s.view().feedback.map(|n| n.message).as_deref(),
        Some("transaction underpriced")
    );

    let retry = s.swipe(Gesture::Left).await;
    assert!(matches!(retry, SwipeOutcome::Settled(ref st) if st.is_success()));
    assert_eq!(s.cursor(), 1);
    assert_eq!(ledger.bets_dispatched(), 2);
    assert_eq!(s.markets()[0].total_no_amount, eth(dec!(0.1)));
}

#[tokio::test]
async fn test_wallet_rejection_keeps_card() {
    let ledger = Arc::new(MockLedger::seeded(1, ONE_ETH));
    let mut s = session(&ledger).await;
    ledger.inner().reject_next_dispatch("User denied transaction signature");

    let outcome = s.swipe(Gesture::Right).await;
    assert!(matches!(outcome, SwipeOutcome::Settled(ref st) if !st.is_success()));
    assert_eq!(s.cursor(), 0);
    assert_eq!(ledger.inner().balance_of(&alice()), ONE_ETH);
}

#[tokio::test]
async fn test_exhausted_deck_shows_empty_state() {
    let ledger = Arc::new(MockLedger::seeded(2, ONE_ETH));
    let mut s = session(&ledger).await;

    assert!(s.pass());
    assert!(matches!(s.swipe(Gesture::Right).await, SwipeOutcome::Settled(_)));
    assert_eq!(s.cursor(), 2);
    assert!(s.top_of_deck().is_empty());

    assert_eq!(s.swipe(Gesture::Right).await, SwipeOutcome::Ignored);
    assert_eq!(s.swipe(Gesture::Up).await, SwipeOutcome::Ignored);
    assert_eq!(s.cursor(), 2);

    let view = s.view();
    assert!(view.is_empty());
    assert!(view.to_string().contains("No active predictions"));
}

#[tokio::test]
async fn test_second_commit_ignored_while_awaiting() {
    let ledger = Arc::new(MockLedger::seeded(2, ONE_ETH));
    let mut s = session(&ledger).await;

    assert!(matches!(s.commit(Side::Yes).await, SwipeOutcome::Dispatched(_)));
    assert_eq!(s.commit(Side::No).await, SwipeOutcome::Ignored);
    assert!(!s.pass());
    assert_eq!(ledger.bets_dispatched(), 1);

    let settled = s.await_confirmation().await.unwrap();
    assert!(settled.is_success());
    assert_eq!(s.cursor(), 1);
    assert!(s.await_confirmation().await.is_none());
}

#[tokio::test]
async fn test_read_failure_keeps_last_snapshot() {
    let ledger = Arc::new(MockLedger::seeded(2, ONE_ETH));
    let mut s = session(&ledger).await;
    s.drain_events();

    ledger.set_error("gateway timeout");
    assert!(s.refresh_markets().await.is_err());
    assert!(s.refresh_balance().await.is_err());
    assert_eq!(s.markets().len(), 2);
    assert_eq!(s.balance(), Some(ONE_ETH));
    assert_eq!(s.view().read_error.as_deref(), Some("gateway timeout"));
    assert!(s
        .drain_events()
        .iter()
        .all(|e| matches!(e, SessionEvent::ReadFailed(_))));

    ledger.clear_error();
    tokio_test::assert_ok!(s.refresh_markets().await);
    tokio_test::assert_ok!(s.refresh_balance().await);
    assert!(s.view().read_error.is_none());
}

#[tokio::test]
async fn test_resolved_market_drops_out_and_cursor_clamps() {
    let ledger = Arc::new(MockLedger::seeded(2, ONE_ETH));
    let mut s = session(&ledger).await;
    assert!(s.pass());
    assert!(s.pass());
    assert_eq!(s.cursor(), 2);

    ledger.inner().resolve_market(MarketId(2), Side::Yes);
    tokio_test::assert_ok!(s.refresh_markets().await);
    assert_eq!(s.markets().len(), 1);
    assert_eq!(s.cursor(), 1);
    assert!(s.top_of_deck().is_empty());
}
