//! Client core: the swipe deck and its bet-session state machine.

pub mod odds;
pub mod wager_input;
pub mod guard;
pub mod snapshot;
pub mod deck;
pub mod machine;
pub mod notice;
pub mod view;
pub mod portfolio;
pub mod creator;
pub mod session;

use crate::ledger::PredictionLedger;
use crate::types::{Receipt, SessionError, TxHandle};

/// Collaborator failures surface to the user with their own text.
pub(crate) fn tx_error(e: anyhow::Error) -> SessionError {
    SessionError::Transaction(e.to_string())
}

/// Await a receipt and turn a revert into an error.
pub(crate) async fn confirm(
    ledger: &dyn PredictionLedger,
    handle: &TxHandle,
) -> Result<Receipt, SessionError> {
    let receipt = ledger.await_receipt(handle).await.map_err(tx_error)?;
    if !receipt.is_success() {
        return Err(SessionError::Transaction(format!(
            "transaction {handle} reverted"
        )));
    }
    Ok(receipt)
}
