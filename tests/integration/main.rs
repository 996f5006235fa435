//! End-to-end tests: a bet session driven against the in-process ledger.

mod mock_ledger;
mod recovery;
mod scenarios;
