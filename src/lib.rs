//! SWIPEBET — swipe-to-wager client core for on-chain prediction markets
//!
//! Library crate exposing all modules for use by integration tests
//! and the terminal front end.

pub mod config;
pub mod types;
pub mod currency;
pub mod ledger;
pub mod engine;
