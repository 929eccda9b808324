//! Core business logic module
//!
//! This module contains the split and settlement components:
//! - `split_calculator` - Per-traveller owed amounts for one expense
//! - `balance` - Per-traveller net balances of a trip
//! - `netting` - Suggested payments that settle a trip
//! - `traits` - Storage abstraction shared by sync and async stores
//! - `trip_store` - Single-threaded in-memory trip storage
//! - `ledger` - Service facade tying the above together
//! - `async` - Concurrent store and batch processor

pub mod r#async;
pub mod balance;
pub mod ledger;
pub mod netting;
pub mod split_calculator;
pub mod traits;
pub mod trip_store;

pub use balance::BalanceAggregator;
pub use ledger::TripLedger;
pub use netting::{NettingStrategy, SettlementNetter, OPTIMAL_NETTING_LIMIT};
pub use r#async::{BatchProcessor, SharedTripStore};
pub use split_calculator::SplitCalculator;
pub use traits::{TripSnapshot, TripStore};
pub use trip_store::{InMemoryTripStore, TripBook};
