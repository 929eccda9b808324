//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `money`: Integer minor-unit amounts and decimal conversion
//! - `expense`: Expenses, splits and identifiers
//! - `settlement`: Settlements and derived balances
//! - `journal`: Journal records replayed against a trip ledger
//! - `error`: Error types for the settlement engine

pub mod error;
pub mod expense;
pub mod journal;
pub mod money;
pub mod settlement;

pub use error::SplitError;
pub use expense::{
    Expense, ExpenseId, ExpenseSplit, ParticipantShare, SettlementId, SplitMethod, TravellerId,
    TripId,
};
pub use journal::JournalRecord;
pub use money::Money;
pub use settlement::{Balance, Settlement, SettlementStatus, SuggestedSettlement, TripBalances};
