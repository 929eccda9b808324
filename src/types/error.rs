//! Error types for the trip settlement engine
//!
//! This module defines every error the split, balance and netting core can
//! return, plus the journal I/O errors of the CLI.
//!
//! # Error Categories
//!
//! - **Validation Errors**: caller-fixable input problems (bad amounts, splits
//!   that don't reconcile, missing participants). Never retried.
//! - **Ledger State Errors**: writes that conflict with what is already stored
//!   (duplicate IDs, paid splits that would change).
//! - **Integrity Errors**: `UnbalancedLedger`, upstream data corruption. Logged
//!   at error severity and the operation is aborted.
//! - **Journal Errors**: file and CSV problems while reading a trip journal.

use super::expense::{ExpenseId, SettlementId, SplitMethod, TravellerId, TripId};
use std::fmt;
use thiserror::Error;

/// Main error type for the settlement engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    /// Journal file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error while reading a journal or writing a report
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// Malformed journal row
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },

    /// Negative, malformed or unrepresentable amount
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },

    /// Split requested over an empty participant list
    #[error("Expense {expense} has no participants")]
    NoParticipants { expense: ExpenseId },

    /// Explicit split values don't reconcile with the expense total
    #[error("Split mismatch on expense {expense}: {reason}")]
    SplitMismatch { expense: ExpenseId, reason: String },

    /// Share count that is zero, negative or fractional
    #[error("Invalid share count '{shares}' for {traveller} on expense {expense}")]
    InvalidShareCount {
        expense: ExpenseId,
        traveller: TravellerId,
        shares: String,
    },

    /// EXACT, PERCENTAGE and SHARES need a value per participant
    #[error("{method} split on expense {expense} requires a value for {traveller}")]
    MissingSplitValue {
        expense: ExpenseId,
        traveller: TravellerId,
        method: SplitMethod,
    },

    /// A traveller may appear at most once per expense
    #[error("Traveller {traveller} appears more than once on expense {expense}")]
    DuplicateParticipant {
        expense: ExpenseId,
        traveller: TravellerId,
    },

    /// Expense recorded in a currency other than the trip currency
    #[error("Expense {expense} is in {actual} but the trip ledger uses {expected}")]
    CurrencyMismatch {
        expense: ExpenseId,
        expected: String,
        actual: String,
    },

    /// Settlement with a non-positive amount or identical endpoints
    #[error("Invalid settlement {settlement}: {reason}")]
    InvalidSettlement {
        settlement: SettlementId,
        reason: String,
    },

    #[error("Expense {expense} not found in trip {trip}")]
    ExpenseNotFound { trip: TripId, expense: ExpenseId },

    #[error("Duplicate expense ID {expense} in trip {trip}")]
    DuplicateExpense { trip: TripId, expense: ExpenseId },

    #[error("Duplicate settlement ID {settlement} in trip {trip}")]
    DuplicateSettlement {
        trip: TripId,
        settlement: SettlementId,
    },

    #[error("No split for {traveller} on expense {expense}")]
    SplitNotFound {
        expense: ExpenseId,
        traveller: TravellerId,
    },

    #[error("Split for {traveller} on expense {expense} is already paid")]
    SplitAlreadyPaid {
        expense: ExpenseId,
        traveller: TravellerId,
    },

    /// A paid split's amount, percentage or shares would change
    #[error("Split for {traveller} on expense {expense} is paid and cannot change")]
    SplitLocked {
        expense: ExpenseId,
        traveller: TravellerId,
    },

    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: String },

    /// Balances of a closed trip don't sum to zero
    #[error("Unbalanced ledger: balances sum to {imbalance} minor units instead of 0")]
    UnbalancedLedger { imbalance: i128 },
}

impl From<std::io::Error> for SplitError {
    fn from(error: std::io::Error) -> Self {
        SplitError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for SplitError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        SplitError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl SplitError {
    /// True for data-integrity failures that no caller input can fix
    pub fn is_integrity(&self) -> bool {
        matches!(self, SplitError::UnbalancedLedger { .. })
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: impl fmt::Display, reason: &str) -> Self {
        SplitError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a SplitMismatch error
    pub fn split_mismatch(expense: ExpenseId, reason: &str) -> Self {
        SplitError::SplitMismatch {
            expense,
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidShareCount error
    pub fn invalid_share_count(
        expense: ExpenseId,
        traveller: &str,
        shares: impl fmt::Display,
    ) -> Self {
        SplitError::InvalidShareCount {
            expense,
            traveller: traveller.to_string(),
            shares: shares.to_string(),
        }
    }

    /// Create a MissingSplitValue error
    pub fn missing_split_value(expense: ExpenseId, traveller: &str, method: SplitMethod) -> Self {
        SplitError::MissingSplitValue {
            expense,
            traveller: traveller.to_string(),
            method,
        }
    }

    /// Create a DuplicateParticipant error
    pub fn duplicate_participant(expense: ExpenseId, traveller: &str) -> Self {
        SplitError::DuplicateParticipant {
            expense,
            traveller: traveller.to_string(),
        }
    }

    /// Create an InvalidSettlement error
    pub fn invalid_settlement(settlement: SettlementId, reason: &str) -> Self {
        SplitError::InvalidSettlement {
            settlement,
            reason: reason.to_string(),
        }
    }

    /// Create a SplitNotFound error
    pub fn split_not_found(expense: ExpenseId, traveller: &str) -> Self {
        SplitError::SplitNotFound {
            expense,
            traveller: traveller.to_string(),
        }
    }

    /// Create a SplitAlreadyPaid error
    pub fn split_already_paid(expense: ExpenseId, traveller: &str) -> Self {
        SplitError::SplitAlreadyPaid {
            expense,
            traveller: traveller.to_string(),
        }
    }

    /// Create a SplitLocked error
    pub fn split_locked(expense: ExpenseId, traveller: &str) -> Self {
        SplitError::SplitLocked {
            expense,
            traveller: traveller.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        SplitError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }
}
