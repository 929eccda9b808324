//! Trip Settle Library
//! # Overview
//!
//! This library splits group trip expenses between travellers, rolls them up
//! into per-traveller balances and suggests the payments that settle a trip.
//! Journals are replayed from CSV with either a sync or an async strategy.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Money, Expense, ExpenseSplit, Settlement, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::split_calculator`] - Owed amount per participant of an expense
//!   - [`core::balance`] - Net balance per traveller of a trip
//!   - [`core::netting`] - Suggested payments, greedy or minimum-count
//!   - [`core::trip_store`] - Expense, split and settlement storage
//!   - [`core::ledger`] - Trip ledger tying the components together
//! - [`io`] - Journal parsing and report output
//! - [`strategy`] - Pluggable sync and async journal replay
//!
//! # Split Methods
//!
//! - **Equal**: the amount is divided evenly; the leftover minor units go to
//!   the first participant by traveller ID
//! - **Exact**: each participant owes a stated amount; the amounts must add
//!   up to the expense
//! - **Percentage**: each participant owes a percentage of the amount
//! - **Shares**: each participant owes in proportion to a whole share count
//! - **PaidBy**: the payer alone carries the expense
//!
//! # Balances
//!
//! A traveller's balance is what they paid for expenses, minus what they owe
//! across splits, plus paid settlements they sent, minus paid settlements
//! they received. Positive means the traveller is owed money. The balances of
//! a trip always sum to exactly zero.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    BalanceAggregator, InMemoryTripStore, NettingStrategy, SettlementNetter, SharedTripStore,
    SplitCalculator, TripLedger, TripStore,
};
pub use io::{write_balances_csv, write_settlements_csv};
pub use types::{
    Balance, Expense, ExpenseId, ExpenseSplit, JournalRecord, Money, ParticipantShare,
    Settlement, SettlementId, SettlementStatus, SplitError, SplitMethod, SuggestedSettlement,
    TravellerId, TripBalances, TripId,
};
