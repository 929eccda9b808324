//! Core traits for trip persistence
//!
//! This module defines the storage abstraction that allows both the
//! single-threaded and the concurrent store to back the same `TripLedger`.

use crate::types::{Expense, ExpenseId, ExpenseSplit, Settlement, SplitError, TripId};
use chrono::{DateTime, Utc};

/// Everything recorded for one trip, taken from a single consistent read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripSnapshot {
    pub expenses: Vec<Expense>,
    pub splits: Vec<ExpenseSplit>,
    pub settlements: Vec<Settlement>,
}

/// Trait for storing expenses, splits and settlements per trip
///
/// Every write is atomic with respect to its trip: a reader never observes an
/// expense without its splits or a partially replaced split set.
/// Implementations can be synchronous (using HashMap) or concurrent (using
/// DashMap).
pub trait TripStore {
    /// IDs of every trip with at least one record, ascending
    fn trip_ids(&self) -> Vec<TripId>;

    /// Get an expense by ID
    fn get_expense(&self, trip: TripId, expense: ExpenseId) -> Option<Expense>;

    /// All expenses of a trip, ordered by expense ID
    fn list_expenses(&self, trip: TripId) -> Vec<Expense>;

    /// All splits of a trip, ordered by expense ID then traveller
    fn list_splits(&self, trip: TripId) -> Vec<ExpenseSplit>;

    /// All settlements of a trip in recording order
    fn list_settlements(&self, trip: TripId) -> Vec<Settlement>;

    /// Expenses, splits and settlements of a trip as of one instant
    ///
    /// Unlike three `list_*` calls, no write can land between the parts.
    fn snapshot(&self, trip: TripId) -> TripSnapshot;

    /// Store a new expense together with its splits
    fn create_expense(
        &mut self,
        expense: Expense,
        splits: Vec<ExpenseSplit>,
    ) -> Result<(), SplitError>;

    /// Replace an expense and its splits using a closure
    ///
    /// The closure receives the current expense and splits and returns their
    /// replacements. It runs while the trip is held exclusively, so "load,
    /// recompute, write" cannot interleave with another writer. Returns the
    /// stored splits after paid flags have been carried over.
    fn update_expense<F>(
        &mut self,
        trip: TripId,
        expense: ExpenseId,
        f: F,
    ) -> Result<Vec<ExpenseSplit>, SplitError>
    where
        F: FnOnce(&Expense, &[ExpenseSplit]) -> Result<(Expense, Vec<ExpenseSplit>), SplitError>;

    /// Flag one traveller's split as paid at `at`
    fn mark_split_paid(
        &mut self,
        trip: TripId,
        expense: ExpenseId,
        traveller: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SplitError>;

    /// Append a settlement record
    fn create_settlement(&mut self, settlement: Settlement) -> Result<(), SplitError>;
}
