//! In-memory trip storage
//!
//! This module provides the `TripBook` holding one trip's expenses, splits and
//! settlements, and the single-threaded `InMemoryTripStore` keyed by trip ID.
//!
//! # Paid splits
//!
//! Once a split is marked paid its amount, percentage and share count are
//! frozen. An amendment that would change them, or drop the traveller from the
//! expense, fails with `SplitLocked` and leaves the book untouched. Paid flags
//! of splits the amendment leaves unchanged are carried over.
//!
//! # Duplicate Handling
//!
//! Expense and settlement IDs are unique per trip. A second record with the
//! same ID is rejected and the first one is kept.

use crate::core::traits::{TripSnapshot, TripStore};
use crate::types::{
    Expense, ExpenseId, ExpenseSplit, Settlement, SplitError, TravellerId, TripId,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Everything recorded for one trip
#[derive(Debug, Clone, Default)]
pub struct TripBook {
    expenses: BTreeMap<ExpenseId, Expense>,
    splits: BTreeMap<ExpenseId, Vec<ExpenseSplit>>,
    settlements: Vec<Settlement>,
}

impl TripBook {
    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.get(&id)
    }

    pub fn expenses(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.values()
    }

    pub fn splits(&self) -> impl Iterator<Item = &ExpenseSplit> {
        self.splits.values().flatten()
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    pub fn snapshot(&self) -> TripSnapshot {
        TripSnapshot {
            expenses: self.expenses().cloned().collect(),
            splits: self.splits().cloned().collect(),
            settlements: self.settlements.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.settlements.is_empty()
    }

    /// Store a new expense with its splits
    ///
    /// # Errors
    ///
    /// Returns `DuplicateExpense` if the ID is already taken.
    pub fn insert_expense(
        &mut self,
        expense: Expense,
        splits: Vec<ExpenseSplit>,
    ) -> Result<(), SplitError> {
        if self.expenses.contains_key(&expense.id) {
            return Err(SplitError::DuplicateExpense {
                trip: expense.trip,
                expense: expense.id,
            });
        }

        self.splits.insert(expense.id, splits);
        self.expenses.insert(expense.id, expense);
        Ok(())
    }

    /// Replace an expense and its splits
    ///
    /// The closure gets the current state and returns the replacement. Nothing
    /// is written unless the closure succeeds and no paid split changes.
    ///
    /// # Errors
    ///
    /// - `ExpenseNotFound` if the expense doesn't exist, or the replacement
    ///   carries a different trip or expense ID
    /// - `SplitLocked` if a paid split would change or disappear
    /// - any error returned by the closure
    pub fn replace_expense<F>(
        &mut self,
        trip: TripId,
        id: ExpenseId,
        f: F,
    ) -> Result<Vec<ExpenseSplit>, SplitError>
    where
        F: FnOnce(&Expense, &[ExpenseSplit]) -> Result<(Expense, Vec<ExpenseSplit>), SplitError>,
    {
        let current = self
            .expenses
            .get(&id)
            .ok_or(SplitError::ExpenseNotFound { trip, expense: id })?;
        let current_splits = self.splits.get(&id).map(Vec::as_slice).unwrap_or_default();

        let (replacement, mut new_splits) = f(current, current_splits)?;
        if replacement.trip != trip || replacement.id != id {
            return Err(SplitError::ExpenseNotFound {
                trip: replacement.trip,
                expense: replacement.id,
            });
        }

        let paid: HashMap<&TravellerId, &ExpenseSplit> = current_splits
            .iter()
            .filter(|split| split.paid)
            .map(|split| (&split.traveller, split))
            .collect();

        for (traveller, old) in &paid {
            let unchanged = new_splits
                .iter()
                .any(|split| &split.traveller == *traveller && split.same_terms(old));
            if !unchanged {
                return Err(SplitError::split_locked(id, traveller));
            }
        }

        for split in &mut new_splits {
            if let Some(old) = paid.get(&split.traveller) {
                split.paid = true;
                split.paid_at = old.paid_at;
            }
        }

        self.expenses.insert(id, replacement);
        self.splits.insert(id, new_splits.clone());
        Ok(new_splits)
    }

    /// Flag a split as paid
    ///
    /// # Errors
    ///
    /// - `ExpenseNotFound` if the expense doesn't exist
    /// - `SplitNotFound` if the traveller has no split on it
    /// - `SplitAlreadyPaid` if the split was already marked
    pub fn mark_split_paid(
        &mut self,
        trip: TripId,
        expense: ExpenseId,
        traveller: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SplitError> {
        let splits = self
            .splits
            .get_mut(&expense)
            .ok_or(SplitError::ExpenseNotFound { trip, expense })?;

        let split = splits
            .iter_mut()
            .find(|split| split.traveller == traveller)
            .ok_or_else(|| SplitError::split_not_found(expense, traveller))?;

        if split.paid {
            return Err(SplitError::split_already_paid(expense, traveller));
        }

        split.paid = true;
        split.paid_at = Some(at);
        Ok(())
    }

    /// Append a settlement
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSettlement` if the ID is already recorded.
    pub fn push_settlement(&mut self, settlement: Settlement) -> Result<(), SplitError> {
        if self.settlements.iter().any(|s| s.id == settlement.id) {
            return Err(SplitError::DuplicateSettlement {
                trip: settlement.trip,
                settlement: settlement.id,
            });
        }

        self.settlements.push(settlement);
        Ok(())
    }
}

/// Single-threaded trip store
///
/// Owned exclusively by its ledger, so `&mut self` already serializes every
/// write to a trip.
#[derive(Debug, Default)]
pub struct InMemoryTripStore {
    trips: HashMap<TripId, TripBook>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TripStore for InMemoryTripStore {
    fn trip_ids(&self) -> Vec<TripId> {
        let mut ids: Vec<TripId> = self
            .trips
            .iter()
            .filter(|(_, book)| !book.is_empty())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn get_expense(&self, trip: TripId, expense: ExpenseId) -> Option<Expense> {
        self.trips.get(&trip)?.expense(expense).cloned()
    }

    fn list_expenses(&self, trip: TripId) -> Vec<Expense> {
        self.trips
            .get(&trip)
            .map(|book| book.expenses().cloned().collect())
            .unwrap_or_default()
    }

    fn list_splits(&self, trip: TripId) -> Vec<ExpenseSplit> {
        self.trips
            .get(&trip)
            .map(|book| book.splits().cloned().collect())
            .unwrap_or_default()
    }

    fn list_settlements(&self, trip: TripId) -> Vec<Settlement> {
        self.trips
            .get(&trip)
            .map(|book| book.settlements().to_vec())
            .unwrap_or_default()
    }

    fn snapshot(&self, trip: TripId) -> TripSnapshot {
        self.trips
            .get(&trip)
            .map(TripBook::snapshot)
            .unwrap_or_default()
    }

    fn create_expense(
        &mut self,
        expense: Expense,
        splits: Vec<ExpenseSplit>,
    ) -> Result<(), SplitError> {
        self.trips
            .entry(expense.trip)
            .or_default()
            .insert_expense(expense, splits)
    }

    fn update_expense<F>(
        &mut self,
        trip: TripId,
        expense: ExpenseId,
        f: F,
    ) -> Result<Vec<ExpenseSplit>, SplitError>
    where
        F: FnOnce(&Expense, &[ExpenseSplit]) -> Result<(Expense, Vec<ExpenseSplit>), SplitError>,
    {
        self.trips
            .get_mut(&trip)
            .ok_or(SplitError::ExpenseNotFound { trip, expense })?
            .replace_expense(trip, expense, f)
    }

    fn mark_split_paid(
        &mut self,
        trip: TripId,
        expense: ExpenseId,
        traveller: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SplitError> {
        self.trips
            .get_mut(&trip)
            .ok_or(SplitError::ExpenseNotFound { trip, expense })?
            .mark_split_paid(trip, expense, traveller, at)
    }

    fn create_settlement(&mut self, settlement: Settlement) -> Result<(), SplitError> {
        self.trips
            .entry(settlement.trip)
            .or_default()
            .push_settlement(settlement)
    }
}
