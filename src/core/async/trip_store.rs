//! Thread-safe trip storage for async batch processing
//!
//! This module provides the `SharedTripStore` struct, which keeps one
//! `TripBook` per trip inside a `DashMap`.
//!
//! # Design
//!
//! DashMap shards its entries behind fine-grained locks. Every write goes
//! through `get_mut`/`entry` on the trip's key, so the shard lock is held for
//! the whole operation:
//! - writers to different trips proceed in parallel
//! - writers to the same trip are serialized
//! - an amendment's "load, recompute, write" runs entirely under the lock, so
//!   no reader sees a half-replaced split set
//!
//! Reads clone out of the map to avoid holding locks longer than necessary.

use crate::core::trip_store::TripBook;
use crate::core::traits::{TripSnapshot, TripStore};
use crate::types::{Expense, ExpenseId, ExpenseSplit, Settlement, SplitError, TripId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Thread-safe trip store
///
/// Shared between tasks behind an `Arc`; the `TripStore` implementation lives
/// on `&SharedTripStore` so each task can build its own ledger over a borrow.
#[derive(Debug, Default)]
pub struct SharedTripStore {
    /// Concurrent map of trip ID to that trip's records
    trips: DashMap<TripId, TripBook>,
}

impl SharedTripStore {
    pub fn new() -> Self {
        Self {
            trips: DashMap::new(),
        }
    }

    /// Trip IDs with at least one record, ascending
    pub fn trip_ids(&self) -> Vec<TripId> {
        let mut ids: Vec<TripId> = self
            .trips
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Run `f` against a read-only view of one trip
    ///
    /// Returns `None` if the trip has no records.
    pub fn read<T>(&self, trip: TripId, f: impl FnOnce(&TripBook) -> T) -> Option<T> {
        self.trips.get(&trip).map(|entry| f(entry.value()))
    }

    /// Store a new expense (thread-safe)
    pub fn create_expense(
        &self,
        expense: Expense,
        splits: Vec<ExpenseSplit>,
    ) -> Result<(), SplitError> {
        self.trips
            .entry(expense.trip)
            .or_default()
            .insert_expense(expense, splits)
    }

    /// Replace an expense while holding the trip's lock
    pub fn update_expense<F>(
        &self,
        trip: TripId,
        expense: ExpenseId,
        f: F,
    ) -> Result<Vec<ExpenseSplit>, SplitError>
    where
        F: FnOnce(&Expense, &[ExpenseSplit]) -> Result<(Expense, Vec<ExpenseSplit>), SplitError>,
    {
        match self.trips.get_mut(&trip) {
            Some(mut entry) => entry.value_mut().replace_expense(trip, expense, f),
            None => Err(SplitError::ExpenseNotFound { trip, expense }),
        }
    }

    /// Flag a split as paid (thread-safe)
    pub fn mark_split_paid(
        &self,
        trip: TripId,
        expense: ExpenseId,
        traveller: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SplitError> {
        match self.trips.get_mut(&trip) {
            Some(mut entry) => entry
                .value_mut()
                .mark_split_paid(trip, expense, traveller, at),
            None => Err(SplitError::ExpenseNotFound { trip, expense }),
        }
    }

    /// Append a settlement (thread-safe)
    pub fn create_settlement(&self, settlement: Settlement) -> Result<(), SplitError> {
        self.trips
            .entry(settlement.trip)
            .or_default()
            .push_settlement(settlement)
    }
}

impl TripStore for &SharedTripStore {
    fn trip_ids(&self) -> Vec<TripId> {
        SharedTripStore::trip_ids(self)
    }

    fn get_expense(&self, trip: TripId, expense: ExpenseId) -> Option<Expense> {
        self.read(trip, |book| book.expense(expense).cloned())
            .flatten()
    }

    fn list_expenses(&self, trip: TripId) -> Vec<Expense> {
        self.read(trip, |book| book.expenses().cloned().collect())
            .unwrap_or_default()
    }

    fn list_splits(&self, trip: TripId) -> Vec<ExpenseSplit> {
        self.read(trip, |book| book.splits().cloned().collect())
            .unwrap_or_default()
    }

    fn list_settlements(&self, trip: TripId) -> Vec<Settlement> {
        self.read(trip, |book| book.settlements().to_vec())
            .unwrap_or_default()
    }

    fn snapshot(&self, trip: TripId) -> TripSnapshot {
        self.read(trip, TripBook::snapshot).unwrap_or_default()
    }

    fn create_expense(
        &mut self,
        expense: Expense,
        splits: Vec<ExpenseSplit>,
    ) -> Result<(), SplitError> {
        SharedTripStore::create_expense(self, expense, splits)
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
        SharedTripStore::update_expense(self, trip, expense, f)
    }

    fn mark_split_paid(
        &mut self,
        trip: TripId,
        expense: ExpenseId,
        traveller: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SplitError> {
        SharedTripStore::mark_split_paid(self, trip, expense, traveller, at)
    }

    fn create_settlement(&mut self, settlement: Settlement) -> Result<(), SplitError> {
        SharedTripStore::create_settlement(self, settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SplitCalculator;
    use crate::types::{Money, ParticipantShare, SplitMethod};
    use iso_currency::Currency;
    use std::sync::Arc;
    use std::thread;

    fn expense(trip: TripId, id: ExpenseId, amount: i64) -> (Expense, Vec<ExpenseSplit>) {
        let expense = Expense {
            trip,
            id,
            payer: "a".to_string(),
            amount: Money::from_minor(amount),
            currency: Currency::EUR,
            method: SplitMethod::Equal,
            participants: vec![ParticipantShare::new("a"), ParticipantShare::new("b")],
        };
        let splits = SplitCalculator.compute_splits(&expense).unwrap();
        (expense, splits)
    }

    #[test]
    fn test_create_and_read_through_trait() {
        let store = SharedTripStore::new();
        let (e, s) = expense(4, 1, 1001);
        store.create_expense(e, s).unwrap();

        let handle = &store;
        assert_eq!(TripStore::trip_ids(&handle), vec![4]);
        assert_eq!(handle.list_expenses(4).len(), 1);
        let amounts: Vec<_> = handle
            .list_splits(4)
            .iter()
            .map(|s| s.amount.minor_units())
            .collect();
        assert_eq!(amounts, vec![501, 500]);
        assert!(handle.get_expense(4, 2).is_none());
        assert!(handle.list_settlements(4).is_empty());
    }

    #[test]
    fn test_snapshot_keeps_expense_and_splits_together() {
        let store = SharedTripStore::new();
        let (e, s) = expense(2, 1, 999);
        store.create_expense(e, s).unwrap();
        let handle = &store;

        assert_eq!(handle.snapshot(7), TripSnapshot::default());

        thread::scope(|scope| {
            scope.spawn(|| {
                for amount in 1000..1500 {
                    store
                        .update_expense(2, 1, |_, _| Ok(expense(2, 1, amount)))
                        .unwrap();
                }
            });

            for _ in 0..500 {
                let snapshot = handle.snapshot(2);
                let total: i64 = snapshot.splits.iter().map(|s| s.amount.minor_units()).sum();
                assert_eq!(snapshot.expenses.len(), 1);
                assert_eq!(total, snapshot.expenses[0].amount.minor_units());
            }
        });
    }

    #[test]
    fn test_update_unknown_trip() {
        let store = SharedTripStore::new();

        let result = store.update_expense(9, 1, |_, _| Ok(expense(9, 1, 10)));

        assert_eq!(
            result.unwrap_err(),
            SplitError::ExpenseNotFound { trip: 9, expense: 1 }
        );
    }

    #[test]
    fn test_concurrent_writes_to_different_trips() {
        let store = Arc::new(SharedTripStore::new());

        let mut handles = vec![];
        for trip in 0u32..8u32 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for id in 0u32..25u32 {
                    let (e, s) = expense(trip, id, 100 + i64::from(id));
                    store.create_expense(e, s).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.trip_ids(), (0u32..8u32).collect::<Vec<_>>());
        for trip in 0u32..8u32 {
            assert_eq!(store.read(trip, |book| book.expenses().count()), Some(25));
        }
    }

    #[test]
    fn test_concurrent_amendments_never_expose_partial_splits() {
        let store = Arc::new(SharedTripStore::new());
        let (e, s) = expense(1, 1, 1000);
        store.create_expense(e, s).unwrap();

        let mut handles = vec![];
        for round in 0i64..8i64 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store
                    .update_expense(1, 1, |_, _| Ok(expense(1, 1, 1000 + round)))
                    .unwrap();
                let (total, amount) = store
                    .read(1, |book| {
                        let total: i64 = book.splits().map(|s| s.amount.minor_units()).sum();
                        let amount = book.expense(1).map(|e| e.amount.minor_units());
                        (total, amount)
                    })
                    .unwrap();
                assert_eq!(Some(total), amount);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
