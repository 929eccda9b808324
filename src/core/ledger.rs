//! Trip ledger service
//!
//! This module provides the `TripLedger` that orchestrates split computation,
//! balance aggregation and settlement netting on top of a `TripStore`.
//!
//! The ledger enforces business rules such as:
//! - Expenses are recorded in the ledger's trip currency
//! - Splits are computed, never supplied by the caller
//! - Paid splits are immutable (enforced by the store's amendment path)
//! - Settlements move a positive amount between two different travellers
//!
//! Balances and suggestions are derived on every call; nothing is cached.

use crate::core::balance::BalanceAggregator;
use crate::core::netting::{NettingStrategy, SettlementNetter};
use crate::core::split_calculator::SplitCalculator;
use crate::core::traits::TripStore;
use crate::types::{
    Expense, ExpenseId, ExpenseSplit, JournalRecord, Settlement, SettlementId, SplitError,
    SuggestedSettlement, TripBalances, TripId,
};
use chrono::Utc;
use iso_currency::Currency;

/// Service facade over one trip store
///
/// Generic over the store so the same rules apply to the single-threaded
/// `InMemoryTripStore` and to a borrowed `SharedTripStore`.
#[derive(Debug)]
pub struct TripLedger<S: TripStore> {
    store: S,
    currency: Currency,
    calculator: SplitCalculator,
    aggregator: BalanceAggregator,
    netter: SettlementNetter,
}

impl<S: TripStore> TripLedger<S> {
    /// Create a ledger over `store` using greedy netting
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence collaborator
    /// * `currency` - Currency every expense of every trip must be recorded in
    pub fn new(store: S, currency: Currency) -> Self {
        Self {
            store,
            currency,
            calculator: SplitCalculator,
            aggregator: BalanceAggregator,
            netter: SettlementNetter::default(),
        }
    }

    /// Select the netting algorithm used by `suggest_settlements`
    pub fn with_netting(mut self, strategy: NettingStrategy) -> Self {
        self.netter = SettlementNetter::new(strategy);
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// IDs of every trip with recorded activity
    pub fn trips(&self) -> Vec<TripId> {
        self.store.trip_ids()
    }

    /// Compute the splits of an expense without storing anything
    ///
    /// Pure and reproducible: the same expense always yields the same splits in
    /// the same (traveller ID) order.
    pub fn compute_splits(&self, expense: &Expense) -> Result<Vec<ExpenseSplit>, SplitError> {
        self.calculator.compute_splits(expense)
    }

    /// Record a new expense and its computed splits
    ///
    /// # Returns
    ///
    /// The splits that were stored
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expense currency differs from the ledger currency
    /// - Split computation fails (see `SplitCalculator`)
    /// - The expense ID is already used in the trip
    pub fn add_expense(&mut self, expense: Expense) -> Result<Vec<ExpenseSplit>, SplitError> {
        self.check_currency(&expense)?;

        let splits = self.calculator.compute_splits(&expense)?;
        self.store.create_expense(expense, splits.clone())?;

        Ok(splits)
    }

    /// Replace an expense and recompute its splits
    ///
    /// The recomputation runs inside the store's update closure, so it is
    /// serialized with every other write to the same trip.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expense doesn't exist
    /// - The expense currency differs from the ledger currency
    /// - Split computation fails
    /// - A paid split would change or disappear (`SplitLocked`)
    pub fn amend_expense(&mut self, expense: Expense) -> Result<Vec<ExpenseSplit>, SplitError> {
        self.check_currency(&expense)?;

        let calculator = self.calculator;
        let (trip, id) = (expense.trip, expense.id);
        self.store.update_expense(trip, id, move |_, _| {
            let splits = calculator.compute_splits(&expense)?;
            Ok((expense, splits))
        })
    }

    /// Mark a traveller's split of an expense as paid now
    pub fn mark_split_paid(
        &mut self,
        trip: TripId,
        expense: ExpenseId,
        traveller: &str,
    ) -> Result<(), SplitError> {
        self.store
            .mark_split_paid(trip, expense, traveller, Utc::now())
    }

    /// Per-traveller balances of a trip
    ///
    /// A trip without records has no balances. Expenses, splits and
    /// settlements come from one store snapshot, so a concurrent amendment is
    /// seen either entirely or not at all.
    ///
    /// # Errors
    ///
    /// Returns `UnbalancedLedger` if stored data doesn't reconcile.
    pub fn get_trip_balances(&self, trip: TripId) -> Result<TripBalances, SplitError> {
        let snapshot = self.store.snapshot(trip);

        self.aggregator
            .aggregate(&snapshot.expenses, &snapshot.splits, &snapshot.settlements)
    }

    /// Payments that would settle a trip, without recording them
    pub fn suggest_settlements(&self, trip: TripId) -> Result<Vec<SuggestedSettlement>, SplitError> {
        let balances = self.get_trip_balances(trip)?;
        let suggestions = self.netter.net(&balances)?;

        tracing::debug!(
            trip,
            travellers = balances.len(),
            transfers = suggestions.len(),
            strategy = ?self.netter.strategy(),
            "suggested settlements"
        );

        Ok(suggestions)
    }

    /// Record a completed payment between two travellers
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not strictly positive
    /// - Sender and recipient are the same traveller
    /// - The settlement ID is already used in the trip
    pub fn record_settlement(
        &mut self,
        trip: TripId,
        id: SettlementId,
        transfer: SuggestedSettlement,
    ) -> Result<Settlement, SplitError> {
        if !transfer.amount.is_positive() {
            return Err(SplitError::invalid_settlement(
                id,
                "amount must be greater than zero",
            ));
        }
        if transfer.from == transfer.to {
            return Err(SplitError::invalid_settlement(
                id,
                "sender and recipient must differ",
            ));
        }

        let settlement = transfer.into_paid(trip, id, Utc::now());
        self.store.create_settlement(settlement.clone())?;

        Ok(settlement)
    }

    /// Apply one journal record
    ///
    /// Routes the record to the matching ledger operation.
    pub fn apply(&mut self, record: JournalRecord) -> Result<(), SplitError> {
        match record {
            JournalRecord::Expense(expense) => self.add_expense(expense).map(|_| ()),
            JournalRecord::Amend(expense) => self.amend_expense(expense).map(|_| ()),
            JournalRecord::Paid {
                trip,
                expense,
                traveller,
            } => self.mark_split_paid(trip, expense, &traveller),
            JournalRecord::Settlement { trip, id, transfer } => {
                self.record_settlement(trip, id, transfer).map(|_| ())
            }
        }
    }

    fn check_currency(&self, expense: &Expense) -> Result<(), SplitError> {
        if expense.currency != self.currency {
            return Err(SplitError::CurrencyMismatch {
                expense: expense.id,
                expected: self.currency.code().to_string(),
                actual: expense.currency.code().to_string(),
            });
        }
        Ok(())
    }
}
