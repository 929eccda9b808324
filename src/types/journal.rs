//! Trip journal records
//!
//! A journal is the ordered stream of ledger mutations replayed by the CLI.
//! Every record belongs to exactly one trip.

use super::expense::{Expense, ExpenseId, SettlementId, TravellerId, TripId};
use super::settlement::SuggestedSettlement;

/// One validated journal entry
#[derive(Debug, Clone, PartialEq)]
pub enum JournalRecord {
    /// Create a new expense and compute its splits
    Expense(Expense),

    /// Replace an existing expense and recompute its splits
    Amend(Expense),

    /// Mark one traveller's split of an expense as paid
    Paid {
        trip: TripId,
        expense: ExpenseId,
        traveller: TravellerId,
    },

    /// Record a real-world payment between two travellers
    Settlement {
        trip: TripId,
        id: SettlementId,
        transfer: SuggestedSettlement,
    },
}

impl JournalRecord {
    /// Trip this record mutates
    pub fn trip(&self) -> TripId {
        match self {
            JournalRecord::Expense(expense) | JournalRecord::Amend(expense) => expense.trip,
            JournalRecord::Paid { trip, .. } | JournalRecord::Settlement { trip, .. } => *trip,
        }
    }

    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            JournalRecord::Expense(_) => "expense",
            JournalRecord::Amend(_) => "amend",
            JournalRecord::Paid { .. } => "paid",
            JournalRecord::Settlement { .. } => "settlement",
        }
    }
}
