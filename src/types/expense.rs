//! Expense-related types
//!
//! This module defines expenses, the per-traveller splits derived from them,
//! and the identifiers shared by every record of a trip.

use super::money::Money;
use chrono::{DateTime, Utc};
use iso_currency::Currency;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Trip identifier; every expense, split and settlement belongs to one trip
pub type TripId = u32;

/// Expense identifier, unique within a trip
pub type ExpenseId = u32;

/// Settlement identifier, unique within a trip
pub type SettlementId = u32;

/// Traveller identifier
///
/// Compared lexicographically; that order decides who absorbs rounding
/// remainders and how netting ties are broken.
pub type TravellerId = String;

/// How an expense is divided between its participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitMethod {
    /// Even division, remainder to the first participant
    Equal,

    /// Caller-supplied amount per participant, must sum to the total
    Exact,

    /// Caller-supplied percentage per participant, must sum to 100
    Percentage,

    /// Caller-supplied integer weight per participant
    Shares,

    /// The payer alone carries the whole amount
    PaidBy,
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitMethod::Equal => "equal",
            SplitMethod::Exact => "exact",
            SplitMethod::Percentage => "percentage",
            SplitMethod::Shares => "shares",
            SplitMethod::PaidBy => "paid_by",
        };
        f.write_str(name)
    }
}

impl FromStr for SplitMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equal" => Ok(SplitMethod::Equal),
            "exact" => Ok(SplitMethod::Exact),
            "percentage" | "percent" => Ok(SplitMethod::Percentage),
            "shares" => Ok(SplitMethod::Shares),
            "paid_by" | "paidby" | "paid-by" => Ok(SplitMethod::PaidBy),
            other => Err(format!("Invalid split method: '{}'", other)),
        }
    }
}

/// A participant of an expense with its method-dependent value
///
/// `value` is the exact amount (in currency units) for EXACT, the percentage
/// for PERCENTAGE and the share count for SHARES. EQUAL and PAID_BY ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantShare {
    pub traveller: TravellerId,
    pub value: Option<Decimal>,
}

impl ParticipantShare {
    pub fn new(traveller: impl Into<TravellerId>) -> Self {
        Self {
            traveller: traveller.into(),
            value: None,
        }
    }

    pub fn with_value(traveller: impl Into<TravellerId>, value: Decimal) -> Self {
        Self {
            traveller: traveller.into(),
            value: Some(value),
        }
    }
}

/// One purchase made during a trip
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub trip: TripId,
    pub id: ExpenseId,

    /// Traveller who paid the full amount
    pub payer: TravellerId,

    pub amount: Money,
    pub currency: Currency,
    pub method: SplitMethod,
    pub participants: Vec<ParticipantShare>,
}

/// One traveller's owed share of one expense
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSplit {
    pub trip: TripId,
    pub expense: ExpenseId,
    pub traveller: TravellerId,

    /// Owed amount in minor units
    pub amount: Money,

    /// Requested percentage (PERCENTAGE splits only)
    pub percentage: Option<Decimal>,

    /// Requested share count (SHARES splits only)
    pub shares: Option<u32>,

    /// Whether the traveller has paid this share back
    ///
    /// Once set, `amount`, `percentage` and `shares` are frozen.
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

impl ExpenseSplit {
    /// Fresh unpaid split
    pub fn unpaid(trip: TripId, expense: ExpenseId, traveller: TravellerId, amount: Money) -> Self {
        Self {
            trip,
            expense,
            traveller,
            amount,
            percentage: None,
            shares: None,
            paid: false,
            paid_at: None,
        }
    }

    /// True when both splits charge the same traveller on the same terms
    pub fn same_terms(&self, other: &ExpenseSplit) -> bool {
        self.traveller == other.traveller
            && self.amount == other.amount
            && self.percentage == other.percentage
            && self.shares == other.shares
    }
}
