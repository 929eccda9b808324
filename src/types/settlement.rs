//! Settlement and balance types
//!
//! Balances are derived on every read and never persisted. Settlements are
//! append-only records of who paid whom.

use super::expense::{SettlementId, TravellerId, TripId};
use super::money::Money;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Lifecycle state of a settlement record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    /// Proposed by the netter, not yet carried out
    Suggested,

    /// Confirmed real-world payment; counts towards balances
    Paid,
}

/// A directed payment between two travellers of a trip
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub trip: TripId,
    pub id: SettlementId,

    /// Debtor sending the money
    pub from: TravellerId,

    /// Creditor receiving the money
    pub to: TravellerId,

    pub amount: Money,
    pub status: SettlementStatus,
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Transfer proposed by the settlement netter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedSettlement {
    pub from: TravellerId,
    pub to: TravellerId,
    pub amount: Money,
}

impl SuggestedSettlement {
    pub fn new(from: impl Into<TravellerId>, to: impl Into<TravellerId>, amount: Money) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    /// Turn an accepted suggestion into a paid settlement record
    pub fn into_paid(self, trip: TripId, id: SettlementId, at: DateTime<Utc>) -> Settlement {
        Settlement {
            trip,
            id,
            from: self.from,
            to: self.to,
            amount: self.amount,
            status: SettlementStatus::Paid,
            recorded_at: Some(at),
        }
    }
}

/// A traveller's net position across one trip
///
/// `net = paid - owed + sent - received`. Positive means the traveller is owed
/// money, negative means they owe money.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub traveller: TravellerId,

    /// Total of expenses this traveller paid for
    pub paid: Money,

    /// Total of splits charged to this traveller
    pub owed: Money,

    /// Paid settlements sent to other travellers
    pub sent: Money,

    /// Paid settlements received from other travellers
    pub received: Money,

    pub net: Money,
}

impl Balance {
    pub fn new(traveller: impl Into<TravellerId>) -> Self {
        Self {
            traveller: traveller.into(),
            paid: Money::ZERO,
            owed: Money::ZERO,
            sent: Money::ZERO,
            received: Money::ZERO,
            net: Money::ZERO,
        }
    }
}

/// Balances of one trip, ordered by traveller ID
pub type TripBalances = BTreeMap<TravellerId, Balance>;
