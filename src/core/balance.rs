//! Balance aggregation
//!
//! Rolls a trip's expenses, splits and paid settlements up into one signed
//! balance per traveller. Balances are derived on every call; nothing here is
//! cached or persisted.
//!
//! A trip is a closed system: every minor unit credited to a payer is debited
//! from some split, and every settlement moves money between two travellers.
//! The aggregated balances therefore sum to exactly zero, and anything else is
//! reported as `SplitError::UnbalancedLedger`.

use crate::types::{
    Balance, Expense, ExpenseSplit, Money, Settlement, SettlementStatus, SplitError, TripBalances,
};

/// Stateless balance aggregator
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Aggregate per-traveller balances for one trip
    ///
    /// - each expense credits its payer with the full amount
    /// - each split debits its traveller with the split amount
    /// - each **paid** settlement credits the sender and debits the recipient;
    ///   suggested settlements are ignored
    ///
    /// # Errors
    ///
    /// - `UnbalancedLedger` if the balances don't sum to zero (e.g. a split was
    ///   deleted without recomputing the expense)
    /// - `ArithmeticOverflow` if a running total leaves the i64 range
    pub fn aggregate(
        &self,
        expenses: &[Expense],
        splits: &[ExpenseSplit],
        settlements: &[Settlement],
    ) -> Result<TripBalances, SplitError> {
        let mut balances = TripBalances::new();

        for expense in expenses {
            let balance = entry(&mut balances, &expense.payer);
            balance.paid = add(balance.paid, expense.amount)?;
            balance.net = add(balance.net, expense.amount)?;
        }

        for split in splits {
            let balance = entry(&mut balances, &split.traveller);
            balance.owed = add(balance.owed, split.amount)?;
            balance.net = sub(balance.net, split.amount)?;
        }

        for settlement in settlements
            .iter()
            .filter(|s| s.status == SettlementStatus::Paid)
        {
            let sender = entry(&mut balances, &settlement.from);
            sender.sent = add(sender.sent, settlement.amount)?;
            sender.net = add(sender.net, settlement.amount)?;

            let recipient = entry(&mut balances, &settlement.to);
            recipient.received = add(recipient.received, settlement.amount)?;
            recipient.net = sub(recipient.net, settlement.amount)?;
        }

        let imbalance = imbalance(&balances);
        if imbalance != 0 {
            tracing::error!(
                imbalance,
                travellers = balances.len(),
                "trip balances do not sum to zero"
            );
            return Err(SplitError::UnbalancedLedger { imbalance });
        }

        Ok(balances)
    }
}

/// Sum of all net balances, in i128 so the check itself can't overflow
pub fn imbalance(balances: &TripBalances) -> i128 {
    balances
        .values()
        .map(|b| i128::from(b.net.minor_units()))
        .sum()
}

fn entry<'a>(balances: &'a mut TripBalances, traveller: &str) -> &'a mut Balance {
    balances
        .entry(traveller.to_string())
        .or_insert_with(|| Balance::new(traveller))
}

fn add(a: Money, b: Money) -> Result<Money, SplitError> {
    a.checked_add(b)
        .ok_or_else(|| SplitError::arithmetic_overflow("balance aggregation"))
}

fn sub(a: Money, b: Money) -> Result<Money, SplitError> {
    a.checked_sub(b)
        .ok_or_else(|| SplitError::arithmetic_overflow("balance aggregation"))
}
