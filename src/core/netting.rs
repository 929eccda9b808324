//! Settlement netting
//!
//! Reduces a trip's balances to a short list of directed payments that bring
//! every traveller back to zero.
//!
//! # Strategies
//!
//! - **Greedy**: repeatedly match the largest debtor with the largest creditor
//!   and move `min(debt, credit)` between them. Ties go to the smaller
//!   traveller ID. O(N log N), at most N - 1 payments.
//! - **Optimal**: split the travellers into the largest possible number of
//!   independent zero-sum groups, then settle each group greedily. A group of
//!   k travellers needs k - 1 payments, so this reaches the minimum N - groups.
//!   The search is exponential and is only used up to
//!   [`OPTIMAL_NETTING_LIMIT`] travellers with a non-zero balance.
//!
//! Both strategies are deterministic: the same balances always produce the same
//! payments in the same order.

use crate::core::balance::imbalance;
use crate::types::{Money, SplitError, SuggestedSettlement, TripBalances};
use clap::ValueEnum;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Largest number of non-zero balances the optimal search will handle
pub const OPTIMAL_NETTING_LIMIT: usize = 16;

/// Netting algorithm selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum NettingStrategy {
    /// Largest debtor pays largest creditor until everyone is even
    #[default]
    Greedy,

    /// Minimum number of payments (falls back to greedy for large trips)
    Optimal,
}

/// Travellers with a non-zero balance, in traveller ID order
type Positions = Vec<(String, i64)>;

/// Computes suggested settlements from trip balances
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementNetter {
    strategy: NettingStrategy,
}

impl SettlementNetter {
    pub fn new(strategy: NettingStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> NettingStrategy {
        self.strategy
    }

    /// Produce the payments that zero out `balances`
    ///
    /// Every debtor's outgoing payments add up to its debt, every creditor's
    /// incoming payments add up to its credit, and no payment is zero.
    ///
    /// # Errors
    ///
    /// Returns `SplitError::UnbalancedLedger` if the balances don't sum to
    /// zero; no partial suggestion is produced in that case.
    pub fn net(&self, balances: &TripBalances) -> Result<Vec<SuggestedSettlement>, SplitError> {
        let imbalance = imbalance(balances);
        if imbalance != 0 {
            tracing::error!(imbalance, "refusing to net an unbalanced ledger");
            return Err(SplitError::UnbalancedLedger { imbalance });
        }

        let positions: Positions = balances
            .values()
            .filter(|b| !b.net.is_zero())
            .map(|b| (b.traveller.clone(), b.net.minor_units()))
            .collect();
        let everyone: Vec<usize> = (0..positions.len()).collect();

        let settlements = match self.strategy {
            NettingStrategy::Greedy => settle_group(&positions, &everyone),
            NettingStrategy::Optimal if positions.len() <= OPTIMAL_NETTING_LIMIT => {
                settle_optimal(&positions)
            }
            NettingStrategy::Optimal => {
                tracing::debug!(
                    travellers = positions.len(),
                    limit = OPTIMAL_NETTING_LIMIT,
                    "too many open balances for optimal netting, using greedy"
                );
                settle_group(&positions, &everyone)
            }
        };

        Ok(settlements)
    }
}

/// Greedy matching restricted to `members` (indices into `positions`)
///
/// `members` must sum to zero. Heap keys are `(amount, Reverse(index))`, so the
/// largest amount wins and ties go to the smaller index, i.e. traveller ID.
fn settle_group(positions: &Positions, members: &[usize]) -> Vec<SuggestedSettlement> {
    let mut debtors = BinaryHeap::new();
    let mut creditors = BinaryHeap::new();

    for &index in members {
        let net = positions[index].1;
        if net < 0 {
            debtors.push((net.unsigned_abs(), Reverse(index)));
        } else if net > 0 {
            creditors.push((net.unsigned_abs(), Reverse(index)));
        }
    }

    let mut settlements = Vec::new();
    while let (Some((debt, Reverse(debtor))), Some((credit, Reverse(creditor)))) =
        (debtors.pop(), creditors.pop())
    {
        let amount = debt.min(credit);
        settlements.push(SuggestedSettlement::new(
            positions[debtor].0.clone(),
            positions[creditor].0.clone(),
            // amount <= |i64 balance| <= i64::MAX except for i64::MIN itself
            Money::from_minor(i64::try_from(amount).unwrap_or(i64::MAX)),
        ));

        if debt > amount {
            debtors.push((debt - amount, Reverse(debtor)));
        }
        if credit > amount {
            creditors.push((credit - amount, Reverse(creditor)));
        }
    }

    settlements
}

/// Minimum-payment netting via zero-sum group partitioning
///
/// `groups[mask]` is the largest number of disjoint zero-sum groups the
/// travellers in `mask` can be split into. Walking back from the full mask
/// along the best choices yields an insertion order whose zero-sum prefixes
/// delimit the groups.
fn settle_optimal(positions: &Positions) -> Vec<SuggestedSettlement> {
    let n = positions.len();
    if n == 0 {
        return Vec::new();
    }
    let full: usize = (1 << n) - 1;

    let mut sums = vec![0_i128; full + 1];
    for mask in 1..=full {
        let lowest = mask.trailing_zeros() as usize;
        sums[mask] = sums[mask & (mask - 1)] + i128::from(positions[lowest].1);
    }

    let mut groups = vec![0_u8; full + 1];
    for mask in 1..=full {
        let best = (0..n)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| groups[mask ^ (1 << i)])
            .max()
            .unwrap_or(0);
        groups[mask] = best + u8::from(sums[mask] == 0);
    }

    let mut removal_order = Vec::with_capacity(n);
    let mut mask = full;
    while mask != 0 {
        let mut pick = None;
        for i in (0..n).filter(|i| mask & (1 << i) != 0) {
            let candidate = groups[mask ^ (1 << i)];
            match pick {
                Some((_, best)) if candidate <= best => {}
                _ => pick = Some((i, candidate)),
            }
        }
        let Some((index, _)) = pick else { break };
        removal_order.push(index);
        mask ^= 1 << index;
    }

    let mut partition: Vec<Vec<usize>> = Vec::new();
    let mut current = Vec::new();
    let mut prefix = 0_usize;
    for &index in removal_order.iter().rev() {
        current.push(index);
        prefix |= 1 << index;
        if sums[prefix] == 0 {
            current.sort_unstable();
            partition.push(std::mem::take(&mut current));
        }
    }
    partition.sort();

    tracing::debug!(
        travellers = n,
        groups = partition.len(),
        "partitioned balances into zero-sum groups"
    );

    partition
        .iter()
        .flat_map(|group| settle_group(positions, group))
        .collect()
}
