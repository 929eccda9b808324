//! Split calculation
//!
//! Turns an expense into one `ExpenseSplit` per participant. The calculator is
//! a pure function of the expense: no I/O, no stored state, and the same
//! expense always produces bit-identical splits.
//!
//! # Rounding
//!
//! Every method works on integer minor units. Proportional methods (EQUAL,
//! PERCENTAGE, SHARES) floor each participant's share and hand the whole
//! remainder to the first participant in lexicographic traveller order, so
//! the split amounts always add up to the expense amount exactly.

use crate::types::{Expense, ExpenseSplit, Money, ParticipantShare, SplitError, SplitMethod};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Allowed distance of a percentage total from 100
const PERCENTAGE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Finest percentage accepted, in decimal places
pub const MAX_PERCENTAGE_SCALE: u32 = 10;

/// Stateless split calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitCalculator;

impl SplitCalculator {
    /// Compute the per-traveller splits of an expense
    ///
    /// Splits are returned in lexicographic traveller order. PAID_BY ignores
    /// the participant list and returns the payer's split alone.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the expense amount is negative, an EXACT value is
    ///   negative or not representable in the currency, or a PERCENTAGE is
    ///   negative or has more than `MAX_PERCENTAGE_SCALE` decimal places
    /// - `NoParticipants` if the participant list is empty
    /// - `DuplicateParticipant` if a traveller is listed twice
    /// - `MissingSplitValue` if EXACT/PERCENTAGE/SHARES lack a value
    /// - `SplitMismatch` if EXACT amounts or PERCENTAGE values don't reconcile
    /// - `InvalidShareCount` for zero, negative or fractional shares
    pub fn compute_splits(&self, expense: &Expense) -> Result<Vec<ExpenseSplit>, SplitError> {
        if expense.amount.is_negative() {
            return Err(SplitError::invalid_amount(
                expense.amount.to_decimal(expense.currency),
                "expense amount must not be negative",
            ));
        }

        match expense.method {
            SplitMethod::PaidBy => Ok(vec![ExpenseSplit::unpaid(
                expense.trip,
                expense.id,
                expense.payer.clone(),
                expense.amount,
            )]),
            SplitMethod::Equal => split_equal(expense, &ordered_participants(expense)?),
            SplitMethod::Exact => split_exact(expense, &ordered_participants(expense)?),
            SplitMethod::Percentage => split_percentage(expense, &ordered_participants(expense)?),
            SplitMethod::Shares => split_shares(expense, &ordered_participants(expense)?),
        }
    }
}

/// Sort participants by traveller ID and reject empty or repeated lists
fn ordered_participants(expense: &Expense) -> Result<Vec<&ParticipantShare>, SplitError> {
    if expense.participants.is_empty() {
        return Err(SplitError::NoParticipants {
            expense: expense.id,
        });
    }

    let mut ordered: Vec<&ParticipantShare> = expense.participants.iter().collect();
    ordered.sort_by(|a, b| a.traveller.cmp(&b.traveller));

    if let Some(pair) = ordered
        .windows(2)
        .find(|pair| pair[0].traveller == pair[1].traveller)
    {
        return Err(SplitError::duplicate_participant(
            expense.id,
            &pair[0].traveller,
        ));
    }

    Ok(ordered)
}

fn required_value(expense: &Expense, participant: &ParticipantShare) -> Result<Decimal, SplitError> {
    participant.value.ok_or_else(|| {
        SplitError::missing_split_value(expense.id, &participant.traveller, expense.method)
    })
}

/// Distribute `amount` proportionally to integer weights
///
/// Each share is `floor(amount * weight / total)`; the remainder goes to the
/// first entry.
fn distribute(amount: Money, weights: &[i128]) -> Result<Vec<Money>, SplitError> {
    let total: i128 = weights.iter().sum();
    let amount = i128::from(amount.minor_units());

    let mut shares = Vec::with_capacity(weights.len());
    for weight in weights {
        let scaled = amount
            .checked_mul(*weight)
            .ok_or_else(|| SplitError::arithmetic_overflow("split distribution"))?;
        shares.push(scaled / total);
    }

    let remainder = amount - shares.iter().sum::<i128>();
    if let Some(first) = shares.first_mut() {
        *first += remainder;
    }

    shares
        .into_iter()
        .map(|share| {
            i64::try_from(share)
                .map(Money::from_minor)
                .map_err(|_| SplitError::arithmetic_overflow("split distribution"))
        })
        .collect()
}

fn split_equal(
    expense: &Expense,
    participants: &[&ParticipantShare],
) -> Result<Vec<ExpenseSplit>, SplitError> {
    let amounts = distribute(expense.amount, &vec![1_i128; participants.len()])?;

    Ok(participants
        .iter()
        .zip(amounts)
        .map(|(p, amount)| ExpenseSplit::unpaid(expense.trip, expense.id, p.traveller.clone(), amount))
        .collect())
}

fn split_exact(
    expense: &Expense,
    participants: &[&ParticipantShare],
) -> Result<Vec<ExpenseSplit>, SplitError> {
    let mut splits = Vec::with_capacity(participants.len());
    let mut total = Money::ZERO;

    for participant in participants {
        let value = required_value(expense, participant)?;
        let amount = Money::from_decimal(value, expense.currency)?;
        if amount.is_negative() {
            return Err(SplitError::invalid_amount(
                value,
                "exact split amounts must not be negative",
            ));
        }

        total = total
            .checked_add(amount)
            .ok_or_else(|| SplitError::arithmetic_overflow("exact split total"))?;
        splits.push(ExpenseSplit::unpaid(
            expense.trip,
            expense.id,
            participant.traveller.clone(),
            amount,
        ));
    }

    if total != expense.amount {
        return Err(SplitError::split_mismatch(
            expense.id,
            &format!(
                "exact splits sum to {}, expected {}",
                total.to_decimal(expense.currency),
                expense.amount.to_decimal(expense.currency)
            ),
        ));
    }

    Ok(splits)
}

fn split_percentage(
    expense: &Expense,
    participants: &[&ParticipantShare],
) -> Result<Vec<ExpenseSplit>, SplitError> {
    let mut percentages = Vec::with_capacity(participants.len());
    for participant in participants {
        let value = required_value(expense, participant)?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(SplitError::invalid_amount(
                value,
                "percentages must not be negative",
            ));
        }
        if value.normalize().scale() > MAX_PERCENTAGE_SCALE {
            return Err(SplitError::invalid_amount(
                value,
                "percentages allow at most 10 decimal places",
            ));
        }
        percentages.push(value);
    }

    let total = percentages
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))
        .ok_or_else(|| SplitError::arithmetic_overflow("percentage total"))?;

    if (total - Decimal::ONE_HUNDRED).abs() > PERCENTAGE_EPSILON {
        return Err(SplitError::split_mismatch(
            expense.id,
            &format!("percentages sum to {}, expected 100", total),
        ));
    }

    // Bring every percentage to a common scale so they become integer weights.
    let scale = percentages
        .iter()
        .map(|p| p.normalize().scale())
        .max()
        .unwrap_or(0);
    let mut weights: Vec<i128> = Vec::with_capacity(percentages.len());
    for percentage in &percentages {
        let mut rescaled = percentage.normalize();
        rescaled.rescale(scale);
        if rescaled.scale() != scale {
            return Err(SplitError::invalid_amount(
                percentage,
                "percentage cannot be represented at a common scale",
            ));
        }
        weights.push(rescaled.mantissa());
    }

    let amounts = distribute(expense.amount, &weights)?;

    Ok(participants
        .iter()
        .zip(percentages)
        .zip(amounts)
        .map(|((p, percentage), amount)| {
            let mut split =
                ExpenseSplit::unpaid(expense.trip, expense.id, p.traveller.clone(), amount);
            split.percentage = Some(percentage);
            split
        })
        .collect())
}

fn split_shares(
    expense: &Expense,
    participants: &[&ParticipantShare],
) -> Result<Vec<ExpenseSplit>, SplitError> {
    let mut counts = Vec::with_capacity(participants.len());
    for participant in participants {
        let value = required_value(expense, participant)?;
        let count = value
            .fract()
            .is_zero()
            .then(|| value.to_u32())
            .flatten()
            .filter(|count| *count > 0)
            .ok_or_else(|| {
                SplitError::invalid_share_count(expense.id, &participant.traveller, value)
            })?;
        counts.push(count);
    }

    let weights: Vec<i128> = counts.iter().map(|c| i128::from(*c)).collect();
    let amounts = distribute(expense.amount, &weights)?;

    Ok(participants
        .iter()
        .zip(counts)
        .zip(amounts)
        .map(|((p, count), amount)| {
            let mut split =
                ExpenseSplit::unpaid(expense.trip, expense.id, p.traveller.clone(), amount);
            split.shares = Some(count);
            split
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_currency::Currency;
    use rstest::rstest;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn expense(amount: i64, method: SplitMethod, participants: Vec<ParticipantShare>) -> Expense {
        Expense {
            trip: 1,
            id: 1,
            payer: "alice".to_string(),
            amount: Money::from_minor(amount),
            currency: Currency::USD,
            method,
            participants,
        }
    }

    fn plain(names: &[&str]) -> Vec<ParticipantShare> {
        names.iter().map(|n| ParticipantShare::new(*n)).collect()
    }

    fn valued(entries: &[(&str, &str)]) -> Vec<ParticipantShare> {
        entries
            .iter()
            .map(|(n, v)| ParticipantShare::with_value(*n, dec(v)))
            .collect()
    }

    fn amounts(splits: &[ExpenseSplit]) -> Vec<(String, i64)> {
        splits
            .iter()
            .map(|s| (s.traveller.clone(), s.amount.minor_units()))
            .collect()
    }

    #[rstest]
    #[case::three_way_remainder(10000, &["alice", "bob", "carol"], &[3334, 3333, 3333])]
    #[case::even(9000, &["alice", "bob", "carol"], &[3000, 3000, 3000])]
    #[case::whole_remainder_to_first(11, &["a", "b", "c", "d"], &[5, 2, 2, 2])]
    #[case::single(4321, &["solo"], &[4321])]
    #[case::smaller_than_participants(2, &["a", "b", "c"], &[2, 0, 0])]
    #[case::zero_amount(0, &["a", "b"], &[0, 0])]
    fn test_equal_split(#[case] amount: i64, #[case] names: &[&str], #[case] expected: &[i64]) {
        let splits = SplitCalculator
            .compute_splits(&expense(amount, SplitMethod::Equal, plain(names)))
            .unwrap();

        let got: Vec<i64> = splits.iter().map(|s| s.amount.minor_units()).collect();
        assert_eq!(got, expected);
        assert_eq!(got.iter().sum::<i64>(), amount);
    }

    #[test]
    fn test_equal_split_orders_participants_by_id() {
        let splits = SplitCalculator
            .compute_splits(&expense(10000, SplitMethod::Equal, plain(&["carol", "alice", "bob"])))
            .unwrap();

        assert_eq!(
            amounts(&splits),
            vec![
                ("alice".to_string(), 3334),
                ("bob".to_string(), 3333),
                ("carol".to_string(), 3333)
            ]
        );
    }

    #[test]
    fn test_exact_split_accepts_reconciling_amounts() {
        let splits = SplitCalculator
            .compute_splits(&expense(
                10000,
                SplitMethod::Exact,
                valued(&[("bob", "60.00"), ("alice", "40")]),
            ))
            .unwrap();

        assert_eq!(
            amounts(&splits),
            vec![("alice".to_string(), 4000), ("bob".to_string(), 6000)]
        );
    }

    #[test]
    fn test_exact_split_rejects_sum_mismatch() {
        let result = SplitCalculator.compute_splits(&expense(
            10000,
            SplitMethod::Exact,
            valued(&[("alice", "50.00"), ("bob", "49.99")]),
        ));

        assert_eq!(
            result.unwrap_err(),
            SplitError::split_mismatch(1, "exact splits sum to 99.99, expected 100.00")
        );
    }

    #[rstest]
    #[case::negative(&[("alice", "-10.00"), ("bob", "110.00")])]
    #[case::sub_cent(&[("alice", "50.005"), ("bob", "49.995")])]
    fn test_exact_split_rejects_invalid_amounts(#[case] entries: &[(&str, &str)]) {
        let result =
            SplitCalculator.compute_splits(&expense(10000, SplitMethod::Exact, valued(entries)));
        assert!(matches!(result, Err(SplitError::InvalidAmount { .. })));
    }

    #[rstest]
    #[case::thirds(&[("a", "33.33"), ("b", "33.33"), ("c", "33.34")], &[3333, 3333, 3334])]
    #[case::halves(&[("a", "50"), ("b", "50")], &[5000, 5000])]
    #[case::within_epsilon(&[("a", "33.33"), ("b", "33.33"), ("c", "33.33")], &[3334, 3333, 3333])]
    #[case::zero_percent(&[("a", "100"), ("b", "0")], &[10000, 0])]
    #[case::finest_scale(&[("a", "7.5"), ("b", "0.0000000001"), ("c", "92.4999999999")], &[751, 0, 9249])]
    #[case::trailing_zeros(&[("a", "50.000000000000"), ("b", "50")], &[5000, 5000])]
    fn test_percentage_split(#[case] entries: &[(&str, &str)], #[case] expected: &[i64]) {
        let splits = SplitCalculator
            .compute_splits(&expense(10000, SplitMethod::Percentage, valued(entries)))
            .unwrap();

        let got: Vec<i64> = splits.iter().map(|s| s.amount.minor_units()).collect();
        assert_eq!(got, expected);
        assert_eq!(got.iter().sum::<i64>(), 10000);
        assert!(splits.iter().all(|s| s.percentage.is_some()));
    }

    #[rstest]
    #[case::under(&[("a", "50"), ("b", "49.9")])]
    #[case::over(&[("a", "50"), ("b", "50.02")])]
    fn test_percentage_split_rejects_mismatch(#[case] entries: &[(&str, &str)]) {
        let result = SplitCalculator.compute_splits(&expense(
            10000,
            SplitMethod::Percentage,
            valued(entries),
        ));
        assert!(matches!(result, Err(SplitError::SplitMismatch { .. })));
    }

    #[rstest]
    #[case::negative(&[("a", "110"), ("b", "-10")])]
    #[case::beyond_decimal_precision(&[("a", "7"), ("b", "0.0000000000000000000000000001"), ("c", "92.99")])]
    #[case::eleven_places(&[("a", "50.00000000001"), ("b", "49.99999999999")])]
    fn test_percentage_split_rejects_invalid_values(#[case] entries: &[(&str, &str)]) {
        let result = SplitCalculator.compute_splits(&expense(
            10000,
            SplitMethod::Percentage,
            valued(entries),
        ));
        assert!(matches!(result, Err(SplitError::InvalidAmount { .. })));
    }

    #[test]
    fn test_shares_split_distributes_remainder_to_first() {
        let splits = SplitCalculator
            .compute_splits(&expense(
                10000,
                SplitMethod::Shares,
                valued(&[("alice", "1"), ("bob", "2")]),
            ))
            .unwrap();

        assert_eq!(
            amounts(&splits),
            vec![("alice".to_string(), 3334), ("bob".to_string(), 6666)]
        );
        assert_eq!(splits[1].shares, Some(2));
    }

    #[rstest]
    #[case::zero("0")]
    #[case::negative("-1")]
    #[case::fractional("1.5")]
    #[case::too_large("5000000000")]
    fn test_shares_split_rejects_invalid_counts(#[case] shares: &str) {
        let result = SplitCalculator.compute_splits(&expense(
            10000,
            SplitMethod::Shares,
            valued(&[("alice", "1"), ("bob", shares)]),
        ));
        assert_eq!(
            result.unwrap_err(),
            SplitError::invalid_share_count(1, "bob", dec(shares))
        );
    }

    #[test]
    fn test_paid_by_charges_payer_only() {
        let splits = SplitCalculator
            .compute_splits(&expense(12345, SplitMethod::PaidBy, plain(&["bob", "carol"])))
            .unwrap();

        assert_eq!(amounts(&splits), vec![("alice".to_string(), 12345)]);
    }

    #[test]
    fn test_paid_by_needs_no_participants() {
        let splits = SplitCalculator
            .compute_splits(&expense(500, SplitMethod::PaidBy, vec![]))
            .unwrap();
        assert_eq!(splits.len(), 1);
    }

    #[rstest]
    #[case::equal(SplitMethod::Equal)]
    #[case::exact(SplitMethod::Exact)]
    #[case::percentage(SplitMethod::Percentage)]
    #[case::shares(SplitMethod::Shares)]
    fn test_empty_participants_rejected(#[case] method: SplitMethod) {
        let result = SplitCalculator.compute_splits(&expense(100, method, vec![]));
        assert_eq!(result.unwrap_err(), SplitError::NoParticipants { expense: 1 });
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result =
            SplitCalculator.compute_splits(&expense(-100, SplitMethod::Equal, plain(&["a"])));
        assert!(matches!(result, Err(SplitError::InvalidAmount { .. })));
    }

    #[test]
    fn test_duplicate_participant_rejected() {
        let result = SplitCalculator.compute_splits(&expense(
            100,
            SplitMethod::Equal,
            plain(&["bob", "alice", "bob"]),
        ));
        assert_eq!(
            result.unwrap_err(),
            SplitError::duplicate_participant(1, "bob")
        );
    }

    #[rstest]
    #[case::exact(SplitMethod::Exact)]
    #[case::percentage(SplitMethod::Percentage)]
    #[case::shares(SplitMethod::Shares)]
    fn test_missing_value_rejected(#[case] method: SplitMethod) {
        let participants = vec![
            ParticipantShare::with_value("alice", dec("1")),
            ParticipantShare::new("bob"),
        ];
        let result = SplitCalculator.compute_splits(&expense(100, method, participants));
        assert_eq!(
            result.unwrap_err(),
            SplitError::missing_split_value(1, "bob", method)
        );
    }

    #[test]
    fn test_recomputation_is_identical() {
        let e = expense(
            99999,
            SplitMethod::Shares,
            valued(&[("x", "3"), ("y", "7"), ("z", "11")]),
        );
        let first = SplitCalculator.compute_splits(&e).unwrap();
        let second = SplitCalculator.compute_splits(&e).unwrap();
        assert_eq!(first, second);
    }
}
