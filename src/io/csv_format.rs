//! CSV format handling for trip journals and reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for journal deserialization
//! - Conversion from CSV records to `JournalRecord`s
//! - Balance and settlement report serialization
//!
//! All functions are pure (no file I/O) for easy testing.
//!
//! # Journal columns
//!
//! `type,trip,id,traveller,counterparty,amount,method,participants`
//!
//! Participants are `;`-separated traveller IDs, each optionally followed by
//! `=value` (exact amount, percentage or share count depending on the method):
//! `ana;ben;cy` or `ana=60;ben=40`.

use crate::types::{
    Expense, JournalRecord, Money, ParticipantShare, SplitError, SplitMethod, SuggestedSettlement,
    TripBalances, TripId,
};
use iso_currency::Currency;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Only `type`, `trip` and `id` are always present; the other columns depend
/// on the record type and may be empty.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub trip: TripId,
    pub id: u32,
    pub traveller: Option<String>,
    pub counterparty: Option<String>,
    pub amount: Option<String>,
    pub method: Option<String>,
    pub participants: Option<String>,
}

/// Convert a CsvRecord to a JournalRecord
///
/// - `expense` / `amend`: `traveller` is the payer; `amount` is required;
///   `method` defaults to equal when blank
/// - `paid`: `id` is the expense and `traveller` the paying participant
/// - `settlement`: `id` is the settlement, `traveller` pays `counterparty`
///
/// Amounts are converted to minor units of `currency`.
///
/// # Errors
///
/// `ParseError` for unknown types, missing columns and malformed numbers;
/// `InvalidAmount` for amounts finer than the currency's minor unit.
pub fn convert_csv_record(
    csv_record: CsvRecord,
    currency: Currency,
) -> Result<JournalRecord, SplitError> {
    let record_type = csv_record.record_type.trim().to_lowercase();

    match record_type.as_str() {
        "expense" => Ok(JournalRecord::Expense(expense_from(&csv_record, currency)?)),
        "amend" => Ok(JournalRecord::Amend(expense_from(&csv_record, currency)?)),
        "paid" => Ok(JournalRecord::Paid {
            trip: csv_record.trip,
            expense: csv_record.id,
            traveller: required(&csv_record.traveller, "traveller", &csv_record)?,
        }),
        "settlement" => {
            let from = required(&csv_record.traveller, "traveller", &csv_record)?;
            let to = required(&csv_record.counterparty, "counterparty", &csv_record)?;
            let amount = amount_from(&csv_record, currency)?;
            Ok(JournalRecord::Settlement {
                trip: csv_record.trip,
                id: csv_record.id,
                transfer: SuggestedSettlement::new(from, to, amount),
            })
        }
        _ => Err(parse_error(format!(
            "Invalid record type: '{}' for id {}",
            csv_record.record_type, csv_record.id
        ))),
    }
}

fn expense_from(csv_record: &CsvRecord, currency: Currency) -> Result<Expense, SplitError> {
    let payer = required(&csv_record.traveller, "traveller", csv_record)?;
    let amount = amount_from(csv_record, currency)?;

    let method = match present(&csv_record.method) {
        Some(method) => SplitMethod::from_str(method).map_err(parse_error)?,
        None => SplitMethod::Equal,
    };

    let participants = match present(&csv_record.participants) {
        Some(list) => parse_participants(list)?,
        None => Vec::new(),
    };

    Ok(Expense {
        trip: csv_record.trip,
        id: csv_record.id,
        payer,
        amount,
        currency,
        method,
        participants,
    })
}

/// Parse `a;b;c` or `a=v;b=v` into participant shares
///
/// Empty segments (e.g. a trailing `;`) are ignored.
pub fn parse_participants(list: &str) -> Result<Vec<ParticipantShare>, SplitError> {
    list.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((traveller, value)) => {
                let traveller = traveller.trim();
                if traveller.is_empty() {
                    return Err(parse_error(format!("Participant '{}' has no traveller", entry)));
                }
                let value = Decimal::from_str(value.trim()).map_err(|_| {
                    parse_error(format!("Invalid value '{}' for {}", value.trim(), traveller))
                })?;
                Ok(ParticipantShare::with_value(traveller, value))
            }
            None => Ok(ParticipantShare::new(entry)),
        })
        .collect()
}

fn amount_from(csv_record: &CsvRecord, currency: Currency) -> Result<Money, SplitError> {
    let raw = present(&csv_record.amount).ok_or_else(|| {
        parse_error(format!(
            "{} {} in trip {} requires an amount",
            csv_record.record_type.trim(),
            csv_record.id,
            csv_record.trip
        ))
    })?;

    let decimal = Decimal::from_str(raw).map_err(|_| {
        parse_error(format!("Invalid amount '{}' for id {}", raw, csv_record.id))
    })?;

    Money::from_decimal(decimal, currency)
}

fn required(field: &Option<String>, name: &str, csv_record: &CsvRecord) -> Result<String, SplitError> {
    present(field).map(str::to_string).ok_or_else(|| {
        parse_error(format!(
            "{} {} in trip {} requires a {}",
            csv_record.record_type.trim(),
            csv_record.id,
            csv_record.trip,
            name
        ))
    })
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_error(message: String) -> SplitError {
    SplitError::ParseError {
        line: None,
        message,
    }
}

/// Write per-traveller balances to CSV
///
/// Columns: trip, traveller, paid, owed, sent, received, balance. Rows follow
/// the order of `report` (callers pass trips ascending) and traveller ID
/// within a trip. Amounts carry the currency's decimal places.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_balances_csv(
    report: &[(TripId, TripBalances)],
    currency: Currency,
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["trip", "traveller", "paid", "owed", "sent", "received", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for (trip, balances) in report {
        for balance in balances.values() {
            writer
                .write_record(&[
                    trip.to_string(),
                    balance.traveller.clone(),
                    balance.paid.to_decimal(currency).to_string(),
                    balance.owed.to_decimal(currency).to_string(),
                    balance.sent.to_decimal(currency).to_string(),
                    balance.received.to_decimal(currency).to_string(),
                    balance.net.to_decimal(currency).to_string(),
                ])
                .map_err(|e| format!("Failed to write balance record: {}", e))?;
        }
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write suggested settlements to CSV
///
/// Columns: trip, from, to, amount. Settlements keep the netter's order.
pub fn write_settlements_csv(
    report: &[(TripId, Vec<SuggestedSettlement>)],
    currency: Currency,
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["trip", "from", "to", "amount"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for (trip, settlements) in report {
        for settlement in settlements {
            writer
                .write_record(&[
                    trip.to_string(),
                    settlement.from.clone(),
                    settlement.to.clone(),
                    settlement.amount.to_decimal(currency).to_string(),
                ])
                .map_err(|e| format!("Failed to write settlement record: {}", e))?;
        }
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Balance;
    use rstest::rstest;

    fn record(record_type: &str, amount: Option<&str>) -> CsvRecord {
        CsvRecord {
            record_type: record_type.to_string(),
            trip: 1,
            id: 7,
            traveller: Some("ana".to_string()),
            counterparty: Some("ben".to_string()),
            amount: amount.map(str::to_string),
            method: None,
            participants: Some("ana;ben".to_string()),
        }
    }

    #[rstest]
    #[case::lowercase("expense")]
    #[case::uppercase("EXPENSE")]
    #[case::padded("  Expense ")]
    fn test_convert_expense(#[case] record_type: &str) {
        let result = convert_csv_record(record(record_type, Some("12.50")), Currency::USD).unwrap();

        let expense = match result {
            JournalRecord::Expense(expense) => expense,
            other => panic!("expected an expense, got {:?}", other),
        };
        assert_eq!(expense.trip, 1);
        assert_eq!(expense.id, 7);
        assert_eq!(expense.payer, "ana");
        assert_eq!(expense.amount, Money::from_minor(1250));
        assert_eq!(expense.method, SplitMethod::Equal);
        assert_eq!(
            expense.participants,
            vec![ParticipantShare::new("ana"), ParticipantShare::new("ben")]
        );
    }

    #[test]
    fn test_convert_amend_with_weighted_participants() {
        let mut csv_record = record("amend", Some("90"));
        csv_record.method = Some("shares".to_string());
        csv_record.participants = Some("ana=2; ben = 1;".to_string());

        let result = convert_csv_record(csv_record, Currency::USD).unwrap();

        let expense = match result {
            JournalRecord::Amend(expense) => expense,
            other => panic!("expected an amendment, got {:?}", other),
        };
        assert_eq!(expense.method, SplitMethod::Shares);
        assert_eq!(
            expense.participants,
            vec![
                ParticipantShare::with_value("ana", Decimal::from(2)),
                ParticipantShare::with_value("ben", Decimal::from(1)),
            ]
        );
    }

    #[test]
    fn test_convert_paid() {
        let result = convert_csv_record(record("paid", None), Currency::USD).unwrap();

        assert_eq!(
            result,
            JournalRecord::Paid {
                trip: 1,
                expense: 7,
                traveller: "ana".to_string(),
            }
        );
    }

    #[test]
    fn test_convert_settlement_in_zero_decimal_currency() {
        let result = convert_csv_record(record("settlement", Some("1500")), Currency::JPY).unwrap();

        assert_eq!(
            result,
            JournalRecord::Settlement {
                trip: 1,
                id: 7,
                transfer: SuggestedSettlement::new("ana", "ben", Money::from_minor(1500)),
            }
        );
    }

    #[rstest]
    #[case::invalid_type("refund", Some("1.00"), "Invalid record type")]
    #[case::expense_missing_amount("expense", None, "requires an amount")]
    #[case::blank_amount("settlement", Some("  "), "requires an amount")]
    #[case::bad_amount("expense", Some("ten"), "Invalid amount")]
    fn test_convert_parse_errors(
        #[case] record_type: &str,
        #[case] amount: Option<&str>,
        #[case] expected: &str,
    ) {
        let result = convert_csv_record(record(record_type, amount), Currency::USD);

        let message = match result {
            Err(SplitError::ParseError { message, .. }) => message,
            other => panic!("expected a parse error, got {:?}", other),
        };
        assert!(message.contains(expected), "{}", message);
    }

    #[rstest]
    #[case::missing_counterparty("settlement", "counterparty")]
    #[case::missing_payer("expense", "traveller")]
    fn test_convert_missing_columns(#[case] record_type: &str, #[case] column: &str) {
        let mut csv_record = record(record_type, Some("1.00"));
        if column == "counterparty" {
            csv_record.counterparty = None;
        } else {
            csv_record.traveller = Some(" ".to_string());
        }

        let result = convert_csv_record(csv_record, Currency::USD);

        let message = match result {
            Err(SplitError::ParseError { message, .. }) => message,
            other => panic!("expected a parse error, got {:?}", other),
        };
        assert!(message.ends_with(&format!("requires a {}", column)), "{}", message);
    }

    #[test]
    fn test_convert_rejects_sub_cent_amount() {
        let result = convert_csv_record(record("expense", Some("1.005")), Currency::USD);
        assert!(matches!(result, Err(SplitError::InvalidAmount { .. })));
    }

    #[test]
    fn test_convert_rejects_unknown_method() {
        let mut csv_record = record("expense", Some("1.00"));
        csv_record.method = Some("random".to_string());

        let result = convert_csv_record(csv_record, Currency::USD);

        assert!(matches!(result, Err(SplitError::ParseError { .. })));
    }

    #[rstest]
    #[case::names_only("a;b;c", vec![ParticipantShare::new("a"), ParticipantShare::new("b"), ParticipantShare::new("c")])]
    #[case::decimals("a=33.34;b=66.66", vec![
        ParticipantShare::with_value("a", Decimal::new(3334, 2)),
        ParticipantShare::with_value("b", Decimal::new(6666, 2)),
    ])]
    #[case::empty("", vec![])]
    fn test_parse_participants(#[case] list: &str, #[case] expected: Vec<ParticipantShare>) {
        assert_eq!(parse_participants(list).unwrap(), expected);
    }

    #[rstest]
    #[case::missing_name("=5")]
    #[case::bad_value("a=x")]
    fn test_parse_participants_errors(#[case] list: &str) {
        assert!(matches!(
            parse_participants(list),
            Err(SplitError::ParseError { .. })
        ));
    }

    #[test]
    fn test_write_balances_csv() {
        let mut ana = Balance::new("ana");
        ana.paid = Money::from_minor(30000);
        ana.owed = Money::from_minor(10000);
        ana.net = Money::from_minor(20000);
        let mut ben = Balance::new("ben");
        ben.owed = Money::from_minor(10000);
        ben.net = Money::from_minor(-10000);
        let balances: TripBalances = [ana, ben]
            .into_iter()
            .map(|b| (b.traveller.clone(), b))
            .collect();

        let mut output = Vec::new();
        write_balances_csv(&[(3, balances)], Currency::USD, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "trip,traveller,paid,owed,sent,received,balance\n\
             3,ana,300.00,100.00,0.00,0.00,200.00\n\
             3,ben,0.00,100.00,0.00,0.00,-100.00\n"
        );
    }

    #[rstest]
    #[case::usd(
        Currency::USD,
        "trip,from,to,amount\n1,ben,ana,100.00\n2,cy,ana,0.05\n"
    )]
    #[case::jpy(
        Currency::JPY,
        "trip,from,to,amount\n1,ben,ana,10000\n2,cy,ana,5\n"
    )]
    fn test_write_settlements_csv(#[case] currency: Currency, #[case] expected: &str) {
        let report = vec![
            (1, vec![SuggestedSettlement::new("ben", "ana", Money::from_minor(10000))]),
            (2, vec![SuggestedSettlement::new("cy", "ana", Money::from_minor(5))]),
        ];

        let mut output = Vec::new();
        write_settlements_csv(&report, currency, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }

    #[test]
    fn test_write_empty_reports() {
        let mut output = Vec::new();
        write_settlements_csv(&[], Currency::USD, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "trip,from,to,amount\n");
    }
}
