//! Synchronous journal reader with iterator interface
//!
//! Provides a streaming iterator over journal records from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<JournalRecord, String>` for each CSV row:
//!
//! ```no_run
//! use iso_currency::Currency;
//! use std::path::Path;
//! use trip_settle::io::sync_reader::SyncReader;
//!
//! let reader = SyncReader::new(Path::new("journal.csv"), Currency::EUR).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("Applying {:?}", record),
//!         Err(e) => eprintln!("Skipping: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as Err variants carrying the line number
//!
//! Rows are read one at a time; the file is never loaded whole.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{JournalRecord, SplitError};
use csv::{ReaderBuilder, Trim};
use iso_currency::Currency;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Synchronous journal reader
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    currency: Currency,
    line_num: usize,
}

impl SyncReader {
    /// Open a journal for streaming iteration
    ///
    /// The CSV reader trims whitespace from all fields and accepts rows with
    /// fewer columns than the header (trailing optional columns).
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the journal CSV
    /// * `currency` - Trip currency used to convert amounts to minor units
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if the file opened successfully
    /// * `Err(String)` if it could not be opened
    pub fn new(path: &Path, currency: Currency) -> Result<Self, String> {
        let file = File::open(path).map_err(|e| open_error(path, e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            currency,
            line_num: 1,
        })
    }
}

pub(crate) fn open_error(path: &Path, error: std::io::Error) -> String {
    let error = match error.kind() {
        ErrorKind::NotFound => SplitError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => SplitError::from(error),
    };
    format!("Failed to open journal '{}': {}", path.display(), error)
}

impl Iterator for SyncReader {
    type Item = Result<JournalRecord, String>;

    /// Read, deserialize and convert the next row
    ///
    /// # Returns
    ///
    /// * `Some(Ok(JournalRecord))` - Successfully parsed record
    /// * `Some(Err(String))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        let result = row
            .map_err(SplitError::from)
            .and_then(|csv_record| convert_csv_record(csv_record, self.currency));

        Some(result.map_err(|e| format!("Line {}: {}", self.line_num, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Money, SplitMethod};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "type,trip,id,traveller,counterparty,amount,method,participants\n";

    /// Helper function to create a temporary journal for testing
    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(HEADER.as_bytes())
            .expect("Failed to write to temp file");
        file.write_all(rows.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn read_all(rows: &str) -> Vec<Result<JournalRecord, String>> {
        let file = create_temp_csv(rows);
        SyncReader::new(file.path(), Currency::USD).unwrap().collect()
    }

    #[test]
    fn test_sync_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"), Currency::USD);

        let error = result.unwrap_err();
        assert!(error.contains("Failed to open journal"));
        assert!(error.contains("File not found"));
    }

    #[test]
    fn test_sync_reader_iterates_every_record_type() {
        let records = read_all(
            "expense,1,1,ana,,90.00,equal,ana;ben;cy\n\
             amend,1,1,ana,,60.00,percentage,ana=50;ben=50\n\
             paid,1,1,ben,,,,\n\
             settlement,1,1,cy,ana,30.00,,\n",
        );

        let kinds: Vec<_> = records
            .iter()
            .map(|r| r.as_ref().unwrap().kind())
            .collect();
        assert_eq!(kinds, vec!["expense", "amend", "paid", "settlement"]);

        match records[1].as_ref().unwrap() {
            JournalRecord::Amend(expense) => {
                assert_eq!(expense.method, SplitMethod::Percentage);
                assert_eq!(expense.amount, Money::from_minor(6000));
            }
            other => panic!("expected an amendment, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_reader_accepts_short_rows() {
        let records = read_all("paid,2,5,ben\n");

        assert_eq!(
            records[0],
            Ok(JournalRecord::Paid {
                trip: 2,
                expense: 5,
                traveller: "ben".to_string(),
            })
        );
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let records = read_all(
            "expense,1,1,ana,,10.00,,ana\n\
             expense,1,2,ana,,ten,,ana\n\
             expense,x,3,ana,,10.00,,ana\n\
             expense,1,4,ana,,10.00,,ana\n",
        );

        assert_eq!(records.len(), 4);
        assert!(records[0].is_ok());
        let error = records[1].as_ref().unwrap_err();
        assert!(error.starts_with("Line 3:"), "{}", error);
        assert!(error.contains("Invalid amount"));
        assert!(records[2].as_ref().unwrap_err().starts_with("Line 4:"));
        assert!(records[3].is_ok());
    }

    #[test]
    fn test_sync_reader_handles_whitespace_and_case() {
        let records = read_all("  EXPENSE , 1 , 9 ,  ana , , 5.5 , Shares , ana=1;ben=2 \n");

        match records[0].as_ref().unwrap() {
            JournalRecord::Expense(expense) => {
                assert_eq!(expense.id, 9);
                assert_eq!(expense.amount, Money::from_minor(550));
                assert_eq!(expense.method, SplitMethod::Shares);
                assert_eq!(expense.participants.len(), 2);
            }
            other => panic!("expected an expense, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_reader_handles_empty_journal() {
        assert!(read_all("").is_empty());
    }
}
