//! Asynchronous journal reader with batch interface
//!
//! Provides batch reading over journal records for the async strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of JournalRecords
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{JournalRecord, SplitError};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use iso_currency::Currency;

/// Asynchronous journal reader
///
/// Reads rows lazily; at most one batch is held in memory.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    currency: Currency,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async byte source
    ///
    /// # Arguments
    ///
    /// * `reader` - Async reader providing CSV data
    /// * `currency` - Trip currency used to convert amounts to minor units
    pub fn new(reader: R, currency: Currency) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            currency,
        }
    }

    /// Read a batch of journal records
    ///
    /// Reads up to `batch_size` rows. Rows that fail to parse or convert are
    /// logged at warn level and skipped, so a batch may be shorter than
    /// `batch_size` even before the end of the file.
    ///
    /// # Returns
    ///
    /// * `Some(records)` - the converted records in journal order (possibly
    ///   empty if every row in the batch was rejected)
    /// * `None` - the end of the file was reached before any row was read
    pub async fn read_batch(&mut self, batch_size: usize) -> Option<Vec<JournalRecord>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows_read = 0;
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while rows_read < batch_size {
            let Some(row) = records.next().await else {
                break;
            };
            rows_read += 1;

            let converted = match row {
                Ok(csv_record) => convert_csv_record(csv_record, self.currency),
                Err(e) => Err(SplitError::ParseError {
                    line: None,
                    message: e.to_string(),
                }),
            };

            match converted {
                Ok(record) => batch.push(record),
                Err(e) => tracing::warn!(error = %e, "skipping journal row"),
            }
        }

        (rows_read > 0).then_some(batch)
    }
}
