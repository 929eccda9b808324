//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. It orchestrates journal replay by coordinating
//! between the SyncReader (for CSV input) and a TripLedger over an
//! InMemoryTripStore (for business logic).
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Ledger rules to `TripLedger`
//! - CSV output to `write_report` (format handling)
//!
//! Records are streamed one at a time; memory grows with the recorded trips,
//! not with the journal file.

use crate::core::{InMemoryTripStore, TripLedger};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{write_report, ProcessingStrategy, ReportConfig};
use std::io::Write;
use std::path::Path;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use trip_settle::strategy::{ProcessingStrategy, ReportConfig, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(ReportConfig::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("journal.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProcessingStrategy {
    report: ReportConfig,
}

impl SyncProcessingStrategy {
    pub fn new(report: ReportConfig) -> Self {
        Self { report }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Replay the journal and write the report
    ///
    /// 1. Creates a SyncReader to stream records from the CSV file
    /// 2. Creates a TripLedger over a fresh InMemoryTripStore
    /// 3. Applies each record, logging and skipping failures
    /// 4. Writes the configured report
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let mut ledger = TripLedger::new(InMemoryTripStore::new(), self.report.currency)
            .with_netting(self.report.netting);

        let reader = SyncReader::new(input_path, self.report.currency)?;

        for result in reader {
            match result {
                Ok(record) => {
                    let (trip, kind) = (record.trip(), record.kind());
                    if let Err(e) = ledger.apply(record) {
                        tracing::warn!(trip, kind, error = %e, "journal record rejected");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping journal row");
                }
            }
        }

        write_report(&ledger, &self.report, output)
    }
}
