//! Processing strategy module for journal replay
//!
//! This module defines the Strategy pattern for complete journal processing
//! pipelines, covering CSV parsing, ledger updates and report output. This
//! allows different implementations (synchronous, asynchronous batch) to be
//! selected at runtime.

use crate::cli::{ReportKind, StrategyType};
use crate::core::{NettingStrategy, TripLedger, TripStore};
use crate::io::{write_balances_csv, write_settlements_csv};
use iso_currency::Currency;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// What to print once the journal has been replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    pub report: ReportKind,
    pub netting: NettingStrategy,

    /// Trip currency; journal amounts are read and printed in it
    pub currency: Currency,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report: ReportKind::Settlements,
            netting: NettingStrategy::Greedy,
            currency: Currency::USD,
        }
    }
}

/// Processing strategy trait for complete journal pipelines
///
/// Each strategy reads journal records from a CSV file, applies them to a
/// trip ledger and writes the configured report to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the journal at `input_path` and write the report to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(())` if processing completed (rejected records don't count as
    ///   failures)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error,
    ///   output not writable)
    ///
    /// Individual record errors are logged and skipped; processing continues
    /// with the next record.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - Sync or Async
/// * `report` - Report kind, netting algorithm and currency
/// * `config` - Optional batch configuration (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    report: ReportConfig,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(report)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, report))
        }
    }
}

/// Write the configured report for every trip in the ledger
///
/// Trips are visited in ascending ID order. A trip whose balances fail to
/// aggregate or net is logged at error level and left out of the report.
pub(crate) fn write_report<S: TripStore>(
    ledger: &TripLedger<S>,
    config: &ReportConfig,
    output: &mut dyn Write,
) -> Result<(), String> {
    let trips = ledger.trips();

    match config.report {
        ReportKind::Balances => {
            let report: Vec<_> = trips
                .into_iter()
                .filter_map(|trip| match ledger.get_trip_balances(trip) {
                    Ok(balances) => Some((trip, balances)),
                    Err(e) => {
                        tracing::error!(trip, error = %e, "omitting trip from balance report");
                        None
                    }
                })
                .collect();
            write_balances_csv(&report, config.currency, output)
        }
        ReportKind::Settlements => {
            let report: Vec<_> = trips
                .into_iter()
                .filter_map(|trip| match ledger.suggest_settlements(trip) {
                    Ok(settlements) => Some((trip, settlements)),
                    Err(e) => {
                        tracing::error!(trip, error = %e, "omitting trip from settlement report");
                        None
                    }
                })
                .collect();
            write_settlements_csv(&report, config.currency, output)
        }
    }
}
