use crate::core::NettingStrategy;
use crate::strategy::{BatchConfig, ReportConfig};
use clap::{Parser, ValueEnum};
use iso_currency::Currency;
use std::path::PathBuf;

/// Split trip expenses and suggest the payments that settle them
#[derive(Parser, Debug)]
#[command(name = "trip-settle")]
#[command(about = "Split trip expenses and suggest the payments that settle them", long_about = None)]
pub struct CliArgs {
    /// Trip journal CSV
    #[arg(value_name = "INPUT", help = "Path to the journal CSV file")]
    pub input_file: PathBuf,

    /// Parsing strategy to use for replaying the journal
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Parsing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Report written to stdout
    #[arg(long = "report", value_name = "REPORT", default_value = "settlements")]
    pub report: ReportKind,

    /// Settlement netting algorithm
    #[arg(long = "netting", value_name = "NETTING", default_value = "greedy")]
    pub netting: NettingStrategy,

    /// ISO 4217 code of the trip currency
    #[arg(
        long = "currency",
        value_name = "CODE",
        env = "TRIP_SETTLE_CURRENCY",
        default_value = "USD",
        value_parser = parse_currency
    )]
    pub currency: Currency,

    /// Number of journal rows per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of journal rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads replaying trips concurrently (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Log filter directive, e.g. `warn` or `trip_settle=debug`
    #[arg(
        long = "log-level",
        value_name = "FILTER",
        env = "TRIP_SETTLE_LOG",
        default_value = "warn"
    )]
    pub log_level: String,
}

/// Available parsing strategies for CSV processing
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Report written after the journal is replayed
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Per-traveller paid, owed, sent, received and net balance
    Balances,
    /// Suggested payments that bring every balance to zero
    Settlements,
}

fn parse_currency(code: &str) -> Result<Currency, String> {
    Currency::from_code(&code.trim().to_uppercase())
        .ok_or_else(|| format!("unknown ISO 4217 currency code '{}'", code))
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values use the defaults; zero values are replaced by the
    /// defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_report_config(&self) -> ReportConfig {
        ReportConfig {
            report: self.report,
            netting: self.netting,
            currency: self.currency,
        }
    }
}
