//! Trip Settle CLI
//!
//! Command-line interface for settling group trip expenses from a CSV journal.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- journal.csv > settlements.csv
//! cargo run -- --report balances journal.csv > balances.csv
//! cargo run -- --netting optimal --currency EUR journal.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 journal.csv
//! ```
//!
//! The program replays the journal with the selected processing strategy and
//! writes the report to stdout. Logs go to stderr; the filter comes from
//! `--log-level` or `TRIP_SETTLE_LOG` (default `warn`).
//!
//! # Processing Strategies
//!
//! - **sync**: Synchronous CSV parsing with single-threaded processing
//! - **async**: Asynchronous batch processing with one task per trip (default)
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use std::process;
use trip_settle::cli;
use trip_settle::strategy;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::parse_args();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}': {}; using 'warn'", args.log_level, e);
        EnvFilter::new("warn")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, args.to_report_config(), config)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
