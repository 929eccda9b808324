//! Asynchronous batch processing strategy
//!
//! This module provides an asynchronous, multi-threaded implementation of the
//! ProcessingStrategy trait. It replays the journal in batches using
//! thread-based parallelism with trip-based partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── ReportConfig (report kind, netting, currency)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (trip partitioning + tasks)
//!     └── SharedTripStore (DashMap of trip books)
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another, so a trip whose records span
//!   several batches still sees them in journal order
//! - Within a batch, different trips run in parallel on the tokio
//!   multi-threaded runtime
//! - Trips never share state, so parallel replay produces the same report as
//!   the synchronous strategy

use crate::core::r#async::{BatchProcessor, SharedTripStore};
use crate::core::TripLedger;
use crate::io::async_reader::AsyncReader;
use crate::io::sync_reader::open_error;
use crate::strategy::{write_report, ProcessingStrategy, ReportConfig};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Configuration for batch processing
///
/// Controls how journal records are batched and the number of worker threads
/// for parallel processing within each batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of journal rows per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid worker count, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// Journal records are read in batches and processed batch by batch. Within
/// each batch, records are partitioned by trip and each trip is replayed in
/// its own task.
///
/// # Configuration
///
/// - `batch_size`: journal rows per batch (default: 1000)
/// - `max_concurrent_batches`: worker threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    report: ReportConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, report: ReportConfig) -> Self {
        Self { config, report }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Replay the journal and write the report
    ///
    /// 1. Builds a multi-threaded tokio runtime
    /// 2. Opens the journal and wraps it for `csv-async`
    /// 3. Reads batches until the end of the file, processing each to
    ///    completion before reading the next
    /// 4. Builds the report from the shared store once every batch is done
    ///
    /// Fatal errors (file not found, runtime or output errors) are returned;
    /// rejected rows and records are logged and skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let store = runtime.block_on(async {
            let store = Arc::new(SharedTripStore::new());
            let processor = BatchProcessor::new(Arc::clone(&store), self.report.currency);

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| open_error(input_path, e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file, self.report.currency);

            let mut batches = 0_usize;
            while let Some(batch) = reader.read_batch(self.config.batch_size).await {
                processor.process_batch(batch).await;
                batches += 1;
            }
            tracing::debug!(batches, "journal replay finished");

            Ok::<_, String>(store)
        })?;

        let ledger = TripLedger::new(&*store, self.report.currency).with_netting(self.report.netting);
        write_report(&ledger, &self.report, output)
    }
}
