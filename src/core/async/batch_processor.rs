//! Batch processing with trip-based partitioning for async journal replay
//!
//! This module provides the `BatchProcessor` struct, which replays batches of
//! journal records concurrently while keeping every trip's records in journal
//! order.
//!
//! # Design
//!
//! Trips share nothing, so a batch is partitioned by trip ID and each trip's
//! sub-batch runs in its own tokio task. Inside a task the records are applied
//! one after another through a `TripLedger` borrowing the shared store.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── Arc<SharedTripStore>  (DashMap-backed trip books)
//!     └── Currency              (trip currency every expense must use)
//! ```
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be safely shared across async tasks.
//! All shared state lives behind the Arc, and the store locks per trip.

use std::collections::HashMap;
use std::sync::Arc;

use super::SharedTripStore;
use crate::core::ledger::TripLedger;
use crate::types::{JournalRecord, SplitError, TripId};
use iso_currency::Currency;

/// Result of applying a single journal record
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The record that was applied
    pub record: JournalRecord,

    /// The outcome (success or error)
    pub result: Result<(), SplitError>,
}

/// Batch processor with trip-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    /// Shared trip storage, wrapped in Arc to cross task boundaries
    store: Arc<SharedTripStore>,

    currency: Currency,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `store` - Arc-wrapped shared store all tasks write into
    /// * `currency` - Trip currency enforced on every expense
    pub fn new(store: Arc<SharedTripStore>, currency: Currency) -> Self {
        Self { store, currency }
    }

    /// Partition a batch of records by trip ID
    ///
    /// # Guarantees
    ///
    /// - Each record appears in exactly one sub-batch
    /// - Records of each trip keep their original order
    /// - Sub-batches contain records of a single trip
    pub fn partition_by_trip(
        &self,
        batch: Vec<JournalRecord>,
    ) -> HashMap<TripId, Vec<JournalRecord>> {
        let mut trip_batches: HashMap<TripId, Vec<JournalRecord>> = HashMap::new();

        for record in batch {
            trip_batches.entry(record.trip()).or_default().push(record);
        }

        trip_batches
    }

    /// Apply all records of one trip sequentially
    ///
    /// Every record is applied even if an earlier one failed; failures are
    /// captured in the returned results, in input order.
    pub async fn process_trip_records(&self, records: Vec<JournalRecord>) -> Vec<ProcessingResult> {
        let mut ledger = TripLedger::new(&*self.store, self.currency);
        let mut results = Vec::with_capacity(records.len());

        for record in records {
            let result = ledger.apply(record.clone());
            if let Err(e) = &result {
                tracing::warn!(
                    trip = record.trip(),
                    kind = record.kind(),
                    error = %e,
                    "journal record rejected"
                );
            }
            results.push(ProcessingResult { record, result });
        }

        results
    }

    /// Apply a batch with trip-based partitioning
    ///
    /// 1. Partition the batch by trip ID
    /// 2. Spawn one tokio task per trip
    /// 3. Wait for every task and collect the results
    ///
    /// Results of different trips may be interleaved in any order.
    pub async fn process_batch(&self, batch: Vec<JournalRecord>) -> Vec<ProcessingResult> {
        let trip_batches = self.partition_by_trip(batch);

        let mut tasks = Vec::with_capacity(trip_batches.len());
        for (_trip, records) in trip_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_trip_records(records).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(trip_results) => results.extend(trip_results),
                Err(e) => tracing::error!(error = %e, "trip task panicked"),
            }
        }

        results
    }
}
