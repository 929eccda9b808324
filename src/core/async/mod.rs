//! Concurrent implementations of core components
//!
//! This module provides the thread-safe store and the batch processor used by
//! the async processing strategy.
//!
//! # Architecture
//!
//! - **SharedTripStore**: `TripStore` over a `DashMap<TripId, TripBook>`
//! - **BatchProcessor**: partitions journal batches by trip and applies each
//!   trip's records in its own tokio task
//!
//! # Thread Safety
//!
//! - Writes to different trips proceed in parallel
//! - Writes to the same trip are serialized by the trip's shard lock
//! - No global locks

pub mod batch_processor;
pub mod trip_store;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use trip_store::SharedTripStore;
