//! Coordinator module for the appointment indexer.
//!
//! Receives booking-domain notifications and turns them into asynchronous
//! re-index runs.

mod reindex_coordinator;

pub use reindex_coordinator::{FormRunState, ReindexCoordinator};
