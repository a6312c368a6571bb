//! # Appointment Search Indexer
//!
//! Keeps the Solr documents of appointment forms and slots in sync with the
//! booking backend.
//!
//! ## Architecture
//!
//! Notifications flow through four layers:
//!
//! 1. **Coordinator**: coalesces booking notifications into re-index runs
//! 2. **Indexer**: recomputes the slots of a form and writes or deletes documents
//! 3. **Mapper**: turns forms and slots into search documents
//! 4. **Repository**: sends documents to Solr
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`source`]: Read access to the booking backend
//! - [`mapper`]: Transforms forms and slots into documents
//! - [`indexer`]: Writes and deletes documents
//! - [`coordinator`]: Schedules re-index runs from notifications
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod indexer;
pub mod mapper;
pub mod source;

pub use config::Dependencies;
pub use coordinator::ReindexCoordinator;
pub use errors::{BookingError, IndexerError};
pub use indexer::AppointmentIndexer;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Indexer error.
    #[error("Indexer error: {0}")]
    IndexerError(#[from] IndexerError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
