//! # Appointment Search Repository
//!
//! This crate provides the trait and implementation used to write appointment
//! documents to the search index. It includes definitions for errors, the
//! provider interface, delete queries, and a concrete implementation for Solr.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod solr;
pub mod types;
pub mod utils;

pub use config::SolrConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use solr::SolrProvider;
pub use types::{BatchOperationResult, BatchOperationSummary, DeleteQuery};
pub use utils::escape_query_value;
