//! Solr implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using Solr as the backend.

mod document;
mod provider;

pub use document::{stored_uid, to_solr_json, to_solr_json_in_zone};
pub use provider::SolrProvider;
