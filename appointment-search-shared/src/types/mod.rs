//! This module defines the core data structures used across the indexer.
//! It re-exports the booking snapshots and the search document types.

pub mod form;
pub mod search_document;
pub mod slot;

pub use form::Form;
pub use search_document::{FieldValue, GeoLocation, SearchDocument};
pub use slot::Slot;
