//! # Appointment Search Shared
//!
//! This crate defines the data structures shared across the appointment search
//! indexer: read-only snapshots of booking forms and slots, and the flat
//! search document produced from them.

pub mod types;

pub use types::form::Form;
pub use types::search_document::{FieldValue, GeoLocation, SearchDocument};
pub use types::slot::Slot;
