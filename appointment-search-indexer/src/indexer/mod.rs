//! Indexer module for the appointment indexer.
//!
//! Writes form and slot documents to the search index and deletes them.
//!
//! Writes are serialized per resource through [`KeyedLocks`]; queued slot
//! notifications wait in [`PendingSlots`].

mod appointment_indexer;
mod locks;
mod pending;
mod window;

pub use appointment_indexer::{
    AppointmentIndexer, INDEXER_DESCRIPTION, INDEXER_NAME, INDEXER_VERSION,
};
pub use locks::KeyedLocks;
pub use pending::PendingSlots;
pub use window::{display_window, filter_min_notice, is_period_valid_to_index};
