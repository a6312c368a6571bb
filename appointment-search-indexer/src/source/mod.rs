//! Source module for the appointment indexer.
//!
//! Read access to the booking backend: forms, slots and categories.

mod booking_source;
mod http_source;

pub use booking_source::BookingSource;
pub use http_source::HttpBookingSource;
