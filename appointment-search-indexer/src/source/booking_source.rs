//! Booking source trait definition.

use async_trait::async_trait;
use chrono::NaiveDate;

use appointment_search_shared::{Form, Slot};

use crate::errors::BookingError;

/// Read-only access to the booking backend.
///
/// Lookups that find nothing return `Ok(None)`; an `Err` always means the
/// backend could not be queried.
#[async_trait]
pub trait BookingSource: Send + Sync {
    /// All forms that should be present in the index.
    async fn active_forms(&self) -> Result<Vec<Form>, BookingError>;

    /// Look up a form by id.
    async fn find_form(&self, id_form: i32) -> Result<Option<Form>, BookingError>;

    /// Look up a persisted slot by id, with its remaining places computed.
    async fn find_slot(&self, id_slot: i32) -> Result<Option<Slot>, BookingError>;

    /// Build the slots of a form between two dates (inclusive), from its
    /// week definitions and reservation rules.
    async fn build_slots(
        &self,
        id_form: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>, BookingError>;

    /// Label of a category, if it exists.
    async fn find_category_label(&self, id_category: i32) -> Result<Option<String>, BookingError>;
}
