//! Slot snapshot types.
//!
//! A slot is a bookable time interval of an appointment form. Slots built from
//! week definitions are not always persisted, so a slot is identified by its
//! form and its starting date-time rather than by a database id.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a slot, as produced by the booking backend.
///
/// # Fields
///
/// - `id_slot`: Persisted slot id, `None` for slots computed from week definitions
/// - `id_form`: The form this slot belongs to
/// - `starting_date_time` / `ending_date_time`: Local date-times bounding the slot
/// - `is_open`: Whether the slot accepts bookings
/// - `nb_potential_remaining_places`: Places still bookable (may be negative when overbooked)
/// - `max_capacity`: Total places of the slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_slot: Option<i32>,
    pub id_form: i32,
    pub starting_date_time: NaiveDateTime,
    pub ending_date_time: NaiveDateTime,
    #[serde(default = "default_open")]
    pub is_open: bool,
    pub nb_potential_remaining_places: i32,
    pub max_capacity: i32,
}

fn default_open() -> bool {
    true
}

impl Slot {
    /// Create an open, unpersisted slot.
    ///
    /// # Example
    ///
    /// ```
    /// use appointment_search_shared::Slot;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    /// let slot = Slot::new(
    ///     7,
    ///     day.and_hms_opt(9, 0, 0).unwrap(),
    ///     day.and_hms_opt(9, 30, 0).unwrap(),
    ///     2,
    ///     4,
    /// );
    /// assert!(slot.is_available());
    /// ```
    pub fn new(
        id_form: i32,
        starting_date_time: NaiveDateTime,
        ending_date_time: NaiveDateTime,
        nb_potential_remaining_places: i32,
        max_capacity: i32,
    ) -> Self {
        Self {
            id_slot: None,
            id_form,
            starting_date_time,
            ending_date_time,
            is_open: true,
            nb_potential_remaining_places,
            max_capacity,
        }
    }

    /// Whether the slot still has at least one bookable place.
    pub fn has_remaining_places(&self) -> bool {
        self.nb_potential_remaining_places > 0
    }

    /// Whether the slot is open and has at least one bookable place.
    pub fn is_available(&self) -> bool {
        self.is_open && self.has_remaining_places()
    }

    /// Whether `other` identifies the same slot (same form, same start).
    pub fn same_slot(&self, other: &Slot) -> bool {
        self.id_form == other.id_form && self.starting_date_time == other.starting_date_time
    }
}
