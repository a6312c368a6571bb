//! Appointment form snapshot types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of an appointment form (the bookable calendar).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Form {
    pub id_form: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_category: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_start_validity: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_end_validity: Option<NaiveDate>,
    /// Minimum notice, in hours, before a slot can be booked.
    #[serde(default)]
    pub min_time_before_appointment: i32,
    #[serde(default = "default_nb_weeks_to_display")]
    pub nb_weeks_to_display: i32,
    #[serde(default)]
    pub is_active: bool,
}

fn default_nb_weeks_to_display() -> i32 {
    1
}

impl Form {
    /// Create an active form with only an id and a title set.
    pub fn new(id_form: i32, title: impl Into<String>) -> Self {
        Self {
            id_form,
            title: title.into(),
            description: String::new(),
            id_category: None,
            address: None,
            longitude: None,
            latitude: None,
            date_start_validity: None,
            date_end_validity: None,
            min_time_before_appointment: 0,
            nb_weeks_to_display: default_nb_weeks_to_display(),
            is_active: true,
        }
    }

    /// Address, longitude and latitude, when all three are set and the
    /// address is not empty.
    pub fn geolocation(&self) -> Option<(&str, f64, f64)> {
        match (self.address.as_deref(), self.longitude, self.latitude) {
            (Some(address), Some(longitude), Some(latitude)) if !address.is_empty() => {
                Some((address, longitude, latitude))
            }
            _ => None,
        }
    }
}
