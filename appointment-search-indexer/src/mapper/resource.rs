//! Resource identifiers and front-office URLs.
//!
//! Uids must stay stable across runs: a slot written twice must land on the
//! same document, so every uid here is derived only from the form id and the
//! slot start.

use chrono::{NaiveDateTime, Timelike};
use tracing::error;
use url::Url;

use appointment_search_repository::solr::stored_uid;
use appointment_search_shared::Slot;

use crate::config::SiteConfig;

pub const RESOURCE_TYPE_APPOINTMENT: &str = "appointment";
pub const RESOURCE_TYPE_SLOT: &str = "slot";
pub const SHORT_NAME_APPOINTMENT: &str = "appointment";
pub const SHORT_NAME_SLOT: &str = "appointment-slot";

pub const PARAMETER_XPAGE: &str = "page";
pub const XPAGE_APPOINTMENT: &str = "appointment";
pub const PARAMETER_VIEW: &str = "view";
pub const PARAMETER_ID_FORM: &str = "id_form";

const VIEW_FORM_CALENDAR: &str = "getViewAppointmentCalendar";
const VIEW_FORM_SLOT: &str = "getViewAppointmentForm";
const PARAMETER_STARTING_DATETIME: &str = "starting_date_time";
const PARAMETER_ANCHOR: &str = "anchor";
const VALUE_ANCHOR: &str = "step3";

/// Readable, alphanumeric timestamp used in slot ids.
const SLOT_ID_DATE_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Kind of indexed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Appointment,
    Slot,
}

impl ResourceType {
    /// Parse a resource type name (`appointment` or `slot`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            RESOURCE_TYPE_APPOINTMENT => Some(Self::Appointment),
            RESOURCE_TYPE_SLOT => Some(Self::Slot),
            _ => None,
        }
    }

    /// Short name used as document type and uid suffix.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Appointment => SHORT_NAME_APPOINTMENT,
            Self::Slot => SHORT_NAME_SLOT,
        }
    }

    /// Uid of a resource of this type.
    pub fn uid(&self, resource_id: &str) -> String {
        format!("{}_{}", resource_id, self.short_name())
    }
}

/// Build the uid of a resource from a type name.
///
/// Entry point for hosts that only carry the resource type as a string, as
/// the booking backend does in its resource notifications. Code that knows
/// the type statically goes through [`ResourceType::uid`], as [`slot_uid`]
/// and [`form_uid`] do.
///
/// Returns `None` and logs an error when the type name is unknown.
///
/// # Example
///
/// ```
/// use appointment_search_indexer::mapper::build_resource_uid;
///
/// assert_eq!(build_resource_uid("3", "appointment").as_deref(), Some("3_appointment"));
/// assert_eq!(build_resource_uid("3", "calendar"), None);
/// ```
pub fn build_resource_uid(resource_id: &str, resource_type: &str) -> Option<String> {
    match ResourceType::parse(resource_type) {
        Some(kind) => Some(kind.uid(resource_id)),
        None => {
            error!(resource_type = %resource_type, "Unknown resource type");
            None
        }
    }
}

/// Slot id built from its form and start: `F<form>D<yyyyMMddTHHmmss>`.
pub fn slot_resource_id(slot: &Slot) -> String {
    format!(
        "F{}D{}",
        slot.id_form,
        slot.starting_date_time.format(SLOT_ID_DATE_FORMAT)
    )
}

/// Document uid of a slot.
pub fn slot_uid(slot: &Slot) -> String {
    ResourceType::Slot.uid(&slot_resource_id(slot))
}

/// Document uid of a form.
pub fn form_uid(id_form: i32) -> String {
    ResourceType::Appointment.uid(&id_form.to_string())
}

/// Form uid as stored in the index, prefixed with the site name.
pub fn site_form_uid(site: &SiteConfig, id_form: i32) -> String {
    stored_uid(&site.name, &form_uid(id_form))
}

/// ISO-8601 local date-time, omitting seconds when they are zero.
pub fn iso_local_date_time(date_time: &NaiveDateTime) -> String {
    if date_time.second() == 0 && date_time.nanosecond() == 0 {
        date_time.format("%Y-%m-%dT%H:%M").to_string()
    } else {
        date_time.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// Portal URL with the given query.
///
/// Values are appended as-is, so `:` in dates stays readable. The root URL
/// is only parsed to reject malformed sites.
fn portal_url(site: &SiteConfig, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    match Url::parse(&site.base_url()) {
        Ok(mut url) => {
            url.set_query(Some(&query));
            url.to_string()
        }
        Err(e) => {
            error!(root_url = %site.root_url, error = %e, "Invalid site root URL");
            format!("{}?{}", site.base_url(), query)
        }
    }
}

/// Front-office URL of a form's calendar.
pub fn form_url(site: &SiteConfig, id_form: i32) -> String {
    let id = id_form.to_string();
    portal_url(
        site,
        &[
            (PARAMETER_XPAGE, XPAGE_APPOINTMENT),
            (PARAMETER_VIEW, VIEW_FORM_CALENDAR),
            (PARAMETER_ID_FORM, id.as_str()),
        ],
    )
}

/// Front-office URL booking a slot directly.
pub fn slot_url(site: &SiteConfig, slot: &Slot) -> String {
    let id = slot.id_form.to_string();
    let start = iso_local_date_time(&slot.starting_date_time);
    portal_url(
        site,
        &[
            (PARAMETER_XPAGE, XPAGE_APPOINTMENT),
            (PARAMETER_VIEW, VIEW_FORM_SLOT),
            (PARAMETER_ID_FORM, id.as_str()),
            (PARAMETER_STARTING_DATETIME, start.as_str()),
            (PARAMETER_ANCHOR, VALUE_ANCHOR),
        ],
    )
}
