//! Document mapper implementation.
//!
//! Transforms forms and slots into `SearchDocument` structures for indexing.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use tracing::{debug, instrument};

use appointment_search_shared::{Form, SearchDocument, Slot};

use crate::config::SiteConfig;
use crate::mapper::consecutive::consecutive_count;
use crate::mapper::resource::{
    form_uid, form_url, site_form_uid, slot_uid, slot_url, SHORT_NAME_APPOINTMENT,
    SHORT_NAME_SLOT,
};

const MIN_HOURS_BEFORE_APPOINTMENT: &str = "min_hours_before_appointment";
const APPOINTMENT_ACTIVE: &str = "appointment_active";
const URL_BASE: &str = "url_base";
const FORM_ID_TITLE: &str = "form_id_title";
const APPOINTMENT_NB_FREE_PLACES: &str = "appointment_nb_free_places";
const APPOINTMENT_NB_PLACES: &str = "appointment_nb_places";

const DAY_OPEN: &str = "day_open";
const ENABLED: &str = "enabled";
const SLOT_NB_FREE_PLACES: &str = "slot_nb_free_places";
const SLOT_NB_PLACES: &str = "slot_nb_places";
const DAY_OF_WEEK: &str = "day_of_week";
const MINUTE_OF_DAY: &str = "minute_of_day";
const NB_CONSECUTIVE_SLOTS: &str = "nb_consecutives_slots";
const UID_FORM: &str = "uid_form";
const URL_FORM: &str = "url_form";
const GEOLOC_SLOT: &str = "appointmentslot";

const FORM_ID_TITLE_SEPARATOR: &str = "|";
const ROLE_NONE: &str = "none";

/// Date hierarchy string, `YYYY/MM/DD`.
pub fn hie_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Free and total places over a slot list.
pub fn aggregate_places(slots: &[Slot]) -> (i64, i64) {
    slots.iter().fold((0, 0), |(free, total), slot| {
        (
            free + i64::from(slot.nb_potential_remaining_places),
            total + i64::from(slot.max_capacity),
        )
    })
}

fn minute_of_day(date_time: &NaiveDateTime) -> i64 {
    i64::from(date_time.hour() * 60 + date_time.minute())
}

/// Mapper that transforms forms and slots into search documents.
///
/// The mapper is pure: category labels and slot lists are fetched by the
/// caller and passed in.
#[derive(Debug, Clone)]
pub struct DocumentMapper {
    site: SiteConfig,
}

impl DocumentMapper {
    /// Create a new mapper for the given site.
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Fields shared by form and slot documents.
    fn default_document(&self, form: &Form, category: Option<&str>) -> SearchDocument {
        let mut doc = SearchDocument {
            summary: form.description.clone(),
            title: form.title.clone(),
            site: self.site.name.clone(),
            role: ROLE_NONE.to_string(),
            ..Default::default()
        };
        if let Some(label) = category {
            doc.categories = vec![label.to_string()];
        }

        doc.add_dynamic_field_long(
            MIN_HOURS_BEFORE_APPOINTMENT,
            i64::from(form.min_time_before_appointment),
        );
        doc.add_dynamic_field_not_analysed(APPOINTMENT_ACTIVE, form.is_active.to_string());
        doc.add_dynamic_field_not_analysed(URL_BASE, self.site.root_url.clone());
        doc.add_dynamic_field_not_analysed(
            FORM_ID_TITLE,
            format!(
                "{}{}{}",
                site_form_uid(&self.site, form.id_form),
                FORM_ID_TITLE_SEPARATOR,
                form.title
            ),
        );
        doc
    }

    /// Build the form document, aggregating places over `slots`.
    ///
    /// # Arguments
    ///
    /// * `form` - The form
    /// * `category` - Label of the form's category, if found
    /// * `slots` - The slots currently displayed for the form
    #[instrument(skip_all, fields(id_form = form.id_form, slot_count = slots.len()))]
    pub fn form_document(
        &self,
        form: &Form,
        category: Option<&str>,
        slots: &[Slot],
    ) -> SearchDocument {
        let mut doc = self.default_document(form, category);
        doc.uid = form_uid(form.id_form);
        doc.url = form_url(&self.site, form.id_form);
        doc.doc_type = SHORT_NAME_APPOINTMENT.to_string();
        doc.date = form
            .date_start_validity
            .and_then(|date| date.and_hms_opt(0, 0, 0));

        let (free_places, places) = aggregate_places(slots);
        if let Some((address, longitude, latitude)) = form.geolocation() {
            doc.add_dynamic_field_geoloc(
                SHORT_NAME_APPOINTMENT,
                address,
                longitude,
                latitude,
                format!("{}-{}/{}", SHORT_NAME_APPOINTMENT, free_places, places),
            );
        }
        doc.add_dynamic_field_long(APPOINTMENT_NB_FREE_PLACES, free_places);
        doc.add_dynamic_field_long(APPOINTMENT_NB_PLACES, places);

        doc.hie_date = form.date_start_validity.map(hie_date);

        debug!(uid = %doc.uid, free_places, places, "Mapped form document");
        doc
    }

    /// Build the document of one slot.
    ///
    /// # Arguments
    ///
    /// * `form` - The slot's form
    /// * `category` - Label of the form's category, if found
    /// * `slot` - The slot to map
    /// * `all_slots` - Every slot of the form, used for the consecutive count
    pub fn slot_document(
        &self,
        form: &Form,
        category: Option<&str>,
        slot: &Slot,
        all_slots: &[Slot],
    ) -> SearchDocument {
        let mut doc = self.default_document(form, category);
        doc.uid = slot_uid(slot);
        doc.add_dynamic_field_not_analysed(UID_FORM, site_form_uid(&self.site, form.id_form));
        doc.url = slot_url(&self.site, slot);
        doc.add_dynamic_field_not_analysed(URL_FORM, form_url(&self.site, form.id_form));
        doc.date = Some(slot.starting_date_time);
        doc.doc_type = SHORT_NAME_SLOT.to_string();

        if let Some((address, longitude, latitude)) = form.geolocation() {
            doc.add_dynamic_field_geoloc(
                GEOLOC_SLOT,
                address,
                longitude,
                latitude,
                format!(
                    "{}-{}/{}",
                    GEOLOC_SLOT, slot.nb_potential_remaining_places, slot.max_capacity
                ),
            );
        }
        doc.add_dynamic_field_not_analysed(DAY_OPEN, true.to_string());
        doc.add_dynamic_field_not_analysed(ENABLED, slot.is_open.to_string());
        doc.add_dynamic_field_long(
            SLOT_NB_FREE_PLACES,
            i64::from(slot.nb_potential_remaining_places),
        );
        doc.add_dynamic_field_long(SLOT_NB_PLACES, i64::from(slot.max_capacity));
        doc.add_dynamic_field_long(
            DAY_OF_WEEK,
            i64::from(slot.starting_date_time.weekday().number_from_monday()),
        );
        doc.add_dynamic_field_long(MINUTE_OF_DAY, minute_of_day(&slot.starting_date_time));
        doc.add_dynamic_field_long(
            NB_CONSECUTIVE_SLOTS,
            i64::from(consecutive_count(slot, all_slots)),
        );

        doc.hie_date = Some(hie_date(slot.starting_date_time.date()));
        doc
    }

    /// Build the documents of several slots of the same form.
    #[instrument(skip_all, fields(id_form = form.id_form))]
    pub fn slot_documents<'a>(
        &self,
        form: &Form,
        category: Option<&str>,
        slots: impl IntoIterator<Item = &'a Slot>,
        all_slots: &[Slot],
    ) -> Vec<SearchDocument> {
        slots
            .into_iter()
            .map(|slot| self.slot_document(form, category, slot, all_slots))
            .collect()
    }
}
