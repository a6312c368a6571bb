//! Appointment indexer.
//!
//! Writes and deletes form and slot documents. Every write recomputes the
//! form's slot list from the booking source, so documents always reflect the
//! current state of the backend rather than the state carried by an event.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, error, info, instrument, warn};

use appointment_search_repository::solr::stored_uid;
use appointment_search_repository::{BatchOperationSummary, DeleteQuery, SearchIndexProvider};
use appointment_search_shared::{Form, SearchDocument, Slot};

use crate::config::IndexerConfig;
use crate::errors::IndexerError;
use crate::indexer::locks::KeyedLocks;
use crate::indexer::pending::PendingSlots;
use crate::indexer::window::{display_window, filter_min_notice, is_period_valid_to_index};
use crate::mapper::{affected_predecessors, site_form_uid, slot_uid, DocumentMapper};
use crate::source::BookingSource;

pub const INDEXER_NAME: &str = "appointmentForm";
pub const INDEXER_DESCRIPTION: &str = "Appointments and slots indexer";
pub const INDEXER_VERSION: &str = "1.0.0";

const FIELD_UID: &str = "uid";
const FIELD_UID_FORM: &str = "uid_form_string";

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Indexer keeping the documents of forms and slots up to date.
pub struct AppointmentIndexer {
    source: Arc<dyn BookingSource>,
    provider: Arc<dyn SearchIndexProvider>,
    mapper: DocumentMapper,
    config: IndexerConfig,
    locks: KeyedLocks,
}

impl AppointmentIndexer {
    /// Create a new indexer.
    pub fn new(
        source: Arc<dyn BookingSource>,
        provider: Arc<dyn SearchIndexProvider>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            source,
            provider,
            mapper: DocumentMapper::new(config.site.clone()),
            config,
            locks: KeyedLocks::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn source(&self) -> &Arc<dyn BookingSource> {
        &self.source
    }

    /// Whether `[start, end]` overlaps the form's display window as of today.
    pub fn is_period_valid_to_index(&self, form: &Form, start: NaiveDate, end: NaiveDate) -> bool {
        is_period_valid_to_index(form, start, end, now().date())
    }

    /// Slots currently displayed for `form`.
    pub async fn displayed_slots(&self, form: &Form) -> Result<Vec<Slot>, IndexerError> {
        let now = now();
        let Some((start, end)) = display_window(form, now.date()) else {
            debug!(id_form = form.id_form, "Display window is empty");
            return Ok(Vec::new());
        };
        let slots = self.source.build_slots(form.id_form, start, end).await?;
        Ok(filter_min_notice(form, slots, now))
    }

    async fn category_label(&self, form: &Form) -> Result<Option<String>, IndexerError> {
        match form.id_category {
            Some(id_category) => Ok(self.source.find_category_label(id_category).await?),
            None => Ok(None),
        }
    }

    /// Write documents and turn per-document failures into an error.
    async fn write(&self, documents: &[SearchDocument]) -> Result<(), IndexerError> {
        if documents.is_empty() {
            return Ok(());
        }

        let summary = self.provider.write_documents(documents).await?;
        Self::check_summary(summary)
    }

    fn check_summary(summary: BatchOperationSummary) -> Result<(), IndexerError> {
        if summary.failed == 0 {
            debug!(count = summary.succeeded, "Wrote all documents");
            return Ok(());
        }

        warn!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Write completed with some failures"
        );
        let mut first_error = None;
        for result in summary.results.into_iter().filter(|r| !r.success) {
            if let Some(err) = result.error {
                error!(uid = %result.uid, error = %err, "Failed to write document");
                first_error.get_or_insert(err);
            }
        }
        Err(match first_error {
            Some(err) => err.into(),
            None => IndexerError::mapping(format!("{} documents failed", summary.failed)),
        })
    }

    /// Rebuild the form document and the documents of all its displayed slots.
    #[instrument(skip(self, form), fields(id_form = form.id_form))]
    pub async fn write_form_and_slots(&self, form: &Form) -> Result<(), IndexerError> {
        let _guard = self
            .locks
            .lock(&site_form_uid(&self.config.site, form.id_form))
            .await;

        let category = self.category_label(form).await?;
        let slots = self.displayed_slots(form).await?;

        let form_document = self
            .mapper
            .form_document(form, category.as_deref(), &slots);
        self.write(std::slice::from_ref(&form_document)).await?;

        let slot_documents =
            self.mapper
                .slot_documents(form, category.as_deref(), slots.iter(), &slots);
        self.write(&slot_documents).await?;

        info!(slot_count = slots.len(), "Indexed form and slots");
        Ok(())
    }

    /// Re-index a changed slot, the slots whose consecutive count depends on
    /// it, and its form.
    ///
    /// Queued slots of the same form are taken out of `pending` and written
    /// in the same batch, under the locks of every notified slot. Returns the
    /// number of slot documents written.
    #[instrument(skip(self, slot, pending), fields(id_form = slot.id_form, slot = %slot_uid(slot)))]
    pub async fn write_slot_and_form(
        &self,
        slot: &Slot,
        pending: &PendingSlots,
    ) -> Result<usize, IndexerError> {
        let mut notified = vec![slot.clone()];
        notified.extend(pending.drain_form(slot.id_form).await);
        let _guards = self.locks.lock_all(notified.iter().map(slot_uid)).await;

        let Some(form) = self.source.find_form(slot.id_form).await? else {
            debug!(
                notified = notified.len(),
                "Form no longer exists, skipping slots"
            );
            return Ok(0);
        };
        let category = self.category_label(&form).await?;
        let all_slots = self.displayed_slots(&form).await?;

        let mut selected = vec![false; all_slots.len()];
        for changed in &notified {
            let Some(index) = all_slots.iter().position(|s| s.same_slot(changed)) else {
                debug!(slot = %slot_uid(changed), "Slot outside the display window, not indexed");
                continue;
            };
            selected[index] = true;
            for predecessor in affected_predecessors(&all_slots[index], &all_slots) {
                if let Some(i) = all_slots.iter().position(|s| s.same_slot(predecessor)) {
                    selected[i] = true;
                }
            }
        }

        let targets = all_slots
            .iter()
            .zip(&selected)
            .filter(|(_, selected)| **selected)
            .map(|(slot, _)| slot);
        let slot_documents =
            self.mapper
                .slot_documents(&form, category.as_deref(), targets, &all_slots);
        self.write(&slot_documents).await?;

        let form_document = self
            .mapper
            .form_document(&form, category.as_deref(), &all_slots);
        self.write(std::slice::from_ref(&form_document)).await?;

        debug!(
            notified = notified.len(),
            written = slot_documents.len(),
            "Indexed slots and form"
        );
        Ok(slot_documents.len())
    }

    /// Resolve a persisted slot and re-index it.
    pub async fn write_slot_by_id(
        &self,
        id_slot: i32,
        pending: &PendingSlots,
    ) -> Result<usize, IndexerError> {
        match self.source.find_slot(id_slot).await? {
            Some(slot) => self.write_slot_and_form(&slot, pending).await,
            None => {
                warn!(id_slot, "Slot not found, nothing to index");
                Ok(0)
            }
        }
    }

    /// Delete the form document and every slot document referencing it.
    #[instrument(skip(self))]
    pub async fn delete_form_and_slots(&self, id_form: i32) -> Result<(), IndexerError> {
        let form_uid = site_form_uid(&self.config.site, id_form);
        let _guard = self.locks.lock(&form_uid).await;

        let query = DeleteQuery::field(FIELD_UID, &form_uid).or(FIELD_UID_FORM, &form_uid);
        self.provider.delete_by_query(&query).await?;

        info!(query = %query, "Deleted form and slots");
        Ok(())
    }

    /// Delete the document of one slot.
    #[instrument(skip(self, slot), fields(id_form = slot.id_form))]
    pub async fn delete_slot(&self, slot: &Slot) -> Result<(), IndexerError> {
        let uid = stored_uid(&self.config.site.name, &slot_uid(slot));
        let _guard = self.locks.lock(&slot_uid(slot)).await;

        self.provider
            .delete_by_query(&DeleteQuery::field(FIELD_UID, &uid))
            .await?;

        debug!(uid = %uid, "Deleted slot");
        Ok(())
    }

    /// Rebuild the documents of every form.
    ///
    /// A failing form does not stop the run; one message per failure is
    /// returned.
    #[instrument(skip(self))]
    pub async fn index_documents(&self) -> Vec<String> {
        if !self.config.enabled {
            info!("Indexer is disabled, nothing to index");
            return Vec::new();
        }

        let forms = match self.source.active_forms().await {
            Ok(forms) => forms,
            Err(e) => {
                error!(error = %e, "Failed to list forms");
                return vec![format!("Failed to list forms: {}", e)];
            }
        };

        let mut errors = Vec::new();
        for form in &forms {
            if let Err(e) = self.write_form_and_slots(form).await {
                error!(id_form = form.id_form, error = %e, "Error indexing form");
                errors.push(format!("Error indexing form {}: {}", form.id_form, e));
            }
        }

        info!(
            form_count = forms.len(),
            error_count = errors.len(),
            "Indexed all forms"
        );
        errors
    }
}
