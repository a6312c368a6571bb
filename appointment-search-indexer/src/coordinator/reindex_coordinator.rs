//! Reindex coordinator.
//!
//! Form rebuilds follow a per-form state machine:
//!
//! ```text
//! IDLE --event--> RUNNING --event--> RUNNING_PENDING --event--> (no-op)
//!   ^               |                     |
//!   +---done--------+      done: RUNNING, rebuild once more
//! ```
//!
//! Any number of events received while a rebuild runs collapse into a single
//! trailing rebuild. Rebuilds of different forms run concurrently, bounded by
//! a semaphore.
//!
//! Slot re-indexing goes through one global FIFO consumed by at most one task
//! at a time.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use appointment_search_shared::{Form, Slot};

use crate::config::CoordinatorConfig;
use crate::errors::IndexerError;
use crate::indexer::{AppointmentIndexer, PendingSlots};

/// Rebuild state of one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRunState {
    /// No rebuild scheduled.
    Idle,
    /// A rebuild is running.
    Running,
    /// A rebuild is running and another one must follow it.
    RunningPending,
}

struct Inner {
    indexer: Arc<AppointmentIndexer>,
    /// Forms absent from the map are idle.
    form_states: DashMap<i32, FormRunState>,
    rebuild_permits: Semaphore,
    pending_slots: PendingSlots,
}

/// Coalesces booking notifications into form and slot re-index runs.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct ReindexCoordinator {
    inner: Arc<Inner>,
}

impl ReindexCoordinator {
    /// Create a new coordinator driving `indexer`.
    pub fn new(indexer: Arc<AppointmentIndexer>, config: CoordinatorConfig) -> Self {
        let permits = config.max_concurrent_form_rebuilds.max(1);
        info!(max_concurrent_form_rebuilds = permits, "Created reindex coordinator");

        Self {
            inner: Arc::new(Inner {
                indexer,
                form_states: DashMap::new(),
                rebuild_permits: Semaphore::new(permits),
                pending_slots: PendingSlots::new(),
            }),
        }
    }

    pub fn indexer(&self) -> &Arc<AppointmentIndexer> {
        &self.inner.indexer
    }

    /// Current rebuild state of a form.
    pub fn form_state(&self, id_form: i32) -> FormRunState {
        self.inner
            .form_states
            .get(&id_form)
            .map(|state| *state)
            .unwrap_or(FormRunState::Idle)
    }

    /// True when no form rebuild and no slot run is active.
    pub async fn is_idle(&self) -> bool {
        self.inner.form_states.is_empty() && !self.inner.pending_slots.is_running().await
    }

    /// Number of slots waiting behind the active slot run.
    pub async fn pending_slot_count(&self) -> usize {
        self.inner.pending_slots.len().await
    }

    pub fn on_form_created(&self, id_form: i32) {
        self.schedule_form_rebuild(id_form);
    }

    pub fn on_form_updated(&self, id_form: i32) {
        self.schedule_form_rebuild(id_form);
    }

    /// Delete the form and its slots, on the caller's task.
    pub async fn on_form_removed(&self, id_form: i32) {
        if !self.inner.indexer.is_enabled() {
            return;
        }
        if let Err(e) = self.inner.indexer.delete_form_and_slots(id_form).await {
            error!(id_form, error = %e, "Failed to delete form documents");
        }
    }

    /// A change over `[start, end]` of the form's calendar: ending time,
    /// week assignment or week definition.
    ///
    /// Schedules a rebuild only when the range overlaps the display window.
    pub async fn on_form_period_changed(&self, id_form: i32, start: NaiveDate, end: NaiveDate) {
        if !self.inner.indexer.is_enabled() {
            return;
        }
        let Some(form) = self.find_form(id_form).await else {
            return;
        };
        if self.inner.indexer.is_period_valid_to_index(&form, start, end) {
            self.schedule_form_rebuild(id_form);
        } else {
            debug!(id_form, %start, %end, "Change outside the display window, ignored");
        }
    }

    /// Schedule a slot re-index when its day is displayed.
    pub async fn on_slot_changed(&self, slot: Slot) {
        if !self.inner.indexer.is_enabled() {
            return;
        }
        let Some(form) = self.find_form(slot.id_form).await else {
            return;
        };
        let day = slot.starting_date_time.date();
        if self.inner.indexer.is_period_valid_to_index(&form, day, day) {
            self.schedule_slot(slot).await;
        } else {
            debug!(id_form = slot.id_form, %day, "Slot outside the display window, ignored");
        }
    }

    /// Delete the slot document, on the caller's task.
    pub async fn on_slot_removed(&self, slot: Slot) {
        if !self.inner.indexer.is_enabled() {
            return;
        }
        if let Err(e) = self.inner.indexer.delete_slot(&slot).await {
            error!(id_form = slot.id_form, error = %e, "Failed to delete slot document");
        }
    }

    /// Schedule the re-index of the slot an appointment was booked on.
    pub async fn on_appointment_created(&self, id_slot: i32) {
        if !self.inner.indexer.is_enabled() {
            return;
        }
        match self.inner.indexer.source().find_slot(id_slot).await {
            Ok(Some(slot)) => self.schedule_slot(slot).await,
            Ok(None) => warn!(id_slot, "Booked slot not found"),
            Err(e) => error!(id_slot, error = %e, "Failed to look up booked slot"),
        }
    }

    async fn find_form(&self, id_form: i32) -> Option<Form> {
        match self.inner.indexer.source().find_form(id_form).await {
            Ok(Some(form)) => Some(form),
            Ok(None) => {
                debug!(id_form, "Form not found");
                None
            }
            Err(e) => {
                error!(id_form, error = %e, "Failed to look up form");
                None
            }
        }
    }

    fn schedule_form_rebuild(&self, id_form: i32) {
        if !self.inner.indexer.is_enabled() {
            return;
        }
        if !self.inner.request_rebuild(id_form) {
            debug!(id_form, "Rebuild already running, coalesced");
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.run_form_rebuilds(id_form));
    }

    async fn schedule_slot(&self, slot: Slot) {
        let Some(first) = self.inner.pending_slots.submit(slot).await else {
            debug!("Slot run active, slot queued");
            return;
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.consume_slots(first));
    }
}

impl Inner {
    /// Move a form to RUNNING or RUNNING_PENDING. Returns true when the
    /// caller must start the rebuild task.
    fn request_rebuild(&self, id_form: i32) -> bool {
        let mut state = self.form_states.entry(id_form).or_insert(FormRunState::Idle);
        let current = *state;
        match current {
            FormRunState::Idle => {
                *state = FormRunState::Running;
                true
            }
            FormRunState::Running => {
                *state = FormRunState::RunningPending;
                false
            }
            FormRunState::RunningPending => false,
        }
    }

    /// Leave RUNNING after a rebuild. Returns true when a trailing rebuild
    /// was requested in the meantime.
    fn finish_rebuild(&self, id_form: i32) -> bool {
        match self.form_states.entry(id_form) {
            Entry::Occupied(mut state) if *state.get() == FormRunState::RunningPending => {
                state.insert(FormRunState::Running);
                true
            }
            Entry::Occupied(state) => {
                state.remove();
                false
            }
            Entry::Vacant(_) => false,
        }
    }

    #[instrument(skip(self))]
    async fn run_form_rebuilds(self: Arc<Self>, id_form: i32) {
        loop {
            self.rebuild_form_guarded(id_form).await;
            if !self.finish_rebuild(id_form) {
                break;
            }
            debug!("Events arrived during the rebuild, rebuilding again");
        }
    }

    async fn rebuild_form_guarded(&self, id_form: i32) {
        let _permit = match self.rebuild_permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Rebuild pool closed");
                return;
            }
        };

        match AssertUnwindSafe(self.rebuild_form(id_form))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Form rebuild failed"),
            Err(_) => error!("Form rebuild panicked"),
        }
    }

    async fn rebuild_form(&self, id_form: i32) -> Result<(), IndexerError> {
        self.indexer.delete_form_and_slots(id_form).await?;
        match self.indexer.source().find_form(id_form).await? {
            Some(form) => self.indexer.write_form_and_slots(&form).await,
            None => {
                debug!("Form no longer exists, documents deleted only");
                Ok(())
            }
        }
    }

    async fn consume_slots(self: Arc<Self>, first: Slot) {
        let mut next = Some(first);
        while let Some(slot) = next {
            match AssertUnwindSafe(self.indexer.write_slot_and_form(&slot, &self.pending_slots))
                .catch_unwind()
                .await
            {
                Ok(Ok(written)) => debug!(id_form = slot.id_form, written, "Slot run step done"),
                Ok(Err(e)) => error!(id_form = slot.id_form, error = %e, "Slot re-index failed"),
                Err(_) => error!(id_form = slot.id_form, "Slot re-index panicked"),
            }
            next = self.pending_slots.next_or_finish().await;
        }
        debug!("Slot queue drained");
    }
}
