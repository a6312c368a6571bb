//! In-memory booking source and search provider shared by the integration
//! tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::time::{sleep, timeout};

use appointment_search_indexer::config::{IndexerConfig, SiteConfig};
use appointment_search_indexer::errors::BookingError;
use appointment_search_indexer::source::BookingSource;
use appointment_search_indexer::{AppointmentIndexer, ReindexCoordinator};
use appointment_search_repository::{
    BatchOperationSummary, DeleteQuery, SearchIndexError, SearchIndexProvider,
};
use appointment_search_shared::{Form, SearchDocument, Slot};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Today at the given hour.
pub fn at(hour: u32) -> NaiveDateTime {
    today().and_hms_opt(hour, 0, 0).unwrap()
}

pub fn slot(id_form: i32, start: u32, end: u32, remaining: i32) -> Slot {
    Slot::new(id_form, at(start), at(end), remaining, 2)
}

// Mock booking source for testing
#[derive(Default)]
pub struct MockBookingSource {
    forms: Mutex<HashMap<i32, Form>>,
    slots: Mutex<HashMap<i32, Vec<Slot>>>,
    persisted_slots: Mutex<HashMap<i32, Slot>>,
    categories: Mutex<HashMap<i32, String>>,
    failing_forms: Mutex<HashSet<i32>>,
    build_delay: Mutex<Duration>,
    build_calls: Mutex<HashMap<i32, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    in_flight_per_form: Mutex<HashMap<i32, usize>>,
    max_in_flight_per_form: AtomicUsize,
}

impl MockBookingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_form(&self, form: Form, slots: Vec<Slot>) {
        self.slots.lock().unwrap().insert(form.id_form, slots);
        self.forms.lock().unwrap().insert(form.id_form, form);
    }

    pub fn remove_form(&self, id_form: i32) {
        self.forms.lock().unwrap().remove(&id_form);
        self.slots.lock().unwrap().remove(&id_form);
    }

    pub fn add_persisted_slot(&self, id_slot: i32, slot: Slot) {
        self.persisted_slots.lock().unwrap().insert(id_slot, slot);
    }

    pub fn add_category(&self, id_category: i32, label: &str) {
        self.categories
            .lock()
            .unwrap()
            .insert(id_category, label.to_string());
    }

    pub fn fail_form(&self, id_form: i32) {
        self.failing_forms.lock().unwrap().insert(id_form);
    }

    pub fn set_build_delay(&self, delay: Duration) {
        *self.build_delay.lock().unwrap() = delay;
    }

    pub fn build_calls(&self, id_form: i32) -> usize {
        self.build_calls
            .lock()
            .unwrap()
            .get(&id_form)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of slot builds seen running at once, all forms together.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slot builds seen running at once for a single form.
    pub fn max_in_flight_per_form(&self) -> usize {
        self.max_in_flight_per_form.load(Ordering::SeqCst)
    }

    fn enter(&self, id_form: i32) {
        *self.build_calls.lock().unwrap().entry(id_form).or_insert(0) += 1;
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let mut per_form = self.in_flight_per_form.lock().unwrap();
        let count = per_form.entry(id_form).or_insert(0);
        *count += 1;
        self.max_in_flight_per_form
            .fetch_max(*count, Ordering::SeqCst);
    }

    fn leave(&self, id_form: i32) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(count) = self.in_flight_per_form.lock().unwrap().get_mut(&id_form) {
            *count -= 1;
        }
    }
}

#[async_trait]
impl BookingSource for MockBookingSource {
    async fn active_forms(&self) -> Result<Vec<Form>, BookingError> {
        let mut forms: Vec<Form> = self.forms.lock().unwrap().values().cloned().collect();
        forms.sort_by_key(|form| form.id_form);
        Ok(forms)
    }

    async fn find_form(&self, id_form: i32) -> Result<Option<Form>, BookingError> {
        Ok(self.forms.lock().unwrap().get(&id_form).cloned())
    }

    async fn find_slot(&self, id_slot: i32) -> Result<Option<Slot>, BookingError> {
        Ok(self.persisted_slots.lock().unwrap().get(&id_slot).cloned())
    }

    async fn build_slots(
        &self,
        id_form: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>, BookingError> {
        self.enter(id_form);
        let delay = *self.build_delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }
        self.leave(id_form);

        if self.failing_forms.lock().unwrap().contains(&id_form) {
            return Err(BookingError::request(format!(
                "Mock failure building slots of form {}",
                id_form
            )));
        }

        Ok(self
            .slots
            .lock()
            .unwrap()
            .get(&id_form)
            .map(|slots| {
                slots
                    .iter()
                    .filter(|slot| {
                        let day = slot.starting_date_time.date();
                        day >= start && day <= end
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_category_label(&self, id_category: i32) -> Result<Option<String>, BookingError> {
        Ok(self.categories.lock().unwrap().get(&id_category).cloned())
    }
}

// Mock Search Provider for testing
#[derive(Default)]
pub struct MockSearchProvider {
    written: Mutex<Vec<SearchDocument>>,
    deletes: Mutex<Vec<String>>,
    fail_writes: Mutex<bool>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn written(&self) -> Vec<SearchDocument> {
        self.written.lock().unwrap().clone()
    }

    pub fn written_uids(&self) -> Vec<String> {
        self.written().into_iter().map(|doc| doc.uid).collect()
    }

    pub fn written_slot_uids(&self) -> Vec<String> {
        self.written()
            .into_iter()
            .filter(|doc| doc.doc_type == "appointment-slot")
            .map(|doc| doc.uid)
            .collect()
    }

    pub fn document(&self, uid: &str) -> Option<SearchDocument> {
        self.written().into_iter().rev().find(|doc| doc.uid == uid)
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndexProvider for MockSearchProvider {
    async fn ensure_ready(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn write_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut summary = BatchOperationSummary::default();
        let fail = *self.fail_writes.lock().unwrap();
        for doc in documents {
            if fail {
                summary.record(doc.uid.clone(), Some(SearchIndexError::write("mock failure")));
            } else {
                self.written.lock().unwrap().push(doc.clone());
                summary.record(doc.uid.clone(), None);
            }
        }
        Ok(summary)
    }

    async fn delete_by_query(&self, query: &DeleteQuery) -> Result<(), SearchIndexError> {
        query.validate()?;
        self.deletes.lock().unwrap().push(query.to_string());
        Ok(())
    }
}

pub fn site() -> SiteConfig {
    SiteConfig::new("lutece", "http://localhost:8080/lutece/")
}

pub fn indexer(
    source: &Arc<MockBookingSource>,
    provider: &Arc<MockSearchProvider>,
) -> Arc<AppointmentIndexer> {
    Arc::new(AppointmentIndexer::new(
        Arc::clone(source) as Arc<dyn BookingSource>,
        Arc::clone(provider) as Arc<dyn SearchIndexProvider>,
        IndexerConfig {
            enabled: true,
            site: site(),
        },
    ))
}

/// Wait until every scheduled rebuild and slot run has finished.
pub async fn wait_idle(coordinator: &ReindexCoordinator) {
    timeout(Duration::from_secs(10), async {
        while !coordinator.is_idle().await {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("coordinator did not become idle");
}
