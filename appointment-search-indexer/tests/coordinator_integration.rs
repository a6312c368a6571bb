//! Integration tests for the reindex coordinator.
//!
//! These tests drive the real ReindexCoordinator and AppointmentIndexer with
//! in-memory booking source and search provider. Time is paused so slow
//! backends are simulated without slowing the tests down.

mod common;

use std::sync::Arc;
use std::time::Duration;

use appointment_search_indexer::config::CoordinatorConfig;
use appointment_search_indexer::coordinator::{FormRunState, ReindexCoordinator};
use appointment_search_shared::Form;
use chrono::Duration as DateDuration;
use tokio::time::sleep;

use common::{indexer, slot, today, wait_idle, MockBookingSource, MockSearchProvider};

fn coordinator(
    source: &Arc<MockBookingSource>,
    provider: &Arc<MockSearchProvider>,
    max_concurrent_form_rebuilds: usize,
) -> ReindexCoordinator {
    ReindexCoordinator::new(
        indexer(source, provider),
        CoordinatorConfig {
            max_concurrent_form_rebuilds,
        },
    )
}

#[tokio::test(start_paused = true)]
async fn test_events_during_rebuild_coalesce_into_one_trailing_rebuild() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    source.add_form(Form::new(1, "Passports"), vec![slot(1, 9, 10, 1)]);
    source.set_build_delay(Duration::from_millis(100));
    let coordinator = coordinator(&source, &provider, 4);

    coordinator.on_form_updated(1);
    assert_eq!(coordinator.form_state(1), FormRunState::Running);

    // Let the rebuild start and block in the slow backend.
    sleep(Duration::from_millis(10)).await;
    for _ in 0..5 {
        coordinator.on_form_updated(1);
    }
    assert_eq!(coordinator.form_state(1), FormRunState::RunningPending);

    wait_idle(&coordinator).await;

    assert_eq!(coordinator.form_state(1), FormRunState::Idle);
    assert_eq!(source.build_calls(1), 2);
    assert_eq!(source.max_in_flight_per_form(), 1);
    assert_eq!(provider.deletes().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_event_rebuilds_once() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    source.add_form(Form::new(1, "Passports"), vec![slot(1, 9, 10, 1)]);
    let coordinator = coordinator(&source, &provider, 4);

    coordinator.on_form_created(1);
    wait_idle(&coordinator).await;

    assert_eq!(source.build_calls(1), 1);
    assert_eq!(
        provider.deletes(),
        vec!["uid:lutece_1_appointment OR uid_form_string:lutece_1_appointment".to_string()]
    );
    assert!(provider
        .written_uids()
        .contains(&"1_appointment".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_rebuild_of_missing_form_only_deletes() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    let coordinator = coordinator(&source, &provider, 4);

    coordinator.on_form_updated(8);
    wait_idle(&coordinator).await;

    assert_eq!(provider.deletes().len(), 1);
    assert!(provider.written().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_rebuild_returns_to_idle() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    source.add_form(Form::new(1, "Broken"), vec![slot(1, 9, 10, 1)]);
    source.fail_form(1);
    let coordinator = coordinator(&source, &provider, 4);

    coordinator.on_form_updated(1);
    wait_idle(&coordinator).await;

    assert_eq!(coordinator.form_state(1), FormRunState::Idle);

    // A later event starts a new rebuild.
    coordinator.on_form_updated(1);
    wait_idle(&coordinator).await;
    assert_eq!(source.build_calls(1), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rebuilds_are_bounded_by_the_pool() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    for id_form in 1..=5 {
        source.add_form(Form::new(id_form, "Form"), vec![slot(id_form, 9, 10, 1)]);
    }
    source.set_build_delay(Duration::from_millis(50));
    let coordinator = coordinator(&source, &provider, 2);

    for id_form in 1..=5 {
        coordinator.on_form_updated(id_form);
    }
    wait_idle(&coordinator).await;

    assert_eq!(source.max_in_flight(), 2);
    for id_form in 1..=5 {
        assert_eq!(source.build_calls(id_form), 1);
    }
}

#[tokio::test]
async fn test_form_removed_deletes_inline() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    let coordinator = coordinator(&source, &provider, 4);

    coordinator.on_form_removed(3).await;

    assert_eq!(
        provider.deletes(),
        vec!["uid:lutece_3_appointment OR uid_form_string:lutece_3_appointment".to_string()]
    );
    assert!(coordinator.is_idle().await);
}

#[tokio::test(start_paused = true)]
async fn test_period_change_is_gated_by_display_window() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    source.add_form(Form::new(1, "Passports"), vec![slot(1, 9, 10, 1)]);
    let coordinator = coordinator(&source, &provider, 4);

    let far = today() + DateDuration::days(60);
    coordinator
        .on_form_period_changed(1, far, far + DateDuration::days(7))
        .await;
    assert!(coordinator.is_idle().await);
    assert_eq!(source.build_calls(1), 0);

    coordinator
        .on_form_period_changed(1, today(), today() + DateDuration::days(7))
        .await;
    wait_idle(&coordinator).await;
    assert_eq!(source.build_calls(1), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slot_change_outside_window_is_ignored() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    source.add_form(Form::new(1, "Passports"), vec![slot(1, 9, 10, 1)]);
    let coordinator = coordinator(&source, &provider, 4);

    let mut far = slot(1, 9, 10, 1);
    far.starting_date_time += DateDuration::days(60);
    far.ending_date_time += DateDuration::days(60);
    coordinator.on_slot_changed(far).await;

    assert!(coordinator.is_idle().await);
    assert!(provider.written().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_week_count_keeps_events_flowing() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    let mut form = Form::new(1, "Passports");
    form.nb_weeks_to_display = i32::MAX;
    let mut far_slot = slot(1, 9, 10, 1);
    far_slot.starting_date_time += DateDuration::days(3650);
    far_slot.ending_date_time += DateDuration::days(3650);
    source.add_form(form, vec![slot(1, 9, 10, 1), far_slot.clone()]);
    let coordinator = coordinator(&source, &provider, 4);

    let far = far_slot.starting_date_time.date();
    coordinator
        .on_form_period_changed(1, far, far + DateDuration::days(7))
        .await;
    wait_idle(&coordinator).await;
    assert_eq!(source.build_calls(1), 1);
    assert_eq!(provider.written_slot_uids().len(), 2);

    coordinator.on_slot_changed(far_slot.clone()).await;
    wait_idle(&coordinator).await;
    assert_eq!(source.build_calls(1), 2);
    let written = provider.written_slot_uids();
    assert_eq!(written.len(), 3);
    assert_eq!(
        written.last().cloned(),
        Some(format!(
            "F1D{}_appointment-slot",
            far_slot.starting_date_time.format("%Y%m%dT%H%M%S")
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn test_slot_queue_is_fifo_and_merges_same_form() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    source.add_form(
        Form::new(1, "One"),
        vec![slot(1, 9, 10, 1), slot(1, 11, 12, 1)],
    );
    source.add_form(
        Form::new(2, "Two"),
        vec![slot(2, 9, 10, 1), slot(2, 11, 12, 1)],
    );
    source.set_build_delay(Duration::from_millis(50));
    let coordinator = coordinator(&source, &provider, 4);

    coordinator.on_slot_changed(slot(1, 9, 10, 1)).await;
    coordinator.on_slot_changed(slot(2, 9, 10, 1)).await;
    coordinator.on_slot_changed(slot(1, 11, 12, 1)).await;
    coordinator.on_slot_changed(slot(2, 11, 12, 1)).await;
    assert_eq!(coordinator.pending_slot_count().await, 3);

    wait_idle(&coordinator).await;

    let expected: Vec<String> = [(1, 9), (1, 11), (2, 9), (2, 11)]
        .iter()
        .map(|(id_form, hour)| {
            format!(
                "F{}D{}_appointment-slot",
                id_form,
                common::at(*hour).format("%Y%m%dT%H%M%S")
            )
        })
        .collect();
    assert_eq!(provider.written_slot_uids(), expected);

    // Queued slots of a form are merged into the run of its first slot.
    assert_eq!(source.build_calls(1), 1);
    assert_eq!(source.build_calls(2), 1);
    assert_eq!(source.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_appointment_created_reindexes_slot() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    source.add_form(Form::new(1, "One"), vec![slot(1, 9, 10, 0)]);
    let mut booked = slot(1, 9, 10, 0);
    booked.id_slot = Some(12);
    source.add_persisted_slot(12, booked);
    let coordinator = coordinator(&source, &provider, 4);

    coordinator.on_appointment_created(12).await;
    coordinator.on_appointment_created(99).await;
    wait_idle(&coordinator).await;

    assert_eq!(provider.written_slot_uids().len(), 1);
    assert_eq!(
        provider
            .document("1_appointment")
            .and_then(|doc| doc.long_field("appointment_nb_free_places")),
        Some(0)
    );
}

#[tokio::test]
async fn test_slot_removed_deletes_inline() {
    let source = Arc::new(MockBookingSource::new());
    let provider = Arc::new(MockSearchProvider::new());
    let coordinator = coordinator(&source, &provider, 4);

    coordinator.on_slot_removed(slot(4, 9, 10, 1)).await;

    assert_eq!(provider.deletes().len(), 1);
    assert!(provider.deletes()[0].starts_with("uid:lutece_F4D"));
}
