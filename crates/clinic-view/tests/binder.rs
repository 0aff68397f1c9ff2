//! Integration tests for live-bound views

use clinic_store::{Key, MemoryStore, Record, StoreHandle};
use clinic_test_utils::{
    appointment, patient, ClinicFixture, CountingStore, FailingStore, GatedStore,
};
use clinic_view::{
    AllRecords, JoinBinding, JoinResolver, MemoryTarget, PassOutcome, RenderBinder, RenderUnit,
    StoreRef, ViewConfig, ViewDefinition, ViewError, ViewState,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn appointments_view(appointments: StoreRef, patients: StoreRef, doctors: StoreRef) -> ViewDefinition {
    let resolver = JoinResolver::new(vec![
        JoinBinding::one("patient_id", patients, "patient")
            .with_label(["First", "Last"])
            .with_sentinel("Unknown Patient"),
        JoinBinding::one("doctor_id", doctors, "doctor")
            .with_label(["first_name", "last_name"])
            .with_sentinel("Unknown Doctor"),
    ]);
    ViewDefinition::new(AllRecords::new(appointments), resolver, |row| {
        format!(
            "{} | {} | {} | {}",
            row.text("id"),
            row.label("patient"),
            row.label("doctor"),
            row.text("date")
        )
    })
}

fn fixture_view(fixture: &ClinicFixture) -> ViewDefinition {
    appointments_view(
        fixture.appointments.clone(),
        fixture.patients.clone(),
        fixture.doctors.clone(),
    )
}

async fn wait(view: &clinic_view::BoundView, generation: u64) {
    tokio::time::timeout(Duration::from_secs(5), view.wait_for_generation(generation))
        .await
        .expect("pass did not complete in time");
}

#[tokio::test]
async fn dangling_doctor_renders_sentinel() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    let binder = RenderBinder::default();
    let target = MemoryTarget::shared("appointmentsTableBody");

    let view = binder.bind(target.clone(), fixture_view(&fixture)).await;

    assert_eq!(
        target.units(),
        vec![RenderUnit::Row(
            "10 | John Doe | Unknown Doctor | 2024-05-01".to_string()
        )]
    );
    assert_eq!(target.error(), None);
    assert_eq!(view.state(), ViewState::Rendered);
}

#[tokio::test]
async fn shared_reference_read_once_per_pass() {
    let fixture = ClinicFixture::empty();
    fixture.patients.put(patient(1, "John", "Doe")).await.unwrap();
    for id in 0..5 {
        fixture
            .appointments
            .put(appointment(id, 1, 7, "2024-05-01"))
            .await
            .unwrap();
    }
    let patients = CountingStore::wrap(fixture.patients.clone());
    let doctors = CountingStore::wrap(fixture.doctors.clone());
    let definition = appointments_view(fixture.appointments.clone(), patients.clone(), doctors.clone());

    let rows = definition.rows().await.unwrap();

    assert_eq!(rows.len(), 5);
    assert_eq!(patients.reads_of(&Key::Int(1)), 1);
    assert_eq!(doctors.reads_of(&Key::Int(7)), 1);

    // A second pass starts with a fresh cache
    definition.rows().await.unwrap();
    assert_eq!(patients.reads_of(&Key::Int(1)), 2);
}

#[tokio::test]
async fn row_count_tracks_store_and_empty_shows_placeholder() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    let binder = RenderBinder::default();
    let target = MemoryTarget::shared("appointmentsTableBody");
    let view = binder.bind(target.clone(), fixture_view(&fixture)).await;

    let generation = view.generation();
    fixture
        .appointments
        .add(Record::new().with("patient_id", 1).with("doctor_id", 1))
        .await
        .unwrap();
    wait(&view, generation + 1).await;
    assert_eq!(
        target.row_count(),
        fixture.appointments.count().await.unwrap()
    );

    let generation = view.generation();
    fixture.appointments.clear().await.unwrap();
    wait(&view, generation + 1).await;
    assert_eq!(
        target.units(),
        vec![RenderUnit::Placeholder("No records found.".to_string())]
    );
}

#[tokio::test]
async fn join_target_mutation_rerenders() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    let binder = RenderBinder::default();
    let target = MemoryTarget::shared("appointmentsTableBody");
    let view = binder.bind(target.clone(), fixture_view(&fixture)).await;

    let generation = view.generation();
    fixture
        .doctors
        .put(clinic_test_utils::doctor(2, "Alan", "Turing"))
        .await
        .unwrap();
    wait(&view, generation + 1).await;

    assert_eq!(
        target.render_text(),
        "10 | John Doe | Alan Turing | 2024-05-01"
    );
}

#[tokio::test]
async fn custom_placeholder() {
    let fixture = ClinicFixture::empty();
    let binder = RenderBinder::new(
        ViewConfig::default().with_empty_placeholder("No appointments found."),
    );
    let target = MemoryTarget::shared("appointmentsTableBody");
    binder.bind(target.clone(), fixture_view(&fixture)).await;

    assert_eq!(target.render_text(), "No appointments found.");
    assert_eq!(target.row_count(), 0);
}

#[tokio::test]
async fn two_targets_render_identically() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    fixture
        .appointments
        .put(appointment(11, 1, 1, "2024-06-02"))
        .await
        .unwrap();
    let binder = RenderBinder::default();
    let first = MemoryTarget::shared("tableA");
    let second = MemoryTarget::shared("tableB");

    binder.bind(first.clone(), fixture_view(&fixture)).await;
    binder.bind(second.clone(), fixture_view(&fixture)).await;

    assert_eq!(first.units(), second.units());
    assert_eq!(first.render_text(), second.render_text());
    assert_eq!(binder.bound_count(), 2);
}

#[tokio::test]
async fn stale_pass_is_discarded() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    let gated = GatedStore::wrap(fixture.appointments.clone());
    let binder = RenderBinder::default();
    let target = MemoryTarget::shared("appointmentsTableBody");
    let definition = appointments_view(
        gated.clone(),
        fixture.patients.clone(),
        fixture.doctors.clone(),
    );
    let view = binder.bind(target.clone(), definition).await;
    assert_eq!(view.generation(), 1);

    gated.hold_next();
    let slow = tokio::spawn({
        let view = view.clone();
        async move { view.refresh().await }
    });
    gated.wait_until_held(1).await;

    gated.put(appointment(11, 1, 1, "2024-06-02")).await.unwrap();
    wait(&view, 2).await;
    assert_eq!(target.row_count(), 2);

    gated.release();
    let outcome = slow.await.unwrap().unwrap();

    assert_eq!(outcome, PassOutcome::Superseded);
    assert_eq!(target.snapshot().replacements, 2);
    assert_eq!(target.row_count(), 2);
    assert_eq!(view.state(), ViewState::Rendered);
}

#[tokio::test]
async fn failed_query_keeps_last_good_render() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    let binder = RenderBinder::default();
    let target = MemoryTarget::shared("appointmentsTableBody");
    let view = binder.bind(target.clone(), fixture_view(&fixture)).await;
    let before = target.units();

    fixture.appointments.close();
    let outcome = view.refresh().await.unwrap();

    assert!(matches!(outcome, PassOutcome::Failed(_)));
    assert_eq!(target.units(), before);
    assert_eq!(view.last_rendered(), Some(before));
    assert!(target.error().unwrap().contains("unavailable"));
    assert_eq!(view.state(), ViewState::Rendered);

    fixture.appointments.reopen();
    let outcome = view.refresh().await.unwrap();
    assert_eq!(
        outcome,
        PassOutcome::Applied {
            rows: 1,
            failed_references: 0
        }
    );
    assert_eq!(target.error(), None);
}

#[tokio::test]
async fn unreadable_reference_raises_indicator() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    let binder = RenderBinder::default();
    let target = MemoryTarget::shared("appointmentsTableBody");
    let definition = appointments_view(
        fixture.appointments.clone(),
        fixture.patients.clone(),
        FailingStore::shared("doctors"),
    );

    let view = binder.bind(target.clone(), definition).await;

    assert_eq!(
        target.render_text(),
        "10 | John Doe | Unknown Doctor | 2024-05-01"
    );
    assert_eq!(
        target.error().as_deref(),
        Some("1 references could not be loaded")
    );
    assert_eq!(
        view.refresh().await.unwrap(),
        PassOutcome::Applied {
            rows: 1,
            failed_references: 1
        }
    );
}

#[tokio::test]
async fn unbind_stops_updates() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    let binder = RenderBinder::default();
    let target = MemoryTarget::shared("appointmentsTableBody");
    let view = binder.bind(target.clone(), fixture_view(&fixture)).await;

    assert!(binder.unbind("appointmentsTableBody"));
    assert_eq!(view.state(), ViewState::Unbound);
    assert!(!binder.is_bound("appointmentsTableBody"));

    fixture
        .appointments
        .put(appointment(11, 1, 1, "2024-06-02"))
        .await
        .unwrap();
    tokio::task::yield_now().await;

    assert_eq!(target.snapshot().replacements, 1);
    assert!(matches!(view.refresh().await, Err(ViewError::Unbound(id)) if id == "appointmentsTableBody"));
}

#[tokio::test]
async fn rebinding_a_target_replaces_the_old_binding() {
    let fixture = ClinicFixture::with_dangling_doctor().await;
    let binder = RenderBinder::default();
    let target = MemoryTarget::shared("appointmentsTableBody");

    let old = binder.bind(target.clone(), fixture_view(&fixture)).await;
    let new = binder.bind(target.clone(), fixture_view(&fixture)).await;

    assert!(!old.is_bound());
    assert!(new.is_bound());
    assert_eq!(binder.bound_count(), 1);
}

#[tokio::test]
async fn query_sources_and_join_targets_are_deduplicated() {
    let patients: Arc<MemoryStore> = ClinicFixture::empty().patients;
    let resolver = JoinResolver::new(vec![JoinBinding::one("referrer_id", patients.clone(), "referrer")]);
    let definition = ViewDefinition::new(AllRecords::new(patients), resolver, |row| row.text("id"));

    assert_eq!(definition.sources().len(), 1);
}
