//! Standard joins and view definitions
//!
//! Every page of the clinic UI is one of these definitions bound to a target.
//! The appointment joins are declared once here and shared by every view that
//! shows appointments.

use crate::clinic::ClinicStores;
use crate::config::SentinelConfig;
use clinic_auth::{Role, Session};
use clinic_store::{Key, Record};
use clinic_view::{
    AllRecords, IndexedRecords, JoinBinding, JoinResolver, TextSearch, ViewDefinition, ViewRow,
};

/// Appointment → patient
#[must_use]
pub fn patient_join(stores: &ClinicStores, sentinels: &SentinelConfig) -> JoinBinding {
    JoinBinding::one("patient_id", stores.patients.clone(), "patient")
        .with_label(["First", "Last"])
        .with_sentinel(&sentinels.patient)
}

/// Appointment → doctor
#[must_use]
pub fn doctor_join(stores: &ClinicStores, sentinels: &SentinelConfig) -> JoinBinding {
    JoinBinding::one("doctor_id", stores.doctors.clone(), "doctor")
        .with_label(["first_name", "last_name"])
        .with_sentinel(&sentinels.doctor)
}

/// Appointment → prescribed medicines
#[must_use]
pub fn medicines_join(stores: &ClinicStores, sentinels: &SentinelConfig) -> JoinBinding {
    JoinBinding::many("medicines", stores.medicines.clone(), "medicines")
        .with_label(["Drug"])
        .with_sentinel(&sentinels.medicine)
}

/// Resolver for appointment rows
#[must_use]
pub fn appointment_resolver(stores: &ClinicStores, sentinels: &SentinelConfig) -> JoinResolver {
    JoinResolver::new(vec![
        patient_join(stores, sentinels),
        doctor_join(stores, sentinels),
        medicines_join(stores, sentinels),
    ])
}

/// `id | patient | doctor | date`, then notes and medicines when present
#[must_use]
pub fn render_appointment(row: &ViewRow) -> String {
    let mut line = format!(
        "{} | {} | {} | {}",
        row.text("id"),
        row.label("patient"),
        row.label("doctor"),
        row.text("date")
    );
    let notes = row.text("notes");
    if !notes.trim().is_empty() {
        line.push_str(" | ");
        line.push_str(notes.trim());
    }
    let medicines = row.labels("medicines");
    if !medicines.is_empty() {
        line.push_str(" | Rx: ");
        line.push_str(&medicines.join(", "));
    }
    line
}

fn full_name(record: &Record, first: &str, last: &str) -> String {
    [record.text(first), record.text(last)]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every appointment
#[must_use]
pub fn appointments_table(stores: &ClinicStores, sentinels: &SentinelConfig) -> ViewDefinition {
    ViewDefinition::new(
        AllRecords::new(stores.appointments.clone()),
        appointment_resolver(stores, sentinels),
        render_appointment,
    )
}

/// Appointments of one patient
#[must_use]
pub fn patient_appointments(
    stores: &ClinicStores,
    sentinels: &SentinelConfig,
    patient: Key,
) -> ViewDefinition {
    ViewDefinition::new(
        IndexedRecords::new(stores.appointments.clone(), "patient_id", patient),
        appointment_resolver(stores, sentinels),
        render_appointment,
    )
}

/// Appointments of one doctor
#[must_use]
pub fn doctor_appointments(
    stores: &ClinicStores,
    sentinels: &SentinelConfig,
    doctor: Key,
) -> ViewDefinition {
    ViewDefinition::new(
        IndexedRecords::new(stores.appointments.clone(), "doctor_id", doctor),
        appointment_resolver(stores, sentinels),
        render_appointment,
    )
}

/// Appointments visible to a session: patients see their own, everyone else
/// sees all
#[must_use]
pub fn appointments_for(
    stores: &ClinicStores,
    sentinels: &SentinelConfig,
    session: &Session,
) -> ViewDefinition {
    match session.role {
        Role::Patient => patient_appointments(stores, sentinels, session.user.clone()),
        Role::Doctor => doctor_appointments(stores, sentinels, session.user.clone()),
        Role::Admin => appointments_table(stores, sentinels),
    }
}

/// Patient table: `id | name | email | telephone`
#[must_use]
pub fn patients_table(stores: &ClinicStores) -> ViewDefinition {
    ViewDefinition::new(
        AllRecords::new(stores.patients.clone()),
        JoinResolver::default(),
        |row| {
            format!(
                "{} | {} | {} | {}",
                row.text("id"),
                full_name(row.record(), "First", "Last"),
                row.text("Email"),
                row.text("Telephone")
            )
        },
    )
}

/// Patient dropdown: `id - First Last`
#[must_use]
pub fn patient_options(stores: &ClinicStores) -> ViewDefinition {
    ViewDefinition::new(
        AllRecords::new(stores.patients.clone()),
        JoinResolver::default(),
        |row| format!("{} - {}", row.text("id"), full_name(row.record(), "First", "Last")),
    )
}

/// Doctor dropdown: `id - first_name last_name`
#[must_use]
pub fn doctor_options(stores: &ClinicStores) -> ViewDefinition {
    ViewDefinition::new(
        AllRecords::new(stores.doctors.clone()),
        JoinResolver::default(),
        |row| {
            format!(
                "{} - {}",
                row.text("id"),
                full_name(row.record(), "first_name", "last_name")
            )
        },
    )
}

/// Doctors whose first or last name contains `term`, ignoring case:
/// `id | name | email | Telephone`
#[must_use]
pub fn doctor_search(stores: &ClinicStores, term: &str) -> ViewDefinition {
    ViewDefinition::new(
        TextSearch::new(stores.doctors.clone(), ["first_name", "last_name"], term),
        JoinResolver::default(),
        |row| {
            format!(
                "{} | {} | {} | {}",
                row.text("id"),
                full_name(row.record(), "first_name", "last_name"),
                row.text("email"),
                row.text("Telephone")
            )
        },
    )
}

/// Admin dropdown: `id - first_name last_name`
#[must_use]
pub fn admin_options(stores: &ClinicStores) -> ViewDefinition {
    ViewDefinition::new(
        AllRecords::new(stores.admins.clone()),
        JoinResolver::default(),
        |row| {
            format!(
                "{} - {}",
                row.text("id"),
                full_name(row.record(), "first_name", "last_name")
            )
        },
    )
}

/// Medicine table: `id | Drug`
#[must_use]
pub fn medicines_table(stores: &ClinicStores) -> ViewDefinition {
    ViewDefinition::new(
        AllRecords::new(stores.medicines.clone()),
        JoinResolver::default(),
        |row| format!("{} | {}", row.text("id"), row.text("Drug")),
    )
}
