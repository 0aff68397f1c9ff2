//! Entity catalog: store schemas and seed plans per entity kind

use clinic_store::{FieldMapping, Record, Schema, SeedMode, SeedPlan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every entity kind the clinic stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    /// Patients
    Patients,
    /// Doctors
    Doctors,
    /// Appointments between a patient and a doctor
    Appointments,
    /// Medicines that can be prescribed
    Medicines,
    /// Admin accounts
    Admins,
    /// Login credentials
    Logins,
}

impl Entity {
    /// All entity kinds, in seeding order
    pub const ALL: [Entity; 6] = [
        Entity::Admins,
        Entity::Patients,
        Entity::Doctors,
        Entity::Medicines,
        Entity::Appointments,
        Entity::Logins,
    ];

    /// Store name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Patients => "patients",
            Entity::Doctors => "doctors",
            Entity::Appointments => "appointments",
            Entity::Medicines => "medicines",
            Entity::Admins => "admins",
            Entity::Logins => "logins",
        }
    }

    /// Store schema
    #[must_use]
    pub fn schema(&self) -> Schema {
        let schema = Schema::new(self.name());
        match self {
            Entity::Patients => schema.auto_increment().index("Last").index("Email"),
            Entity::Doctors => schema
                .auto_increment()
                .index("first_name")
                .index("last_name"),
            Entity::Appointments => schema
                .auto_increment()
                .index("patient_id")
                .index("doctor_id")
                .index("date"),
            Entity::Medicines => schema,
            Entity::Admins => schema.unique_index("email"),
            Entity::Logins => schema.auto_increment().unique_index("username"),
        }
    }

    /// Seed plan, or `None` for entities with no seed data
    #[must_use]
    pub fn seed_plan(&self) -> Option<SeedPlan> {
        let plan = SeedPlan::new(self.name());
        match self {
            Entity::Patients | Entity::Doctors => Some(plan),
            Entity::Medicines => Some(
                plan.with_mode(SeedMode::AddIfAbsent)
                    .with_mapping(FieldMapping::project(["id", "Drug"])),
            ),
            Entity::Admins => Some(plan.with_source("admin").with_mode(SeedMode::Upsert)),
            Entity::Appointments | Entity::Logins => None,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entity::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| format!("unknown entity '{s}'"))
    }
}

/// New patient record from a full name
///
/// The name is split on its first space into `First` and `Last`; the other
/// patient fields start blank.
#[must_use]
pub fn new_patient(full_name: &str) -> Record {
    let mut record = Record::new()
        .with("NHS", "")
        .with("Title", "")
        .with("name", full_name);
    FieldMapping::split_name("name", "First", "Last").apply(&mut record);
    for field in ["DOB", "Gender", "Address", "Email", "Telephone"] {
        record.set(field, "");
    }
    record
}
