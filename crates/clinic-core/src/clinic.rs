//! The clinic registry
//!
//! [`Clinic`] owns one explicit connection per entity store and hands them to
//! views, seeding and login. Nothing is global: two `Clinic`s never share a
//! store unless they were built from the same [`ClinicStores`].

use crate::catalog::{new_patient, Entity};
use crate::config::ClinicConfig;
use crate::error::{ClinicError, ClinicResult};
use crate::views;
use clinic_auth::{CredentialStore, Session};
use clinic_store::{Key, MemoryStore, Record, SeedReport, SeedSource, Seeder, StoreHandle, Value};
use clinic_view::{BoundView, RenderBinder, RenderTarget, StoreRef, ViewDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One connection per entity store
#[derive(Debug, Clone)]
pub struct ClinicStores {
    /// Patients
    pub patients: StoreRef,
    /// Doctors
    pub doctors: StoreRef,
    /// Appointments
    pub appointments: StoreRef,
    /// Medicines
    pub medicines: StoreRef,
    /// Admins
    pub admins: StoreRef,
    /// Logins
    pub logins: StoreRef,
}

impl ClinicStores {
    /// Fresh in-memory stores with the catalog schemas
    #[must_use]
    pub fn in_memory() -> Self {
        let open = |entity: Entity| -> StoreRef { MemoryStore::shared(entity.schema()) };
        Self {
            patients: open(Entity::Patients),
            doctors: open(Entity::Doctors),
            appointments: open(Entity::Appointments),
            medicines: open(Entity::Medicines),
            admins: open(Entity::Admins),
            logins: open(Entity::Logins),
        }
    }

    /// Connection for an entity kind
    #[must_use]
    pub fn get(&self, entity: Entity) -> &StoreRef {
        match entity {
            Entity::Patients => &self.patients,
            Entity::Doctors => &self.doctors,
            Entity::Appointments => &self.appointments,
            Entity::Medicines => &self.medicines,
            Entity::Admins => &self.admins,
            Entity::Logins => &self.logins,
        }
    }
}

/// Record counts shown on the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    /// Patients
    pub patients: usize,
    /// Doctors
    pub doctors: usize,
    /// Appointments
    pub appointments: usize,
    /// Medicines
    pub medicines: usize,
}

/// Stores, configuration and the render binder of one clinic
#[derive(Debug)]
pub struct Clinic {
    config: ClinicConfig,
    stores: ClinicStores,
    binder: RenderBinder,
}

impl Clinic {
    /// Create clinic over explicit store connections
    #[must_use]
    pub fn new(config: ClinicConfig, stores: ClinicStores) -> Self {
        let binder = RenderBinder::new(config.view.clone());
        Self {
            config,
            stores,
            binder,
        }
    }

    /// Create clinic over fresh in-memory stores
    #[must_use]
    pub fn in_memory(config: ClinicConfig) -> Self {
        Self::new(config, ClinicStores::in_memory())
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClinicConfig {
        &self.config
    }

    /// Store connections
    #[inline]
    #[must_use]
    pub fn stores(&self) -> &ClinicStores {
        &self.stores
    }

    /// Connection for an entity kind
    #[inline]
    #[must_use]
    pub fn store(&self, entity: Entity) -> &StoreRef {
        self.stores.get(entity)
    }

    /// Render binder
    #[inline]
    #[must_use]
    pub fn binder(&self) -> &RenderBinder {
        &self.binder
    }

    /// Credential store over the logins store
    #[must_use]
    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.stores.logins.clone())
            .with_rounds(self.config.auth.pbkdf2_rounds)
    }

    /// View definition for an entity's table
    ///
    /// Admins render as their dropdown; logins have no table.
    #[must_use]
    pub fn table(&self, entity: Entity) -> Option<ViewDefinition> {
        let sentinels = &self.config.sentinels;
        match entity {
            Entity::Appointments => Some(views::appointments_table(&self.stores, sentinels)),
            Entity::Patients => Some(views::patients_table(&self.stores)),
            Entity::Doctors => Some(views::doctor_options(&self.stores)),
            Entity::Medicines => Some(views::medicines_table(&self.stores)),
            Entity::Admins => Some(views::admin_options(&self.stores)),
            Entity::Logins => None,
        }
    }

    /// Appointments of one patient
    #[must_use]
    pub fn patient_appointments(&self, patient: Key) -> ViewDefinition {
        views::patient_appointments(&self.stores, &self.config.sentinels, patient)
    }

    /// Appointments visible to a session
    #[must_use]
    pub fn appointments_for(&self, session: &Session) -> ViewDefinition {
        views::appointments_for(&self.stores, &self.config.sentinels, session)
    }

    /// Doctors whose name contains `term`
    #[must_use]
    pub fn doctor_search(&self, term: &str) -> ViewDefinition {
        views::doctor_search(&self.stores, term)
    }

    /// Add a medicine to an appointment, optionally replacing its notes
    ///
    /// Reads the full appointment, appends the medicine id and writes the
    /// whole record back. Another writer between the read and the put is
    /// overwritten.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the appointment does not exist
    pub async fn prescribe(
        &self,
        appointment: &Key,
        medicine: Key,
        notes: Option<&str>,
    ) -> ClinicResult<Record> {
        let store = &self.stores.appointments;
        let mut record = store.require(appointment).await?;

        let mut medicines = match record.remove("medicines") {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single],
        };
        medicines.push(medicine.clone().into());
        record.set("medicines", medicines);
        if let Some(notes) = notes {
            record.set("notes", notes);
        }

        store.put(record.clone()).await?;
        info!(%appointment, %medicine, "Medicine prescribed");
        Ok(record)
    }

    /// Bind a view to a render target
    pub async fn bind(&self, target: Arc<dyn RenderTarget>, definition: ViewDefinition) -> BoundView {
        self.binder.bind(target, definition).await
    }

    /// Dashboard counts, read concurrently
    pub async fn counts(&self) -> ClinicResult<DashboardCounts> {
        let (patients, doctors, appointments, medicines) = tokio::try_join!(
            self.stores.patients.count(),
            self.stores.doctors.count(),
            self.stores.appointments.count(),
            self.stores.medicines.count(),
        )?;
        Ok(DashboardCounts {
            patients,
            doctors,
            appointments,
            medicines,
        })
    }

    /// Add a patient from a full name, returning the generated key
    pub async fn add_patient(&self, full_name: &str) -> ClinicResult<Key> {
        Ok(self.stores.patients.add(new_patient(full_name)).await?)
    }

    /// Seed every entity that has a seed plan
    ///
    /// A transient fetch failure for one entity is logged and skipped so the
    /// others still seed; any other failure aborts.
    pub async fn seed_all(&self, source: &dyn SeedSource) -> ClinicResult<Vec<SeedReport>> {
        let seeder = Seeder::new(self.config.seed.batch_size);
        let mut reports = Vec::new();

        for entity in Entity::ALL {
            let Some(plan) = entity.seed_plan() else {
                continue;
            };
            match seeder.seed(self.store(entity).as_ref(), source, &plan).await {
                Ok(report) => reports.push(report),
                Err(err) if err.is_retryable() => {
                    warn!(entity = %entity, error = %err, "Seeding skipped");
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(entities = reports.len(), "Seeding finished");
        Ok(reports)
    }

    /// Seed from the configured source
    ///
    /// # Errors
    /// - `ClinicError::Config` if neither `seed.dir` nor `seed.base_url` is set
    pub async fn seed_from_config(&self) -> ClinicResult<Vec<SeedReport>> {
        let source = self
            .config
            .seed
            .source()
            .ok_or_else(|| ClinicError::config("no seed.dir or seed.base_url configured"))?;
        self.seed_all(source.as_ref()).await
    }

    /// Create the login of an existing admin
    pub async fn create_admin_login(&self, admin_id: &Key, password: &str) -> ClinicResult<Key> {
        Ok(self
            .credentials()
            .create_admin_login(self.stores.admins.as_ref(), admin_id, password)
            .await?)
    }

    /// Log in
    pub async fn login(&self, username: &str, password: &str) -> ClinicResult<Session> {
        Ok(self.credentials().authenticate(username, password).await?)
    }
}
