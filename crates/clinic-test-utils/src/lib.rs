//! Testing utilities for the clinic workspace
//!
//! Store wrappers that count, fail or hold reads, plus record fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use clinic_store::{
    Key, MemoryStore, MutationEvent, Record, Schema, StoreError, StoreHandle, StoreResult, Value,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Counts reads reaching the wrapped store
#[derive(Debug)]
pub struct CountingStore {
    inner: Arc<dyn StoreHandle>,
    reads: Mutex<HashMap<Key, u64>>,
    scans: AtomicU64,
}

impl CountingStore {
    pub fn wrap(inner: Arc<dyn StoreHandle>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reads: Mutex::new(HashMap::new()),
            scans: AtomicU64::new(0),
        })
    }

    pub fn reads_of(&self, key: &Key) -> u64 {
        self.reads.lock().get(key).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> u64 {
        self.reads.lock().values().sum()
    }

    /// Number of `get_all`/`get_all_by_index` calls
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.reads.lock().clear();
        self.scans.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreHandle for CountingStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    async fn get(&self, key: &Key) -> StoreResult<Option<Record>> {
        *self.reads.lock().entry(key.clone()).or_insert(0) += 1;
        self.inner.get(key).await
    }

    async fn get_all(&self) -> StoreResult<Vec<Record>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.get_all().await
    }

    async fn get_all_by_index(&self, field: &str, value: &Value) -> StoreResult<Vec<Record>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.get_all_by_index(field, value).await
    }

    async fn put(&self, record: Record) -> StoreResult<Key> {
        self.inner.put(record).await
    }

    async fn add(&self, record: Record) -> StoreResult<Key> {
        self.inner.add(record).await
    }

    async fn delete(&self, key: &Key) -> StoreResult<()> {
        self.inner.delete(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.inner.clear().await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.inner.count().await
    }

    fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.inner.subscribe()
    }
}

/// Store whose every operation fails with `Unavailable`
#[derive(Debug)]
pub struct FailingStore {
    schema: Schema,
    events: broadcast::Sender<MutationEvent>,
}

impl FailingStore {
    pub fn shared(name: &str) -> Arc<Self> {
        let (events, _) = broadcast::channel(8);
        Arc::new(Self {
            schema: Schema::new(name),
            events,
        })
    }

    fn fail<T>(&self) -> StoreResult<T> {
        Err(StoreError::unavailable(self.schema.name.clone()))
    }
}

#[async_trait]
impl StoreHandle for FailingStore {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn get(&self, _key: &Key) -> StoreResult<Option<Record>> {
        self.fail()
    }

    async fn get_all(&self) -> StoreResult<Vec<Record>> {
        self.fail()
    }

    async fn get_all_by_index(&self, _field: &str, _value: &Value) -> StoreResult<Vec<Record>> {
        self.fail()
    }

    async fn put(&self, _record: Record) -> StoreResult<Key> {
        self.fail()
    }

    async fn add(&self, _record: Record) -> StoreResult<Key> {
        self.fail()
    }

    async fn delete(&self, _key: &Key) -> StoreResult<()> {
        self.fail()
    }

    async fn clear(&self) -> StoreResult<()> {
        self.fail()
    }

    async fn count(&self) -> StoreResult<usize> {
        self.fail()
    }

    fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }
}

/// Holds the next `get_all` until released
///
/// Used to keep one render pass in flight while a newer pass completes.
#[derive(Debug)]
pub struct GatedStore {
    inner: Arc<dyn StoreHandle>,
    hold_next: Mutex<bool>,
    gate: watch::Sender<bool>,
    held: watch::Sender<u64>,
}

impl GatedStore {
    pub fn wrap(inner: Arc<dyn StoreHandle>) -> Arc<Self> {
        let (gate, _) = watch::channel(true);
        let (held, _) = watch::channel(0);
        Arc::new(Self {
            inner,
            hold_next: Mutex::new(false),
            gate,
            held,
        })
    }

    /// Make the next `get_all` wait for [`release`](Self::release)
    pub fn hold_next(&self) {
        self.gate.send_replace(false);
        *self.hold_next.lock() = true;
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Wait until `count` calls in total have been held
    pub async fn wait_until_held(&self, count: u64) {
        let mut rx = self.held.subscribe();
        let _ = rx.wait_for(|held| *held >= count).await;
    }
}

#[async_trait]
impl StoreHandle for GatedStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    async fn get(&self, key: &Key) -> StoreResult<Option<Record>> {
        self.inner.get(key).await
    }

    async fn get_all(&self) -> StoreResult<Vec<Record>> {
        let gate = {
            let mut hold = self.hold_next.lock();
            std::mem::take(&mut *hold).then(|| self.gate.subscribe())
        };
        if let Some(mut gate) = gate {
            self.held.send_modify(|held| *held += 1);
            let _ = gate.wait_for(|open| *open).await;
        }
        self.inner.get_all().await
    }

    async fn get_all_by_index(&self, field: &str, value: &Value) -> StoreResult<Vec<Record>> {
        self.inner.get_all_by_index(field, value).await
    }

    async fn put(&self, record: Record) -> StoreResult<Key> {
        self.inner.put(record).await
    }

    async fn add(&self, record: Record) -> StoreResult<Key> {
        self.inner.add(record).await
    }

    async fn delete(&self, key: &Key) -> StoreResult<()> {
        self.inner.delete(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.inner.clear().await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.inner.count().await
    }

    fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.inner.subscribe()
    }
}

pub fn patient(id: i64, first: &str, last: &str) -> Record {
    Record::new()
        .with("id", id)
        .with("First", first)
        .with("Last", last)
}

pub fn doctor(id: i64, first: &str, last: &str) -> Record {
    Record::new()
        .with("id", id)
        .with("first_name", first)
        .with("last_name", last)
}

pub fn appointment(id: i64, patient_id: i64, doctor_id: i64, date: &str) -> Record {
    Record::new()
        .with("id", id)
        .with("patient_id", patient_id)
        .with("doctor_id", doctor_id)
        .with("date", date)
}

pub fn medicine(id: i64, drug: &str) -> Record {
    Record::new().with("id", id).with("Drug", drug)
}

/// Appointment-related stores with the clinic's schemas
#[derive(Debug, Clone)]
pub struct ClinicFixture {
    pub patients: Arc<MemoryStore>,
    pub doctors: Arc<MemoryStore>,
    pub appointments: Arc<MemoryStore>,
    pub medicines: Arc<MemoryStore>,
}

impl ClinicFixture {
    pub fn empty() -> Self {
        Self {
            patients: MemoryStore::shared(
                Schema::new("patients")
                    .auto_increment()
                    .index("Last")
                    .index("Email"),
            ),
            doctors: MemoryStore::shared(
                Schema::new("doctors")
                    .auto_increment()
                    .index("first_name")
                    .index("last_name"),
            ),
            appointments: MemoryStore::shared(
                Schema::new("appointments")
                    .auto_increment()
                    .index("patient_id")
                    .index("doctor_id")
                    .index("date"),
            ),
            medicines: MemoryStore::shared(Schema::new("medicines")),
        }
    }

    /// Patient 1 "John Doe", doctor 1 "Ada Lovelace", and appointment 10
    /// referencing patient 1 and the nonexistent doctor 2
    pub async fn with_dangling_doctor() -> Self {
        let fixture = Self::empty();
        fixture.patients.put(patient(1, "John", "Doe")).await.unwrap();
        fixture.doctors.put(doctor(1, "Ada", "Lovelace")).await.unwrap();
        fixture
            .appointments
            .put(appointment(10, 1, 2, "2024-05-01"))
            .await
            .unwrap();
        fixture
    }
}
