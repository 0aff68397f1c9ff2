//! Uniform asynchronous store handle
//!
//! [`StoreHandle`] is the only way records are read or mutated. Components that
//! join across stores hold several handles but only ever call the read methods
//! on stores they do not own.

use crate::error::{StoreError, StoreResult};
use crate::schema::Schema;
use crate::value::{Key, Record, Value};
use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::broadcast;

/// Kind of mutation applied to a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// New record inserted
    Added,
    /// Existing record replaced
    Updated,
    /// Record removed
    Deleted,
    /// All records removed
    Cleared,
}

/// Notification emitted after a successful mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    /// Store that changed
    pub store: String,
    /// What happened
    pub kind: MutationKind,
    /// Affected key (`None` for [`MutationKind::Cleared`])
    pub key: Option<Key>,
}

/// Asynchronous handle over one local store
///
/// Every operation may suspend and every failure is a distinguishable
/// [`StoreError`].
///
/// # Replace semantics
///
/// [`put`](StoreHandle::put) with an existing key replaces the stored record
/// wholesale. Fields missing from the new record are gone afterwards; nothing
/// is merged. Read, modify and write back the full record to change one field.
#[async_trait]
pub trait StoreHandle: Send + Sync + Debug {
    /// Store name
    fn name(&self) -> &str;

    /// Store schema
    fn schema(&self) -> &Schema;

    /// Fetch record by key, `None` if absent
    async fn get(&self, key: &Key) -> StoreResult<Option<Record>>;

    /// Fetch record by key, failing with [`StoreError::NotFound`] if absent
    async fn require(&self, key: &Key) -> StoreResult<Record> {
        self.get(key)
            .await?
            .ok_or_else(|| StoreError::not_found(self.name(), key.clone()))
    }

    /// All records in insertion order
    async fn get_all(&self) -> StoreResult<Vec<Record>>;

    /// Records whose indexed `field` equals `value`, in insertion order
    ///
    /// # Errors
    /// - `StoreError::UnknownIndex` if `field` is not indexed
    async fn get_all_by_index(&self, field: &str, value: &Value) -> StoreResult<Vec<Record>>;

    /// Insert or fully replace a record, returning its key
    async fn put(&self, record: Record) -> StoreResult<Key>;

    /// Insert a record, failing if its key already exists
    async fn add(&self, record: Record) -> StoreResult<Key>;

    /// Remove record by key
    ///
    /// # Errors
    /// - `StoreError::NotFound` if no record has that key
    async fn delete(&self, key: &Key) -> StoreResult<()>;

    /// Remove every record
    async fn clear(&self) -> StoreResult<()>;

    /// Number of records
    async fn count(&self) -> StoreResult<usize>;

    /// Subscribe to mutation events
    fn subscribe(&self) -> broadcast::Receiver<MutationEvent>;
}
