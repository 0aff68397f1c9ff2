//! In-process store implementation
//!
//! Records live in an insertion-ordered map behind a synchronous lock. The lock
//! is never held across an `.await`, so each operation is atomic with respect
//! to every other operation on the same store.

use crate::error::{StoreError, StoreResult};
use crate::handle::{MutationEvent, MutationKind, StoreHandle};
use crate::schema::Schema;
use crate::value::{Key, Record, Value};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Buffered mutation events per subscriber
const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
struct StoreState {
    open: bool,
    records: IndexMap<Key, Record>,
    /// Highest integer key seen or generated
    last_key: i64,
}

/// In-memory store with mutation notifications
#[derive(Debug)]
pub struct MemoryStore {
    schema: Schema,
    state: RwLock<StoreState>,
    events: broadcast::Sender<MutationEvent>,
}

impl MemoryStore {
    /// Create open, empty store
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            schema,
            state: RwLock::new(StoreState {
                open: true,
                records: IndexMap::new(),
                last_key: 0,
            }),
            events,
        }
    }

    /// Create store behind an `Arc`
    #[inline]
    #[must_use]
    pub fn shared(schema: Schema) -> Arc<Self> {
        Arc::new(Self::new(schema))
    }

    /// Close the connection; every later operation fails with `Unavailable`
    pub fn close(&self) {
        self.state.write().open = false;
        tracing::debug!(store = %self.schema.name, "store closed");
    }

    /// Reopen a closed connection
    pub fn reopen(&self) {
        self.state.write().open = true;
    }

    /// Check if connection is open
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.read().open
    }

    fn ensure_open(&self, state: &StoreState) -> StoreResult<()> {
        if state.open {
            Ok(())
        } else {
            Err(StoreError::unavailable(&self.schema.name))
        }
    }

    /// Resolve the record's key, generating one when the schema allows it
    fn assign_key(&self, state: &StoreState, record: &mut Record) -> StoreResult<Key> {
        let key_field = &self.schema.key_field;
        match record.get(key_field) {
            Some(value) if !value.is_null() => value.as_key().ok_or_else(|| {
                StoreError::Serialization(format!(
                    "field '{key_field}' in store '{}' is not a valid key: {value:?}",
                    self.schema.name
                ))
            }),
            _ if self.schema.auto_increment => {
                let key = state.last_key.checked_add(1).ok_or_else(|| {
                    StoreError::KeySpaceExhausted {
                        store: self.schema.name.clone(),
                    }
                })?;
                record.set(key_field.clone(), key);
                Ok(Key::Int(key))
            }
            _ => Err(StoreError::MissingKey {
                store: self.schema.name.clone(),
                key_field: key_field.clone(),
            }),
        }
    }

    fn check_unique(&self, state: &StoreState, record: &Record, own_key: &Key) -> StoreResult<()> {
        for index in self.schema.unique_indexes() {
            let Some(value) = record.get(&index.field).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = state.records.iter().any(|(key, existing)| {
                key != own_key
                    && existing
                        .get(&index.field)
                        .is_some_and(|other| other.index_eq(value))
            });
            if clash {
                return Err(StoreError::constraint(&self.schema.name, &index.field, value));
            }
        }
        Ok(())
    }

    fn insert(&self, mut record: Record, allow_replace: bool) -> StoreResult<Key> {
        let (key, kind) = {
            let mut state = self.state.write();
            self.ensure_open(&state)?;

            let key = self.assign_key(&state, &mut record)?;
            let exists = state.records.contains_key(&key);
            if exists && !allow_replace {
                return Err(StoreError::constraint(
                    &self.schema.name,
                    &self.schema.key_field,
                    &key,
                ));
            }
            self.check_unique(&state, &record, &key)?;

            if let Key::Int(i) = key {
                state.last_key = state.last_key.max(i);
            }
            state.records.insert(key.clone(), record);

            let kind = if exists {
                MutationKind::Updated
            } else {
                MutationKind::Added
            };
            (key, kind)
        };

        tracing::debug!(store = %self.schema.name, %key, ?kind, "record written");
        self.emit(kind, Some(key.clone()));
        Ok(key)
    }

    fn emit(&self, kind: MutationKind, key: Option<Key>) {
        // No receivers is not an error
        let _ = self.events.send(MutationEvent {
            store: self.schema.name.clone(),
            kind,
            key,
        });
    }
}

#[async_trait]
impl StoreHandle for MemoryStore {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn get(&self, key: &Key) -> StoreResult<Option<Record>> {
        let state = self.state.read();
        self.ensure_open(&state)?;
        Ok(state.records.get(key).cloned())
    }

    async fn get_all(&self) -> StoreResult<Vec<Record>> {
        let state = self.state.read();
        self.ensure_open(&state)?;
        Ok(state.records.values().cloned().collect())
    }

    async fn get_all_by_index(&self, field: &str, value: &Value) -> StoreResult<Vec<Record>> {
        if self.schema.index_for(field).is_none() {
            return Err(StoreError::UnknownIndex {
                store: self.schema.name.clone(),
                field: field.to_string(),
            });
        }
        let state = self.state.read();
        self.ensure_open(&state)?;
        Ok(state
            .records
            .values()
            .filter(|r| r.get(field).is_some_and(|v| v.index_eq(value)))
            .cloned()
            .collect())
    }

    async fn put(&self, record: Record) -> StoreResult<Key> {
        self.insert(record, true)
    }

    async fn add(&self, record: Record) -> StoreResult<Key> {
        self.insert(record, false)
    }

    async fn delete(&self, key: &Key) -> StoreResult<()> {
        {
            let mut state = self.state.write();
            self.ensure_open(&state)?;
            if state.records.shift_remove(key).is_none() {
                return Err(StoreError::not_found(&self.schema.name, key.clone()));
            }
        }
        tracing::debug!(store = %self.schema.name, %key, "record deleted");
        self.emit(MutationKind::Deleted, Some(key.clone()));
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        {
            let mut state = self.state.write();
            self.ensure_open(&state)?;
            state.records.clear();
        }
        self.emit(MutationKind::Cleared, None);
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        let state = self.state.read();
        self.ensure_open(&state)?;
        Ok(state.records.len())
    }

    fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }
}
