//! Cross-store foreign-key resolution
//!
//! A [`JoinResolver`] holds one [`JoinBinding`] per reference field. For each
//! base record it looks up every referenced key in the binding's target store
//! through the pass's [`ViewCache`], and produces a [`ViewRow`].
//!
//! Lookups for one record run concurrently; rows keep the order of the base
//! records. An empty or non-key reference resolves to [`Resolved::Missing`]
//! without touching a store.

use crate::cache::ViewCache;
use crate::row::{JoinedField, Resolved, ResolvedRef, ViewRow};
use crate::StoreRef;
use clinic_store::{Key, Record, Value};
use futures::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Whether a reference field holds one key or a list of keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cardinality {
    /// Scalar key
    #[default]
    One,
    /// List of keys
    Many,
}

/// One foreign-key field and the store it points into
#[derive(Debug, Clone)]
pub struct JoinBinding {
    /// Field of the base record holding the key
    pub field: String,
    /// Store the key refers to
    pub target: StoreRef,
    /// Name under which the resolution appears in the row
    pub alias: String,
    /// Label rendered for missing or unreadable targets
    pub sentinel: String,
    /// Fields of the target record that form its label
    pub label_fields: Vec<String>,
    /// Scalar or list reference
    pub cardinality: Cardinality,
}

impl JoinBinding {
    fn new(
        field: impl Into<String>,
        target: StoreRef,
        alias: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            field: field.into(),
            target,
            alias: alias.into(),
            sentinel: "Unknown".to_string(),
            label_fields: vec!["name".to_string()],
            cardinality,
        }
    }

    /// Bind a scalar reference field
    #[must_use]
    pub fn one(field: impl Into<String>, target: StoreRef, alias: impl Into<String>) -> Self {
        Self::new(field, target, alias, Cardinality::One)
    }

    /// Bind a list-of-keys reference field
    #[must_use]
    pub fn many(field: impl Into<String>, target: StoreRef, alias: impl Into<String>) -> Self {
        Self::new(field, target, alias, Cardinality::Many)
    }

    /// With sentinel label
    #[inline]
    #[must_use]
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// With label fields
    #[must_use]
    pub fn with_label<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    fn keys(&self, record: &Record) -> Vec<Option<Key>> {
        let value = record.get(&self.field);
        match self.cardinality {
            Cardinality::One => vec![value.and_then(Value::as_key)],
            Cardinality::Many => match value {
                Some(Value::List(items)) => items.iter().map(Value::as_key).collect(),
                // A scalar in a list field counts as a one-element list
                Some(v) if !v.is_null() => vec![v.as_key()],
                _ => Vec::new(),
            },
        }
    }

    async fn resolve_key(&self, key: Option<Key>, cache: &ViewCache) -> Resolved {
        let Some(key) = key else {
            return Resolved::Missing;
        };
        match cache.resolve(self.target.as_ref(), &key).await {
            Ok(Some(record)) => Resolved::Found(record),
            Ok(None) => {
                debug!(store = %self.target.name(), key = %key, "Dangling reference");
                Resolved::Missing
            }
            Err(err) if err.is_not_found() => Resolved::Missing,
            Err(err) => {
                warn!(
                    store = %self.target.name(),
                    key = %key,
                    error = %err,
                    "Reference could not be loaded"
                );
                Resolved::Failed(err)
            }
        }
    }

    async fn resolve(&self, record: &Record, cache: &ViewCache) -> JoinedField {
        let lookups = self
            .keys(record)
            .into_iter()
            .map(|key| self.resolve_key(key, cache));
        let mut resolved = join_all(lookups).await;

        let value = match self.cardinality {
            Cardinality::One => ResolvedRef::One(resolved.pop().unwrap_or(Resolved::Missing)),
            Cardinality::Many => ResolvedRef::Many(resolved),
        };
        JoinedField {
            value,
            sentinel: self.sentinel.clone(),
            label_fields: self.label_fields.clone(),
        }
    }
}

/// Resolves every binding of a view for each base record
#[derive(Debug, Clone, Default)]
pub struct JoinResolver {
    bindings: Vec<JoinBinding>,
}

impl JoinResolver {
    /// Create resolver from bindings
    #[must_use]
    pub fn new(bindings: Vec<JoinBinding>) -> Self {
        Self { bindings }
    }

    /// Add a binding
    #[must_use]
    pub fn with_binding(mut self, binding: JoinBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Configured bindings
    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &[JoinBinding] {
        &self.bindings
    }

    /// Stores this resolver reads from
    #[must_use]
    pub fn target_stores(&self) -> Vec<StoreRef> {
        self.bindings.iter().map(|b| b.target.clone()).collect()
    }

    /// Resolve all bindings for one record
    ///
    /// Never fails: unreadable targets surface as [`Resolved::Failed`] inside
    /// the row.
    pub async fn resolve(&self, record: Record, cache: &ViewCache) -> ViewRow {
        let joins = join_all(self.bindings.iter().map(|b| b.resolve(&record, cache))).await;
        let joins: IndexMap<String, JoinedField> = self
            .bindings
            .iter()
            .map(|b| b.alias.clone())
            .zip(joins)
            .collect();
        ViewRow::new(record, joins)
    }

    /// Resolve a batch of records, preserving their order
    pub async fn resolve_all(&self, records: Vec<Record>, cache: &ViewCache) -> Vec<ViewRow> {
        join_all(records.into_iter().map(|r| self.resolve(r, cache))).await
    }
}
