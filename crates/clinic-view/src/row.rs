//! View Rows: a base record plus its resolved references
//!
//! View Rows are built for one pass and thrown away afterwards. They own no
//! persistent state and are never written back to a store.

use clinic_store::{Record, StoreError, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Outcome of resolving one reference
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Target record exists
    Found(Record),
    /// Reference is empty, dangling or not a key
    Missing,
    /// Target store could not be read
    Failed(Arc<StoreError>),
}

impl Resolved {
    /// Borrow found record
    #[inline]
    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        match self {
            Resolved::Found(record) => Some(record),
            _ => None,
        }
    }

    /// Check for a read failure
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Resolved::Failed(_))
    }

    /// Display label built from `fields`, or `sentinel`
    ///
    /// Non-empty field values are joined with a single space. Missing and
    /// failed references, and found records whose label is empty, render as
    /// the sentinel.
    #[must_use]
    pub fn label(&self, fields: &[String], sentinel: &str) -> String {
        let Resolved::Found(record) = self else {
            return sentinel.to_string();
        };
        let label = fields
            .iter()
            .filter_map(|f| record.get(f))
            .map(ToString::to_string)
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if label.is_empty() {
            sentinel.to_string()
        } else {
            label
        }
    }
}

/// Resolution of one binding: a single reference or a list of them
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedRef {
    /// Scalar reference
    One(Resolved),
    /// List reference, in list order
    Many(Vec<Resolved>),
}

impl ResolvedRef {
    fn iter(&self) -> impl Iterator<Item = &Resolved> {
        let slice: &[Resolved] = match self {
            ResolvedRef::One(r) => std::slice::from_ref(r),
            ResolvedRef::Many(items) => items,
        };
        slice.iter()
    }
}

/// One binding's result inside a View Row
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedField {
    /// Resolution result
    pub value: ResolvedRef,
    /// Placeholder label for missing/failed targets
    pub sentinel: String,
    /// Fields of the target record forming its label
    pub label_fields: Vec<String>,
}

/// Base record plus resolved references, for rendering only
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    record: Record,
    joins: IndexMap<String, JoinedField>,
}

impl ViewRow {
    /// Create row from base record and resolved joins
    #[must_use]
    pub fn new(record: Record, joins: IndexMap<String, JoinedField>) -> Self {
        Self { record, joins }
    }

    /// Base record
    #[inline]
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Base field value
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    /// Base field rendered as text (empty when absent)
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.field(name).map(ToString::to_string).unwrap_or_default()
    }

    /// Base field as text, or `fallback` when absent or blank
    #[must_use]
    pub fn text_or(&self, name: &str, fallback: &str) -> String {
        let text = self.text(name);
        if text.trim().is_empty() {
            fallback.to_string()
        } else {
            text
        }
    }

    /// Joined field by alias
    #[inline]
    #[must_use]
    pub fn joined(&self, alias: &str) -> Option<&JoinedField> {
        self.joins.get(alias)
    }

    /// Scalar resolution by alias
    #[must_use]
    pub fn resolved(&self, alias: &str) -> Option<&Resolved> {
        match &self.joins.get(alias)?.value {
            ResolvedRef::One(r) => Some(r),
            ResolvedRef::Many(_) => None,
        }
    }

    /// Label of a scalar join (sentinel when missing or failed)
    ///
    /// An unknown alias renders as an empty string.
    #[must_use]
    pub fn label(&self, alias: &str) -> String {
        let Some(join) = self.joins.get(alias) else {
            return String::new();
        };
        match &join.value {
            ResolvedRef::One(r) => r.label(&join.label_fields, &join.sentinel),
            ResolvedRef::Many(_) => self.labels(alias).join(", "),
        }
    }

    /// Labels of every resolution of a join, in list order
    #[must_use]
    pub fn labels(&self, alias: &str) -> Vec<String> {
        self.joins
            .get(alias)
            .map(|join| {
                join.value
                    .iter()
                    .map(|r| r.label(&join.label_fields, &join.sentinel))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every failed resolution as `(alias, error)`
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &StoreError)> {
        self.joins
            .iter()
            .flat_map(|(alias, join)| {
                join.value.iter().filter_map(move |r| match r {
                    Resolved::Failed(err) => Some((alias.as_str(), err.as_ref())),
                    _ => None,
                })
            })
            .collect()
    }

    /// Check if any resolution failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.joins
            .values()
            .any(|join| join.value.iter().any(Resolved::is_failed))
    }
}
