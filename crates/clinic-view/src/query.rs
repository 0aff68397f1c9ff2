//! Base-record queries feeding a view

use crate::StoreRef;
use async_trait::async_trait;
use clinic_store::{Record, StoreResult, Value};
use std::fmt::Debug;

/// Source of the base records of a view
///
/// `sources` names every store whose mutations change the result, so the
/// binder knows what to subscribe to.
#[async_trait]
pub trait RecordQuery: Send + Sync + Debug {
    /// Fetch base records in display order
    async fn fetch(&self) -> StoreResult<Vec<Record>>;

    /// Stores this query reads
    fn sources(&self) -> Vec<StoreRef>;
}

/// Every record of one store, in store order
#[derive(Debug, Clone)]
pub struct AllRecords {
    store: StoreRef,
}

impl AllRecords {
    /// Create query over a store
    #[must_use]
    pub fn new(store: StoreRef) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RecordQuery for AllRecords {
    async fn fetch(&self) -> StoreResult<Vec<Record>> {
        self.store.get_all().await
    }

    fn sources(&self) -> Vec<StoreRef> {
        vec![self.store.clone()]
    }
}

/// Records whose indexed field equals a value
#[derive(Debug, Clone)]
pub struct IndexedRecords {
    store: StoreRef,
    field: String,
    value: Value,
}

impl IndexedRecords {
    /// Create index query
    #[must_use]
    pub fn new(store: StoreRef, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            store,
            field: field.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
impl RecordQuery for IndexedRecords {
    async fn fetch(&self) -> StoreResult<Vec<Record>> {
        self.store.get_all_by_index(&self.field, &self.value).await
    }

    fn sources(&self) -> Vec<StoreRef> {
        vec![self.store.clone()]
    }
}

/// Records where any of `fields` contains `term`, ignoring case
///
/// An empty term matches every record. Non-text values are compared by
/// their display form.
#[derive(Debug, Clone)]
pub struct TextSearch {
    store: StoreRef,
    fields: Vec<String>,
    term: String,
}

impl TextSearch {
    /// Create search over `fields` of `store`
    #[must_use]
    pub fn new<I, S>(store: StoreRef, fields: I, term: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store,
            fields: fields.into_iter().map(Into::into).collect(),
            term: term.trim().to_lowercase(),
        }
    }

    /// Check if a record matches
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.term.is_empty()
            || self.fields.iter().any(|field| {
                record
                    .get(field)
                    .is_some_and(|v| v.to_string().to_lowercase().contains(&self.term))
            })
    }
}

#[async_trait]
impl RecordQuery for TextSearch {
    async fn fetch(&self) -> StoreResult<Vec<Record>> {
        let mut records = self.store.get_all().await?;
        records.retain(|r| self.matches(r));
        Ok(records)
    }

    fn sources(&self) -> Vec<StoreRef> {
        vec![self.store.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_store::{MemoryStore, Schema, StoreError, StoreHandle};

    async fn appointments() -> StoreRef {
        let store = MemoryStore::shared(
            Schema::new("appointments")
                .auto_increment()
                .index("patient_id"),
        );
        for patient in [1, 2, 1] {
            store
                .add(Record::new().with("patient_id", patient))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn all_records_in_store_order() {
        let query = AllRecords::new(appointments().await);
        let ids: Vec<String> = query
            .fetch()
            .await
            .unwrap()
            .iter()
            .map(|r| r.get("id").map(ToString::to_string).unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(query.sources().len(), 1);
    }

    #[tokio::test]
    async fn indexed_records_filter() {
        let query = IndexedRecords::new(appointments().await, "patient_id", 1);
        assert_eq!(query.fetch().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_index_is_an_error() {
        let query = IndexedRecords::new(appointments().await, "doctor_id", 1);
        assert!(matches!(
            query.fetch().await,
            Err(StoreError::UnknownIndex { .. })
        ));
    }

    #[tokio::test]
    async fn text_search_ignores_case_and_checks_each_field() {
        let doctors = MemoryStore::shared(Schema::new("doctors").auto_increment());
        for (first, last) in [("Ada", "Lovelace"), ("Alan", "Turing"), ("Grace", "Hopper")] {
            doctors
                .add(Record::new().with("first_name", first).with("last_name", last))
                .await
                .unwrap();
        }
        let firsts = |records: Vec<Record>| -> Vec<String> {
            records
                .iter()
                .filter_map(|r| r.text("first_name").map(str::to_string))
                .collect()
        };

        let by_last = TextSearch::new(doctors.clone(), ["first_name", "last_name"], "TUR");
        assert_eq!(firsts(by_last.fetch().await.unwrap()), vec!["Alan"]);

        let shared = TextSearch::new(doctors.clone(), ["first_name", "last_name"], "a");
        assert_eq!(
            firsts(shared.fetch().await.unwrap()),
            vec!["Ada", "Alan", "Grace"]
        );

        let none = TextSearch::new(doctors.clone(), ["first_name"], "hopper");
        assert!(none.fetch().await.unwrap().is_empty());

        let blank = TextSearch::new(doctors, ["first_name"], "  ");
        assert_eq!(blank.fetch().await.unwrap().len(), 3);
    }

    #[test]
    fn text_search_skips_absent_fields() {
        let store: StoreRef = MemoryStore::shared(Schema::new("doctors"));
        let search = TextSearch::new(store, ["last_name"], "doe");
        assert!(!search.matches(&Record::new().with("first_name", "Doe")));
        assert!(search.matches(&Record::new().with("last_name", "McDoe")));
    }
}
