//! First-run population from static JSON
//!
//! Each entity kind is served as one JSON array of objects. A [`SeedPlan`]
//! describes how inbound objects map onto stored records and how collisions
//! with existing records are handled.
//!
//! ```text
//! SeedSource::fetch(entity) → [FieldMapping] → batches of N → StoreHandle::{add,put}
//! ```

use crate::error::{StoreError, StoreResult};
use crate::handle::StoreHandle;
use crate::value::{Record, Value};
use async_trait::async_trait;
use std::path::PathBuf;

/// Default number of records written per batch
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Source of seed records for an entity kind
#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Fetch every inbound record for `entity`
    ///
    /// # Errors
    /// - `StoreError::TransientFetchFailure` if the source cannot be reached
    /// - `StoreError::Serialization` if the payload is not an array of objects
    async fn fetch(&self, entity: &str) -> StoreResult<Vec<Record>>;
}

/// Reads `<dir>/<entity>.json`
#[derive(Debug, Clone)]
pub struct FileSeedSource {
    dir: PathBuf,
}

impl FileSeedSource {
    /// Create source rooted at directory
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SeedSource for FileSeedSource {
    async fn fetch(&self, entity: &str) -> StoreResult<Vec<Record>> {
        let path = self.dir.join(format!("{entity}.json"));
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::fetch_failed(entity, format!("{}: {e}", path.display())))?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Fetches `<base_url>/<entity>.json` over HTTP
#[derive(Debug, Clone)]
pub struct HttpSeedSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSeedSource {
    /// Create source for base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, entity: &str) -> String {
        format!("{}/{entity}.json", self.base_url)
    }
}

#[async_trait]
impl SeedSource for HttpSeedSource {
    async fn fetch(&self, entity: &str) -> StoreResult<Vec<Record>> {
        let response = self
            .client
            .get(self.url_for(entity))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| StoreError::fetch_failed(entity, e))?;

        response.json::<Vec<Record>>().await.map_err(|e| {
            if e.is_decode() {
                StoreError::Serialization(e.to_string())
            } else {
                StoreError::fetch_failed(entity, e)
            }
        })
    }
}

/// Transformation applied to every inbound record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMapping {
    /// Split a full name on its first space into two fields
    SplitName {
        /// Inbound field, removed after splitting
        from: String,
        /// Receives the first word
        first: String,
        /// Receives the remainder (empty when there is none)
        last: String,
    },
    /// Move a field to a new name
    Rename {
        /// Inbound field
        from: String,
        /// Stored field
        to: String,
    },
    /// Keep only the listed fields
    Project(Vec<String>),
}

impl FieldMapping {
    /// Create split-name mapping
    pub fn split_name(
        from: impl Into<String>,
        first: impl Into<String>,
        last: impl Into<String>,
    ) -> Self {
        Self::SplitName {
            from: from.into(),
            first: first.into(),
            last: last.into(),
        }
    }

    /// Create rename mapping
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create projection mapping
    pub fn project<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Project(fields.into_iter().map(Into::into).collect())
    }

    /// Apply mapping to record
    pub fn apply(&self, record: &mut Record) {
        match self {
            FieldMapping::SplitName { from, first, last } => {
                let Some(Value::Text(full)) = record.remove(from) else {
                    return;
                };
                let full = full.trim();
                let (given, family) = full.split_once(' ').unwrap_or((full, ""));
                record.set(first.clone(), given);
                record.set(last.clone(), family.trim());
            }
            FieldMapping::Rename { from, to } => {
                if let Some(value) = record.remove(from) {
                    record.set(to.clone(), value);
                }
            }
            FieldMapping::Project(keep) => record.retain_fields(keep),
        }
    }
}

/// How inbound records interact with existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedMode {
    /// Only seed an empty store; insert every record
    #[default]
    Add,
    /// Always run; skip records whose key is already present
    AddIfAbsent,
    /// Always run; insert or replace every record
    Upsert,
}

/// Seeding recipe for one entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    /// Entity (store) name
    pub entity: String,
    /// Source file / URL stem, usually the entity name
    pub source: String,
    /// Collision handling
    pub mode: SeedMode,
    /// Mappings applied in order
    pub mappings: Vec<FieldMapping>,
}

impl SeedPlan {
    /// Create plan with default mode and no mappings
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            source: entity.clone(),
            entity,
            mode: SeedMode::default(),
            mappings: Vec::new(),
        }
    }

    /// With mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: SeedMode) -> Self {
        self.mode = mode;
        self
    }

    /// With source stem differing from the entity name
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// With mapping appended
    #[must_use]
    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Apply every mapping to record
    #[must_use]
    pub fn map(&self, mut record: Record) -> Record {
        for mapping in &self.mappings {
            mapping.apply(&mut record);
        }
        record
    }
}

/// Outcome of seeding one entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Entity name
    pub entity: String,
    /// Records received from the source
    pub fetched: usize,
    /// Records written
    pub inserted: usize,
    /// Records skipped (already present or rejected by a constraint)
    pub skipped: usize,
    /// Batches written
    pub batches: usize,
}

impl SeedReport {
    fn empty(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            ..Self::default()
        }
    }
}

/// Writes seed records into stores in fixed-size batches
#[derive(Debug, Clone, Copy)]
pub struct Seeder {
    batch_size: usize,
}

impl Seeder {
    /// Create seeder with batch size (minimum 1)
    #[inline]
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Batch size in use
    #[inline]
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Seed `store` from `source` according to `plan`
    ///
    /// A [`SeedMode::Add`] plan does nothing (and fetches nothing) when the
    /// store already holds records. Constraint violations skip the offending
    /// record; any other failure aborts and propagates.
    pub async fn seed(
        &self,
        store: &dyn StoreHandle,
        source: &dyn SeedSource,
        plan: &SeedPlan,
    ) -> StoreResult<SeedReport> {
        if plan.mode == SeedMode::Add && store.count().await? > 0 {
            tracing::debug!(entity = %plan.entity, "store already populated, skipping seed");
            return Ok(SeedReport::empty(&plan.entity));
        }

        let inbound = source.fetch(&plan.source).await?;
        let mut report = SeedReport {
            fetched: inbound.len(),
            ..SeedReport::empty(&plan.entity)
        };
        let total_batches = inbound.len().div_ceil(self.batch_size);

        for (i, batch) in inbound.chunks(self.batch_size).enumerate() {
            for record in batch {
                let record = plan.map(record.clone());
                if self.write(store, plan, record).await? {
                    report.inserted += 1;
                } else {
                    report.skipped += 1;
                }
            }
            report.batches += 1;
            tracing::debug!(
                entity = %plan.entity,
                "batch {} of {} written",
                i + 1,
                total_batches
            );
        }

        tracing::info!(
            entity = %report.entity,
            fetched = report.fetched,
            inserted = report.inserted,
            skipped = report.skipped,
            "seeding complete"
        );
        Ok(report)
    }

    /// Write one record; `Ok(false)` means skipped
    async fn write(
        &self,
        store: &dyn StoreHandle,
        plan: &SeedPlan,
        record: Record,
    ) -> StoreResult<bool> {
        let result = match plan.mode {
            SeedMode::Add => store.add(record).await,
            SeedMode::AddIfAbsent => {
                if let Some(key) = record.key(&store.schema().key_field) {
                    if store.get(&key).await?.is_some() {
                        tracing::debug!(entity = %plan.entity, %key, "record already exists");
                        return Ok(false);
                    }
                }
                store.add(record).await
            }
            SeedMode::Upsert => store.put(record).await,
        };

        match result {
            Ok(_) => Ok(true),
            Err(err @ StoreError::ConstraintViolation { .. }) => {
                tracing::warn!(entity = %plan.entity, error = %err, "seed record rejected");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for Seeder {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
