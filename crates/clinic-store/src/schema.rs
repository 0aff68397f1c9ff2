//! Store schemas
//!
//! A schema is fixed when its store is created: the key field, whether keys are
//! generated, and which fields are indexed.

use serde::{Deserialize, Serialize};

/// Indexed field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Field name
    pub field: String,
    /// Reject two records sharing a value
    pub unique: bool,
}

/// Schema of one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Store name
    pub name: String,
    /// Field holding the record key
    pub key_field: String,
    /// Generate integer keys for records that carry none
    pub auto_increment: bool,
    /// Indexed fields
    pub indexes: Vec<IndexSpec>,
    /// Schema version (additive upgrades only)
    pub version: u32,
}

impl Schema {
    /// Create schema keyed by `id`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_field: "id".to_string(),
            auto_increment: false,
            indexes: Vec::new(),
            version: 1,
        }
    }

    /// With custom key field
    #[inline]
    #[must_use]
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }

    /// With generated keys
    #[inline]
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// With non-unique index
    #[must_use]
    pub fn index(mut self, field: impl Into<String>) -> Self {
        self.indexes.push(IndexSpec {
            field: field.into(),
            unique: false,
        });
        self
    }

    /// With unique index
    #[must_use]
    pub fn unique_index(mut self, field: impl Into<String>) -> Self {
        self.indexes.push(IndexSpec {
            field: field.into(),
            unique: true,
        });
        self
    }

    /// With version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Look up index declaration for field
    #[must_use]
    pub fn index_for(&self, field: &str) -> Option<&IndexSpec> {
        self.indexes.iter().find(|i| i.field == field)
    }

    /// Iterate unique indexes
    pub fn unique_indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.indexes.iter().filter(|i| i.unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let schema = Schema::new("medicines");
        assert_eq!(schema.key_field, "id");
        assert!(!schema.auto_increment);
        assert!(schema.indexes.is_empty());
        assert_eq!(schema.version, 1);
    }

    #[test]
    fn builder_indexes() {
        let schema = Schema::new("admins")
            .unique_index("email")
            .index("role")
            .with_version(2);

        assert!(schema.index_for("email").unwrap().unique);
        assert!(!schema.index_for("role").unwrap().unique);
        assert!(schema.index_for("name").is_none());
        assert_eq!(schema.unique_indexes().count(), 1);
        assert_eq!(schema.version, 2);
    }
}
