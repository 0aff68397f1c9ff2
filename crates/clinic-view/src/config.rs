//! View layer configuration

use serde::{Deserialize, Serialize};

/// Settings shared by every bound view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Text of the single unit rendered for an empty result set
    pub empty_placeholder: String,
}

impl ViewConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With empty-result placeholder text
    #[inline]
    #[must_use]
    pub fn with_empty_placeholder(mut self, text: impl Into<String>) -> Self {
        self.empty_placeholder = text.into();
        self
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            empty_placeholder: "No records found.".to_string(),
        }
    }
}
