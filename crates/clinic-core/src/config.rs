//! Clinic configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! [view]
//! empty_placeholder = "No records found."
//!
//! [sentinels]
//! patient = "Unknown Patient"
//!
//! [seed]
//! batch_size = 20
//! dir = "seed"
//!
//! [auth]
//! pbkdf2_rounds = 100000
//! ```

use crate::error::{ClinicError, ClinicResult};
use clinic_auth::DEFAULT_ROUNDS;
use clinic_store::seed::DEFAULT_BATCH_SIZE;
use clinic_store::{FileSeedSource, HttpSeedSource, SeedSource};
use clinic_view::ViewConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    /// View layer settings
    pub view: ViewConfig,
    /// Labels for unresolved references
    pub sentinels: SentinelConfig,
    /// First-run seeding
    pub seed: SeedConfig,
    /// Credential hashing
    pub auth: AuthConfig,
}

impl ClinicConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> ClinicResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ClinicResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClinicError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// With view settings
    #[inline]
    #[must_use]
    pub fn with_view(mut self, view: ViewConfig) -> Self {
        self.view = view;
        self
    }

    /// With seed directory
    #[inline]
    #[must_use]
    pub fn with_seed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.seed.dir = Some(dir.into());
        self
    }

    /// With PBKDF2 rounds
    #[inline]
    #[must_use]
    pub fn with_pbkdf2_rounds(mut self, rounds: u32) -> Self {
        self.auth.pbkdf2_rounds = rounds;
        self
    }
}

/// Sentinel labels per referenced entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Missing patient
    pub patient: String,
    /// Missing doctor
    pub doctor: String,
    /// Missing medicine
    pub medicine: String,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            patient: "Unknown Patient".to_string(),
            doctor: "Unknown Doctor".to_string(),
            medicine: "Unknown Medicine".to_string(),
        }
    }
}

/// Seeding settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Records written per batch
    pub batch_size: usize,
    /// Base URL serving `<entity>.json`
    pub base_url: Option<String>,
    /// Directory holding `<entity>.json` (preferred over `base_url`)
    pub dir: Option<PathBuf>,
}

impl SeedConfig {
    /// Build the configured seed source, if any
    #[must_use]
    pub fn source(&self) -> Option<Box<dyn SeedSource>> {
        if let Some(dir) = &self.dir {
            return Some(Box::new(FileSeedSource::new(dir.clone())));
        }
        self.base_url
            .as_ref()
            .map(|url| Box::new(HttpSeedSource::new(url.clone())) as Box<dyn SeedSource>)
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            base_url: None,
            dir: None,
        }
    }
}

/// Credential settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// PBKDF2 iteration count for new hashes
    pub pbkdf2_rounds: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pbkdf2_rounds: DEFAULT_ROUNDS,
        }
    }
}
