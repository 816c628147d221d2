//! # Compliance Settings Document
//!
//! The serde model of the settings an operator writes. YAML and JSON are both
//! accepted (JSON is parsed as YAML). Unknown keys are rejected so that a
//! misspelled watch list fails loudly instead of silently auditing nothing.
//!
//! ```yaml
//! security_index: ".auditgate-config"
//! audit_index: "'security-auditlog-'YYYY.MM.dd"
//! write:
//!   watched_indices: ["orders-*"]
//! read:
//!   watched_fields: ["customers-*,name,ssn"]
//! immutable_indices: ["ledger-*"]
//! ```
//!
//! `security_index` and `audit_index` are required; everything else has a
//! default. Converting settings into an evaluator is
//! [`ComplianceConfig::from_settings`](crate::ComplianceConfig::from_settings).

use std::path::Path;

use serde::{Deserialize, Serialize};

use auditgate_core::ConfigError;

use crate::cache::DEFAULT_FIELD_CACHE_CAPACITY;

/// Top-level compliance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplianceSettings {
    /// Master switch.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// The subsystem's own configuration index.
    pub security_index: String,
    /// Audit index name or quoted date template.
    pub audit_index: String,
    /// Audit every field of the security index.
    #[serde(default)]
    pub log_internal_config: bool,
    /// Audit node-external configuration changes.
    #[serde(default)]
    pub log_external_config: bool,
    /// Write-protected index patterns.
    #[serde(default)]
    pub immutable_indices: Vec<String>,
    /// Maximum number of indices kept in the read-field cache.
    #[serde(default = "default_field_cache_capacity")]
    pub field_cache_capacity: usize,
    /// Write-history settings.
    #[serde(default)]
    pub write: WriteHistorySettings,
    /// Read-history settings.
    #[serde(default)]
    pub read: ReadHistorySettings,
}

/// Write-history settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WriteHistorySettings {
    /// Index patterns whose writes are recorded.
    pub watched_indices: Vec<String>,
    /// Record full document diffs.
    pub log_diffs: bool,
    /// Record write metadata only.
    pub metadata_only: bool,
}

/// Read-history settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReadHistorySettings {
    /// `indexPattern[,fieldPattern...]` entries.
    pub watched_fields: Vec<String>,
    /// Record read metadata only.
    pub metadata_only: bool,
}

fn default_true() -> bool {
    true
}

fn default_field_cache_capacity() -> usize {
    DEFAULT_FIELD_CACHE_CAPACITY
}

impl ComplianceSettings {
    /// Minimal settings: enabled, nothing watched.
    pub fn new(security_index: impl Into<String>, audit_index: impl Into<String>) -> Self {
        Self {
            enabled: true,
            security_index: security_index.into(),
            audit_index: audit_index.into(),
            log_internal_config: false,
            log_external_config: false,
            immutable_indices: Vec::new(),
            field_cache_capacity: DEFAULT_FIELD_CACHE_CAPACITY,
            write: WriteHistorySettings::default(),
            read: ReadHistorySettings::default(),
        }
    }

    /// Parse a YAML or JSON settings document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSettings`] on syntax errors, unknown keys,
    /// or missing required keys.
    pub fn from_yaml_str(document: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(document).map_err(|e| ConfigError::InvalidSettings(e.to_string()))
    }

    /// Read and parse a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`ComplianceSettings::from_yaml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&document)
    }
}
