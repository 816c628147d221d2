//! # Error Types — Structured Error Hierarchy
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Configuration errors are raised while a snapshot is being built. A
//!   snapshot that would silently disable auditing is never produced.
//! - Lookup errors are the only failures a decision can report at call time.
//!   They are never coerced into a negative verdict.
//! - An absent index or field name is not an error anywhere in the workspace.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for auditgate.
#[derive(Error, Debug)]
pub enum AuditGateError {
    /// Snapshot construction failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A read-history lookup could not be answered.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),
}

/// Error detected while building a configuration snapshot.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required field was not supplied to the builder.
    #[error("missing required setting `{0}`")]
    MissingField(&'static str),

    /// A name pattern is empty or otherwise unusable.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern as written.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The audit index template could not be parsed.
    #[error("malformed audit index template {template:?}: {reason}")]
    MalformedTemplate {
        /// The template as written.
        template: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Diff logging and metadata-only logging were both requested for writes.
    #[error("write.log_diffs and write.metadata_only are mutually exclusive")]
    ConflictingWriteGranularity,

    /// A numeric setting is out of range.
    #[error("invalid value for `{setting}`: {reason}")]
    InvalidValue {
        /// Setting name.
        setting: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The settings document could not be parsed.
    #[error("invalid settings document: {0}")]
    InvalidSettings(String),

    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by a field resolver when its backing data is unavailable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ResolveError {
    message: String,
}

impl ResolveError {
    /// Create a resolver failure with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A read-history decision could not be made because the field set for an
/// index could not be loaded.
#[derive(Error, Debug)]
pub enum LookupError {
    /// The resolver failed for this index.
    #[error("field resolver failed for index {index:?}: {source}")]
    Resolver {
        /// Index whose field set was requested.
        index: String,
        /// Resolver failure.
        #[source]
        source: ResolveError,
    },

    /// The resolver returned a field pattern that cannot be compiled.
    #[error("field resolver returned an invalid pattern for index {index:?}: {source}")]
    InvalidFieldPattern {
        /// Index whose field set was requested.
        index: String,
        /// Pattern compilation failure.
        #[source]
        source: ConfigError,
    },
}

impl LookupError {
    /// The index the failed lookup was for.
    pub fn index(&self) -> &str {
        match self {
            Self::Resolver { index, .. } | Self::InvalidFieldPattern { index, .. } => index,
        }
    }
}
