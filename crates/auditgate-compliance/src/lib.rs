#![deny(missing_docs)]

//! # auditgate-compliance — Compliance Audit Policy Evaluator
//!
//! Decides, per request, whether a write or read against an index must be
//! recorded for compliance audit, at what granularity, and whether the index
//! is write-protected.
//!
//! - [`ComplianceConfig`]: the immutable policy snapshot and its decision
//!   operations.
//! - [`FieldDecisionCache`]: single-flight pull-through cache of the
//!   read-history field patterns per index.
//! - [`WatchedReadFields`]: the settings-driven [`FieldResolver`].
//! - [`ComplianceSettings`]: the YAML/JSON settings document.
//! - [`SharedComplianceConfig`]: hot-swappable handle for request handlers.
//!
//! ## Architecture
//!
//! ```text
//! ComplianceSettings ──▶ ComplianceConfigBuilder ──▶ ComplianceConfig
//!                                                     ├─ PatternSet (write watch list)
//!                                                     ├─ PatternSet (immutable indices)
//!                                                     ├─ RollingIndexNameResolver
//!                                                     └─ FieldDecisionCache ──▶ FieldResolver
//! ```
//!
//! ## Self-Exclusion
//!
//! The audit sink writes its records into an ordinary index. If writes to
//! that index were themselves write-audited, every audit record would
//! produce another one. The evaluator therefore resolves the sink's current
//! index name on every write and read decision and excludes it, ahead of the
//! watch lists and the field cache. Cached field sets never encode the
//! exclusion, so they stay correct across a rollover.

pub mod cache;
pub mod config;
pub mod settings;
pub mod shared;
pub mod watched;

pub use cache::{FieldDecisionCache, FieldResolver, DEFAULT_FIELD_CACHE_CAPACITY};
pub use config::{ComplianceConfig, ComplianceConfigBuilder, WriteGranularity};
pub use settings::{ComplianceSettings, ReadHistorySettings, WriteHistorySettings};
pub use shared::SharedComplianceConfig;
pub use watched::{WatchedReadEntry, WatchedReadFields};
