#![deny(missing_docs)]

//! # auditgate-core — Foundational Types for auditgate
//!
//! This crate is the leaf of the auditgate workspace. It holds the pieces the
//! compliance evaluator is assembled from, none of which know anything about
//! audit policy on their own:
//!
//! 1. **Structured errors.** `ConfigError` for everything detected while a
//!    configuration snapshot is built, `LookupError` for the one call-time
//!    failure path (the read-field cache), and `AuditGateError` on top.
//!
//! 2. **`PatternSet`.** Index and field name matching with `*` and `?`
//!    wildcards. All name matching in the evaluator flows through this type;
//!    there are no ad hoc string comparisons against watch lists.
//!
//! 3. **`RollingIndexNameResolver`.** Resolves the literal name of the index
//!    the audit sink writes to right now, from a quoted date template such as
//!    `'security-auditlog-'YYYY.MM.dd`. Resolution happens on every call.
//!
//! 4. **`Clock`.** Injected time source so rollover behaviour is testable.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `auditgate-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod clock;
pub mod error;
pub mod pattern;
pub mod rolling;

// Re-export primary types for ergonomic imports.
pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use error::{AuditGateError, ConfigError, LookupError, ResolveError};
pub use pattern::{PatternSet, WildcardPattern};
pub use rolling::{AuditIndexTemplate, RollingIndexNameResolver};
