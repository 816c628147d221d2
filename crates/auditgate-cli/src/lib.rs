#![deny(missing_docs)]

//! # auditgate-cli — auditgate Command-Line Interface
//!
//! Operator tooling around a compliance settings file.
//!
//! ## Subcommands
//!
//! - `validate` — Build the evaluator from a settings file and summarise it
//! - `audit-index` — Print the audit index name in effect right now
//! - `write` / `read` / `immutable` — Evaluate one decision
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs` and the `*Args` structs.
//! - Handlers return their output as a `String`; printing happens in `main`.
//! - All policy logic lives in `auditgate-compliance`.
//! - Evaluator failures are carried as `AuditGateError` so `main` can map
//!   them to an exit status (see [`exit_code`]).

pub mod check;
pub mod validate;

use std::path::Path;

use anyhow::Context;

use auditgate_compliance::{ComplianceConfig, ComplianceSettings};
use auditgate_core::AuditGateError;

/// Exit status for failures outside the evaluator.
pub const EXIT_FAILURE: u8 = 1;
/// Exit status for an unusable settings file.
pub const EXIT_CONFIG: u8 = 2;
/// Exit status for a read-history lookup that could not be answered.
pub const EXIT_LOOKUP: u8 = 3;

/// Load a settings file and build the evaluator from it.
pub fn load_config(path: &Path) -> anyhow::Result<ComplianceConfig> {
    let settings = ComplianceSettings::from_path(path)
        .map_err(AuditGateError::from)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    let config = ComplianceConfig::from_settings(&settings)
        .map_err(AuditGateError::from)
        .with_context(|| format!("building compliance configuration from {}", path.display()))?;
    tracing::debug!(path = %path.display(), "compliance configuration loaded");
    Ok(config)
}

/// Map a command failure to the process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AuditGateError>() {
        Some(AuditGateError::Config(_)) => EXIT_CONFIG,
        Some(AuditGateError::Lookup(_)) => EXIT_LOOKUP,
        None => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unreadable_settings_exit_as_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("missing.yaml")).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_CONFIG);
        assert!(format!("{err:#}").contains("missing.yaml"));
    }

    #[test]
    fn invalid_policy_exits_as_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"security_index: sec\naudit_index: audit\nfield_cache_capacity: 0\n")
            .unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_CONFIG);
    }

    #[test]
    fn other_failures_exit_generically() {
        assert_eq!(exit_code(&anyhow::anyhow!("stdout closed")), EXIT_FAILURE);
    }
}
