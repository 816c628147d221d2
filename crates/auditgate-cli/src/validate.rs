//! # Validate Subcommand
//!
//! Builds the evaluator from a settings file exactly as a node would and
//! summarises the resulting policy. Any configuration error is reported and
//! fails the command.

use std::fmt::Write as _;

use clap::Args;

use auditgate_compliance::ComplianceConfig;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Only report success or failure, without the policy summary.
    #[arg(long)]
    pub quiet: bool,
}

/// Summarise a successfully built configuration.
pub fn run_validate(config: &ComplianceConfig, args: &ValidateArgs) -> anyhow::Result<String> {
    if args.quiet {
        return Ok("ok".to_string());
    }

    let mut out = String::new();
    writeln!(out, "enabled:              {}", config.is_enabled())?;
    writeln!(out, "security index:       {}", config.security_index_name())?;
    writeln!(out, "audit index template: {}", config.audit_index_template())?;
    writeln!(out, "audit index (now):    {}", config.current_audit_index_name())?;
    writeln!(out, "watched writes:       {}", config.watched_write_index_patterns())?;
    writeln!(out, "write granularity:    {}", config.write_granularity())?;
    writeln!(out, "read metadata only:   {}", config.log_read_metadata_only())?;
    writeln!(out, "internal config:      {}", config.log_internal_config())?;
    writeln!(out, "external config:      {}", config.log_external_config())?;
    write!(out, "immutable indices:    {}", config.immutable_index_patterns())?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn summarises_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
security_index: ".auditgate-config"
audit_index: "audit-fixed"
immutable_indices: ["ledger-*", "archive"]
write:
  watched_indices: ["orders-*"]
  metadata_only: true
"#,
        )
        .unwrap();

        let config = crate::load_config(file.path()).unwrap();
        let out = run_validate(&config, &ValidateArgs { quiet: false }).unwrap();

        assert!(out.contains("security index:       .auditgate-config"));
        assert!(out.contains("audit index (now):    audit-fixed"));
        assert!(out.contains("watched writes:       [orders-*]"));
        assert!(out.contains("write granularity:    METADATA_ONLY"));
        assert!(out.contains("immutable indices:    [ledger-*, archive]"));
    }

    #[test]
    fn invalid_settings_fail_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
security_index: sec
audit_index: "'unterminated"
"#,
        )
        .unwrap();

        let err = crate::load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("malformed audit index template"));
    }

    #[test]
    fn quiet_mode() {
        let config = ComplianceConfig::builder()
            .security_index("sec")
            .audit_index("audit")
            .build()
            .unwrap();
        assert_eq!(run_validate(&config, &ValidateArgs { quiet: true }).unwrap(), "ok");
    }
}
