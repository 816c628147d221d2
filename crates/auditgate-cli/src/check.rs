//! # Decision Subcommands
//!
//! `write`, `read`, `immutable` and `audit-index`: evaluate a single decision
//! against a settings file, as the request layer would.

use clap::Args;
use serde::Serialize;

use auditgate_compliance::ComplianceConfig;
use auditgate_core::AuditGateError;

/// Arguments for the `write` subcommand.
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Index being written to.
    #[arg(long)]
    pub index: String,
}

/// Arguments for the `read` subcommand.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Index being read.
    #[arg(long)]
    pub index: String,

    /// Field being read. Without it, asks whether the index is read-audited at all.
    #[arg(long)]
    pub field: Option<String>,

    /// Treat a field lookup failure as "must audit" instead of an error.
    #[arg(long)]
    pub fail_closed: bool,
}

/// Arguments for the `immutable` subcommand.
#[derive(Args, Debug)]
pub struct ImmutableArgs {
    /// Index to check.
    #[arg(long)]
    pub index: String,
}

/// One evaluated decision.
#[derive(Debug, Serialize)]
pub struct Verdict<'a> {
    /// Decision name.
    pub decision: &'static str,
    /// Index the decision was made for.
    pub index: &'a str,
    /// Field the decision was made for, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'a str>,
    /// Extra granularity attached to the decision, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
    /// The answer.
    pub verdict: bool,
}

impl Verdict<'_> {
    /// Render as a single line, or as JSON.
    pub fn render(&self, json: bool) -> anyhow::Result<String> {
        if json {
            return Ok(serde_json::to_string(self)?);
        }
        let mut line = format!("{} {}", self.decision, self.index);
        if let Some(field) = self.field {
            line.push('.');
            line.push_str(field);
        }
        line.push_str(if self.verdict { ": true" } else { ": false" });
        if let Some(granularity) = &self.granularity {
            line.push_str(&format!(" ({granularity})"));
        }
        Ok(line)
    }
}

/// Evaluate `write_history_enabled_for_index`.
pub fn run_write(config: &ComplianceConfig, args: &WriteArgs, json: bool) -> anyhow::Result<String> {
    let verdict = config.write_history_enabled_for_index(args.index.as_str());
    Verdict {
        decision: "write_history",
        index: &args.index,
        field: None,
        granularity: verdict.then(|| config.write_granularity().to_string()),
        verdict,
    }
    .render(json)
}

/// Evaluate `read_history_enabled_for_index` or `read_history_enabled_for_field`.
pub fn run_read(config: &ComplianceConfig, args: &ReadArgs, json: bool) -> anyhow::Result<String> {
    let index = args.index.as_str();
    let verdict = match (&args.field, args.fail_closed) {
        (Some(field), true) => config.read_history_enabled_for_field_or_audit(index, field.as_str()),
        (Some(field), false) => config
            .read_history_enabled_for_field(index, field.as_str())
            .map_err(AuditGateError::from)?,
        (None, true) => config.read_history_enabled_for_index_or_audit(index),
        (None, false) => config
            .read_history_enabled_for_index(index)
            .map_err(AuditGateError::from)?,
    };
    let granularity = (verdict && config.log_read_metadata_only()).then(|| "METADATA_ONLY".to_string());
    Verdict {
        decision: "read_history",
        index,
        field: args.field.as_deref(),
        granularity,
        verdict,
    }
    .render(json)
}

/// Evaluate `is_index_immutable`.
pub fn run_immutable(
    config: &ComplianceConfig,
    args: &ImmutableArgs,
    json: bool,
) -> anyhow::Result<String> {
    Verdict {
        decision: "immutable",
        index: &args.index,
        field: None,
        granularity: None,
        verdict: config.is_index_immutable(args.index.as_str()),
    }
    .render(json)
}

/// Print the audit index the sink is writing to right now.
pub fn run_audit_index(config: &ComplianceConfig, json: bool) -> anyhow::Result<String> {
    let name = config.current_audit_index_name();
    if json {
        let body = serde_json::json!({
            "audit_index": name,
            "template": config.audit_index_template().as_str(),
            "rolling": config.audit_index_template().is_rolling(),
        });
        return Ok(body.to_string());
    }
    Ok(name)
}
