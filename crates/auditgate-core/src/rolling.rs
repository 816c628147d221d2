//! # Rolling Audit Index Names
//!
//! The audit sink writes to an index whose name usually rolls over with the
//! date, e.g. `security-auditlog-2026.10.19`. The evaluator must recognise
//! *today's* name so that writes to it are never themselves audited.
//!
//! ## Template Syntax
//!
//! A configured audit index containing a single quote is a date template.
//! Quoted runs are literal text, `''` is a literal quote, and unquoted
//! letters are date fields:
//!
//! | Letters | Field | Example |
//! |---------|-------|---------|
//! | `yyyy`, `YYYY`, `uuuu` | year | `2026` |
//! | `yy`, `YY` | two-digit year | `26` |
//! | `xxxx` / `xx` | ISO week-based year | `2026` / `26` |
//! | `M` / `MM` / `MMM` / `MMMM` | month | `1` / `01` / `Jan` / `January` |
//! | `d` / `dd` | day of month | `5` / `05` |
//! | `D` / `DDD` | day of year | `5` / `005` |
//! | `H` / `HH` | hour (0-23) | `7` / `07` |
//! | `h` / `hh` | hour (1-12) | `7` / `07` |
//! | `m` / `mm` | minute | `3` / `03` |
//! | `s` / `ss` | second | `9` / `09` |
//! | `w` / `ww` | ISO week of year | `2` / `02` |
//! | `e` | ISO day of week (1 = Monday) | `1` |
//! | `E` / `EEEE` | day name | `Mon` / `Monday` |
//! | `a` | AM/PM marker | `PM` |
//!
//! Any other character outside quotes is copied through. A template without
//! quotes is a fixed literal index name.
//!
//! Templates are rendered in UTC.
//!
//! ## Security Invariant
//!
//! The resolved name is computed on every call. A cached name would stop
//! matching at the first rollover and the audit index would start auditing
//! its own writes.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::error::ConfigError;

/// A parsed audit index name: either fixed or date-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditIndexTemplate {
    /// The audit sink always writes to this index.
    Literal(String),
    /// The audit sink writes to a date-derived index.
    Rolling {
        /// The template as configured.
        template: String,
        /// Equivalent `chrono` strftime format.
        format: String,
    },
}

impl AuditIndexTemplate {
    /// Parse a configured audit index name or template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedTemplate`] for an empty template, an
    /// unterminated quote, or an unsupported pattern letter.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        if template.trim().is_empty() {
            return Err(malformed(template, "template must not be empty"));
        }
        if !template.contains('\'') {
            return Ok(Self::Literal(template.to_string()));
        }

        let format = translate(template)?;
        Ok(Self::Rolling {
            template: template.to_string(),
            format,
        })
    }

    /// The template as configured.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(name) => name,
            Self::Rolling { template, .. } => template,
        }
    }

    /// Whether the name changes over time.
    pub fn is_rolling(&self) -> bool {
        matches!(self, Self::Rolling { .. })
    }

    /// Render the index name for `at`.
    pub fn render(&self, at: DateTime<Utc>) -> String {
        match self {
            Self::Literal(name) => name.clone(),
            Self::Rolling { format, .. } => at.format(format).to_string(),
        }
    }
}

impl fmt::Display for AuditIndexTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn malformed(template: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::MalformedTemplate {
        template: template.to_string(),
        reason: reason.into(),
    }
}

/// Translate a quoted date template into a strftime format string.
fn translate(template: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(template.len() * 2);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push('\'');
                continue;
            }
            let mut closed = false;
            while let Some(q) = chars.next() {
                if q == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        out.push('\'');
                        continue;
                    }
                    closed = true;
                    break;
                }
                push_literal(&mut out, q);
            }
            if !closed {
                return Err(malformed(template, "unterminated quoted literal"));
            }
        } else if c.is_ascii_alphabetic() {
            let mut width = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                width += 1;
            }
            let directive = strftime_directive(c, width).ok_or_else(|| {
                malformed(template, format!("unsupported pattern letter '{c}'"))
            })?;
            out.push_str(directive);
        } else {
            push_literal(&mut out, c);
        }
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn strftime_directive(letter: char, width: usize) -> Option<&'static str> {
    let directive = match (letter, width) {
        ('y' | 'Y' | 'u', 2) => "%y",
        ('y' | 'Y' | 'u', _) => "%Y",
        ('x', 2) => "%g",
        ('x', _) => "%G",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('D', 1) => "%-j",
        ('D', _) => "%j",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('w', 1) => "%-V",
        ('w', _) => "%V",
        ('e', _) => "%u",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('a', _) => "%p",
        _ => return None,
    };
    Some(directive)
}

/// Resolves the name of the index the audit sink is writing to right now.
#[derive(Debug, Clone)]
pub struct RollingIndexNameResolver {
    template: AuditIndexTemplate,
    clock: Arc<dyn Clock>,
}

impl RollingIndexNameResolver {
    /// Resolve `template` against `clock`.
    pub fn new(template: AuditIndexTemplate, clock: Arc<dyn Clock>) -> Self {
        Self { template, clock }
    }

    /// The configured template.
    pub fn template(&self) -> &AuditIndexTemplate {
        &self.template
    }

    /// The literal audit index name for the current instant.
    pub fn current_audit_index_name(&self) -> String {
        self.template.render(self.clock.now())
    }

    /// Whether `index` is the audit index the sink is writing to right now.
    ///
    /// Compared ASCII case-insensitively.
    pub fn is_current_audit_index(&self, index: &str) -> bool {
        index.eq_ignore_ascii_case(&self.current_audit_index_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, ManualClock};
    use chrono::{Duration, TimeZone};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn default_style_template_renders_daily_name() {
        let t = AuditIndexTemplate::parse("'security-auditlog-'YYYY.MM.dd").unwrap();
        assert!(t.is_rolling());
        assert_eq!(t.render(at(2026, 10, 19, 8, 0, 0)), "security-auditlog-2026.10.19");
        assert_eq!(t.render(at(2026, 1, 5, 8, 0, 0)), "security-auditlog-2026.01.05");
    }

    #[test]
    fn unpadded_and_textual_fields() {
        let t = AuditIndexTemplate::parse("'audit-'yyyy-M-d'T'H").unwrap();
        assert_eq!(t.render(at(2026, 1, 5, 7, 0, 0)), "audit-2026-1-5T7");

        let names = AuditIndexTemplate::parse("'audit-'MMM'-'EEE").unwrap();
        assert_eq!(names.render(at(2026, 10, 19, 0, 0, 0)), "audit-Oct-Mon");
    }

    #[test]
    fn weekly_template_uses_iso_week() {
        let t = AuditIndexTemplate::parse("'audit-'xxxx'.w'ww").unwrap();
        assert_eq!(t.render(at(2026, 10, 19, 0, 0, 0)), "audit-2026.w43");
    }

    #[test]
    fn fully_quoted_template_is_constant() {
        let t = AuditIndexTemplate::parse("'3'").unwrap();
        assert!(t.is_rolling());
        assert_eq!(t.render(at(2026, 10, 19, 0, 0, 0)), "3");
        assert_eq!(t.render(at(1999, 1, 1, 0, 0, 0)), "3");
    }

    #[test]
    fn escaped_quotes_and_percent_are_literal() {
        let t = AuditIndexTemplate::parse("'it''s-100%-'yyyy").unwrap();
        assert_eq!(t.render(at(2026, 10, 19, 0, 0, 0)), "it's-100%-2026");

        let bare = AuditIndexTemplate::parse("''yy").unwrap();
        assert_eq!(bare.render(at(2026, 10, 19, 0, 0, 0)), "'26");
    }

    #[test]
    fn unquoted_name_is_literal() {
        let t = AuditIndexTemplate::parse("auditlog").unwrap();
        assert_eq!(t, AuditIndexTemplate::Literal("auditlog".into()));
        assert!(!t.is_rolling());
        assert_eq!(t.render(at(2026, 10, 19, 0, 0, 0)), "auditlog");
    }

    #[test]
    fn malformed_templates_rejected() {
        for bad in ["", "   ", "'unterminated", "'audit-'qq", "'audit-'YYYY'"] {
            assert!(
                matches!(
                    AuditIndexTemplate::parse(bad),
                    Err(ConfigError::MalformedTemplate { .. })
                ),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn doubled_quotes_are_escapes_not_delimiters() {
        let t = AuditIndexTemplate::parse("''''").unwrap();
        assert_eq!(t.render(at(2026, 10, 19, 0, 0, 0)), "''");
        assert!(AuditIndexTemplate::parse("'abc''").is_err());
    }

    #[test]
    fn resolver_recomputes_across_rollover() {
        let clock = Arc::new(ManualClock::starting_at(at(2026, 10, 19, 23, 59, 30)));
        let template = AuditIndexTemplate::parse("'auditlog-'YYYY.MM.dd").unwrap();
        let resolver = RollingIndexNameResolver::new(template, clock.clone());

        assert_eq!(resolver.current_audit_index_name(), "auditlog-2026.10.19");
        clock.advance(Duration::seconds(60));
        assert_eq!(resolver.current_audit_index_name(), "auditlog-2026.10.20");
        assert!(resolver.is_current_audit_index("auditlog-2026.10.20"));
        assert!(!resolver.is_current_audit_index("auditlog-2026.10.19"));
    }

    #[test]
    fn current_index_comparison_ignores_ascii_case() {
        let resolver = RollingIndexNameResolver::new(
            AuditIndexTemplate::parse("'AuditLog-'yyyy").unwrap(),
            Arc::new(FixedClock::at(at(2026, 10, 19, 0, 0, 0))),
        );
        assert!(resolver.is_current_audit_index("auditlog-2026"));
        assert!(resolver.is_current_audit_index("AUDITLOG-2026"));
        assert!(!resolver.is_current_audit_index("auditlog-2025"));
    }
}
