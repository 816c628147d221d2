//! # Watched Read Fields
//!
//! The settings-driven [`FieldResolver`]. Each watched entry names an index
//! pattern and the field patterns whose reads are recorded on matching
//! indices, written as `indexPattern[,fieldPattern...]`:
//!
//! ```text
//! customers-*,name,ssn     reads of `name` and `ssn` on customers-* indices
//! payments                 reads of any field on `payments`
//! ```
//!
//! Resolving an index unions the field patterns of every entry whose index
//! pattern matches it. The answer depends only on the index name, so it is
//! safe to cache; excluding the audit sink's current index is left to the
//! evaluator, which checks it on every call.

use std::fmt;

use auditgate_core::{ConfigError, ResolveError, WildcardPattern};

use crate::cache::FieldResolver;

/// One `indexPattern[,fieldPattern...]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedReadEntry {
    index: WildcardPattern,
    fields: Vec<String>,
}

impl WatchedReadEntry {
    /// Parse a comma-separated entry. A bare index pattern watches all fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for an empty entry, an empty
    /// index pattern, or an empty field pattern.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let mut parts = entry.split(',').map(str::trim);
        let index = match parts.next() {
            Some(index) if !index.is_empty() => WildcardPattern::new(index)?,
            _ => {
                return Err(ConfigError::InvalidPattern {
                    pattern: entry.to_string(),
                    reason: "watched read entry must start with an index pattern".into(),
                })
            }
        };

        let mut fields = Vec::new();
        for field in parts {
            // Validate now so a bad entry fails at construction, not on first read.
            let field = WildcardPattern::new(field).map_err(|_| ConfigError::InvalidPattern {
                pattern: entry.to_string(),
                reason: "watched read entry contains an empty field pattern".into(),
            })?;
            fields.push(field.as_str().to_string());
        }
        if fields.is_empty() {
            fields.push("*".to_string());
        }

        Ok(Self { index, fields })
    }

    /// The index pattern.
    pub fn index_pattern(&self) -> &str {
        self.index.as_str()
    }

    /// The watched field patterns.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Resolver over a list of watched read entries.
#[derive(Debug, Clone)]
pub struct WatchedReadFields {
    entries: Vec<WatchedReadEntry>,
}

impl WatchedReadFields {
    /// Parse `entries`.
    ///
    /// # Errors
    ///
    /// Returns the first entry that fails to parse.
    pub fn new<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| WatchedReadEntry::parse(e.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Union of the field patterns of every entry matching `index`.
    pub fn fields_for(&self, index: &str) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.index.matches(index)) {
            for field in &entry.fields {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
            }
        }
        fields
    }
}

impl FieldResolver for WatchedReadFields {
    fn resolve(&self, index: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self.fields_for(index))
    }
}

impl fmt::Display for WatchedReadEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)?;
        for field in &self.fields {
            write!(f, ",{field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_index_watches_all_fields() {
        let entry = WatchedReadEntry::parse("payments").unwrap();
        assert_eq!(entry.index_pattern(), "payments");
        assert_eq!(entry.fields(), ["*"]);
    }

    #[test]
    fn entries_are_trimmed() {
        let entry = WatchedReadEntry::parse(" customers-* , name ,ssn ").unwrap();
        assert_eq!(entry.index_pattern(), "customers-*");
        assert_eq!(entry.fields(), ["name", "ssn"]);
        assert_eq!(entry.to_string(), "customers-*,name,ssn");
    }

    #[test]
    fn empty_parts_rejected() {
        assert!(WatchedReadEntry::parse("").is_err());
        assert!(WatchedReadEntry::parse(",name").is_err());
        assert!(WatchedReadEntry::parse("customers,,name").is_err());
        assert!(WatchedReadEntry::parse("customers,").is_err());
    }

    #[test]
    fn matching_entries_are_unioned() {
        let watched = WatchedReadFields::new(
            ["customers-*,name,ssn", "customers-eu,iban,name", "payments"],
        )
        .unwrap();

        assert_eq!(watched.fields_for("customers-eu"), vec!["name", "ssn", "iban"]);
        assert_eq!(watched.fields_for("customers-us"), vec!["name", "ssn"]);
        assert_eq!(watched.fields_for("payments"), vec!["*"]);
        assert!(watched.fields_for("orders").is_empty());
    }

    #[test]
    fn resolution_depends_only_on_the_name() {
        let watched = WatchedReadFields::new(["*", "auditlog-*,f"]).unwrap();

        assert_eq!(watched.fields_for("auditlog-2026.10.19"), vec!["*", "f"]);
        assert_eq!(watched.resolve("orders").unwrap(), vec!["*"]);
    }

    #[test]
    fn bad_entry_fails_construction() {
        assert!(WatchedReadFields::new(["orders", ""]).is_err());
    }
}
