//! # Name Patterns — Wildcard Matching for Index and Field Names
//!
//! Index watch lists, immutable index lists and read-history field lists are
//! all sets of name patterns. A pattern is either an exact name or contains
//! wildcards:
//!
//! - `*` matches any run of characters, including the empty run.
//! - `?` matches exactly one character.
//!
//! Matching is case-sensitive and operates on Unicode scalar values. Names are
//! opaque; no normalization is applied to either side.
//!
//! ## Security Invariant
//!
//! An absent name never matches, and an empty [`PatternSet`] matches nothing.
//! A missing watch list therefore never widens what is audited or protected.

use std::fmt;

use crate::error::ConfigError;

/// A single compiled name pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternKind {
    /// No wildcard characters; plain equality.
    Exact,
    /// The pattern consists only of `*`.
    MatchAll,
    /// General wildcard pattern, pre-split into characters.
    Glob(Vec<char>),
}

impl WildcardPattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if the pattern is empty or
    /// consists only of whitespace.
    pub fn new(pattern: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = pattern.into();
        if raw.trim().is_empty() {
            return Err(ConfigError::InvalidPattern {
                pattern: raw,
                reason: "pattern must not be empty".into(),
            });
        }

        let kind = if raw.chars().all(|c| c == '*') {
            PatternKind::MatchAll
        } else if raw.contains(['*', '?']) {
            PatternKind::Glob(raw.chars().collect())
        } else {
            PatternKind::Exact
        };

        Ok(Self { raw, kind })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains wildcard characters.
    pub fn is_wildcard(&self) -> bool {
        !matches!(self.kind, PatternKind::Exact)
    }

    /// Whether `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match &self.kind {
            PatternKind::Exact => self.raw == name,
            PatternKind::MatchAll => true,
            PatternKind::Glob(pattern) => {
                let text: Vec<char> = name.chars().collect();
                glob_match(pattern, &text)
            }
        }
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Iterative wildcard match with single-star backtracking.
///
/// Runs in O(pattern × text) worst case and never recurses.
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some(p);
                resume = t;
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some(s) => {
                    p = s + 1;
                    resume += 1;
                    t = resume;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// An immutable set of name patterns.
///
/// Duplicate patterns are collapsed; insertion order is otherwise kept so
/// that diagnostics list patterns the way they were configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<WildcardPattern>,
}

impl PatternSet {
    /// A set that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a set of patterns.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidPattern`] encountered.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut compiled: Vec<WildcardPattern> = Vec::new();
        for pattern in patterns {
            let pattern = WildcardPattern::new(pattern)?;
            if !compiled.contains(&pattern) {
                compiled.push(pattern);
            }
        }
        Ok(Self { patterns: compiled })
    }

    /// Whether `name` equals or wildcard-matches any pattern in the set.
    ///
    /// Accepts either a `&str` or an `Option<&str>`; `None` never matches.
    pub fn matches<'a>(&self, name: impl Into<Option<&'a str>>) -> bool {
        match name.into() {
            Some(name) => self.patterns.iter().any(|p| p.matches(name)),
            None => false,
        }
    }

    /// Whether the set holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Iterate the patterns as written.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(WildcardPattern::as_str)
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{pattern}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> PatternSet {
        PatternSet::new(patterns.iter().copied()).unwrap()
    }

    #[test]
    fn exact_pattern_matches_only_itself() {
        let p = WildcardPattern::new("orders").unwrap();
        assert!(!p.is_wildcard());
        assert!(p.matches("orders"));
        assert!(!p.matches("orders-1"));
        assert!(!p.matches("Orders"));
    }

    #[test]
    fn prefix_and_suffix_wildcards() {
        let prefix = WildcardPattern::new("orders-*").unwrap();
        assert!(prefix.matches("orders-"));
        assert!(prefix.matches("orders-2026.10"));
        assert!(!prefix.matches("archive-orders-1"));

        let suffix = WildcardPattern::new("*-archive").unwrap();
        assert!(suffix.matches("orders-archive"));
        assert!(!suffix.matches("orders-archive-old"));
    }

    #[test]
    fn interior_wildcards_backtrack() {
        let p = WildcardPattern::new("a*b*c").unwrap();
        assert!(p.matches("abc"));
        assert!(p.matches("axxbyybzzc"));
        assert!(!p.matches("axxbyy"));

        let q = WildcardPattern::new("log-????.??").unwrap();
        assert!(q.matches("log-2026.10"));
        assert!(!q.matches("log-26.10"));
    }

    #[test]
    fn question_mark_matches_one_unicode_scalar() {
        let p = WildcardPattern::new("caf?").unwrap();
        assert!(p.matches("café"));
        assert!(!p.matches("caf"));
    }

    #[test]
    fn star_only_matches_everything() {
        let p = WildcardPattern::new("**").unwrap();
        assert!(p.matches(""));
        assert!(p.matches("anything at all"));
    }

    #[test]
    fn empty_pattern_rejected() {
        assert!(matches!(
            WildcardPattern::new(""),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(PatternSet::new(["ok", "  "]).is_err());
    }

    #[test]
    fn empty_set_matches_nothing() {
        let empty = PatternSet::empty();
        assert!(empty.is_empty());
        assert!(!empty.matches("foo"));
        assert!(!empty.matches(""));
    }

    #[test]
    fn absent_name_never_matches() {
        let all = set(&["*"]);
        assert!(!all.matches(None::<&str>));
        assert!(all.matches(Some("x")));
    }

    #[test]
    fn duplicates_collapse() {
        let s = set(&["a*", "b", "a*"]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec!["a*", "b"]);
        assert_eq!(s.to_string(), "[a*, b]");
    }

    #[test]
    fn set_matches_any_member() {
        let s = set(&["foo", "bar-*"]);
        assert!(s.matches("foo"));
        assert!(s.matches("bar-1"));
        assert!(!s.matches("baz"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A name without wildcard characters always matches itself exactly.
        #[test]
        fn literal_name_matches_itself(name in "[a-zA-Z0-9_.-]{1,32}") {
            let p = WildcardPattern::new(name.clone()).unwrap();
            prop_assert!(p.matches(&name));
        }

        /// `prefix*` matches every extension of the prefix.
        #[test]
        fn prefix_star_matches_extensions(
            prefix in "[a-z]{1,10}",
            rest in "[a-z0-9.-]{0,20}",
        ) {
            let p = WildcardPattern::new(format!("{prefix}*")).unwrap();
            let name = format!("{prefix}{rest}");
            prop_assert!(p.matches(&name));
        }

        /// `*` matches any name, including the empty one.
        #[test]
        fn match_all_is_total(name in ".{0,40}") {
            prop_assert!(set_of_star().matches(name.as_str()));
        }
    }

    fn set_of_star() -> PatternSet {
        PatternSet::new(["*"]).unwrap()
    }
}
