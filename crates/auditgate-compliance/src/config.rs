//! # Compliance Policy Evaluator
//!
//! [`ComplianceConfig`] is an immutable snapshot of the compliance settings
//! together with the decision operations the request layer calls before
//! emitting an audit record:
//!
//! | Operation | Question |
//! |-----------|----------|
//! | `write_history_enabled_for_index` | record the history of this write? |
//! | `read_history_enabled_for_index` | record reads of this index? |
//! | `read_history_enabled_for_field` | record reads of this field? |
//! | `log_diffs_for_write` | include a full diff with write records? |
//! | `log_read_metadata_only` | omit field contents from read records? |
//! | `is_index_immutable` | reject updates to this index? |
//!
//! ## Invariants
//!
//! - A disabled snapshot answers `false` to every operation.
//! - An absent index answers `false` and is not an error.
//! - The audit sink's *current* index is never write- or read-audited, for
//!   every name the rolling template can resolve to. The check runs on every
//!   call, so a rollover takes effect without touching the field cache.
//!   Writes to the security index are never write-audited through this path.
//! - The security index is read-audited iff `log_internal_config`, in full,
//!   independent of the field cache.
//! - Only the read-history operations can fail, and only when the field cache
//!   cannot load. Failures are returned, never folded into `false`; the
//!   `*_or_audit` variants resolve them to "must audit".

use std::fmt;
use std::sync::Arc;

use auditgate_core::{
    AuditIndexTemplate, Clock, ConfigError, LookupError, PatternSet, RollingIndexNameResolver,
    SystemClock,
};

use crate::cache::{FieldDecisionCache, FieldResolver, DEFAULT_FIELD_CACHE_CAPACITY};
use crate::settings::ComplianceSettings;
use crate::watched::WatchedReadFields;

/// What is recorded with a write audit event beyond the base event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteGranularity {
    /// Nothing beyond the base event.
    None,
    /// Document metadata only.
    MetadataOnly,
    /// Full document diff.
    Diffs,
}

impl fmt::Display for WriteGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::MetadataOnly => "METADATA_ONLY",
            Self::Diffs => "DIFFS",
        };
        f.write_str(s)
    }
}

/// Immutable compliance configuration snapshot and policy evaluator.
///
/// Built with [`ComplianceConfig::builder`] or
/// [`ComplianceConfig::from_settings`]. Safe to share across threads; only
/// the read-field cache has interior mutability.
#[derive(Debug)]
pub struct ComplianceConfig {
    enabled: bool,
    security_index: String,
    log_internal_config: bool,
    log_external_config: bool,
    watched_write_indices: PatternSet,
    audit_index: RollingIndexNameResolver,
    immutable_indices: PatternSet,
    write_granularity: WriteGranularity,
    log_read_metadata_only: bool,
    read_fields: FieldDecisionCache,
}

impl ComplianceConfig {
    /// Start building a snapshot.
    pub fn builder() -> ComplianceConfigBuilder {
        ComplianceConfigBuilder::default()
    }

    /// Build a snapshot from a settings document, resolving the audit index
    /// against wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any invalid pattern, template or value.
    pub fn from_settings(settings: &ComplianceSettings) -> Result<Self, ConfigError> {
        Self::from_settings_with_clock(settings, Arc::new(SystemClock))
    }

    /// Build a snapshot from a settings document with an explicit clock.
    ///
    /// # Errors
    ///
    /// As [`ComplianceConfig::from_settings`].
    pub fn from_settings_with_clock(
        settings: &ComplianceSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Self::builder()
            .enabled(settings.enabled)
            .security_index(settings.security_index.as_str())
            .audit_index(settings.audit_index.as_str())
            .clock(clock)
            .log_internal_config(settings.log_internal_config)
            .log_external_config(settings.log_external_config)
            .watched_write_indices(settings.write.watched_indices.iter().cloned())
            .immutable_indices(settings.immutable_indices.iter().cloned())
            .log_diffs_for_write(settings.write.log_diffs)
            .log_write_metadata_only(settings.write.metadata_only)
            .log_read_metadata_only(settings.read.metadata_only)
            .watched_read_fields(settings.read.watched_fields.iter().cloned())
            .field_cache_capacity(settings.field_cache_capacity)
            .build()
    }

    // ─── Decisions ───────────────────────────────────────────────────

    /// Whether writes to `index` are recorded in write history.
    pub fn write_history_enabled_for_index<'a>(&self, index: impl Into<Option<&'a str>>) -> bool {
        let Some(index) = self.live(index.into()) else {
            return false;
        };
        if self.is_current_audit_index(index) {
            return false;
        }
        if index == self.security_index {
            return false;
        }
        self.watched_write_indices.matches(index)
    }

    /// Whether reads of `index` are recorded in read history.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the field set for `index` cannot be loaded.
    pub fn read_history_enabled_for_index<'a>(
        &self,
        index: impl Into<Option<&'a str>>,
    ) -> Result<bool, LookupError> {
        let Some(index) = self.live(index.into()) else {
            return Ok(false);
        };
        if index == self.security_index {
            return Ok(self.log_internal_config);
        }
        if self.is_current_audit_index(index) {
            return Ok(false);
        }
        Ok(!self.read_fields.fields_enabled_for(index)?.is_empty())
    }

    /// Whether reads of `field` on `index` are recorded in read history.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the field set for `index` cannot be loaded.
    pub fn read_history_enabled_for_field<'a, 'b>(
        &self,
        index: impl Into<Option<&'a str>>,
        field: impl Into<Option<&'b str>>,
    ) -> Result<bool, LookupError> {
        let Some(index) = self.live(index.into()) else {
            return Ok(false);
        };
        if index == self.security_index {
            return Ok(self.log_internal_config);
        }
        let field = field.into();
        if field.is_none() || self.is_current_audit_index(index) {
            return Ok(false);
        }
        Ok(self.read_fields.fields_enabled_for(index)?.matches(field))
    }

    /// [`read_history_enabled_for_index`](Self::read_history_enabled_for_index),
    /// answering "must audit" when the field set cannot be loaded.
    pub fn read_history_enabled_for_index_or_audit<'a>(
        &self,
        index: impl Into<Option<&'a str>>,
    ) -> bool {
        self.read_history_enabled_for_index(index)
            .unwrap_or_else(|err| fail_closed(&err))
    }

    /// [`read_history_enabled_for_field`](Self::read_history_enabled_for_field),
    /// answering "must audit" when the field set cannot be loaded.
    pub fn read_history_enabled_for_field_or_audit<'a, 'b>(
        &self,
        index: impl Into<Option<&'a str>>,
        field: impl Into<Option<&'b str>>,
    ) -> bool {
        self.read_history_enabled_for_field(index, field)
            .unwrap_or_else(|err| fail_closed(&err))
    }

    /// Whether write records carry a full document diff.
    ///
    /// Never true together with [`log_write_metadata_only`](Self::log_write_metadata_only).
    pub fn log_diffs_for_write(&self) -> bool {
        self.enabled && self.write_granularity == WriteGranularity::Diffs
    }

    /// Whether write records carry document metadata only.
    pub fn log_write_metadata_only(&self) -> bool {
        self.enabled && self.write_granularity == WriteGranularity::MetadataOnly
    }

    /// Whether read records carry metadata only.
    pub fn log_read_metadata_only(&self) -> bool {
        self.enabled && self.log_read_metadata_only
    }

    /// Whether `index` is write-protected.
    pub fn is_index_immutable<'a>(&self, index: impl Into<Option<&'a str>>) -> bool {
        match self.live(index.into()) {
            Some(index) => self.immutable_indices.matches(index),
            None => false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    /// Master switch.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Effective write granularity; `None` when disabled.
    pub fn write_granularity(&self) -> WriteGranularity {
        if self.enabled {
            self.write_granularity
        } else {
            WriteGranularity::None
        }
    }

    /// Whether the security index is audited in full.
    pub fn log_internal_config(&self) -> bool {
        self.enabled && self.log_internal_config
    }

    /// Whether node-external configuration changes are audited.
    pub fn log_external_config(&self) -> bool {
        self.enabled && self.log_external_config
    }

    /// Name of the subsystem's own configuration index.
    pub fn security_index_name(&self) -> &str {
        &self.security_index
    }

    /// The audit index name or template as configured.
    pub fn audit_index_template(&self) -> &AuditIndexTemplate {
        self.audit_index.template()
    }

    /// The index the audit sink is writing to right now.
    pub fn current_audit_index_name(&self) -> String {
        self.audit_index.current_audit_index_name()
    }

    /// Index patterns whose writes are recorded.
    pub fn watched_write_index_patterns(&self) -> &PatternSet {
        &self.watched_write_indices
    }

    /// Write-protected index patterns.
    pub fn immutable_index_patterns(&self) -> &PatternSet {
        &self.immutable_indices
    }

    /// The read-history field cache.
    pub fn field_cache(&self) -> &FieldDecisionCache {
        &self.read_fields
    }

    fn is_current_audit_index(&self, index: &str) -> bool {
        let current = self.audit_index.is_current_audit_index(index);
        if current {
            tracing::trace!(index, "current audit index excluded from audit history");
        }
        current
    }

    /// `index` if the snapshot is enabled and the index is present.
    fn live<'a>(&self, index: Option<&'a str>) -> Option<&'a str> {
        if self.enabled {
            index
        } else {
            None
        }
    }
}

fn fail_closed(err: &LookupError) -> bool {
    tracing::warn!(index = err.index(), error = %err, "read-history lookup failed; auditing");
    true
}

// ─── Builder ─────────────────────────────────────────────────────────

enum FieldSource {
    Resolver(Arc<dyn FieldResolver>),
    Watched(Vec<String>),
}

/// Validating builder for [`ComplianceConfig`].
///
/// `security_index` and `audit_index` are required. Everything else defaults
/// to an enabled snapshot that audits nothing.
pub struct ComplianceConfigBuilder {
    enabled: bool,
    security_index: Option<String>,
    audit_index: Option<String>,
    clock: Option<Arc<dyn Clock>>,
    log_internal_config: bool,
    log_external_config: bool,
    watched_write_indices: Vec<String>,
    immutable_indices: Vec<String>,
    log_diffs_for_write: bool,
    log_write_metadata_only: bool,
    log_read_metadata_only: bool,
    fields: FieldSource,
    field_cache_capacity: usize,
}

impl Default for ComplianceConfigBuilder {
    fn default() -> Self {
        Self {
            enabled: true,
            security_index: None,
            audit_index: None,
            clock: None,
            log_internal_config: false,
            log_external_config: false,
            watched_write_indices: Vec::new(),
            immutable_indices: Vec::new(),
            log_diffs_for_write: false,
            log_write_metadata_only: false,
            log_read_metadata_only: false,
            fields: FieldSource::Watched(Vec::new()),
            field_cache_capacity: DEFAULT_FIELD_CACHE_CAPACITY,
        }
    }
}

impl ComplianceConfigBuilder {
    /// Master switch. Defaults to `true`.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Name of the subsystem's own configuration index. Required.
    pub fn security_index(mut self, name: impl Into<String>) -> Self {
        self.security_index = Some(name.into());
        self
    }

    /// Audit index name or quoted date template. Required.
    pub fn audit_index(mut self, template: impl Into<String>) -> Self {
        self.audit_index = Some(template.into());
        self
    }

    /// Clock the audit index is resolved against. Defaults to wall-clock time.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Audit every field of the security index.
    pub fn log_internal_config(mut self, on: bool) -> Self {
        self.log_internal_config = on;
        self
    }

    /// Audit node-external configuration changes.
    pub fn log_external_config(mut self, on: bool) -> Self {
        self.log_external_config = on;
        self
    }

    /// Index patterns whose writes are recorded.
    pub fn watched_write_indices<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.watched_write_indices = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Write-protected index patterns.
    pub fn immutable_indices<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.immutable_indices = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Record full document diffs with write events.
    pub fn log_diffs_for_write(mut self, on: bool) -> Self {
        self.log_diffs_for_write = on;
        self
    }

    /// Record document metadata only with write events.
    pub fn log_write_metadata_only(mut self, on: bool) -> Self {
        self.log_write_metadata_only = on;
        self
    }

    /// Record metadata only with read events.
    pub fn log_read_metadata_only(mut self, on: bool) -> Self {
        self.log_read_metadata_only = on;
        self
    }

    /// `indexPattern[,fieldPattern...]` read-history entries. Replaces any
    /// resolver set with [`field_resolver`](Self::field_resolver).
    pub fn watched_read_fields<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = FieldSource::Watched(entries.into_iter().map(Into::into).collect());
        self
    }

    /// Custom read-history field resolver. Replaces any watched entries.
    pub fn field_resolver(mut self, resolver: impl FieldResolver + 'static) -> Self {
        self.fields = FieldSource::Resolver(Arc::new(resolver));
        self
    }

    /// Maximum number of indices held in the read-field cache.
    pub fn field_cache_capacity(mut self, capacity: usize) -> Self {
        self.field_cache_capacity = capacity;
        self
    }

    /// Validate and build the snapshot.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] without a security index or audit index.
    /// - [`ConfigError::InvalidPattern`] for an empty pattern or watched entry.
    /// - [`ConfigError::MalformedTemplate`] for an unparseable audit index.
    /// - [`ConfigError::ConflictingWriteGranularity`] when both diff and
    ///   metadata-only write logging are requested.
    /// - [`ConfigError::InvalidValue`] for a zero cache capacity.
    pub fn build(self) -> Result<ComplianceConfig, ConfigError> {
        let security_index = self
            .security_index
            .filter(|name| !name.trim().is_empty())
            .ok_or(ConfigError::MissingField("security_index"))?;
        let template = self
            .audit_index
            .ok_or(ConfigError::MissingField("audit_index"))?;
        let template = AuditIndexTemplate::parse(&template)?;

        let write_granularity = match (self.log_diffs_for_write, self.log_write_metadata_only) {
            (true, true) => return Err(ConfigError::ConflictingWriteGranularity),
            (true, false) => WriteGranularity::Diffs,
            (false, true) => WriteGranularity::MetadataOnly,
            (false, false) => WriteGranularity::None,
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let audit_index = RollingIndexNameResolver::new(template, clock);

        let resolver: Arc<dyn FieldResolver> = match self.fields {
            FieldSource::Resolver(resolver) => resolver,
            FieldSource::Watched(entries) => Arc::new(WatchedReadFields::new(entries)?),
        };
        let read_fields = FieldDecisionCache::new(resolver, self.field_cache_capacity)?;

        let config = ComplianceConfig {
            enabled: self.enabled,
            security_index,
            log_internal_config: self.log_internal_config,
            log_external_config: self.log_external_config,
            watched_write_indices: PatternSet::new(self.watched_write_indices)?,
            immutable_indices: PatternSet::new(self.immutable_indices)?,
            write_granularity,
            log_read_metadata_only: self.log_read_metadata_only,
            read_fields,
            audit_index,
        };

        tracing::debug!(
            enabled = config.enabled,
            security_index = %config.security_index,
            audit_index = %config.audit_index.template(),
            watched_write = %config.watched_write_indices,
            immutable = %config.immutable_indices,
            write_granularity = %config.write_granularity,
            "built compliance configuration"
        );
        Ok(config)
    }
}
