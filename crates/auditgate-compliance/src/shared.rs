//! # Shared Snapshot
//!
//! Request handlers read the current [`ComplianceConfig`] through a
//! [`SharedComplianceConfig`]. A reader clones the inner `Arc` and evaluates
//! against that snapshot for the rest of the request; a concurrent reload
//! swaps in a new snapshot (with a fresh, empty field cache) without
//! disturbing readers that already hold the old one.

use std::sync::Arc;

use parking_lot::RwLock;

use auditgate_core::{Clock, ConfigError};

use crate::config::ComplianceConfig;
use crate::settings::ComplianceSettings;

/// Hot-swappable handle to the current compliance snapshot.
///
/// Cheaply cloneable; all clones observe the same snapshot.
#[derive(Debug, Clone)]
pub struct SharedComplianceConfig {
    current: Arc<RwLock<Arc<ComplianceConfig>>>,
}

impl SharedComplianceConfig {
    /// Wrap an initial snapshot.
    pub fn new(config: ComplianceConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The snapshot in effect right now.
    pub fn current(&self) -> Arc<ComplianceConfig> {
        Arc::clone(&self.current.read())
    }

    /// Install `config`, returning the snapshot it replaced.
    pub fn replace(&self, config: ComplianceConfig) -> Arc<ComplianceConfig> {
        let next = Arc::new(config);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        tracing::info!(
            enabled = previous.is_enabled(),
            cached_indices = previous.field_cache().len(),
            "replaced compliance configuration"
        );
        previous
    }

    /// Build a snapshot from `settings` and install it.
    ///
    /// # Errors
    ///
    /// Returns the construction error and keeps the current snapshot.
    pub fn reload(
        &self,
        settings: &ComplianceSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<(), ConfigError> {
        match ComplianceConfig::from_settings_with_clock(settings, clock) {
            Ok(config) => {
                self.replace(config);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "compliance configuration reload rejected; keeping previous");
                Err(e)
            }
        }
    }
}
