//! # Field Decision Cache
//!
//! Pull-through cache from index name to the field patterns whose reads are
//! recorded for that index. Loading goes through a [`FieldResolver`]; the
//! compiled result is kept until the whole configuration snapshot is
//! replaced.
//!
//! ## Single Flight
//!
//! Each key owns a slot guarded by its own mutex. The first caller for a key
//! holds that mutex while the resolver runs; concurrent callers for the same
//! key block on it and then read the loaded value, so a resolver is invoked
//! at most once per key at a time. Different keys load independently.
//!
//! A failed load leaves the slot empty and returns the error to the caller
//! that ran the resolver. Callers that were waiting retry the load
//! themselves. Failures are never cached and never turned into an empty set.
//!
//! ## Capacity
//!
//! Inserting a new key at capacity evicts one idle slot. A slot is idle when
//! the map holds the only reference to it, so a slot with a load in flight,
//! a waiter, or a caller about to lock it is never evicted. When every slot
//! is busy nothing is evicted and the cache grows past `capacity` until
//! those callers finish; concurrent misses can overshoot the same way.
//! Evicted keys reload on next use.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use auditgate_core::{ConfigError, LookupError, PatternSet, ResolveError};

/// Default maximum number of cached indices.
pub const DEFAULT_FIELD_CACHE_CAPACITY: usize = 1000;

/// Source of the read-history field patterns for an index.
///
/// Invoked on cache miss. An empty result means no fields of that index are
/// watched; an error means the answer is unknown.
pub trait FieldResolver: Send + Sync {
    /// Field patterns enabled for read history on `index`.
    fn resolve(&self, index: &str) -> Result<Vec<String>, ResolveError>;
}

impl<F> FieldResolver for F
where
    F: Fn(&str) -> Result<Vec<String>, ResolveError> + Send + Sync,
{
    fn resolve(&self, index: &str) -> Result<Vec<String>, ResolveError> {
        self(index)
    }
}

type Slot = Arc<Mutex<Option<Arc<PatternSet>>>>;

/// Single-flight, bounded pull-through cache of read-history field patterns.
pub struct FieldDecisionCache {
    resolver: Arc<dyn FieldResolver>,
    slots: DashMap<String, Slot>,
    capacity: usize,
}

impl FieldDecisionCache {
    /// Cache backed by `resolver`, holding about `capacity` indices.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a capacity of zero.
    pub fn new(resolver: Arc<dyn FieldResolver>, capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidValue {
                setting: "field_cache_capacity",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(Self::with_capacity(resolver, capacity))
    }

    /// Cache with [`DEFAULT_FIELD_CACHE_CAPACITY`].
    pub fn with_default_capacity(resolver: Arc<dyn FieldResolver>) -> Self {
        Self::with_capacity(resolver, DEFAULT_FIELD_CACHE_CAPACITY)
    }

    fn with_capacity(resolver: Arc<dyn FieldResolver>, capacity: usize) -> Self {
        Self {
            resolver,
            slots: DashMap::new(),
            capacity,
        }
    }

    /// Field patterns enabled for read history on `index`, loading on miss.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the resolver fails or returns a pattern
    /// that cannot be compiled. Nothing is cached in that case.
    pub fn fields_enabled_for(&self, index: &str) -> Result<Arc<PatternSet>, LookupError> {
        let slot = self.slot_for(index);
        let mut loaded = slot.lock();

        if let Some(fields) = loaded.as_ref() {
            metrics::counter!("auditgate_field_cache_hits_total").increment(1);
            return Ok(Arc::clone(fields));
        }

        metrics::counter!("auditgate_field_cache_loads_total").increment(1);
        let raw = self.resolver.resolve(index).map_err(|source| {
            metrics::counter!("auditgate_field_cache_load_failures_total").increment(1);
            tracing::debug!(index, error = %source, "field resolver failed");
            LookupError::Resolver {
                index: index.to_string(),
                source,
            }
        })?;
        let fields = PatternSet::new(raw).map_err(|source| {
            metrics::counter!("auditgate_field_cache_load_failures_total").increment(1);
            LookupError::InvalidFieldPattern {
                index: index.to_string(),
                source,
            }
        })?;

        tracing::debug!(index, fields = %fields, "loaded read-history fields");
        let fields = Arc::new(fields);
        *loaded = Some(Arc::clone(&fields));
        Ok(fields)
    }

    /// Number of cached or in-flight indices.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Target number of cached indices; see the module docs for when it is exceeded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.slots.clear();
    }

    fn slot_for(&self, index: &str) -> Slot {
        if let Some(slot) = self.slots.get(index) {
            return Arc::clone(slot.value());
        }
        if self.slots.len() >= self.capacity {
            self.evict_one();
        }
        Arc::clone(self.slots.entry(index.to_string()).or_default().value())
    }

    fn evict_one(&self) {
        let victim = self
            .slots
            .iter()
            .find(|entry| is_idle(entry.value()))
            .map(|entry| entry.key().clone());
        let Some(key) = victim else {
            tracing::trace!(entries = self.slots.len(), "no idle slot to evict");
            return;
        };
        // Re-checked under the shard write lock: nobody can clone the slot
        // out of the map while it is held.
        if self.slots.remove_if(&key, |_, slot| is_idle(slot)).is_some() {
            metrics::counter!("auditgate_field_cache_evictions_total").increment(1);
        }
    }
}

/// Only the map references the slot: no load, waiter or pending lock.
fn is_idle(slot: &Slot) -> bool {
    Arc::strong_count(slot) == 1
}

impl fmt::Debug for FieldDecisionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecisionCache")
            .field("entries", &self.slots.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(
        fields: &'static [&'static str],
    ) -> (Arc<AtomicUsize>, Arc<dyn FieldResolver>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let resolver = move |_index: &str| -> Result<Vec<String>, ResolveError> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(fields.iter().map(|f| f.to_string()).collect())
        };
        let resolver: Arc<dyn FieldResolver> = Arc::new(resolver);
        (calls, resolver)
    }

    #[test]
    fn loads_once_then_serves_from_cache() {
        let (calls, resolver) = counting(&["BAZ"]);
        let cache = FieldDecisionCache::with_default_capacity(resolver);

        let first = cache.fields_enabled_for("orders").unwrap();
        let second = cache.fields_enabled_for("orders").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.matches("BAZ"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_result_is_cached_as_empty_set() {
        let (calls, resolver) = counting(&[]);
        let cache = FieldDecisionCache::with_default_capacity(resolver);

        assert!(cache.fields_enabled_for("orders").unwrap().is_empty());
        assert!(cache.fields_enabled_for("orders").unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolver_failure_is_reported_and_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let resolver = move |_index: &str| -> Result<Vec<String>, ResolveError> {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ResolveError::new("store unavailable"))
            } else {
                Ok(vec!["*".into()])
            }
        };
        let cache = FieldDecisionCache::with_default_capacity(Arc::new(resolver));

        let err = cache.fields_enabled_for("orders").unwrap_err();
        assert!(matches!(err, LookupError::Resolver { .. }));
        assert_eq!(err.index(), "orders");

        let fields = cache.fields_enabled_for("orders").unwrap();
        assert!(fields.matches("anything"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalid_pattern_from_resolver_is_a_lookup_failure() {
        let resolver = |_index: &str| -> Result<Vec<String>, ResolveError> {
            Ok(vec!["ok".into(), String::new()])
        };
        let cache = FieldDecisionCache::with_default_capacity(Arc::new(resolver));
        assert!(matches!(
            cache.fields_enabled_for("orders"),
            Err(LookupError::InvalidFieldPattern { .. })
        ));
    }

    #[test]
    fn capacity_bounds_entry_count() {
        let (calls, resolver) = counting(&["f"]);
        let cache = FieldDecisionCache::new(resolver, 2).unwrap();

        for index in ["a", "b", "c", "d"] {
            cache.fields_enabled_for(index).unwrap();
            assert!(cache.len() <= 2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn zero_capacity_rejected() {
        let (_, resolver) = counting(&[]);
        let err = FieldDecisionCache::new(resolver, 0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { setting: "field_cache_capacity", .. }
        ));
    }

    #[test]
    fn capacity_of_one_keeps_latest_key() {
        let (calls, resolver) = counting(&["f"]);
        let cache = FieldDecisionCache::new(resolver, 1).unwrap();
        assert_eq!(cache.capacity(), 1);

        cache.fields_enabled_for("a").unwrap();
        cache.fields_enabled_for("b").unwrap();
        assert_eq!(cache.len(), 1);
        cache.fields_enabled_for("b").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn held_slot_is_not_evicted() {
        let (_, resolver) = counting(&["f"]);
        let cache = FieldDecisionCache::new(resolver, 1).unwrap();
        cache.fields_enabled_for("a").unwrap();

        let held = cache.slot_for("a");
        cache.fields_enabled_for("b").unwrap();
        assert_eq!(cache.len(), 2);
        drop(held);

        cache.fields_enabled_for("c").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_all_forces_reload() {
        let (calls, resolver) = counting(&["f"]);
        let cache = FieldDecisionCache::with_default_capacity(resolver);

        cache.fields_enabled_for("a").unwrap();
        cache.invalidate_all();
        assert!(cache.is_empty());
        cache.fields_enabled_for("a").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
