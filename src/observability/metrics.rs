//! Execution counters for cursors
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase, reset only when the registry is dropped
//! - Thread-safe but lock-free
//!
//! A registry is shared by `Arc` into every cursor that should report into
//! it; an external metrics collector reads counters by name through
//! `snapshot` or `to_json`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Registry of cursor execution counters
///
/// # Thread Safety
///
/// All counters use atomic operations with Relaxed ordering; exact
/// cross-counter consistency is not required for instrumentation.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Elements handed to a filter's predicate
    filter_given: AtomicU64,
    /// Predicate evaluations that ran through the async pipeline
    filter_during: AtomicU64,
    /// Elements that survived filtering
    filter_passed: AtomicU64,
    /// Elements suppressed by filtering
    filter_discarded: AtomicU64,
    /// Merge rounds driven by a union cursor
    union_rounds: AtomicU64,
    /// Elements emitted by a union cursor
    union_elements: AtomicU64,
    /// Union stops forced by a child's resource limit
    union_limit_stops: AtomicU64,
    /// Composite continuations encoded
    continuations_encoded: AtomicU64,
    /// Composite continuations decoded
    continuations_decoded: AtomicU64,
}

impl MetricsRegistry {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Filter counters

    /// Count an element examined by a filter
    pub fn increment_filter_given(&self) {
        self.filter_given.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a predicate evaluation entering the pipeline
    pub fn increment_filter_during(&self) {
        self.filter_during.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an element that passed its predicate
    pub fn increment_filter_passed(&self) {
        self.filter_passed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an element suppressed by its predicate
    pub fn increment_filter_discarded(&self) {
        self.filter_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Elements handed to a filter's predicate
    pub fn filter_given(&self) -> u64 {
        self.filter_given.load(Ordering::Relaxed)
    }

    /// Predicate evaluations that ran through the async pipeline
    pub fn filter_during(&self) -> u64 {
        self.filter_during.load(Ordering::Relaxed)
    }

    /// Elements that survived filtering
    pub fn filter_passed(&self) -> u64 {
        self.filter_passed.load(Ordering::Relaxed)
    }

    /// Elements suppressed by filtering
    pub fn filter_discarded(&self) -> u64 {
        self.filter_discarded.load(Ordering::Relaxed)
    }

    // Union counters

    /// Count a merge round
    pub fn increment_union_rounds(&self) {
        self.union_rounds.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an element emitted by a union
    pub fn increment_union_elements(&self) {
        self.union_elements.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a union stop forced by a child's resource limit
    pub fn increment_union_limit_stops(&self) {
        self.union_limit_stops.fetch_add(1, Ordering::Relaxed);
    }

    /// Merge rounds driven by a union cursor
    pub fn union_rounds(&self) -> u64 {
        self.union_rounds.load(Ordering::Relaxed)
    }

    /// Elements emitted by a union cursor
    pub fn union_elements(&self) -> u64 {
        self.union_elements.load(Ordering::Relaxed)
    }

    /// Union stops forced by a child's resource limit
    pub fn union_limit_stops(&self) -> u64 {
        self.union_limit_stops.load(Ordering::Relaxed)
    }

    // Continuation counters

    /// Count a composite continuation encoded
    pub fn increment_continuations_encoded(&self) {
        self.continuations_encoded.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a composite continuation decoded
    pub fn increment_continuations_decoded(&self) {
        self.continuations_decoded.fetch_add(1, Ordering::Relaxed);
    }

    /// Composite continuations encoded
    pub fn continuations_encoded(&self) -> u64 {
        self.continuations_encoded.load(Ordering::Relaxed)
    }

    /// Composite continuations decoded
    pub fn continuations_decoded(&self) -> u64 {
        self.continuations_decoded.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            filter_given: self.filter_given(),
            filter_during: self.filter_during(),
            filter_passed: self.filter_passed(),
            filter_discarded: self.filter_discarded(),
            union_rounds: self.union_rounds(),
            union_elements: self.union_elements(),
            union_limit_stops: self.union_limit_stops(),
            continuations_encoded: self.continuations_encoded(),
            continuations_decoded: self.continuations_decoded(),
        }
    }

    /// All counters as a JSON object keyed by counter name
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        serde_json::json!({
            "filter_given": s.filter_given,
            "filter_during": s.filter_during,
            "filter_passed": s.filter_passed,
            "filter_discarded": s.filter_discarded,
            "union_rounds": s.union_rounds,
            "union_elements": s.union_elements,
            "union_limit_stops": s.union_limit_stops,
            "continuations_encoded": s.continuations_encoded,
            "continuations_decoded": s.continuations_decoded,
        })
        .to_string()
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub filter_given: u64,
    pub filter_during: u64,
    pub filter_passed: u64,
    pub filter_discarded: u64,
    pub union_rounds: u64,
    pub union_elements: u64,
    pub union_limit_stops: u64,
    pub continuations_encoded: u64,
    pub continuations_decoded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = MetricsRegistry::new();
        assert_eq!(metrics.filter_given(), 0);
        assert_eq!(metrics.union_rounds(), 0);
        assert_eq!(metrics.continuations_encoded(), 0);
    }

    #[test]
    fn test_increments_are_visible() {
        let metrics = MetricsRegistry::new();
        metrics.increment_filter_given();
        metrics.increment_filter_given();
        metrics.increment_filter_passed();
        metrics.increment_filter_discarded();
        assert_eq!(metrics.filter_given(), 2);
        assert_eq!(metrics.filter_passed(), 1);
        assert_eq!(metrics.filter_discarded(), 1);
    }

    #[test]
    fn test_snapshot_is_consistent_copy() {
        let metrics = MetricsRegistry::new();
        metrics.increment_union_rounds();
        metrics.increment_union_elements();
        let snap = metrics.snapshot();
        metrics.increment_union_rounds();
        assert_eq!(snap.union_rounds, 1);
        assert_eq!(metrics.union_rounds(), 2);
    }

    #[test]
    fn test_to_json_names_all_counters() {
        let metrics = MetricsRegistry::new();
        metrics.increment_continuations_encoded();
        let json: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(json["continuations_encoded"], 1);
        assert_eq!(json["filter_given"], 0);
    }
}
