//! # Metrics Traits
//!
//! Recording, snapshotting, and resetting are split into small traits so the
//! decorators only depend on the recorder side.
//!
//! ```text
//!   ┌──────────────────────┐      ┌──────────────────────┐
//!   │  LruMetricsRecorder  │      │ SoftMetricsRecorder  │
//!   │  get/touch/put/evict │      │ get/pin/purge        │
//!   └──────────┬───────────┘      └──────────┬───────────┘
//!              │                             │
//!              ▼                             ▼
//!   ┌────────────────────────────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>  +  MetricsReset        │
//!   │ (tests, benches, exporters)                        │
//!   └────────────────────────────────────────────────────┘
//! ```
//!
//! All recorder methods take `&self`: decorators are shared between threads
//! and count through atomics.

/// Counters for the LRU decorator.
pub trait LruMetricsRecorder {
    fn record_get(&self, touched: bool);
    fn record_put(&self);
    fn record_eviction(&self);
    fn record_remove(&self);
    fn record_clear(&self);
}

/// Counters for the soft-reference decorator.
pub trait SoftMetricsRecorder {
    fn record_get_hit(&self);
    fn record_get_miss(&self);
    fn record_reclaimed_miss(&self);
    fn record_purged(&self, entries: u64);
    fn record_pin(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&self);
}
