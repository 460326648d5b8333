//! Decorator metrics (feature `metrics`).
//!
//! Each decorator owns a set of atomic counters and exposes a copyable
//! snapshot through [`MetricsSnapshotProvider`](traits::MetricsSnapshotProvider).

pub mod cell;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
