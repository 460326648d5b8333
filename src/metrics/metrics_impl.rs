use crate::metrics::cell::MetricsCell;
use crate::metrics::traits::{LruMetricsRecorder, MetricsReset, SoftMetricsRecorder};

#[derive(Debug, Default)]
pub struct LruMetrics {
    pub get_calls: MetricsCell,
    pub touch_found: MetricsCell,
    pub put_calls: MetricsCell,
    pub evictions: MetricsCell,
    pub remove_calls: MetricsCell,
    pub clear_calls: MetricsCell,
}

impl LruMetricsRecorder for LruMetrics {
    fn record_get(&self, touched: bool) {
        self.get_calls.incr();
        if touched {
            self.touch_found.incr();
        }
    }

    fn record_put(&self) {
        self.put_calls.incr();
    }

    fn record_eviction(&self) {
        self.evictions.incr();
    }

    fn record_remove(&self) {
        self.remove_calls.incr();
    }

    fn record_clear(&self) {
        self.clear_calls.incr();
    }
}

impl MetricsReset for LruMetrics {
    fn reset_metrics(&self) {
        self.get_calls.reset();
        self.touch_found.reset();
        self.put_calls.reset();
        self.evictions.reset();
        self.remove_calls.reset();
        self.clear_calls.reset();
    }
}

#[derive(Debug, Default)]
pub struct SoftMetrics {
    pub get_calls: MetricsCell,
    pub get_hits: MetricsCell,
    pub get_misses: MetricsCell,
    pub reclaimed_misses: MetricsCell,
    pub purged_entries: MetricsCell,
    pub pins: MetricsCell,
}

impl SoftMetricsRecorder for SoftMetrics {
    fn record_get_hit(&self) {
        self.get_calls.incr();
        self.get_hits.incr();
    }

    fn record_get_miss(&self) {
        self.get_calls.incr();
        self.get_misses.incr();
    }

    // counted on top of the miss itself
    fn record_reclaimed_miss(&self) {
        self.reclaimed_misses.incr();
    }

    fn record_purged(&self, entries: u64) {
        self.purged_entries.add(entries);
    }

    fn record_pin(&self) {
        self.pins.incr();
    }
}

impl MetricsReset for SoftMetrics {
    fn reset_metrics(&self) {
        self.get_calls.reset();
        self.get_hits.reset();
        self.get_misses.reset();
        self.reclaimed_misses.reset();
        self.purged_entries.reset();
        self.pins.reset();
    }
}
