/// Point-in-time view of [`LruCache`](crate::policy::lru::LruCache) counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LruMetricsSnapshot {
    pub get_calls: u64,
    pub touch_found: u64,
    pub put_calls: u64,
    pub evictions: u64,
    pub remove_calls: u64,
    pub clear_calls: u64,

    // gauges captured at snapshot time
    pub tracked_keys: usize,
    pub capacity: usize,
}

/// Point-in-time view of [`SoftCache`](crate::policy::soft::SoftCache) counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SoftMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub reclaimed_misses: u64, // wrapper present but referent already reclaimed
    pub purged_entries: u64,   // delegate entries removed after a queue notification
    pub pins: u64,

    pub hard_links: usize,
    pub hard_link_limit: usize,
}

impl SoftMetricsSnapshot {
    /// Fraction of `get` calls that returned a value.
    pub fn hit_ratio(&self) -> f64 {
        if self.get_calls == 0 {
            return 0.0;
        }
        self.get_hits as f64 / self.get_calls as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_handles_zero_calls() {
        let snapshot = SoftMetricsSnapshot::default();
        assert_eq!(snapshot.hit_ratio(), 0.0);

        let snapshot = SoftMetricsSnapshot {
            get_calls: 4,
            get_hits: 3,
            get_misses: 1,
            ..SoftMetricsSnapshot::default()
        };
        assert!((snapshot.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
