use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing metrics counter.
///
/// Decorators are shared across threads and record through `&self`, so the
/// counter is a relaxed atomic. Metrics are observational and never feed back
/// into cache decisions.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct MetricsCell(AtomicU64);

impl MetricsCell {
    #[inline]
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_counts_and_resets() {
        let cell = MetricsCell::new();
        cell.incr();
        cell.add(4);
        assert_eq!(cell.get(), 5);
        cell.reset();
        assert_eq!(cell.get(), 0);
    }
}
