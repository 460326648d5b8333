pub use crate::builder::{CacheBuilder, CacheConfig, CacheStack, Layer};
pub use crate::error::{CacheError, CacheResult, ConfigError};
pub use crate::key::{CacheKey, KeyPart};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::{LruMetricsSnapshot, SoftMetricsSnapshot};
#[cfg(feature = "metrics")]
pub use crate::metrics::traits::{MetricsReset, MetricsSnapshotProvider};
pub use crate::policy::{DEFAULT_HARD_LINKS, DEFAULT_LRU_CAPACITY, LruCache, SoftCache};
pub use crate::reclaim::{Reclaimer, ReferenceQueue, SoftReference};
pub use crate::store::PerpetualCache;
pub use crate::traits::{Cache, FromId};
