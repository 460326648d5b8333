//! Cache decorators.
//!
//! Each decorator wraps a delegate [`Cache`](crate::traits::Cache) and adds
//! one concern on top of it:
//!
//! - [`lru`]: bounds the entry count, evicting the least recently used key
//! - [`soft`]: lets values be reclaimed under memory pressure while pinning
//!   a window of recently read values

pub mod lru;
pub mod soft;

pub use lru::{DEFAULT_LRU_CAPACITY, LruCache};
pub use soft::{DEFAULT_HARD_LINKS, SoftCache};
