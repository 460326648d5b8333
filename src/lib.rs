//! cachestack: composable cache decorators over a shared cache contract.
//!
//! A stack starts with a [`PerpetualCache`](store::PerpetualCache) and adds
//! behavior by wrapping it: [`LruCache`](policy::LruCache) bounds the entry
//! count, [`SoftCache`](policy::SoftCache) lets a memory manager reclaim
//! values while pinning the most recently read ones. Every layer implements
//! [`Cache`](traits::Cache), so callers never see how deep a stack is.
//!
//! See `DESIGN.md` for architecture notes and behavior decisions.

pub mod builder;
pub mod ds;
pub mod error;
pub mod key;
pub mod policy;
pub mod reclaim;
pub mod store;
pub mod traits;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
