//! Storage backends that sit at the bottom of a decorator stack.
//!
//! Stores own key/value entries; bounding, recency, and reclamation are
//! layered on top by the decorators in [`policy`](crate::policy).

pub mod perpetual;

pub use perpetual::PerpetualCache;
