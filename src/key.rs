//! Composite cache keys.
//!
//! A [`CacheKey`] fingerprints an ordered list of [`KeyPart`]s (statement
//! id, bound parameters, paging bounds, ...) so that upstream code can look
//! up results computed from the same inputs.
//!
//! ## Fingerprint
//!
//! ```text
//!   hashcode = 17, checksum = 0, count = 0
//!
//!   update(part):
//!     base      = fxhash(part)
//!     count    += 1
//!     checksum += base
//!     base     *= count
//!     hashcode  = 37 * hashcode + base          (all wrapping)
//! ```
//!
//! Equality short-circuits on `hashcode`, `checksum` and `count` before
//! comparing parts; [`Hash`] feeds only the precomputed `hashcode`.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

const DEFAULT_MULTIPLIER: u64 = 37;
const DEFAULT_HASHCODE: u64 = 17;

/// One component of a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    Bytes(Vec<u8>),
}

impl KeyPart {
    fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Str(s) => f.write_str(s),
            Self::Bytes(bytes) => write!(f, "{bytes:?}"),
        }
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<usize> for KeyPart {
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&[u8]> for KeyPart {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for KeyPart {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl<T> From<Option<T>> for KeyPart
where
    T: Into<KeyPart>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Order-sensitive fingerprint of a list of [`KeyPart`]s.
///
/// # Example
///
/// ```
/// use cachestack::key::CacheKey;
///
/// let mut a = CacheKey::new();
/// a.update("select_user");
/// a.update(42i64);
///
/// let b = CacheKey::from_parts(["select_user".into(), 42i64.into()]);
/// assert_eq!(a, b);
/// assert_eq!(a.count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CacheKey {
    hashcode: u64,
    checksum: u64,
    count: usize,
    parts: Vec<KeyPart>,
}

impl CacheKey {
    /// Creates a key with no parts.
    pub fn new() -> Self {
        Self {
            hashcode: DEFAULT_HASHCODE,
            checksum: 0,
            count: 0,
            parts: Vec::new(),
        }
    }

    /// Creates a key from `parts` in order.
    pub fn from_parts(parts: impl IntoIterator<Item = KeyPart>) -> Self {
        let mut key = Self::new();
        key.update_all(parts);
        key
    }

    /// Appends one part.
    pub fn update(&mut self, part: impl Into<KeyPart>) {
        let part = part.into();
        let mut base = part.fingerprint();

        self.count += 1;
        self.checksum = self.checksum.wrapping_add(base);
        base = base.wrapping_mul(self.count as u64);
        self.hashcode = self
            .hashcode
            .wrapping_mul(DEFAULT_MULTIPLIER)
            .wrapping_add(base);

        self.parts.push(part);
    }

    /// Appends every part of `parts` in order.
    pub fn update_all<P>(&mut self, parts: impl IntoIterator<Item = P>)
    where
        P: Into<KeyPart>,
    {
        for part in parts {
            self.update(part);
        }
    }

    /// Number of parts folded in.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn hashcode(&self) -> u64 {
        self.hashcode
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.hashcode == other.hashcode
            && self.checksum == other.checksum
            && self.count == other.count
            && self.parts == other.parts
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hashcode);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hashcode, self.checksum)?;
        for part in &self.parts {
            write!(f, ":{part}")?;
        }
        Ok(())
    }
}

impl<P> FromIterator<P> for CacheKey
where
    P: Into<KeyPart>,
{
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut key = Self::new();
        key.update_all(iter);
        key
    }
}
