//! Identity types for the reactive system.
//!
//! Effects and observed objects are addressed by small copyable IDs rather
//! than by reference, so the registry can key its maps on them without
//! holding on to the objects themselves.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an effect.
///
/// Each effect gets a unique ID when created. Dependency sets use it as the
/// membership key, which is what makes subscription idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Identity of an observed object.
///
/// The interception layer gives each object it wraps one of these and passes
/// it to [`track`](crate::reactive::track) and
/// [`trigger`](crate::reactive::trigger). Two calls refer to the same object
/// if and only if their IDs are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Mint a fresh identity from a process-wide counter.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Use an identity supplied by the caller, such as an address.
    ///
    /// Raw identities share a namespace with minted ones; a runtime should be
    /// fed from one source or the other, not both.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}
