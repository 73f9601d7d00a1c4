//! Cache Entry Module
//!
//! Defines the stored value together with its absolute expiry.

use std::time::{Duration, Instant};

// == Expiry ==
/// Absolute expiry of an entry.
///
/// Every `At` instant orders before `Never`, so a sorted index of expiries
/// yields soonest-to-die entries first and immortal ones last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expiry {
    /// Expires once the clock is strictly past this instant
    At(Instant),
    /// Never expires by time
    Never,
}

impl Expiry {
    /// Computes `now + ttl`.
    ///
    /// No TTL, or a TTL too large for the clock to represent, yields `Never`.
    pub fn after(now: Instant, ttl: Option<Duration>) -> Self {
        ttl.and_then(|ttl| now.checked_add(ttl))
            .map_or(Self::Never, Self::At)
    }

    /// Checks whether `now` is past this expiry.
    pub fn has_passed(&self, now: Instant) -> bool {
        match self {
            Self::At(deadline) => now > *deadline,
            Self::Never => false,
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When this entry stops being served
    pub expires_at: Expiry,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub fn new(value: V, expires_at: Expiry) -> Self {
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// Boundary condition: an entry whose deadline equals `now` is still live;
    /// it expires once the clock moves strictly past the deadline.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.has_passed(now)
    }
}
