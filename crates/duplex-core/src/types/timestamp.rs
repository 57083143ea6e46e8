//! Nanosecond-precision timestamp.

use std::cmp::Ordering;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::constants::{NS_PER_MS, NS_PER_SEC, NS_PER_US};

/// Nanosecond-precision timestamp since the Unix epoch.
///
/// Uses i64 internally so timestamps both before and after the epoch are
/// representable.
///
/// # Example
///
/// ```rust
/// use duplex_core::types::Timestamp;
///
/// let ts = Timestamp::now();
/// let later = ts.add_nanos(1000);
/// assert!(later > ts);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Zero timestamp (Unix epoch)
    pub const EPOCH: Self = Self(0);

    /// Maximum timestamp
    pub const MAX: Self = Self(i64::MAX);

    /// Create a timestamp from nanoseconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros * NS_PER_US as i64)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * NS_PER_MS as i64)
    }

    /// Get the current wall-clock timestamp
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_nanos() as i64)
    }

    /// Get nanoseconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Get microseconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> i64 {
        self.0 / NS_PER_US as i64
    }

    /// Get milliseconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0 / NS_PER_MS as i64
    }

    /// Get seconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0 / NS_PER_SEC as i64
    }

    /// Add a nanosecond offset
    #[inline]
    #[must_use]
    pub const fn add_nanos(self, nanos: i64) -> Self {
        Self(self.0 + nanos)
    }

    /// Signed difference to another timestamp in nanoseconds
    #[inline]
    #[must_use]
    pub const fn nanos_since(self, earlier: Self) -> i64 {
        self.0 - earlier.0
    }

    /// Absolute gap to another timestamp in nanoseconds
    #[inline]
    #[must_use]
    pub const fn abs_gap_ns(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl PartialOrd for Timestamp {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
