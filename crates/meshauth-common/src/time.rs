// ============================================
// File: crates/meshauth-common/src/time.rs
// ============================================
//! # Container Version Timestamps
//!
//! ## Creation Reason
//! A signed network-data container carries its creation time as the
//! version marker. Two nodes decide which copy is fresher by comparing
//! these values as integers.
//!
//! ## Main Functionality
//! - `Timestamp`: unix seconds, big-endian on the wire
//! - `Timestamp::try_now`: wall-clock read that fails instead of panicking
//!
//! ## ⚠️ Important Note for Next Developer
//! - Freshness is plain integer comparison (last writer wins); no clock-skew
//!   bounds apply to container versions
//! - Zero means "no data" when sent as the current version in a request
//!
//! ## Last Modified
//! v0.1.0 - Initial time utilities

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, Result};

// ============================================
// Timestamp
// ============================================

/// Unix timestamp in seconds, used as a container version.
///
/// # Example
/// ```
/// use meshauth_common::time::Timestamp;
///
/// let older = Timestamp::from_secs(1_700_000_000);
/// let newer = Timestamp::from_secs(1_700_000_060);
/// assert!(newer.is_newer_than(older));
/// assert_eq!(Timestamp::from_be_bytes(newer.to_be_bytes()), newer);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The "no data" version.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from Unix seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Reads the current wall-clock time.
    ///
    /// # Errors
    /// Returns `CommonError::Clock` if the system clock is before the epoch.
    pub fn try_now() -> Result<Self> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Self(d.as_secs()))
            .map_err(|e| CommonError::clock(e.to_string()))
    }

    /// Returns the Unix timestamp in seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp as big-endian bytes.
    #[must_use]
    pub const fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Creates a timestamp from big-endian bytes.
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    /// Returns `true` if `self` is strictly fresher than `other`.
    #[must_use]
    pub const fn is_newer_than(&self, other: Self) -> bool {
        self.0 > other.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_now() {
        let ts = Timestamp::try_now().unwrap();
        // 2020-01-01
        assert!(ts.as_secs() > 1_577_836_800);
    }

    #[test]
    fn test_timestamp_ordering() {
        let a = Timestamp::from_secs(10);
        let b = Timestamp::from_secs(11);
        assert!(b.is_newer_than(a));
        assert!(!a.is_newer_than(b));
        assert!(!a.is_newer_than(a));
        assert!(a < b);
    }

    #[test]
    fn test_timestamp_wire_order() {
        let ts = Timestamp::from_secs(0x0102_0304_0506_0708);
        assert_eq!(ts.to_be_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Timestamp::default(), Timestamp::ZERO);
        assert_eq!(Timestamp::ZERO.to_string(), "0");
    }
}
