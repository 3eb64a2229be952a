// SPDX-License-Identifier: Apache-2.0

//! Source-clock timestamps and the epoch offset that separates them
//! from UNIX time.

use std::time::{Duration, SystemTime};

/// Difference, in seconds, between the source clock's epoch and the
/// UNIX epoch. Source timestamps are composed as
/// `seconds + 1e-9 * nanos + EPOCH_OFFSET - timezone_offset`.
pub const EPOCH_OFFSET: i64 = 631_173_600;

/// A timestamp as reported by the acquisition source: seconds and
/// nanoseconds since the source epoch (`EPOCH_OFFSET` seconds before
/// the UNIX epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl SourceTimestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Builds a `SourceTimestamp` from a `SystemTime`, ignoring any
    /// local timezone offset (`timezone_offset = 0`).
    pub fn from_system_time(t: SystemTime) -> Self {
        let dur = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self {
            seconds: dur.as_secs() as i64 - EPOCH_OFFSET,
            nanos: dur.subsec_nanos(),
        }
    }

    /// Converts to fractional UNIX seconds, applying `timezone_offset`
    /// (seconds, e.g. a negative number for zones east of UTC).
    pub fn to_unix_seconds(self, timezone_offset: i64) -> f64 {
        self.seconds as f64 + 1e-9 * self.nanos as f64 + EPOCH_OFFSET as f64
            - timezone_offset as f64
    }

    /// Duration between two source timestamps as a signed number of
    /// seconds (`self - other`).
    pub fn signed_delta_seconds(self, other: SourceTimestamp) -> f64 {
        self.to_unix_seconds(0) - other.to_unix_seconds(0)
    }
}

impl Default for SourceTimestamp {
    fn default() -> Self {
        Self {
            seconds: 0,
            nanos: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_offset_matches_published_constant() {
        assert_eq!(EPOCH_OFFSET, 631_173_600);
    }

    #[test]
    fn round_trips_through_system_time() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        let src = SourceTimestamp::from_system_time(t);
        let back = src.to_unix_seconds(0);
        assert!((back - 1_000_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn delta_is_signed_and_symmetric() {
        let a = SourceTimestamp::new(100, 0);
        let b = SourceTimestamp::new(107, 0);
        assert!((b.signed_delta_seconds(a) - 7.0).abs() < 1e-9);
        assert!((a.signed_delta_seconds(b) + 7.0).abs() < 1e-9);
    }
}
