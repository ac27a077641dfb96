//! Wire timestamp representation.
//!
//! Seconds + nanoseconds since the Unix epoch, restricted to the range the
//! bus wire format can carry (0001-01-01T00:00:00Z to
//! 9999-12-31T23:59:59.999999999Z).

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::TimestampConversionError;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A timestamp as carried in an event header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WireTimestamp {
    /// Seconds since epoch, may be negative.
    pub seconds: i64,
    /// Always in `0..1_000_000_000`.
    pub nanos: i32,
}

impl WireTimestamp {
    /// 0001-01-01T00:00:00Z
    pub const MIN_SECONDS: i64 = -62_135_596_800;
    /// 9999-12-31T23:59:59Z
    pub const MAX_SECONDS: i64 = 253_402_300_799;

    /// Build from raw parts, checking the wire range.
    pub fn new(seconds: i64, nanos: i32) -> Result<Self, TimestampConversionError> {
        if !(0..NANOS_PER_SECOND as i32).contains(&nanos) {
            return Err(TimestampConversionError::InvalidNanos { nanos });
        }
        if !(Self::MIN_SECONDS..=Self::MAX_SECONDS).contains(&seconds) {
            return Err(TimestampConversionError::OutOfRange { seconds });
        }
        Ok(Self { seconds, nanos })
    }

    /// Convert nanoseconds since the Unix epoch.
    pub fn from_unix_nanos(nanos: i64) -> Result<Self, TimestampConversionError> {
        let seconds = nanos.div_euclid(NANOS_PER_SECOND);
        let sub = nanos.rem_euclid(NANOS_PER_SECOND) as i32;
        Self::new(seconds, sub)
    }

    /// Convert a system instant.
    pub fn from_system_time(time: SystemTime) -> Result<Self, TimestampConversionError> {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => {
                let seconds = i64::try_from(after.as_secs()).map_err(|_| {
                    TimestampConversionError::OutOfRange { seconds: i64::MAX }
                })?;
                Self::new(seconds, after.subsec_nanos() as i32)
            }
            Err(before) => {
                let before = before.duration();
                let whole = i64::try_from(before.as_secs()).map_err(|_| {
                    TimestampConversionError::OutOfRange { seconds: i64::MIN }
                })?;
                let sub = before.subsec_nanos() as i32;
                if sub == 0 {
                    Self::new(-whole, 0)
                } else {
                    Self::new(-whole - 1, NANOS_PER_SECOND as i32 - sub)
                }
            }
        }
    }

    /// Total nanoseconds since epoch, if it fits in an `i64`.
    #[must_use]
    pub fn as_unix_nanos(&self) -> Option<i64> {
        let total = i128::from(self.seconds) * i128::from(NANOS_PER_SECOND)
            + i128::from(self.nanos);
        i64::try_from(total).ok()
    }
}
