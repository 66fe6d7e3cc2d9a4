// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Timestamps & Durations
//!
//! Ledger time is a `(seconds, nanos)` pair — seconds since the Unix
//! epoch, nanoseconds in `0..1_000_000_000`. Arithmetic normalizes the
//! carry so `nanos` never leaves that half-open range, which keeps the
//! string form (`"seconds.nanos"`) and the wire form canonical: one
//! instant, one encoding.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{BodyReader, BodyWriter, DecodeError};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Failure to parse a `"seconds.nanos"` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timestamp format: {0:?}")]
pub struct TimestampParseError(String);

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// An instant in ledger time.
///
/// # Examples
///
/// ```
/// use meridian_sdk::temporal::Timestamp;
///
/// let ts: Timestamp = "1700000000.000000123".parse().unwrap();
/// assert_eq!(ts.seconds, 1_700_000_000);
/// assert_eq!(ts.nanos, 123);
/// assert_eq!(ts.to_string(), "1700000000.000000123");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp {
    /// Seconds since the Unix epoch. May be negative for pre-epoch
    /// instants, which the ledger itself never produces but the type
    /// tolerates.
    pub seconds: i64,
    /// Nanosecond remainder, always in `0..1_000_000_000`.
    pub nanos: i32,
}

impl Timestamp {
    /// Creates a timestamp, normalizing the nano carry.
    pub fn new(seconds: i64, nanos: i64) -> Self {
        // Euclidean div/rem keeps the remainder in 0..10^9 even when the
        // incoming nano count is negative.
        Self {
            seconds: seconds + nanos.div_euclid(NANOS_PER_SECOND),
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as i32,
        }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let now = chrono::Utc::now();
        Self::new(now.timestamp(), i64::from(now.timestamp_subsec_nanos()))
    }

    /// This instant plus a non-negative duration.
    pub fn plus(self, duration: Duration) -> Self {
        Self::new(
            self.seconds + duration.as_secs() as i64,
            i64::from(self.nanos) + i64::from(duration.subsec_nanos()),
        )
    }

    /// This instant minus a non-negative duration.
    pub fn minus(self, duration: Duration) -> Self {
        Self::new(
            self.seconds - duration.as_secs() as i64,
            i64::from(self.nanos) - i64::from(duration.subsec_nanos()),
        )
    }

    /// Total nanoseconds since the epoch, for ordering math in tests.
    pub fn as_nanos(self) -> i128 {
        i128::from(self.seconds) * i128::from(NANOS_PER_SECOND) + i128::from(self.nanos)
    }

    /// Wire layout: seconds=1 (zig-zag), nanos=2 (varint).
    pub fn encode(&self) -> BodyWriter {
        let mut w = BodyWriter::new();
        w.write_signed_varint(1, self.seconds);
        w.write_varint(2, self.nanos as u64);
        w
    }

    /// Decodes from the nested wire message.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = BodyReader::new(bytes);
        let mut ts = Self::default();
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => ts.seconds = r.read_signed_varint()?,
                2 => ts.nanos = r.read_varint()? as i32,
                _ => r.skip_field(wt)?,
            }
        }
        Ok(ts)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimestampParseError(s.to_string());
        let (secs, nanos) = s.split_once('.').ok_or_else(err)?;
        let seconds: i64 = secs.parse().map_err(|_| err())?;
        if nanos.is_empty() || nanos.len() > 9 || !nanos.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        // "5" after the dot means 500ms only if we pad; the canonical form
        // is nine digits, but we accept shorter and right-pad.
        let padded = format!("{nanos:0<9}");
        let ns: i64 = padded.parse().map_err(|_| err())?;
        Ok(Self::new(seconds, ns))
    }
}

// ---------------------------------------------------------------------------
// LedgerDuration
// ---------------------------------------------------------------------------

/// A span of ledger time with second precision.
///
/// Requests carry their valid-duration as whole seconds; sub-second
/// precision lives only in [`Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerDuration {
    /// Length of the span in seconds.
    pub seconds: i64,
}

impl LedgerDuration {
    /// Creates a duration from whole seconds.
    pub fn from_secs(seconds: i64) -> Self {
        Self { seconds }
    }

    /// Wire layout: seconds=1 (varint).
    pub fn encode(&self) -> BodyWriter {
        let mut w = BodyWriter::new();
        w.write_varint(1, self.seconds as u64);
        w
    }

    /// Decodes from the nested wire message.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = BodyReader::new(bytes);
        let mut d = Self { seconds: 0 };
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => d.seconds = r.read_varint()? as i64,
                _ => r.skip_field(wt)?,
            }
        }
        Ok(d)
    }
}

impl From<Duration> for LedgerDuration {
    fn from(d: Duration) -> Self {
        Self::from_secs(d.as_secs() as i64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
