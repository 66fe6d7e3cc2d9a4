// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Amounts & Rates
//!
//! [`Tinybar`] is the only money type in the engine: a signed count of the
//! ledger's smallest indivisible unit. No floating point anywhere near
//! money — display formatting divides for humans, arithmetic never does.
//!
//! All arithmetic is overflow-checked *and* range-checked: a result that
//! would exceed the total supply (in either direction — transfer lists
//! carry negative debits) is rejected, not wrapped.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{BodyReader, BodyWriter, DecodeError};
use crate::config::{MAX_TINYBARS, MIN_TINYBARS, TINYBARS_PER_COIN};
use crate::temporal::Timestamp;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures in amount arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The result overflowed i64 or left the valid tinybar range.
    #[error("amount out of range")]
    OutOfRange,

    /// Division by zero.
    #[error("division by zero")]
    DivideByZero,
}

// ---------------------------------------------------------------------------
// Tinybar
// ---------------------------------------------------------------------------

/// A signed amount in the ledger's smallest currency unit.
///
/// # Examples
///
/// ```
/// use meridian_sdk::units::Tinybar;
///
/// let fee = Tinybar::from_coins(1).unwrap();
/// assert_eq!(fee.get(), 100_000_000);
/// let doubled = fee.checked_mul(2).unwrap();
/// assert_eq!(doubled.get(), 200_000_000);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Tinybar(i64);

impl Tinybar {
    /// Zero tinybars.
    pub const ZERO: Self = Self(0);

    /// Largest valid amount: the full supply.
    pub const MAX: Self = Self(MAX_TINYBARS);

    /// Most negative valid amount.
    pub const MIN: Self = Self(MIN_TINYBARS);

    /// Creates an amount, rejecting values outside the supply range.
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if (MIN_TINYBARS..=MAX_TINYBARS).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AmountError::OutOfRange)
        }
    }

    /// Creates an amount from whole coins.
    pub fn from_coins(coins: i64) -> Result<Self, AmountError> {
        let value = coins
            .checked_mul(TINYBARS_PER_COIN)
            .ok_or(AmountError::OutOfRange)?;
        Self::new(value)
    }

    /// The raw tinybar count.
    pub fn get(self) -> i64 {
        self.0
    }

    /// `true` if the amount is negative (a debit in a transfer list).
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition; fails on overflow or out-of-range result.
    pub fn checked_add(self, other: Self) -> Result<Self, AmountError> {
        self.0
            .checked_add(other.0)
            .ok_or(AmountError::OutOfRange)
            .and_then(Self::new)
    }

    /// Checked subtraction; fails on overflow or out-of-range result.
    pub fn checked_sub(self, other: Self) -> Result<Self, AmountError> {
        self.0
            .checked_sub(other.0)
            .ok_or(AmountError::OutOfRange)
            .and_then(Self::new)
    }

    /// Checked multiplication by a scalar.
    pub fn checked_mul(self, factor: i64) -> Result<Self, AmountError> {
        self.0
            .checked_mul(factor)
            .ok_or(AmountError::OutOfRange)
            .and_then(Self::new)
    }

    /// Checked division by a scalar. Truncates toward zero.
    pub fn checked_div(self, divisor: i64) -> Result<Self, AmountError> {
        if divisor == 0 {
            return Err(AmountError::DivideByZero);
        }
        self.0
            .checked_div(divisor)
            .ok_or(AmountError::OutOfRange)
            .and_then(Self::new)
    }

    /// Human-readable form with whole-coin decimal formatting, e.g.
    /// `150_000_000` tinybars becomes `"1.50000000"`.
    pub fn display_coins(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / TINYBARS_PER_COIN as u64;
        let frac = abs % TINYBARS_PER_COIN as u64;
        format!("{sign}{whole}.{frac:08}")
    }
}

impl fmt::Display for Tinybar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tinybar", self.0)
    }
}

// ---------------------------------------------------------------------------
// ExchangeRate
// ---------------------------------------------------------------------------

/// One coin-to-cents conversion rate, as reported in receipts.
///
/// The rate is the ratio `cents / units`: `units_per_coin` whole coins are
/// worth `cents_per_unit` US cents until `expiration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Numerator: value in cents.
    pub cents_per_unit: u32,
    /// Denominator: value in whole coins.
    pub units_per_coin: u32,
    /// When this rate stops applying.
    pub expiration: Timestamp,
}

impl ExchangeRate {
    /// Wire layout: cents=1, units=2, expiration=3 (nested timestamp).
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = BodyReader::new(bytes);
        let mut rate = Self {
            cents_per_unit: 0,
            units_per_coin: 0,
            expiration: Timestamp::new(0, 0),
        };
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => rate.cents_per_unit = r.read_varint()? as u32,
                2 => rate.units_per_coin = r.read_varint()? as u32,
                3 => rate.expiration = Timestamp::decode(r.read_bytes()?)?,
                _ => r.skip_field(wt)?,
            }
        }
        Ok(rate)
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> BodyWriter {
        let mut w = BodyWriter::new();
        w.write_varint(1, u64::from(self.cents_per_unit));
        w.write_varint(2, u64::from(self.units_per_coin));
        w.write_message(3, &self.expiration.encode());
        w
    }
}

/// The current and next exchange rate, as a pair. Receipts carry both so a
/// client spanning a rate rollover can price either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateSet {
    /// Rate in effect now.
    pub current: ExchangeRate,
    /// Rate that takes over at `current.expiration`.
    pub next: ExchangeRate,
}

impl ExchangeRateSet {
    /// Wire layout: current=1, next=2 (both nested).
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = BodyReader::new(bytes);
        let zero = ExchangeRate {
            cents_per_unit: 0,
            units_per_coin: 0,
            expiration: Timestamp::new(0, 0),
        };
        let mut set = Self {
            current: zero,
            next: zero,
        };
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => set.current = ExchangeRate::decode(r.read_bytes()?)?,
                2 => set.next = ExchangeRate::decode(r.read_bytes()?)?,
                _ => r.skip_field(wt)?,
            }
        }
        Ok(set)
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> BodyWriter {
        let mut w = BodyWriter::new();
        w.write_message(1, &self.current.encode());
        w.write_message(2, &self.next.encode());
        w
    }
}

// ---------------------------------------------------------------------------
// FeeComponents
// ---------------------------------------------------------------------------

/// Rough per-operation fee expectations, used to sanity-check the cost a
/// cost-probe query reports before attaching a payment.
///
/// This is deliberately a client-side heuristic, not the ledger's full fee
/// schedule: a probe-reported cost wildly above `ceiling` suggests a
/// misconfigured query (or a node having a bad day) and is worth
/// surfacing to the caller before money moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeComponents {
    /// Smallest plausible cost for the operation.
    pub floor: Tinybar,
    /// Largest plausible cost for the operation.
    pub ceiling: Tinybar,
}

impl FeeComponents {
    /// `true` if a probed cost falls inside the plausible band.
    pub fn is_plausible(&self, cost: Tinybar) -> bool {
        cost >= self.floor && cost <= self.ceiling
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
