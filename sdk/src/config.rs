// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # SDK Configuration & Constants
//!
//! Every magic number in the Meridian SDK lives here. Limits that the
//! network enforces (memo length, amount range) and limits the client
//! chooses for itself (retry ceilings, backoff windows) are both collected
//! in one place so nobody has to grep for a hardcoded `8_000` six months
//! from now.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Amount Range
// ---------------------------------------------------------------------------

/// Number of tinybars in one whole coin.
pub const TINYBARS_PER_COIN: i64 = 100_000_000;

/// Total coin supply cap, in whole coins.
pub const MAX_COIN_SUPPLY: i64 = 50_000_000_000;

/// Largest representable tinybar amount: the full supply expressed in the
/// smallest unit. Anything beyond this is arithmetic gone wrong, not money.
pub const MAX_TINYBARS: i64 = MAX_COIN_SUPPLY * TINYBARS_PER_COIN;

/// Smallest representable tinybar amount (debits in transfer lists are
/// negative, so the range is symmetric).
pub const MIN_TINYBARS: i64 = -MAX_TINYBARS;

// ---------------------------------------------------------------------------
// Request Limits
// ---------------------------------------------------------------------------

/// Maximum memo length in bytes. Enforced at set-time so a caller finds
/// out immediately, not three method calls later at freeze.
pub const MAX_MEMO_BYTES: usize = 100;

/// Default window a frozen request stays valid for, as judged by the
/// network against the request id's valid-start timestamp.
pub const DEFAULT_VALID_DURATION: Duration = Duration::from_secs(120);

/// Default fee ceiling attached to a transaction when the caller does not
/// set one. One whole coin — generous for anything this engine submits.
pub const DEFAULT_MAX_FEE_TINYBARS: i64 = TINYBARS_PER_COIN;

/// Operation payloads occupy envelope field numbers from here up. Fields
/// below this are reserved for the fixed body layout.
pub const MIN_PAYLOAD_FIELD: u32 = 10;

/// Request ids are generated with a valid-start slightly in the past to
/// absorb clock skew between the client and the node it submits to.
pub const VALID_START_BACKDATE: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Retry & Backoff
// ---------------------------------------------------------------------------

/// Maximum submission attempts per `execute` call before the last error is
/// surfaced wrapped in attempt-count and elapsed-time context.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// First retry delay. Doubles per attempt until [`MAX_BACKOFF`].
pub const MIN_BACKOFF: Duration = Duration::from_millis(250);

/// Retry delay ceiling.
pub const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Jitter added to each backoff wait, drawn uniformly from
/// `0..=BACKOFF_JITTER_MS`, so a fleet of clients thawing from the same
/// outage does not resubmit in lockstep.
pub const BACKOFF_JITTER_MS: u64 = 100;

/// Per-attempt network timeout applied around a single transport call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall deadline for an `execute` call when the caller supplies none.
pub const DEFAULT_EXECUTE_DEADLINE: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Node Health
// ---------------------------------------------------------------------------

/// Consecutive failures before a node stops being eligible for selection
/// until its backoff window elapses.
pub const NODE_FAILURE_CEILING: u32 = 3;

/// Base of a failing node's readmission window; doubles per consecutive
/// failure up to [`NODE_MAX_BACKOFF`].
pub const NODE_MIN_BACKOFF: Duration = Duration::from_secs(8);

/// Ceiling of a failing node's readmission window.
pub const NODE_MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// Default service port for Meridian consensus nodes.
pub const DEFAULT_NODE_PORT: u16 = 50211;

// ---------------------------------------------------------------------------
// Receipt Polling
// ---------------------------------------------------------------------------

/// Interval between receipt polls after a successful submission.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long to keep polling for a receipt before giving up with a timeout.
pub const RECEIPT_POLL_DEADLINE: Duration = Duration::from_secs(60);
