// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Request Lifecycle
//!
//! Every operation against the ledger — write or read — moves through the
//! same state machine:
//!
//! ```text
//! Mutable -> Frozen -> Signed -> Submitted -> Resolved
//!                (queries may skip Signed)        \-> Cancelled
//! ```
//!
//! - `Mutable`: all setters allowed.
//! - `Frozen`: the body bytes are fixed; the only legal mutation left is
//!   adding a signature. Freezing requires a request id (auto-generated
//!   from the client's operator when absent) and at least one candidate
//!   node.
//! - `Signed`: at least one signature collected; more may be appended for
//!   multi-sig without re-transitioning.
//! - `Submitted`: bytes have left the process; the caller polls for the
//!   outcome through the receipt read path.
//! - `Resolved` / `Cancelled`: terminal. `Cancelled` is distinct from any
//!   network-origin failure so a test can tell "the network said no" from
//!   "the caller gave up".
//!
//! Misusing the machine — mutating after freeze, executing with no target
//! nodes — is a recoverable error return, never a panic. Caller misuse
//! must be a testable condition.

mod query;
mod request_id;
mod transaction;

pub use query::{Query, QueryResponse, ResponseType};
pub use request_id::RequestId;
pub use transaction::{SignaturePair, Transaction, TransactionResponse};

use thiserror::Error;

use crate::codec::{BodyReader, DecodeError};
use crate::config::{MAX_MEMO_BYTES, MIN_PAYLOAD_FIELD};
use crate::status::Status;
use crate::units::Tinybar;

// ---------------------------------------------------------------------------
// RequestState
// ---------------------------------------------------------------------------

/// Where a request is in its lifecycle. Ordering follows progression, so
/// `state >= Frozen` is the "no more mutation" test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestState {
    /// Freshly built; all setters allowed.
    Mutable,
    /// Body bytes fixed; awaiting signatures.
    Frozen,
    /// One or more signatures collected.
    Signed,
    /// Handed to the network; awaiting resolution.
    Submitted,
    /// Terminal: a receipt (success or failure) was obtained.
    Resolved,
    /// Terminal: the caller cancelled before resolution.
    Cancelled,
}

// ---------------------------------------------------------------------------
// LifecycleError
// ---------------------------------------------------------------------------

/// State-machine misuse and missing-configuration errors.
///
/// These are the caller-programming-error class: they propagate
/// immediately from the offending call and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// A setter was called on a request at or past `Frozen`.
    #[error("request is frozen; only signatures may be added")]
    AlreadyFrozen,

    /// Freeze or execute was attempted with zero candidate nodes.
    #[error("no target node assigned")]
    NodeRequired,

    /// `sign` was called before `freeze`.
    #[error("request must be frozen before signing")]
    NotFrozen,

    /// The memo exceeds the network's length bound. Rejected at set-time.
    #[error("memo of {length} bytes exceeds the {MAX_MEMO_BYTES}-byte bound")]
    MemoTooLong {
        /// Byte length of the rejected memo.
        length: usize,
    },

    /// No payer identity available: neither an explicit request id or
    /// payer was set, nor does the client carry an operator.
    #[error("no payer: set a request id or configure a client operator")]
    MissingOperator,

    /// Freeze was attempted before any operation payload was attached.
    #[error("no operation payload attached")]
    MissingPayload,

    /// The payload's envelope field collides with the fixed body layout.
    #[error("payload field {0} is reserved; use {MIN_PAYLOAD_FIELD} or above")]
    PayloadFieldReserved(u32),

    /// A fee or payment amount was negative.
    #[error("fee amounts cannot be negative")]
    NegativeFee,

    /// The request is not in a state from which it can be executed.
    #[error("request in state {0:?} cannot be executed")]
    NotExecutable(RequestState),
}

// ---------------------------------------------------------------------------
// OperationPayload
// ---------------------------------------------------------------------------

/// An operation-specific payload, already serialized by its builder.
///
/// The engine embeds the bytes verbatim at the payload's registered
/// envelope field and never interprets them. Builders produce the bytes
/// with the [`crate::codec`] writer (or [`crate::codec::Value`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPayload {
    field: u32,
    bytes: Vec<u8>,
}

impl OperationPayload {
    /// Wraps pre-serialized payload bytes destined for `field`.
    ///
    /// Fields below [`MIN_PAYLOAD_FIELD`] belong to the fixed body layout
    /// and are rejected.
    pub fn new(field: u32, bytes: Vec<u8>) -> Result<Self, LifecycleError> {
        if field < MIN_PAYLOAD_FIELD {
            return Err(LifecycleError::PayloadFieldReserved(field));
        }
        Ok(Self { field, bytes })
    }

    /// Constructor for the crate's own fixed query payloads, whose field
    /// numbers are compile-time constants in the registered range.
    pub(crate) fn new_unchecked(field: u32, bytes: Vec<u8>) -> Self {
        Self { field, bytes }
    }

    /// The registered envelope field number.
    pub fn field(&self) -> u32 {
        self.field
    }

    /// The serialized payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Validates a memo against the network bound, so setters fail fast at
/// set-time rather than at freeze.
pub(crate) fn check_memo(memo: &str) -> Result<(), LifecycleError> {
    if memo.len() > MAX_MEMO_BYTES {
        return Err(LifecycleError::MemoTooLong { length: memo.len() });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ResponseHeader
// ---------------------------------------------------------------------------

/// The small synchronous acknowledgement every node response opens with.
///
/// Wire layout: status=1 (varint, the status-code integer), cost=2
/// (varint tinybars, meaningful for cost-probe answers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// The precheck or answer status.
    pub status: Status,
    /// Reported cost. Zero unless the response answers a cost probe.
    pub cost: Tinybar,
}

impl ResponseHeader {
    /// Decodes a header submessage.
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = BodyReader::new(bytes);
        let mut status = Status::Unknown;
        let mut cost = Tinybar::ZERO;
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => status = Status::from_code(r.read_varint()? as i32),
                2 => cost = Tinybar::new(r.read_varint()? as i64).unwrap_or(Tinybar::MAX),
                _ => r.skip_field(wt)?,
            }
        }
        Ok(Self { status, cost })
    }
}
