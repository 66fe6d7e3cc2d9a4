// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Error Taxonomy
//!
//! Four failure families, with four different fates:
//!
//! - **Codec errors** — malformed bytes. Always fatal, never retried: a
//!   response we cannot decode means version skew, not a flaky node.
//! - **Lifecycle errors** — caller programming errors (mutating a frozen
//!   request, executing with no nodes). Propagate immediately.
//! - **Network errors** — connection failures and timeouts. Absorbed by
//!   the retry loop up to the attempt ceiling, then surfaced wrapped in
//!   attempt count and elapsed time.
//! - **Protocol status errors** — the network said no, with a valid
//!   [`Status`]. Retryable ones are retried transparently; the rest
//!   surface as [`Error::PreCheck`] or resolve the request to a terminal
//!   failed receipt the caller reads like any other result.
//!
//! No failure path is silently dropped: everything ends in a returned
//! error value or a terminal resolved state carrying a status.

use std::time::Duration;

use thiserror::Error;

use crate::client::transport::TransportError;
use crate::codec::DecodeError;
use crate::crypto::KeyError;
use crate::receipt::TransactionReceipt;
use crate::request::{LifecycleError, RequestId};
use crate::status::Status;

/// Shorthand result type used across the crate's public API.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure the engine can hand back to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A response or nested message failed to decode. Fatal; indicates a
    /// codec or protocol-version mismatch.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The request state machine was used out of order.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Key material failed to parse.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The transport collaborator failed to deliver or receive bytes.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The node's synchronous precheck rejected the submission with a
    /// non-retryable status.
    #[error("precheck failed with {status} for request {request_id:?}")]
    PreCheck {
        /// The rejecting status code.
        status: Status,
        /// The request id the submission carried, when one exists.
        request_id: Option<RequestId>,
    },

    /// A receipt resolved to a terminal failure status. Only produced
    /// when the caller explicitly asks for status validation; the raw
    /// receipt is otherwise returned as an ordinary value.
    #[error("receipt resolved with {status}")]
    ReceiptStatus {
        /// The terminal failure status.
        status: Status,
        /// The full receipt, for inspection.
        receipt: Box<TransactionReceipt>,
    },

    /// The retry loop ran out of attempts. Wraps the last error seen.
    #[error("retries exhausted after {attempts} attempts over {elapsed:?}: {last}")]
    RetryExhausted {
        /// How many attempts were made.
        attempts: usize,
        /// Wall time spent across all attempts and backoff waits.
        elapsed: Duration,
        /// The final attempt's error.
        last: Box<Error>,
    },

    /// A caller-supplied deadline elapsed before the operation finished.
    #[error("deadline elapsed")]
    Timeout,

    /// The caller cancelled the in-flight operation. Distinct from both
    /// success and network-origin failure so tests can tell "the network
    /// said no" from "the caller gave up".
    #[error("cancelled by caller")]
    Cancelled,
}

impl Error {
    /// `true` if the retry loop may absorb this error and try again.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::PreCheck { status, .. } => status.is_retryable(),
            _ => false,
        }
    }
}
