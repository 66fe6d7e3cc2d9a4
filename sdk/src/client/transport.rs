// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! The byte-shipping seam.
//!
//! The engine never opens sockets. It hands a finished envelope and a
//! target endpoint to a [`Transport`] and gets response bytes back; TLS,
//! connection pooling, and wire-protocol framing are entirely the
//! implementation's concern. Tests plug in scripted doubles here.

use async_trait::async_trait;
use thiserror::Error;

use super::network::NodeEndpoint;

/// Delivery failures, as opposed to the network *answering* with a
/// rejection. These are the flaky-infrastructure class the retry loop
/// absorbs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint could not be reached or dropped the connection.
    #[error("connection to {endpoint} failed: {detail}")]
    ConnectionFailed {
        /// The unreachable endpoint, as `address:port`.
        endpoint: String,
        /// Implementation-provided detail.
        detail: String,
    },

    /// No response arrived within the per-request window.
    #[error("request to {endpoint} timed out")]
    Timeout {
        /// The endpoint that went quiet.
        endpoint: String,
    },

    /// A submission targeted a node account the network map does not
    /// contain. Caller configuration error, never retried.
    #[error("node {account} is not in the network map")]
    UnknownNode {
        /// The unmapped node account, in `shard.realm.num` form.
        account: String,
    },
}

impl TransportError {
    /// `true` if trying again (on this node or another) could plausibly
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::UnknownNode { .. } => false,
        }
    }
}

/// Ships one request envelope to one node and returns the raw response.
///
/// Implementations own their timeouts for connect and read; the engine
/// additionally enforces its per-attempt window from the outside.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `envelope` to `endpoint` and awaits the response bytes.
    async fn send(&self, endpoint: &NodeEndpoint, envelope: &[u8])
        -> Result<Vec<u8>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_failures_are_retryable() {
        assert!(TransportError::ConnectionFailed {
            endpoint: "node0.example:50211".into(),
            detail: "refused".into(),
        }
        .is_retryable());
        assert!(TransportError::Timeout {
            endpoint: "node0.example:50211".into(),
        }
        .is_retryable());
    }

    #[test]
    fn configuration_failures_are_not() {
        assert!(!TransportError::UnknownNode {
            account: "0.0.99".into(),
        }
        .is_retryable());
    }
}
