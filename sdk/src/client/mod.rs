// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Network Client
//!
//! The client owns everything between a signed envelope and a decoded
//! response: node selection, retry with backoff, precheck classification,
//! receipt polling, and cancellation. It holds no sockets itself — byte
//! delivery is the [`Transport`] collaborator's job — which is what makes
//! the whole retry machinery testable with a scripted double.
//!
//! Clones are cheap and share one health table, so a process-wide client
//! handed to many tasks feeds a single selection policy.

mod execute;
mod network;
mod retry;
pub mod transport;

pub use network::{Network, NetworkConfig, NodeEndpoint};
pub use retry::RetryConfig;
pub use transport::{Transport, TransportError};

use std::sync::Arc;

use tokio::sync::watch;

use crate::crypto::PrivateKey;
use crate::entity::AccountId;

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// The identity that pays for requests by default: an account plus the
/// key that signs on its behalf.
#[derive(Debug, Clone)]
pub struct Operator {
    /// The paying account.
    pub account_id: AccountId,
    /// The key signing for that account.
    pub key: PrivateKey,
}

impl Operator {
    /// Pairs an account with its signing key.
    pub fn new(account_id: AccountId, key: PrivateKey) -> Self {
        Self { account_id, key }
    }
}

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// A handle for aborting in-flight executes and polls.
///
/// Cloning shares the same flag; one `cancel()` wakes every operation
/// that was handed a clone, including those parked in a backoff sleep.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { flag: Arc::new(tx) }
    }

    /// Flips the flag. Idempotent; there is no un-cancel.
    ///
    /// `send_replace` updates the value even when nothing is subscribed
    /// yet, so a cancel issued before (or between) waiters still sticks.
    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once the token is cancelled. Never resolves otherwise.
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone means no cancel can ever arrive; park
                // forever so the racing branch wins.
                std::future::pending::<()>().await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// The engine's front door. See the module docs for responsibilities.
#[derive(Clone)]
pub struct Client {
    network: Arc<Network>,
    transport: Arc<dyn Transport>,
    operator: Option<Operator>,
    retry: RetryConfig,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("network", &self.network)
            .field("operator", &self.operator.as_ref().map(|o| o.account_id))
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Builds a client for a node map, with byte delivery provided by
    /// `transport`.
    pub fn new(config: NetworkConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            network: Arc::new(Network::new(config)),
            transport,
            operator: None,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the default payer identity.
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The shared network view.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// The operator's account, when one is configured.
    pub fn operator_account(&self) -> Option<AccountId> {
        self.operator.as_ref().map(|o| o.account_id)
    }

    /// The configured operator.
    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    pub(crate) fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_flag_behaviour() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let peer = token.clone();
        peer.cancel();
        assert!(token.is_cancelled(), "clones share one flag");

        // Idempotent.
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.expect("waiter must resolve once cancelled");
    }

    #[tokio::test]
    async fn cancel_before_any_waiter_still_sticks() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        // A waiter arriving after the fact resolves immediately.
        token.cancelled().await;
    }
}
