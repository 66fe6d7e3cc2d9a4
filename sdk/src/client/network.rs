// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! Network topology and per-node health.
//!
//! The node map is injected data, not a compiled-in global: callers hand
//! the client a [`NetworkConfig`] value (the preset constructors below are
//! just conveniences that build one). At runtime the [`Network`] wraps
//! that map with a health table — consecutive delivery failures per node,
//! decaying on a backoff schedule — so the selection policy can steer
//! traffic away from nodes that are having a bad day without ever
//! permanently blacklisting them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::transport::TransportError;
use crate::config::{DEFAULT_NODE_PORT, NODE_FAILURE_CEILING, NODE_MAX_BACKOFF, NODE_MIN_BACKOFF};
use crate::entity::{AccountId, LedgerId};

// ---------------------------------------------------------------------------
// NodeEndpoint / NetworkConfig
// ---------------------------------------------------------------------------

/// One consensus node: its ledger identity and where to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEndpoint {
    /// The node's account on the ledger.
    pub account: AccountId,
    /// Hostname or IP.
    pub address: String,
    /// TCP port.
    pub port: u16,
    /// Expected TLS certificate hash, when the transport pins one.
    pub cert_hash: Option<Vec<u8>>,
}

impl NodeEndpoint {
    /// An endpoint on the conventional port with no certificate pin.
    pub fn new(account: AccountId, address: impl Into<String>) -> Self {
        Self {
            account,
            address: address.into(),
            port: DEFAULT_NODE_PORT,
            cert_hash: None,
        }
    }

    /// `address:port`, for logs and error messages.
    pub fn label(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// The injected node map plus the ledger it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Every known consensus node.
    pub nodes: Vec<NodeEndpoint>,
    /// Which ledger these nodes serve; also folded into entity checksums.
    pub ledger_id: LedgerId,
}

impl NetworkConfig {
    fn preset(ledger_id: LedgerId, host_prefix: &str, count: u64) -> Self {
        let nodes = (0..count)
            .map(|i| {
                NodeEndpoint::new(
                    AccountId::new(0, 0, 3 + i),
                    format!("{host_prefix}{i}.meridian.network"),
                )
            })
            .collect();
        Self { nodes, ledger_id }
    }

    /// The production ledger's well-known nodes.
    pub fn mainnet() -> Self {
        Self::preset(LedgerId::mainnet(), "node", 7)
    }

    /// The public test ledger's well-known nodes.
    pub fn testnet() -> Self {
        Self::preset(LedgerId::testnet(), "testnet-node", 4)
    }

    /// The preview ledger's well-known nodes.
    pub fn previewnet() -> Self {
        Self::preset(LedgerId::previewnet(), "previewnet-node", 4)
    }
}

// ---------------------------------------------------------------------------
// Node health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct NodeHealth {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

impl NodeHealth {
    /// The cooling-off window after `consecutive_failures` failures:
    /// `min(base << failures, cap)`.
    fn backoff(&self) -> Duration {
        let shift = self.consecutive_failures.min(16);
        NODE_MIN_BACKOFF
            .checked_mul(1u32 << shift)
            .unwrap_or(NODE_MAX_BACKOFF)
            .min(NODE_MAX_BACKOFF)
    }

    /// A node is eligible while under the failure ceiling, or once its
    /// cooling-off window has elapsed — nothing is blacklisted forever.
    fn is_eligible(&self, now: Instant) -> bool {
        if self.consecutive_failures < NODE_FAILURE_CEILING {
            return true;
        }
        match self.last_failure {
            Some(at) => now.duration_since(at) >= self.backoff(),
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// The shared, concurrency-safe view of the network: topology plus the
/// live health table. One instance is shared by every clone of a client,
/// so concurrent executes feed a single selection policy.
#[derive(Debug)]
pub struct Network {
    nodes: Vec<NodeEndpoint>,
    by_account: HashMap<AccountId, usize>,
    ledger_id: LedgerId,
    health: RwLock<HashMap<AccountId, NodeHealth>>,
    cursor: Mutex<usize>,
}

impl Network {
    pub(crate) fn new(config: NetworkConfig) -> Self {
        let by_account = config
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.account, i))
            .collect();
        Self {
            nodes: config.nodes,
            by_account,
            ledger_id: config.ledger_id,
            health: RwLock::new(HashMap::new()),
            cursor: Mutex::new(0),
        }
    }

    /// Every node account in the map, in configuration order. This is the
    /// default candidate list a freeze adopts.
    pub fn node_account_ids(&self) -> Vec<AccountId> {
        self.nodes.iter().map(|n| n.account).collect()
    }

    /// The ledger these nodes serve.
    pub fn ledger_id(&self) -> &LedgerId {
        &self.ledger_id
    }

    /// Picks the candidate to try next: fewest consecutive failures among
    /// the eligible, ties broken by a rotating cursor so equal-health
    /// nodes share load. With nothing eligible, falls back to the least
    /// recently failed candidate rather than refusing outright.
    ///
    /// Returns the index *into the candidate slice* (which is also the
    /// frozen-body index) plus the endpoint to dial.
    pub(crate) fn select(
        &self,
        candidates: &[AccountId],
    ) -> Result<(usize, NodeEndpoint), TransportError> {
        let known: Vec<usize> = (0..candidates.len())
            .filter(|&i| self.by_account.contains_key(&candidates[i]))
            .collect();
        let Some(&first) = known.first() else {
            return Err(TransportError::UnknownNode {
                account: candidates
                    .first()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "<none>".to_string()),
            });
        };

        let now = Instant::now();
        let health = self.health.read();
        let state = |i: usize| health.get(&candidates[i]).copied().unwrap_or_default();

        let eligible: Vec<usize> = known
            .iter()
            .copied()
            .filter(|&i| state(i).is_eligible(now))
            .collect();

        let pick = if eligible.is_empty() {
            // Everyone is cooling off. Least recently failed gets the
            // next chance.
            warn!("no eligible node among candidates, using least recently failed");
            known
                .iter()
                .copied()
                .min_by_key(|&i| state(i).last_failure)
                .unwrap_or(first)
        } else {
            let best = eligible
                .iter()
                .map(|&i| state(i).consecutive_failures)
                .min()
                .unwrap_or(0);
            let tied: Vec<usize> = eligible
                .into_iter()
                .filter(|&i| state(i).consecutive_failures == best)
                .collect();
            let cursor = {
                let mut c = self.cursor.lock();
                let v = *c;
                *c = v.wrapping_add(1);
                v
            };
            tied[cursor % tied.len()]
        };

        let endpoint = self.nodes[self.by_account[&candidates[pick]]].clone();
        Ok((pick, endpoint))
    }

    /// Records a delivery failure against a node.
    pub(crate) fn record_failure(&self, account: AccountId) {
        let mut health = self.health.write();
        let entry = health.entry(account).or_default();
        entry.consecutive_failures += 1;
        entry.last_failure = Some(Instant::now());
    }

    /// Records a successful exchange, resetting the failure streak. A
    /// node that *answers* is healthy, even when the answer is a
    /// rejection.
    pub(crate) fn record_success(&self, account: AccountId) {
        let mut health = self.health.write();
        health.remove(&account);
    }

    #[cfg(test)]
    fn force_health(&self, account: AccountId, failures: u32, last_failure_ago: Duration) {
        let mut health = self.health.write();
        health.insert(
            account,
            NodeHealth {
                consecutive_failures: failures,
                last_failure: Instant::now().checked_sub(last_failure_ago),
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
