// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! The execute loops: submission, query, and receipt polling.
//!
//! All three share one shape — select a node, ship bytes with a
//! per-attempt timeout, classify the outcome, back off, repeat — and all
//! three honor the same cancellation token at every await point. A
//! cancelled operation never reports success and never keeps a socket
//! busy past the next classification boundary.

use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::transport::TransportError;
use super::{CancelToken, Client, NodeEndpoint};
use crate::config::{DEFAULT_EXECUTE_DEADLINE, RECEIPT_POLL_DEADLINE, RECEIPT_POLL_INTERVAL};
use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::receipt::{ReceiptQuery, TransactionReceipt};
use crate::request::{
    LifecycleError, Query, QueryResponse, RequestId, ResponseHeader, ResponseType, Transaction,
    TransactionResponse,
};

/// Sleeps for `delay`, aborting early if the token fires.
async fn sleep_or_cancel(delay: std::time::Duration, cancel: Option<&CancelToken>) -> Result<()> {
    match cancel {
        Some(token) => tokio::select! {
            _ = time::sleep(delay) => Ok(()),
            _ = token.cancelled() => Err(Error::Cancelled),
        },
        None => {
            time::sleep(delay).await;
            Ok(())
        }
    }
}

impl Client {
    /// One send-and-receive against one endpoint, bounded by the
    /// per-attempt window and the cancellation token.
    async fn exchange(
        &self,
        endpoint: &NodeEndpoint,
        envelope: &[u8],
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<u8>> {
        let timed = time::timeout(
            self.retry_config().request_timeout,
            self.transport().send(endpoint, envelope),
        );
        let outcome = match cancel {
            Some(token) => tokio::select! {
                r = timed => r,
                _ = token.cancelled() => return Err(Error::Cancelled),
            },
            None => timed.await,
        };
        match outcome {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(Error::Transport(e)),
            Err(_) => Err(Error::Transport(TransportError::Timeout {
                endpoint: endpoint.label(),
            })),
        }
    }

    /// Runs a frozen, signed transaction through the retry loop.
    ///
    /// Retryable outcomes (delivery failures, `Busy`-class prechecks) are
    /// absorbed up to the attempt ceiling, rotating across candidate
    /// nodes; everything else returns immediately. The request id is
    /// reused verbatim across every attempt.
    pub(crate) async fn submit_transaction(
        &self,
        transaction: &mut Transaction,
        cancel: Option<&CancelToken>,
    ) -> Result<TransactionResponse> {
        transaction.is_executable().map_err(Error::Lifecycle)?;
        let request_id = *transaction
            .request_id_ref()
            .ok_or(Error::Lifecycle(LifecycleError::NotFrozen))?;
        let candidates = transaction.node_candidates().to_vec();

        let retry = *self.retry_config();
        let started = Instant::now();
        let mut last: Option<Error> = None;

        for attempt in 0..retry.max_attempts {
            if attempt > 0 {
                let delay = retry.delay_for(attempt - 1);
                if let Err(e) = sleep_or_cancel(delay, cancel).await {
                    transaction.mark_cancelled();
                    return Err(e);
                }
            }
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    transaction.mark_cancelled();
                    return Err(Error::Cancelled);
                }
            }
            if started.elapsed() > DEFAULT_EXECUTE_DEADLINE {
                return Err(Error::Timeout);
            }

            let (index, endpoint) = self.network().select(&candidates).map_err(Error::Transport)?;
            let node = candidates[index];
            let envelope = transaction
                .envelope_for(index)
                .ok_or(Error::Lifecycle(LifecycleError::NotFrozen))?;
            debug!(%request_id, %node, endpoint = %endpoint.label(), attempt, "submitting");

            match self.exchange(&endpoint, &envelope, cancel).await {
                Ok(bytes) => {
                    self.network().record_success(node);
                    let header = ResponseHeader::decode(&bytes)?;
                    if header.status.is_success() {
                        transaction.mark_submitted();
                        info!(%request_id, %node, "submission accepted");
                        return Ok(TransactionResponse::new(request_id, node, &envelope));
                    }
                    let err = Error::PreCheck {
                        status: header.status,
                        request_id: Some(request_id),
                    };
                    if !header.status.is_retryable() {
                        return Err(err);
                    }
                    warn!(%request_id, %node, status = %header.status, "retryable precheck");
                    last = Some(err);
                }
                Err(Error::Cancelled) => {
                    transaction.mark_cancelled();
                    return Err(Error::Cancelled);
                }
                Err(Error::Transport(e)) if e.is_retryable() => {
                    self.network().record_failure(node);
                    warn!(%node, error = %e, "delivery failed, will retry");
                    last = Some(Error::Transport(e));
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::RetryExhausted {
            attempts: retry.max_attempts,
            elapsed: started.elapsed(),
            last: Box::new(last.unwrap_or(Error::Timeout)),
        })
    }

    /// Runs a frozen query through the same retry loop.
    ///
    /// Pending-class answers (receipt not filed yet) return as ordinary
    /// responses — the polling layer interprets them — while hard
    /// rejections surface as [`Error::PreCheck`].
    pub(crate) async fn execute_query(
        &self,
        query: &mut Query,
        response_type: ResponseType,
        cancel: Option<&CancelToken>,
    ) -> Result<QueryResponse> {
        query.is_executable().map_err(Error::Lifecycle)?;
        let candidates = query.node_candidates().to_vec();

        let retry = *self.retry_config();
        let started = Instant::now();
        let mut last: Option<Error> = None;

        for attempt in 0..retry.max_attempts {
            if attempt > 0 {
                let delay = retry.delay_for(attempt - 1);
                if let Err(e) = sleep_or_cancel(delay, cancel).await {
                    query.mark_cancelled();
                    return Err(e);
                }
            }
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    query.mark_cancelled();
                    return Err(Error::Cancelled);
                }
            }
            if started.elapsed() > DEFAULT_EXECUTE_DEADLINE {
                return Err(Error::Timeout);
            }

            let (index, endpoint) = self.network().select(&candidates).map_err(Error::Transport)?;
            let node = candidates[index];
            let envelope = query
                .envelope_for(index, response_type)
                .ok_or(Error::Lifecycle(LifecycleError::MissingPayload))?;
            debug!(%node, endpoint = %endpoint.label(), attempt, "querying");

            match self.exchange(&endpoint, &envelope, cancel).await {
                Ok(bytes) => {
                    self.network().record_success(node);
                    // A cost probe leaves the lifecycle untouched so the
                    // paid call can still run on the same value.
                    if response_type == ResponseType::Answer {
                        query.mark_submitted();
                    }
                    let response = QueryResponse::decode(&bytes)?;
                    let status = response.status;
                    if status.is_success() || status.is_pending() {
                        if response_type == ResponseType::Answer {
                            query.mark_resolved();
                        }
                        return Ok(response);
                    }
                    let err = Error::PreCheck {
                        status,
                        request_id: None,
                    };
                    if !status.is_retryable() {
                        return Err(err);
                    }
                    warn!(%node, %status, "retryable query status");
                    last = Some(err);
                }
                Err(Error::Cancelled) => {
                    query.mark_cancelled();
                    return Err(Error::Cancelled);
                }
                Err(Error::Transport(e)) if e.is_retryable() => {
                    self.network().record_failure(node);
                    warn!(%node, error = %e, "delivery failed, will retry");
                    last = Some(Error::Transport(e));
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::RetryExhausted {
            attempts: retry.max_attempts,
            elapsed: started.elapsed(),
            last: Box::new(last.unwrap_or(Error::Timeout)),
        })
    }

    /// Polls the receipt for `request_id` at the node that accepted the
    /// submission until the status leaves the pending class, the polling
    /// deadline elapses, or the token fires.
    ///
    /// A receipt that resolves to a *failure* status is still returned as
    /// a value; see [`TransactionReceipt::validate_status`].
    pub async fn wait_for_receipt(
        &self,
        request_id: &RequestId,
        node: AccountId,
        cancel: Option<&CancelToken>,
    ) -> Result<TransactionReceipt> {
        let query = ReceiptQuery::new(*request_id).node_account_ids(vec![node]);
        let started = Instant::now();

        loop {
            let receipt = query.execute_with(self, cancel).await?;
            if !receipt.is_pending() {
                info!(%request_id, status = %receipt.status, "receipt resolved");
                return Ok(receipt);
            }
            if started.elapsed() >= RECEIPT_POLL_DEADLINE {
                return Err(Error::Timeout);
            }
            debug!(%request_id, status = %receipt.status, "receipt pending");
            sleep_or_cancel(RECEIPT_POLL_INTERVAL, cancel).await?;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
