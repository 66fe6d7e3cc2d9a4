// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Receipts & Records
//!
//! The read path for transaction outcomes. A receipt is the small,
//! short-lived answer ("it happened, here is what was created"); a record
//! is the full archival answer (receipt plus consensus time, hash, memo,
//! and the transfer list). Both are fetched with ordinary [`Query`]
//! envelopes keyed by [`RequestId`] — free reads, no payment attached.
//!
//! Resolution philosophy: a receipt that resolves to a *failure* status is
//! still a successful read. It comes back as a value, and only an explicit
//! [`TransactionReceipt::validate_status`] call turns it into an error.

use serde::{Deserialize, Serialize};

use crate::client::{CancelToken, Client};
use crate::codec::{BodyReader, BodyWriter};
use crate::entity::{AccountId, ContractId, FileId, ScheduleId, TokenId, TopicId};
use crate::error::{Error, Result};
use crate::request::{OperationPayload, Query, RequestId};
use crate::status::Status;
use crate::temporal::Timestamp;
use crate::units::{ExchangeRateSet, Tinybar};

/// Envelope field carrying a receipt query payload.
pub(crate) const RECEIPT_QUERY_FIELD: u32 = 10;
/// Envelope field carrying a record query payload.
pub(crate) const RECORD_QUERY_FIELD: u32 = 11;

/// Response answer field carrying a receipt submessage.
const RECEIPT_ANSWER_FIELD: u32 = 2;
/// Response answer field carrying a record submessage.
const RECORD_ANSWER_FIELD: u32 = 3;

// ---------------------------------------------------------------------------
// TransactionReceipt
// ---------------------------------------------------------------------------

/// The outcome of a resolved transaction, plus whatever the operation
/// created.
///
/// Every `Option` field is operation-specific: an account creation fills
/// `account_id`, a topic message fills the sequence number and running
/// hash, and so on. The engine decodes them all and lets the caller pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Terminal status, or a pending-class status while consensus is
    /// still outstanding.
    pub status: Status,
    /// Account created or touched by the operation.
    pub account_id: Option<AccountId>,
    /// File created by the operation.
    pub file_id: Option<FileId>,
    /// Contract created by the operation.
    pub contract_id: Option<ContractId>,
    /// Token created by the operation.
    pub token_id: Option<TokenId>,
    /// Topic created by the operation.
    pub topic_id: Option<TopicId>,
    /// Schedule created by the operation.
    pub schedule_id: Option<ScheduleId>,
    /// Exchange rates in effect at consensus.
    pub exchange_rates: Option<ExchangeRateSet>,
    /// Sequence number assigned to a submitted topic message.
    pub topic_sequence_number: Option<u64>,
    /// Running hash of the topic after the submitted message.
    pub topic_running_hash: Option<Vec<u8>>,
}

impl TransactionReceipt {
    pub(crate) fn pending(status: Status) -> Self {
        Self {
            status,
            account_id: None,
            file_id: None,
            contract_id: None,
            token_id: None,
            topic_id: None,
            schedule_id: None,
            exchange_rates: None,
            topic_sequence_number: None,
            topic_running_hash: None,
        }
    }

    /// Wire layout: status=1 (varint code), account=2, file=3, contract=4,
    /// token=5, topic=6, schedule=7 (nested entities), exchange rates=8
    /// (nested set), topic sequence=9 (varint), running hash=10 (bytes).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = BodyReader::new(bytes);
        let mut receipt = Self::pending(Status::Unknown);
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => receipt.status = Status::from_code(r.read_varint()? as i32),
                2 => receipt.account_id = Some(AccountId::decode(r.read_bytes()?)?),
                3 => receipt.file_id = Some(FileId::decode(r.read_bytes()?)?),
                4 => receipt.contract_id = Some(ContractId::decode(r.read_bytes()?)?),
                5 => receipt.token_id = Some(TokenId::decode(r.read_bytes()?)?),
                6 => receipt.topic_id = Some(TopicId::decode(r.read_bytes()?)?),
                7 => receipt.schedule_id = Some(ScheduleId::decode(r.read_bytes()?)?),
                8 => receipt.exchange_rates = Some(ExchangeRateSet::decode(r.read_bytes()?)?),
                9 => receipt.topic_sequence_number = Some(r.read_varint()?),
                10 => receipt.topic_running_hash = Some(r.read_bytes()?.to_vec()),
                _ => r.skip_field(wt)?,
            }
        }
        Ok(receipt)
    }

    /// `true` while the network has not yet reached a terminal answer.
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// Turns a terminal failure status into [`Error::ReceiptStatus`].
    ///
    /// Opt-in: callers that treat a failed receipt as data simply skip
    /// this call.
    pub fn validate_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::ReceiptStatus {
                status: self.status,
                receipt: Box::new(self),
            })
        }
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> BodyWriter {
        let mut w = BodyWriter::new();
        w.write_varint(1, self.status.code() as u64);
        if let Some(id) = self.account_id {
            w.write_message(2, &id.encode());
        }
        if let Some(id) = self.file_id {
            w.write_message(3, &id.encode());
        }
        if let Some(id) = self.contract_id {
            w.write_message(4, &id.encode());
        }
        if let Some(id) = self.token_id {
            w.write_message(5, &id.encode());
        }
        if let Some(id) = self.topic_id {
            w.write_message(6, &id.encode());
        }
        if let Some(id) = self.schedule_id {
            w.write_message(7, &id.encode());
        }
        if let Some(rates) = self.exchange_rates {
            w.write_message(8, &rates.encode());
        }
        if let Some(seq) = self.topic_sequence_number {
            w.write_varint(9, seq);
        }
        if let Some(hash) = &self.topic_running_hash {
            w.write_bytes(10, hash);
        }
        w
    }
}

// ---------------------------------------------------------------------------
// TransactionRecord
// ---------------------------------------------------------------------------

/// One ledger balance movement inside a record's transfer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// The account whose balance moved.
    pub account_id: AccountId,
    /// Signed movement: negative leaves the account, positive arrives.
    pub amount: Tinybar,
}

impl Transfer {
    /// Wire layout: account=1 (nested), amount=2 (zig-zag tinybars).
    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = BodyReader::new(bytes);
        let mut account_id = AccountId::new(0, 0, 0);
        let mut amount = Tinybar::ZERO;
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => account_id = AccountId::decode(r.read_bytes()?)?,
                2 => amount = Tinybar::new(r.read_signed_varint()?).unwrap_or(Tinybar::ZERO),
                _ => r.skip_field(wt)?,
            }
        }
        Ok(Self { account_id, amount })
    }
}

/// The full archival answer for a resolved transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The embedded receipt.
    pub receipt: TransactionReceipt,
    /// When consensus placed the transaction.
    pub consensus_timestamp: Timestamp,
    /// SHA-384 of the submitted envelope.
    pub transaction_hash: Vec<u8>,
    /// The memo the transaction carried.
    pub memo: String,
    /// The fee actually charged, which may undercut the declared ceiling.
    pub fee_charged: Tinybar,
    /// Every balance movement the transaction caused, fees included.
    pub transfers: Vec<Transfer>,
}

impl TransactionRecord {
    /// Wire layout: receipt=1 (nested), consensus timestamp=2 (nested),
    /// transaction hash=3 (bytes), memo=4 (string), fee=5 (varint),
    /// transfers=6 (repeated nested).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = BodyReader::new(bytes);
        let mut record = Self {
            receipt: TransactionReceipt::pending(Status::Unknown),
            consensus_timestamp: Timestamp::default(),
            transaction_hash: Vec::new(),
            memo: String::new(),
            fee_charged: Tinybar::ZERO,
            transfers: Vec::new(),
        };
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => record.receipt = TransactionReceipt::decode(r.read_bytes()?)?,
                2 => record.consensus_timestamp = Timestamp::decode(r.read_bytes()?)?,
                3 => record.transaction_hash = r.read_bytes()?.to_vec(),
                4 => record.memo = r.read_str()?.to_string(),
                5 => record.fee_charged = Tinybar::new(r.read_varint()? as i64)
                    .unwrap_or(Tinybar::MAX),
                6 => record.transfers.push(Transfer::decode(r.read_bytes()?)?),
                _ => r.skip_field(wt)?,
            }
        }
        Ok(record)
    }

    /// Sum of all movements. Zero for any internally consistent record.
    pub fn net_transfer(&self) -> i64 {
        self.transfers.iter().map(|t| t.amount.get()).sum()
    }
}

// ---------------------------------------------------------------------------
// ReceiptQuery / RecordQuery
// ---------------------------------------------------------------------------

fn request_id_payload(field: u32, request_id: &RequestId) -> OperationPayload {
    let mut body = BodyWriter::new();
    body.write_message(1, &request_id.encode());
    // Both module constants above sit in the registered payload range.
    OperationPayload::new_unchecked(field, body.into_bytes())
}

/// Fetches the receipt for one request id. A free read.
///
/// Each `execute` builds a fresh query envelope, so one value can be
/// polled repeatedly.
#[derive(Debug, Clone)]
pub struct ReceiptQuery {
    /// The id whose outcome to fetch.
    pub request_id: RequestId,
    node_ids: Vec<AccountId>,
}

impl ReceiptQuery {
    /// Targets the receipt filed under `request_id`.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            node_ids: Vec::new(),
        }
    }

    /// Pins candidate nodes; most callers pin the node that accepted the
    /// original submission.
    pub fn node_account_ids(mut self, nodes: Vec<AccountId>) -> Self {
        self.node_ids = nodes;
        self
    }

    /// One fetch, no polling. See [`Client::wait_for_receipt`] for the
    /// poll-until-terminal loop.
    pub async fn execute(&self, client: &Client) -> Result<TransactionReceipt> {
        self.execute_with(client, None).await
    }

    /// [`execute`](Self::execute) with caller-supplied cancellation.
    pub async fn execute_with(
        &self,
        client: &Client,
        cancel: Option<&CancelToken>,
    ) -> Result<TransactionReceipt> {
        let mut query = Query::new();
        query.payload(request_id_payload(RECEIPT_QUERY_FIELD, &self.request_id))?;
        if !self.node_ids.is_empty() {
            query.node_account_ids(self.node_ids.clone())?;
        }
        let response = query.execute_with(client, cancel).await?;
        match response.message_field(RECEIPT_ANSWER_FIELD) {
            Some(bytes) => TransactionReceipt::decode(bytes),
            // Header-only answer: the node has nothing filed yet.
            None => Ok(TransactionReceipt::pending(response.status)),
        }
    }
}

/// Fetches the full record for one request id. A free read.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    /// The id whose record to fetch.
    pub request_id: RequestId,
    node_ids: Vec<AccountId>,
}

impl RecordQuery {
    /// Targets the record filed under `request_id`.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            node_ids: Vec::new(),
        }
    }

    /// Pins candidate nodes.
    pub fn node_account_ids(mut self, nodes: Vec<AccountId>) -> Self {
        self.node_ids = nodes;
        self
    }

    /// Fetches the record once.
    pub async fn execute(&self, client: &Client) -> Result<TransactionRecord> {
        self.execute_with(client, None).await
    }

    /// [`execute`](Self::execute) with caller-supplied cancellation.
    pub async fn execute_with(
        &self,
        client: &Client,
        cancel: Option<&CancelToken>,
    ) -> Result<TransactionRecord> {
        let mut query = Query::new();
        query.payload(request_id_payload(RECORD_QUERY_FIELD, &self.request_id))?;
        if !self.node_ids.is_empty() {
            query.node_account_ids(self.node_ids.clone())?;
        }
        let response = query.execute_with(client, cancel).await?;
        match response.message_field(RECORD_ANSWER_FIELD) {
            Some(bytes) => TransactionRecord::decode(bytes),
            None => Err(Error::PreCheck {
                status: if response.status == Status::Success {
                    Status::RecordNotFound
                } else {
                    response.status
                },
                request_id: Some(self.request_id),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
