// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! The read side of the lifecycle.
//!
//! A [`Query`] reuses the same state machine as a transaction but usually
//! skips `Signed`: most reads are free, and paid reads carry their payment
//! as a nested, already-signed transfer envelope rather than a signature
//! over the query itself.
//!
//! Every query envelope opens with a header submessage (payment=1,
//! response type=2) followed by the operation payload at its registered
//! field. The response mirrors it: header=1 (status + cost), answer
//! fields after.

use tracing::debug;

use super::{LifecycleError, OperationPayload, RequestState, ResponseHeader, Transaction};
use crate::client::{CancelToken, Client};
use crate::codec::{decode_value, BodyReader, BodyWriter, Value};
use crate::entity::AccountId;
use crate::error::Result;
use crate::units::Tinybar;

// ---------------------------------------------------------------------------
// ResponseType
// ---------------------------------------------------------------------------

/// What the caller wants back: the answer itself, or only its price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// The full answer. The default.
    #[default]
    Answer,
    /// Only the cost of asking, as a free probe.
    CostAnswer,
}

impl ResponseType {
    fn code(self) -> u64 {
        match self {
            Self::Answer => 0,
            Self::CostAnswer => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A read request moving through the lifecycle.
///
/// Like [`Transaction`], the engine never interprets the payload; concrete
/// query builders attach an [`OperationPayload`] and decode the answer
/// fields out of the returned [`QueryResponse`].
#[derive(Debug, Clone)]
pub struct Query {
    state: RequestState,
    node_ids: Vec<AccountId>,
    payload: Option<OperationPayload>,
    payment: Option<Transaction>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    /// Creates an empty, mutable query.
    pub fn new() -> Self {
        Self {
            state: RequestState::Mutable,
            node_ids: Vec::new(),
            payload: None,
            payment: None,
        }
    }

    fn require_mutable(&self) -> std::result::Result<(), LifecycleError> {
        if self.state >= RequestState::Frozen {
            return Err(LifecycleError::AlreadyFrozen);
        }
        Ok(())
    }

    /// Sets the candidate target nodes, in retry-rotation order.
    pub fn node_account_ids(&mut self, nodes: Vec<AccountId>) -> Result<&mut Self> {
        self.require_mutable()?;
        self.node_ids = nodes;
        Ok(self)
    }

    /// Attaches the operation payload produced by an external builder.
    pub fn payload(&mut self, payload: OperationPayload) -> Result<&mut Self> {
        self.require_mutable()?;
        self.payload = Some(payload);
        Ok(self)
    }

    /// Attaches an explicit payment for a paid read.
    ///
    /// The payment is a transfer transaction, frozen and signed for the
    /// same candidate nodes as this query, nested whole into the query
    /// header. Free reads simply never call this.
    pub fn payment(&mut self, payment: Transaction) -> Result<&mut Self> {
        self.require_mutable()?;
        self.payment = Some(payment);
        Ok(self)
    }

    /// Fixes the candidate set and transitions to `Frozen`.
    pub fn freeze(&mut self) -> Result<&mut Self> {
        self.require_mutable()?;
        if self.node_ids.is_empty() {
            return Err(LifecycleError::NodeRequired.into());
        }
        if self.payload.is_none() {
            return Err(LifecycleError::MissingPayload.into());
        }
        self.state = RequestState::Frozen;
        debug!(nodes = self.node_ids.len(), "query frozen");
        Ok(self)
    }

    /// Freezes, borrowing the client's network as the candidate list
    /// when the caller set none.
    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self> {
        self.require_mutable()?;
        if self.node_ids.is_empty() {
            self.node_ids = client.network().node_account_ids();
        }
        self.freeze()
    }

    /// Asks a node what the full answer would cost, without paying.
    ///
    /// Sends a cost-probe variant of this query through the ordinary
    /// retry loop and reads the price out of the response header.
    pub async fn get_cost(&self, client: &Client) -> Result<Tinybar> {
        // Probe on a clone: the caller's value stays mutable, so a
        // payment can still be attached before the paid call.
        let mut probe = self.clone();
        if probe.state == RequestState::Mutable {
            probe.freeze_with(client)?;
        }
        let response = client
            .execute_query(&mut probe, ResponseType::CostAnswer, None)
            .await?;
        Ok(response.cost)
    }

    /// Executes the query through the client's retry loop.
    pub async fn execute(&mut self, client: &Client) -> Result<QueryResponse> {
        self.execute_with(client, None).await
    }

    /// [`execute`](Self::execute) with caller-supplied cancellation.
    pub async fn execute_with(
        &mut self,
        client: &Client,
        cancel: Option<&CancelToken>,
    ) -> Result<QueryResponse> {
        if self.state == RequestState::Mutable {
            self.freeze_with(client)?;
        }
        client
            .execute_query(self, ResponseType::Answer, cancel)
            .await
    }

    // -- accessors & internal hooks ----------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Candidate nodes, in rotation order.
    pub fn node_candidates(&self) -> &[AccountId] {
        &self.node_ids
    }

    /// Assembles the query envelope for candidate `index`: header=1
    /// (payment envelope=1, response type=2), payload at its registered
    /// field.
    pub(crate) fn envelope_for(&self, index: usize, response_type: ResponseType) -> Option<Vec<u8>> {
        let payload = self.payload.as_ref()?;
        if index >= self.node_ids.len() {
            return None;
        }

        let mut header = BodyWriter::new();
        if let Some(payment) = &self.payment {
            // A payment frozen for the same candidate list lines up by
            // index; one frozen for a single node pins that node.
            let payment_index = if payment.node_candidates().len() == self.node_ids.len() {
                index
            } else {
                0
            };
            header.write_bytes(1, &payment.envelope_for(payment_index)?);
        }
        header.write_varint(2, response_type.code());

        let mut w = BodyWriter::with_capacity(header.len() + payload.bytes().len() + 8);
        w.write_message(1, &header);
        w.write_bytes(payload.field(), payload.bytes());
        Some(w.into_bytes())
    }

    pub(crate) fn is_executable(&self) -> std::result::Result<(), LifecycleError> {
        match self.state {
            RequestState::Frozen | RequestState::Signed => Ok(()),
            RequestState::Mutable => Err(LifecycleError::NotFrozen),
            other => Err(LifecycleError::NotExecutable(other)),
        }
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.state = RequestState::Submitted;
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.state = RequestState::Resolved;
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.state = RequestState::Cancelled;
    }
}

// ---------------------------------------------------------------------------
// QueryResponse
// ---------------------------------------------------------------------------

/// A decoded query answer: the header, plus every answer field decoded
/// generically for the concrete builder to pick apart.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// The answer status.
    pub status: crate::status::Status,
    /// Reported cost, meaningful for cost probes.
    pub cost: Tinybar,
    /// Answer fields beyond the header, as `(field, value)` pairs in wire
    /// order.
    pub fields: Vec<(u32, Value)>,
}

impl QueryResponse {
    /// Decodes a full response: header=1, everything else collected as
    /// generic values.
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = BodyReader::new(bytes);
        let mut header = None;
        let mut fields = Vec::new();
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            if field == 1 {
                header = Some(ResponseHeader::decode(r.read_bytes()?)?);
            } else {
                fields.push((field, decode_value(&mut r, wt)?));
            }
        }
        let header = header.unwrap_or(ResponseHeader {
            status: crate::status::Status::Unknown,
            cost: Tinybar::ZERO,
        });
        Ok(Self {
            status: header.status,
            cost: header.cost,
            fields,
        })
    }

    /// The first answer field with the given number, if present.
    pub fn field(&self, number: u32) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(f, _)| *f == number)
            .map(|(_, v)| v)
    }

    /// The first answer field with the given number as raw submessage
    /// bytes, for builders that decode a known nested shape.
    pub fn message_field(&self, number: u32) -> Option<&[u8]> {
        match self.field(number)? {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
