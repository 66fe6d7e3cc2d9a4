// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! The transaction side of the lifecycle: freeze, sign, execute.
//!
//! A [`Transaction`] here is the *engine* base — payload-opaque. Concrete
//! operation builders (transfers, token administration, and friends) are
//! external collaborators that hand the engine an [`OperationPayload`]
//! and read back a [`TransactionResponse`]. The engine's whole job is the
//! state machine, the byte-exact body, and the signature envelope.
//!
//! ## Frozen bodies
//!
//! Freezing serializes one body *per candidate node*: the bodies differ
//! only in the node-account field, and each signer signs every body, so a
//! retry that rotates to a different candidate already has a fully signed
//! envelope waiting. The request id is shared across all bodies — that is
//! what keeps a rotated retry deduplicable by the network.

use sha2::{Digest, Sha384};
use tracing::debug;

use super::{check_memo, LifecycleError, OperationPayload, RequestId, RequestState};
use crate::client::{CancelToken, Client};
use crate::codec::BodyWriter;
use crate::config::{DEFAULT_MAX_FEE_TINYBARS, DEFAULT_VALID_DURATION};
use crate::crypto::{PublicKey, SignatureBytes, Signer};
use crate::entity::AccountId;
use crate::error::Result;
use crate::receipt::TransactionReceipt;
use crate::temporal::LedgerDuration;
use crate::units::Tinybar;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One frozen body: the serialized fixed fields bound to one candidate
/// node.
#[derive(Debug, Clone)]
struct FrozenBody {
    node: AccountId,
    bytes: Vec<u8>,
}

/// A public key plus its signatures, one per frozen body (aligned by
/// index with the candidate-node list).
#[derive(Debug, Clone)]
pub struct SignaturePair {
    /// The signing identity.
    pub public_key: PublicKey,
    /// `signatures[i]` covers the body frozen for candidate node `i`.
    pub signatures: Vec<SignatureBytes>,
}

/// A ledger transaction moving through the request lifecycle.
///
/// # Examples
///
/// ```no_run
/// use meridian_sdk::entity::AccountId;
/// use meridian_sdk::request::{OperationPayload, Transaction};
/// use meridian_sdk::units::Tinybar;
///
/// # fn payload() -> OperationPayload { OperationPayload::new(10, vec![]).unwrap() }
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = Transaction::new();
/// tx.payer(AccountId::new(0, 0, 100))?
///     .node_account_ids(vec![AccountId::new(0, 0, 3)])?
///     .max_fee(Tinybar::new(100_000_000)?)?
///     .memo("test")?
///     .payload(payload())?;
/// tx.freeze()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Transaction {
    state: RequestState,
    request_id: Option<RequestId>,
    payer: Option<AccountId>,
    node_ids: Vec<AccountId>,
    max_fee: Tinybar,
    valid_duration: LedgerDuration,
    memo: String,
    payload: Option<OperationPayload>,
    bodies: Vec<FrozenBody>,
    signatures: Vec<SignaturePair>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Creates an empty, mutable transaction with default fee ceiling and
    /// validity window.
    pub fn new() -> Self {
        Self {
            state: RequestState::Mutable,
            request_id: None,
            payer: None,
            node_ids: Vec::new(),
            max_fee: Tinybar::new(DEFAULT_MAX_FEE_TINYBARS).unwrap_or(Tinybar::ZERO),
            valid_duration: DEFAULT_VALID_DURATION.into(),
            memo: String::new(),
            payload: None,
            bodies: Vec::new(),
            signatures: Vec::new(),
        }
    }

    // -- setters (Mutable only) ---------------------------------------------

    fn require_mutable(&self) -> std::result::Result<(), LifecycleError> {
        if self.state >= RequestState::Frozen {
            return Err(LifecycleError::AlreadyFrozen);
        }
        Ok(())
    }

    /// Sets an explicit request id, overriding auto-generation at freeze.
    pub fn request_id(&mut self, id: RequestId) -> Result<&mut Self> {
        self.require_mutable()?;
        self.request_id = Some(id);
        Ok(self)
    }

    /// Sets the paying account used to auto-generate the request id.
    pub fn payer(&mut self, payer: AccountId) -> Result<&mut Self> {
        self.require_mutable()?;
        self.payer = Some(payer);
        Ok(self)
    }

    /// Sets the candidate target nodes, in retry-rotation order.
    pub fn node_account_ids(&mut self, nodes: Vec<AccountId>) -> Result<&mut Self> {
        self.require_mutable()?;
        self.node_ids = nodes;
        Ok(self)
    }

    /// Sets the fee ceiling the payer is willing to be charged.
    pub fn max_fee(&mut self, fee: Tinybar) -> Result<&mut Self> {
        self.require_mutable()?;
        if fee.is_negative() {
            return Err(LifecycleError::NegativeFee.into());
        }
        self.max_fee = fee;
        Ok(self)
    }

    /// Sets the validity window measured from the request id's
    /// valid-start.
    pub fn valid_duration(&mut self, duration: LedgerDuration) -> Result<&mut Self> {
        self.require_mutable()?;
        self.valid_duration = duration;
        Ok(self)
    }

    /// Sets the free-text memo. Length is checked here, at set-time, so
    /// the failure points at the offending call rather than at freeze.
    pub fn memo(&mut self, memo: &str) -> Result<&mut Self> {
        self.require_mutable()?;
        check_memo(memo)?;
        self.memo = memo.to_string();
        Ok(self)
    }

    /// Attaches the operation payload produced by an external builder.
    pub fn payload(&mut self, payload: OperationPayload) -> Result<&mut Self> {
        self.require_mutable()?;
        self.payload = Some(payload);
        Ok(self)
    }

    // -- freeze -------------------------------------------------------------

    /// Fixes the body bytes and transitions to `Frozen`.
    ///
    /// Requires at least one candidate node and a payer identity (an
    /// explicit request id, or a payer to generate one from). Use
    /// [`freeze_with`](Self::freeze_with) to borrow both from a client.
    pub fn freeze(&mut self) -> Result<&mut Self> {
        self.require_mutable()?;
        if self.node_ids.is_empty() {
            return Err(LifecycleError::NodeRequired.into());
        }
        if self.payload.is_none() {
            return Err(LifecycleError::MissingPayload.into());
        }
        let request_id = match self.request_id {
            Some(id) => id,
            None => {
                let payer = self.payer.ok_or(LifecycleError::MissingOperator)?;
                RequestId::generate(payer)
            }
        };
        self.request_id = Some(request_id);

        self.bodies = self
            .node_ids
            .iter()
            .map(|node| FrozenBody {
                node: *node,
                bytes: self.encode_body(&request_id, *node),
            })
            .collect();
        self.state = RequestState::Frozen;
        debug!(request_id = %request_id, nodes = self.node_ids.len(), "transaction frozen");
        Ok(self)
    }

    /// Freezes, borrowing the operator as payer and the client's network
    /// as the candidate-node list when the caller set neither.
    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self> {
        self.require_mutable()?;
        if self.payer.is_none() && self.request_id.is_none() {
            self.payer = Some(client.operator_account().ok_or(LifecycleError::MissingOperator)?);
        }
        if self.node_ids.is_empty() {
            self.node_ids = client.network().node_account_ids();
        }
        self.freeze()
    }

    /// Body wire layout, per node: request id=1 (nested), node account=2
    /// (nested), max fee=3 (varint tinybars), valid duration=4 (nested),
    /// memo=5 (string, omitted when empty), payload at its registered
    /// field. Field order is fixed so identical inputs freeze to
    /// identical bytes.
    fn encode_body(&self, request_id: &RequestId, node: AccountId) -> Vec<u8> {
        let mut w = BodyWriter::with_capacity(128);
        w.write_message(1, &request_id.encode());
        w.write_message(2, &node.encode());
        w.write_varint(3, self.max_fee.get() as u64);
        w.write_message(4, &self.valid_duration.encode());
        if !self.memo.is_empty() {
            w.write_str(5, &self.memo);
        }
        if let Some(payload) = &self.payload {
            w.write_bytes(payload.field(), payload.bytes());
        }
        w.into_bytes()
    }

    // -- sign ---------------------------------------------------------------

    /// Signs every frozen body with the given signer, appending a
    /// signature pair. The first signature transitions `Frozen -> Signed`;
    /// further signers append without re-transitioning (multi-sig).
    /// Signing twice with the same key is a no-op.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<&mut Self> {
        let public_key = signer.public_key();
        self.sign_with(public_key, |message| signer.sign(message))
    }

    /// Signs with an externally produced signature function — the seam
    /// for HSMs and remote signers that never expose key material.
    pub fn sign_with<F>(&mut self, public_key: PublicKey, mut sign_fn: F) -> Result<&mut Self>
    where
        F: FnMut(&[u8]) -> SignatureBytes,
    {
        match self.state {
            RequestState::Frozen | RequestState::Signed => {}
            RequestState::Mutable => return Err(LifecycleError::NotFrozen.into()),
            other => return Err(LifecycleError::NotExecutable(other).into()),
        }
        if self.signatures.iter().any(|p| p.public_key == public_key) {
            return Ok(self);
        }
        let signatures = self
            .bodies
            .iter()
            .map(|body| sign_fn(&body.bytes))
            .collect();
        self.signatures.push(SignaturePair {
            public_key,
            signatures,
        });
        self.state = RequestState::Signed;
        Ok(self)
    }

    // -- execute ------------------------------------------------------------

    /// Submits the signed envelope through the client's retry loop.
    ///
    /// Transitions to `Submitted` once bytes leave the process. The
    /// returned handle is what the caller polls for the receipt.
    pub async fn execute(&mut self, client: &Client) -> Result<TransactionResponse> {
        self.execute_with(client, None).await
    }

    /// [`execute`](Self::execute) with caller-supplied cancellation.
    pub async fn execute_with(
        &mut self,
        client: &Client,
        cancel: Option<&CancelToken>,
    ) -> Result<TransactionResponse> {
        client.submit_transaction(self, cancel).await
    }

    // -- accessors & internal hooks ----------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// The request id, present once frozen (or earlier if set
    /// explicitly).
    pub fn request_id_ref(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Candidate nodes, in rotation order.
    pub fn node_candidates(&self) -> &[AccountId] {
        &self.node_ids
    }

    /// Collected signature pairs.
    pub fn signature_pairs(&self) -> &[SignaturePair] {
        &self.signatures
    }

    /// The frozen body bytes bound to a candidate node, for inspection
    /// and tests. `None` before freeze or for an unknown node.
    pub fn frozen_body_bytes(&self, node: AccountId) -> Option<&[u8]> {
        self.bodies
            .iter()
            .find(|b| b.node == node)
            .map(|b| b.bytes.as_slice())
    }

    /// Assembles the submission envelope for candidate `index`: body
    /// bytes=1, then one signature-pair submessage per signer at field 2
    /// (public key=1, signature=2).
    pub(crate) fn envelope_for(&self, index: usize) -> Option<Vec<u8>> {
        let body = self.bodies.get(index)?;
        let mut w = BodyWriter::with_capacity(body.bytes.len() + 96);
        w.write_bytes(1, &body.bytes);
        for pair in &self.signatures {
            let sig = pair.signatures.get(index)?;
            let mut pair_msg = BodyWriter::new();
            pair_msg.write_bytes(1, pair.public_key.as_bytes());
            pair_msg.write_bytes(2, sig.as_bytes());
            w.write_message(2, &pair_msg);
        }
        Some(w.into_bytes())
    }

    pub(crate) fn is_executable(&self) -> std::result::Result<(), LifecycleError> {
        match self.state {
            // Operations that require no caller signature may execute
            // straight from Frozen.
            RequestState::Frozen | RequestState::Signed => Ok(()),
            RequestState::Mutable => Err(LifecycleError::NotFrozen),
            other => Err(LifecycleError::NotExecutable(other)),
        }
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.state = RequestState::Submitted;
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.state = RequestState::Cancelled;
    }
}

// ---------------------------------------------------------------------------
// TransactionResponse
// ---------------------------------------------------------------------------

/// Handle returned by a successful submission, used to poll for the
/// asynchronous outcome.
#[derive(Debug, Clone)]
pub struct TransactionResponse {
    /// The id the network will file the outcome under.
    pub request_id: RequestId,
    /// The node that accepted the submission.
    pub node_id: AccountId,
    /// SHA-384 of the submitted envelope, as recorded by the ledger.
    pub transaction_hash: Vec<u8>,
}

impl TransactionResponse {
    pub(crate) fn new(request_id: RequestId, node_id: AccountId, envelope: &[u8]) -> Self {
        Self {
            request_id,
            node_id,
            transaction_hash: Sha384::digest(envelope).to_vec(),
        }
    }

    /// Polls the accepting node until the receipt leaves the pending
    /// class or the polling deadline elapses.
    pub async fn get_receipt(&self, client: &Client) -> Result<TransactionReceipt> {
        client
            .wait_for_receipt(&self.request_id, self.node_id, None)
            .await
    }

    /// [`get_receipt`](Self::get_receipt) with caller-supplied
    /// cancellation.
    pub async fn get_receipt_with(
        &self,
        client: &Client,
        cancel: Option<&CancelToken>,
    ) -> Result<TransactionReceipt> {
        client
            .wait_for_receipt(&self.request_id, self.node_id, cancel)
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BodyReader;
    use crate::crypto::PrivateKey;
    use crate::error::Error;
    use crate::temporal::Timestamp;

    fn sample_payload() -> OperationPayload {
        let mut w = BodyWriter::new();
        w.write_str(1, "payload");
        OperationPayload::new(10, w.into_bytes()).unwrap()
    }

    fn frozen_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.payer(AccountId::new(0, 0, 100))
            .unwrap()
            .node_account_ids(vec![AccountId::new(0, 0, 3)])
            .unwrap()
            .max_fee(Tinybar::new(100_000_000).unwrap())
            .unwrap()
            .memo("test")
            .unwrap()
            .payload(sample_payload())
            .unwrap();
        tx.freeze().unwrap();
        tx
    }

    #[test]
    fn setters_rejected_after_freeze() {
        let mut tx = frozen_tx();
        assert_eq!(tx.state(), RequestState::Frozen);

        let err = tx.memo("too late").unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::AlreadyFrozen)
        ));
        let err = tx.max_fee(Tinybar::ZERO).unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::AlreadyFrozen)
        ));
        let err = tx.node_account_ids(vec![]).unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::AlreadyFrozen)
        ));
    }

    #[test]
    fn freeze_requires_nodes() {
        let mut tx = Transaction::new();
        tx.payer(AccountId::new(0, 0, 100))
            .unwrap()
            .payload(sample_payload())
            .unwrap();
        let err = tx.freeze().unwrap_err();
        assert!(matches!(err, Error::Lifecycle(LifecycleError::NodeRequired)));
    }

    #[test]
    fn freeze_requires_payer_or_request_id() {
        let mut tx = Transaction::new();
        tx.node_account_ids(vec![AccountId::new(0, 0, 3)])
            .unwrap()
            .payload(sample_payload())
            .unwrap();
        let err = tx.freeze().unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::MissingOperator)
        ));
    }

    #[test]
    fn freeze_requires_payload() {
        let mut tx = Transaction::new();
        tx.payer(AccountId::new(0, 0, 100))
            .unwrap()
            .node_account_ids(vec![AccountId::new(0, 0, 3)])
            .unwrap();
        let err = tx.freeze().unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::MissingPayload)
        ));
    }

    #[test]
    fn explicit_request_id_survives_freeze_verbatim() {
        let id = RequestId::new(AccountId::new(0, 0, 100), Timestamp::new(1_700_000_000, 0));
        let mut tx = Transaction::new();
        tx.request_id(id)
            .unwrap()
            .node_account_ids(vec![AccountId::new(0, 0, 3)])
            .unwrap()
            .payload(sample_payload())
            .unwrap();
        tx.freeze().unwrap();
        assert_eq!(tx.request_id_ref(), Some(&id));
    }

    #[test]
    fn sign_before_freeze_fails() {
        let mut tx = Transaction::new();
        let key = PrivateKey::generate();
        let err = tx.sign(&key).unwrap_err();
        assert!(matches!(err, Error::Lifecycle(LifecycleError::NotFrozen)));
    }

    #[test]
    fn first_signature_transitions_to_signed() {
        let mut tx = frozen_tx();
        let key = PrivateKey::generate();
        tx.sign(&key).unwrap();
        assert_eq!(tx.state(), RequestState::Signed);
        assert_eq!(tx.signature_pairs().len(), 1);
    }

    #[test]
    fn multisig_appends_without_retransition() {
        let mut tx = frozen_tx();
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        tx.sign(&a).unwrap();
        tx.sign(&b).unwrap();
        assert_eq!(tx.state(), RequestState::Signed);
        assert_eq!(tx.signature_pairs().len(), 2);
    }

    #[test]
    fn duplicate_signer_is_a_noop() {
        let mut tx = frozen_tx();
        let key = PrivateKey::generate();
        tx.sign(&key).unwrap();
        tx.sign(&key).unwrap();
        assert_eq!(tx.signature_pairs().len(), 1);
    }

    #[test]
    fn signature_verifies_over_body_bytes() {
        let mut tx = frozen_tx();
        let key = PrivateKey::generate();
        tx.sign(&key).unwrap();

        let body = tx.frozen_body_bytes(AccountId::new(0, 0, 3)).unwrap();
        let pair = &tx.signature_pairs()[0];
        assert!(pair.public_key.verify(body, &pair.signatures[0]));
    }

    #[test]
    fn freezing_twice_fails() {
        let mut tx = frozen_tx();
        let err = tx.freeze().unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::AlreadyFrozen)
        ));
    }

    #[test]
    fn negative_fee_rejected_at_set_time() {
        let mut tx = Transaction::new();
        let err = tx.max_fee(Tinybar::new(-1).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Lifecycle(LifecycleError::NegativeFee)));
    }

    #[test]
    fn over_long_memo_rejected_at_set_time() {
        let mut tx = Transaction::new();
        let long = "m".repeat(101);
        let err = tx.memo(&long).unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::MemoTooLong { length: 101 })
        ));
    }

    #[test]
    fn frozen_body_contains_expected_fields() {
        let tx = frozen_tx();
        let body = tx.frozen_body_bytes(AccountId::new(0, 0, 3)).unwrap();
        let request_id = *tx.request_id_ref().unwrap();

        let mut r = BodyReader::new(body);
        let mut seen_id = None;
        let mut seen_node = None;
        let mut seen_fee = None;
        let mut seen_memo = None;
        let mut seen_payload = false;
        while r.has_more() {
            let (field, wt) = r.read_tag().unwrap();
            match field {
                1 => seen_id = Some(RequestId::decode(r.read_bytes().unwrap()).unwrap()),
                2 => seen_node = Some(AccountId::decode(r.read_bytes().unwrap()).unwrap()),
                3 => seen_fee = Some(r.read_varint().unwrap()),
                5 => seen_memo = Some(r.read_str().unwrap().to_string()),
                10 => {
                    r.read_bytes().unwrap();
                    seen_payload = true;
                }
                _ => r.skip_field(wt).unwrap(),
            }
        }

        assert_eq!(seen_id, Some(request_id));
        assert_eq!(request_id.payer, AccountId::new(0, 0, 100));
        assert_eq!(seen_node, Some(AccountId::new(0, 0, 3)));
        assert_eq!(seen_fee, Some(100_000_000));
        assert_eq!(seen_memo.as_deref(), Some("test"));
        assert!(seen_payload);
    }

    #[test]
    fn one_body_per_candidate_node() {
        let nodes = vec![
            AccountId::new(0, 0, 3),
            AccountId::new(0, 0, 4),
            AccountId::new(0, 0, 5),
        ];
        let mut tx = Transaction::new();
        tx.payer(AccountId::new(0, 0, 100))
            .unwrap()
            .node_account_ids(nodes.clone())
            .unwrap()
            .payload(sample_payload())
            .unwrap();
        tx.freeze().unwrap();

        for node in nodes {
            let body = tx.frozen_body_bytes(node).unwrap();
            let mut r = BodyReader::new(body);
            let mut found = None;
            while r.has_more() {
                let (field, wt) = r.read_tag().unwrap();
                if field == 2 {
                    found = Some(AccountId::decode(r.read_bytes().unwrap()).unwrap());
                } else {
                    r.skip_field(wt).unwrap();
                }
            }
            assert_eq!(found, Some(node), "body must embed its own node");
        }
    }

    #[test]
    fn envelope_carries_body_and_signatures() {
        let mut tx = frozen_tx();
        let key = PrivateKey::generate();
        tx.sign(&key).unwrap();

        let envelope = tx.envelope_for(0).unwrap();
        let mut r = BodyReader::new(&envelope);

        let (field, _) = r.read_tag().unwrap();
        assert_eq!(field, 1);
        let body = r.read_bytes().unwrap();
        assert_eq!(
            body,
            tx.frozen_body_bytes(AccountId::new(0, 0, 3)).unwrap()
        );

        let (field, _) = r.read_tag().unwrap();
        assert_eq!(field, 2);
        let pair_bytes = r.read_bytes().unwrap();
        let mut pr = BodyReader::new(pair_bytes);
        pr.read_tag().unwrap();
        assert_eq!(pr.read_bytes().unwrap(), key.public_key().as_bytes());
        pr.read_tag().unwrap();
        let sig = pr.read_bytes().unwrap();
        assert_eq!(sig.len(), 64);
    }

    #[test]
    fn identical_inputs_freeze_to_identical_bytes() {
        let id = RequestId::new(AccountId::new(0, 0, 100), Timestamp::new(1_700_000_000, 0));
        let build = || {
            let mut tx = Transaction::new();
            tx.request_id(id)
                .unwrap()
                .node_account_ids(vec![AccountId::new(0, 0, 3)])
                .unwrap()
                .memo("deterministic")
                .unwrap()
                .payload(sample_payload())
                .unwrap();
            tx.freeze().unwrap();
            tx.frozen_body_bytes(AccountId::new(0, 0, 3)).unwrap().to_vec()
        };
        assert_eq!(build(), build());
    }
}
