// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! End-to-end flows against a scripted transport: freeze, sign, submit,
//! retry, poll, resolve. No sockets anywhere.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use meridian_sdk::client::{
    Client, NetworkConfig, NodeEndpoint, Operator, RetryConfig, Transport, TransportError,
};
use meridian_sdk::codec::{BodyReader, BodyWriter};
use meridian_sdk::crypto::PrivateKey;
use meridian_sdk::entity::{AccountId, LedgerId};
use meridian_sdk::receipt::RecordQuery;
use meridian_sdk::request::{OperationPayload, RequestId, RequestState, Transaction};
use meridian_sdk::status::Status;
use meridian_sdk::units::Tinybar;
use meridian_sdk::Error;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

/// Plays back a fixed response script and records every exchange.
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    exchanges: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<Vec<u8>, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            exchanges: Mutex::new(Vec::new()),
        })
    }

    fn exchanges(&self) -> Vec<(String, Vec<u8>)> {
        self.exchanges.lock().clone()
    }

    fn sends(&self) -> usize {
        self.exchanges.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        endpoint: &NodeEndpoint,
        envelope: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        self.exchanges
            .lock()
            .push((endpoint.label(), envelope.to_vec()));
        self.script.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::ConnectionFailed {
                endpoint: endpoint.label(),
                detail: "script exhausted".into(),
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

fn ack(status: Status) -> Vec<u8> {
    let mut w = BodyWriter::new();
    w.write_varint(1, status.code() as u64);
    w.into_bytes()
}

fn query_response(header_status: Status, answer: Option<(u32, BodyWriter)>) -> Vec<u8> {
    let mut header = BodyWriter::new();
    header.write_varint(1, header_status.code() as u64);
    let mut w = BodyWriter::new();
    w.write_message(1, &header);
    if let Some((field, body)) = answer {
        w.write_message(field, &body);
    }
    w.into_bytes()
}

fn receipt_body(status: Status, account: Option<AccountId>) -> BodyWriter {
    let mut w = BodyWriter::new();
    w.write_varint(1, status.code() as u64);
    if let Some(account) = account {
        w.write_message(2, &account.encode());
    }
    w
}

fn network_of(nodes: &[(AccountId, &str)]) -> NetworkConfig {
    NetworkConfig {
        nodes: nodes
            .iter()
            .map(|(account, host)| NodeEndpoint::new(*account, *host))
            .collect(),
        ledger_id: LedgerId::testnet(),
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 6,
        min_backoff: std::time::Duration::from_millis(1),
        max_backoff: std::time::Duration::from_millis(4),
        request_timeout: std::time::Duration::from_secs(1),
    }
}

fn transfer_payload() -> OperationPayload {
    let mut w = BodyWriter::new();
    w.write_message(1, &AccountId::new(0, 0, 100).encode());
    w.write_message(2, &AccountId::new(0, 0, 200).encode());
    w.write_signed_varint(3, 1_000);
    OperationPayload::new(10, w.into_bytes()).expect("registered field")
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_round_trip_resolves_to_success() {
    init_tracing();
    let node = AccountId::new(0, 0, 3);
    let transport = ScriptedTransport::new(vec![
        Ok(ack(Status::Ok)),
        Ok(query_response(Status::Ok, None)),
        Ok(query_response(
            Status::Ok,
            Some((2, receipt_body(Status::Success, Some(AccountId::new(0, 0, 1234))))),
        )),
    ]);
    let key = PrivateKey::generate();
    let client = Client::new(network_of(&[(node, "node-a.test")]), transport.clone())
        .with_operator(Operator::new(AccountId::new(0, 0, 100), key.clone()))
        .with_retry(fast_retry());

    let mut tx = Transaction::new();
    tx.payload(transfer_payload())
        .expect("mutable")
        .memo("test")
        .expect("short memo");
    tx.freeze_with(&client).expect("operator and network set");
    tx.sign(&key).expect("frozen");

    let response = tx.execute(&client).await.expect("accepted");
    assert_eq!(tx.state(), RequestState::Submitted);
    assert_eq!(response.node_id, node);
    assert_eq!(response.transaction_hash.len(), 48);

    let receipt = response
        .get_receipt(&client)
        .await
        .expect("resolved")
        .validate_status()
        .expect("success");
    assert_eq!(receipt.status, Status::Success);
    assert_eq!(receipt.account_id, Some(AccountId::new(0, 0, 1234)));

    // One submission, one pending poll, one final poll.
    assert_eq!(transport.sends(), 3);
}

#[tokio::test(start_paused = true)]
async fn busy_retries_resubmit_identical_bytes() {
    init_tracing();
    let node = AccountId::new(0, 0, 3);
    let transport = ScriptedTransport::new(vec![
        Ok(ack(Status::Busy)),
        Ok(ack(Status::Busy)),
        Ok(ack(Status::Ok)),
    ]);
    let client = Client::new(network_of(&[(node, "node-a.test")]), transport.clone())
        .with_retry(fast_retry());

    let key = PrivateKey::generate();
    let mut tx = Transaction::new();
    tx.payer(AccountId::new(0, 0, 100))
        .expect("mutable")
        .node_account_ids(vec![node])
        .expect("mutable")
        .payload(transfer_payload())
        .expect("mutable");
    tx.freeze().expect("complete");
    tx.sign(&key).expect("frozen");

    tx.execute(&client).await.expect("third attempt accepted");

    let exchanges = transport.exchanges();
    assert_eq!(exchanges.len(), 3);
    // Same request id, same body, same signatures on every attempt: the
    // network sees one logical operation, not three.
    assert_eq!(exchanges[0].1, exchanges[1].1);
    assert_eq!(exchanges[1].1, exchanges[2].1);
}

#[tokio::test(start_paused = true)]
async fn dead_node_is_routed_around() {
    init_tracing();
    let node_a = AccountId::new(0, 0, 3);
    let node_b = AccountId::new(0, 0, 4);
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::ConnectionFailed {
            endpoint: "node-a.test:50211".into(),
            detail: "refused".into(),
        }),
        Ok(ack(Status::Ok)),
    ]);
    let client = Client::new(
        network_of(&[(node_a, "node-a.test"), (node_b, "node-b.test")]),
        transport.clone(),
    )
    .with_retry(fast_retry());

    let key = PrivateKey::generate();
    let mut tx = Transaction::new();
    tx.payer(AccountId::new(0, 0, 100))
        .expect("mutable")
        .node_account_ids(vec![node_a, node_b])
        .expect("mutable")
        .payload(transfer_payload())
        .expect("mutable");
    tx.freeze().expect("complete");
    tx.sign(&key).expect("frozen");

    let response = tx.execute(&client).await.expect("second node accepted");

    let exchanges = transport.exchanges();
    assert_eq!(exchanges.len(), 2);
    assert_ne!(
        exchanges[0].0, exchanges[1].0,
        "retry must rotate to a different node"
    );
    // Accepted-node bookkeeping follows the node that actually answered.
    assert_eq!(response.node_id, node_b);
}

#[tokio::test(start_paused = true)]
async fn failed_receipt_is_a_value_until_validated() {
    init_tracing();
    let node = AccountId::new(0, 0, 3);
    let transport = ScriptedTransport::new(vec![Ok(query_response(
        Status::Ok,
        Some((2, receipt_body(Status::InsufficientPayerBalance, None))),
    ))]);
    let client = Client::new(network_of(&[(node, "node-a.test")]), transport.clone())
        .with_retry(fast_retry());

    let id = RequestId::generate(AccountId::new(0, 0, 100));
    let receipt = client
        .wait_for_receipt(&id, node, None)
        .await
        .expect("a failed receipt is still a resolved receipt");
    assert_eq!(receipt.status, Status::InsufficientPayerBalance);

    let err = receipt.validate_status().unwrap_err();
    match err {
        Error::ReceiptStatus { status, .. } => {
            assert_eq!(status, Status::InsufficientPayerBalance);
        }
        other => panic!("expected ReceiptStatus, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn record_query_decodes_transfer_list() {
    init_tracing();
    let node = AccountId::new(0, 0, 3);

    let mut debit = BodyWriter::new();
    debit.write_message(1, &AccountId::new(0, 0, 100).encode());
    debit.write_signed_varint(2, -1_077);
    let mut credit = BodyWriter::new();
    credit.write_message(1, &AccountId::new(0, 0, 200).encode());
    credit.write_signed_varint(2, 1_000);
    let mut fee = BodyWriter::new();
    fee.write_message(1, &AccountId::new(0, 0, 98).encode());
    fee.write_signed_varint(2, 77);

    let mut record = BodyWriter::new();
    record.write_message(1, &receipt_body(Status::Success, None));
    record.write_bytes(3, &[0x11; 48]);
    record.write_str(4, "paid");
    record.write_varint(5, 77);
    record.write_message(6, &debit);
    record.write_message(6, &credit);
    record.write_message(6, &fee);

    let transport = ScriptedTransport::new(vec![Ok(query_response(
        Status::Ok,
        Some((3, record)),
    ))]);
    let client = Client::new(network_of(&[(node, "node-a.test")]), transport.clone())
        .with_retry(fast_retry());

    let id = RequestId::generate(AccountId::new(0, 0, 100));
    let record = RecordQuery::new(id)
        .node_account_ids(vec![node])
        .execute(&client)
        .await
        .expect("record answer");

    assert_eq!(record.receipt.status, Status::Success);
    assert_eq!(record.memo, "paid");
    assert_eq!(record.fee_charged, Tinybar::new(77).expect("in range"));
    assert_eq!(record.transfers.len(), 3);
    assert_eq!(record.net_transfer(), 0, "movements must balance");
}

#[tokio::test(start_paused = true)]
async fn frozen_body_carries_the_advertised_fields() {
    init_tracing();
    // Submission-side contract: payer 0.0.100, node 0.0.3, memo "test",
    // fee ceiling 100000000, all recoverable from the frozen bytes.
    let node = AccountId::new(0, 0, 3);
    let key = PrivateKey::generate();

    let mut tx = Transaction::new();
    tx.payer(AccountId::new(0, 0, 100))
        .expect("mutable")
        .node_account_ids(vec![node])
        .expect("mutable")
        .max_fee(Tinybar::new(100_000_000).expect("in range"))
        .expect("mutable")
        .memo("test")
        .expect("short memo")
        .payload(transfer_payload())
        .expect("mutable");
    tx.freeze().expect("complete");
    tx.sign(&key).expect("frozen");

    let body = tx.frozen_body_bytes(node).expect("body for node");
    let mut r = BodyReader::new(body);
    let mut fields = Vec::new();
    while r.has_more() {
        let (field, wt) = r.read_tag().expect("well-formed tag");
        fields.push(field);
        match field {
            1 => {
                let id = RequestId::decode(r.read_bytes().expect("nested")).expect("request id");
                assert_eq!(id.payer, AccountId::new(0, 0, 100));
                assert_eq!(id, *tx.request_id_ref().expect("frozen"));
            }
            2 => {
                let target =
                    AccountId::decode(r.read_bytes().expect("nested")).expect("account id");
                assert_eq!(target, node);
            }
            3 => assert_eq!(r.read_varint().expect("fee"), 100_000_000),
            5 => assert_eq!(r.read_str().expect("memo"), "test"),
            _ => r.skip_field(wt).expect("skippable"),
        }
    }
    for required in [1, 2, 3, 5, 10] {
        assert!(fields.contains(&required), "field {required} missing");
    }

    // And the collected signature verifies over exactly these bytes.
    let pair = &tx.signature_pairs()[0];
    assert!(pair.public_key.verify(body, &pair.signatures[0]));
}
