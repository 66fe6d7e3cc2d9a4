// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Meridian SDK — Client Engine
//!
//! The client-side engine for talking to a Meridian ledger network:
//! build a request, freeze it, sign it, ship it to a node that's actually
//! answering, and poll the outcome — with every failure mode accounted
//! for and not a single socket opened by the engine itself.
//!
//! ## Architecture
//!
//! The modules mirror the actual concerns of a ledger client:
//!
//! - **codec** — The tag/varint wire format. Byte-exact, forward
//!   compatible, zero-copy reads.
//! - **entity** — Typed ledger identifiers with advisory checksums.
//! - **units** — Tinybar amounts and exchange rates. Checked arithmetic,
//!   because money.
//! - **temporal** — Ledger timestamps and durations, normalized.
//! - **status** — The network's status vocabulary and the retry/pending
//!   classification built on it. One source of truth.
//! - **request** — The lifecycle state machine: Mutable → Frozen →
//!   Signed → Submitted → Resolved. Misuse is an error, never a panic.
//! - **crypto** — Ed25519 signing, plus the seam for external custody.
//! - **client** — Node selection, retry with backoff, receipt polling,
//!   cancellation. The part that copes with production networks.
//! - **receipt** — Receipts and records, the read path for outcomes.
//! - **config** — Every constant, named and in one place.
//!
//! ## Design Philosophy
//!
//! 1. The engine is payload-opaque: operation builders serialize, the
//!    engine freezes, signs, and ships.
//! 2. Collaborators (transport, signer) are injected at the seams, so
//!    the whole retry machinery runs under test with scripted doubles.
//! 3. A failed receipt is data, not an exception — failure becomes an
//!    error only when the caller opts in.
//! 4. If it touches money, it has tests. Plural.
//!
//! ## A complete round trip
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use meridian_sdk::client::{Client, NetworkConfig, Operator, Transport};
//! use meridian_sdk::crypto::PrivateKey;
//! use meridian_sdk::entity::AccountId;
//! use meridian_sdk::request::{OperationPayload, Transaction};
//!
//! # async fn demo(transport: Arc<dyn Transport>) -> meridian_sdk::Result<()> {
//! let operator_key = PrivateKey::generate();
//! let client = Client::new(NetworkConfig::testnet(), transport)
//!     .with_operator(Operator::new(AccountId::new(0, 0, 100), operator_key.clone()));
//!
//! let mut tx = Transaction::new();
//! tx.payload(OperationPayload::new(10, vec![])?)?
//!     .memo("hello ledger")?;
//! tx.freeze_with(&client)?;
//! tx.sign(&operator_key)?;
//!
//! let response = tx.execute(&client).await?;
//! let receipt = response.get_receipt(&client).await?.validate_status()?;
//! println!("resolved: {}", receipt.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod entity;
pub mod error;
pub mod receipt;
pub mod request;
pub mod status;
pub mod temporal;
pub mod units;

pub use error::{Error, Result};
