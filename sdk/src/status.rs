// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Status Codes
//!
//! The closed enumeration of numeric response codes the Meridian network
//! speaks, and the classification predicates built on top of it.
//!
//! Two consumers read these predicates: the network client's retry policy
//! and caller-facing error reporting. They deliberately share this single
//! table so "what we retry" and "what we tell the user went wrong" can
//! never drift apart.
//!
//! Unknown numeric codes decode to [`Status::Unrecognized`] rather than
//! failing — a newer network talking to an older client is a version skew
//! problem, not a corrupt-bytes problem.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// A network response code.
///
/// `Ok` is the synchronous precheck acceptance; `Success` is the
/// asynchronous consensus-final outcome found in receipts. Everything else
/// is some flavor of "no".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Precheck passed; the node accepted the submission for consensus.
    Ok,
    /// The request was structurally unparseable.
    InvalidRequest,
    /// The paying account does not exist.
    PayerAccountNotFound,
    /// The request named a node account that is not the receiving node.
    InvalidNodeAccount,
    /// The valid-duration window elapsed before the request reached consensus.
    RequestExpired,
    /// The request id's valid-start timestamp is in the future.
    InvalidRequestStart,
    /// The valid-duration is outside the allowed band.
    InvalidRequestDuration,
    /// A signature did not verify against its public key.
    InvalidSignature,
    /// The memo exceeds the network's length bound.
    MemoTooLong,
    /// The offered max fee is below the required fee.
    InsufficientFee,
    /// The payer cannot cover the fee.
    InsufficientPayerBalance,
    /// This request id was already submitted (dedup hit).
    DuplicateRequest,
    /// The node is overloaded; try again shortly.
    Busy,
    /// The operation is not supported by this network version.
    NotSupported,
    /// A referenced file does not exist.
    InvalidFileId,
    /// A referenced account does not exist.
    InvalidAccountId,
    /// A referenced contract does not exist.
    InvalidContractId,
    /// The request id is malformed.
    InvalidRequestId,
    /// No receipt is available for the request id (yet, or anymore).
    ReceiptNotFound,
    /// No record is available for the request id (yet, or anymore).
    RecordNotFound,
    /// The outcome is not yet known; consensus is still in flight.
    Unknown,
    /// Consensus reached and the operation applied successfully.
    Success,
    /// Consensus reached but the operation failed validation.
    FailInvalid,
    /// Consensus reached but the fee could not be charged as assessed.
    FailFee,
    /// Consensus reached but a balance was insufficient at apply time.
    FailBalance,
    /// A required signing key was missing.
    KeyRequired,
    /// A field carried bytes that did not decode as its declared type.
    BadEncoding,
    /// An account balance is too low for the transfer itself (not the fee).
    InsufficientAccountBalance,
    /// The platform accepted but could not create the transaction record.
    PlatformTransactionNotCreated,
    /// The consensus platform is not active; submissions are futile for now.
    PlatformNotActive,
    /// A referenced token does not exist.
    InvalidTokenId,
    /// A referenced topic does not exist.
    InvalidTopicId,
    /// A referenced schedule does not exist.
    InvalidScheduleId,
    /// The target account was deleted.
    AccountDeleted,
    /// The target file was deleted.
    FileDeleted,
    /// The target contract was deleted.
    ContractDeleted,
    /// The target token was deleted.
    TokenWasDeleted,
    /// The account is frozen for the token involved.
    AccountFrozenForToken,
    /// The exchange rate referenced is invalid or expired.
    InvalidExchangeRate,
    /// The request was throttled at consensus; a later retry may pass.
    ThrottledAtConsensus,
    /// A numeric code this client version does not know. Carried verbatim
    /// so it survives a round-trip.
    Unrecognized(i32),
}

impl Status {
    /// Maps a wire integer to a status. Total: unknown integers become
    /// [`Status::Unrecognized`].
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::InvalidRequest,
            2 => Self::PayerAccountNotFound,
            3 => Self::InvalidNodeAccount,
            4 => Self::RequestExpired,
            5 => Self::InvalidRequestStart,
            6 => Self::InvalidRequestDuration,
            7 => Self::InvalidSignature,
            8 => Self::MemoTooLong,
            9 => Self::InsufficientFee,
            10 => Self::InsufficientPayerBalance,
            11 => Self::DuplicateRequest,
            12 => Self::Busy,
            13 => Self::NotSupported,
            14 => Self::InvalidFileId,
            15 => Self::InvalidAccountId,
            16 => Self::InvalidContractId,
            17 => Self::InvalidRequestId,
            18 => Self::ReceiptNotFound,
            19 => Self::RecordNotFound,
            20 => Self::Unknown,
            21 => Self::Success,
            22 => Self::FailInvalid,
            23 => Self::FailFee,
            24 => Self::FailBalance,
            25 => Self::KeyRequired,
            26 => Self::BadEncoding,
            27 => Self::InsufficientAccountBalance,
            28 => Self::PlatformTransactionNotCreated,
            29 => Self::PlatformNotActive,
            30 => Self::InvalidTokenId,
            31 => Self::InvalidTopicId,
            32 => Self::InvalidScheduleId,
            33 => Self::AccountDeleted,
            34 => Self::FileDeleted,
            35 => Self::ContractDeleted,
            36 => Self::TokenWasDeleted,
            37 => Self::AccountFrozenForToken,
            38 => Self::InvalidExchangeRate,
            39 => Self::ThrottledAtConsensus,
            other => Self::Unrecognized(other),
        }
    }

    /// Maps a status back to its wire integer.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::InvalidRequest => 1,
            Self::PayerAccountNotFound => 2,
            Self::InvalidNodeAccount => 3,
            Self::RequestExpired => 4,
            Self::InvalidRequestStart => 5,
            Self::InvalidRequestDuration => 6,
            Self::InvalidSignature => 7,
            Self::MemoTooLong => 8,
            Self::InsufficientFee => 9,
            Self::InsufficientPayerBalance => 10,
            Self::DuplicateRequest => 11,
            Self::Busy => 12,
            Self::NotSupported => 13,
            Self::InvalidFileId => 14,
            Self::InvalidAccountId => 15,
            Self::InvalidContractId => 16,
            Self::InvalidRequestId => 17,
            Self::ReceiptNotFound => 18,
            Self::RecordNotFound => 19,
            Self::Unknown => 20,
            Self::Success => 21,
            Self::FailInvalid => 22,
            Self::FailFee => 23,
            Self::FailBalance => 24,
            Self::KeyRequired => 25,
            Self::BadEncoding => 26,
            Self::InsufficientAccountBalance => 27,
            Self::PlatformTransactionNotCreated => 28,
            Self::PlatformNotActive => 29,
            Self::InvalidTokenId => 30,
            Self::InvalidTopicId => 31,
            Self::InvalidScheduleId => 32,
            Self::AccountDeleted => 33,
            Self::FileDeleted => 34,
            Self::ContractDeleted => 35,
            Self::TokenWasDeleted => 36,
            Self::AccountFrozenForToken => 37,
            Self::InvalidExchangeRate => 38,
            Self::ThrottledAtConsensus => 39,
            Self::Unrecognized(code) => code,
        }
    }

    /// `true` for codes where resubmitting the identical bytes can
    /// plausibly succeed. The retry loop consults exactly this.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Busy
                | Self::PlatformNotActive
                | Self::PlatformTransactionNotCreated
                | Self::ThrottledAtConsensus
        )
    }

    /// `true` for codes meaning the request itself was malformed or
    /// unauthorized — resubmission without changing the request is futile.
    pub fn is_validation_failure(self) -> bool {
        matches!(
            self,
            Self::InvalidRequest
                | Self::InvalidNodeAccount
                | Self::RequestExpired
                | Self::InvalidRequestStart
                | Self::InvalidRequestDuration
                | Self::InvalidSignature
                | Self::MemoTooLong
                | Self::DuplicateRequest
                | Self::InvalidFileId
                | Self::InvalidAccountId
                | Self::InvalidContractId
                | Self::InvalidRequestId
                | Self::InvalidTokenId
                | Self::InvalidTopicId
                | Self::InvalidScheduleId
                | Self::KeyRequired
                | Self::BadEncoding
                | Self::FailInvalid
        )
    }

    /// `true` for codes about fees or balances.
    pub fn is_fee_related(self) -> bool {
        matches!(
            self,
            Self::InsufficientFee
                | Self::InsufficientPayerBalance
                | Self::InsufficientAccountBalance
                | Self::FailFee
                | Self::FailBalance
                | Self::InvalidExchangeRate
        )
    }

    /// `true` for the two acceptance codes.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Success)
    }

    /// `true` while a receipt poll should keep waiting: the outcome is not
    /// yet determined, as opposed to determined-and-bad.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            Self::Unknown | Self::Ok | Self::ReceiptNotFound | Self::RecordNotFound
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "UNRECOGNIZED({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
