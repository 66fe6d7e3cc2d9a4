// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! Request identifiers.
//!
//! A [`RequestId`] names one logical operation: the paying account plus
//! the instant from which the request's validity window opens. The network
//! deduplicates on it, which is exactly why the id is generated once and
//! reused verbatim across retries — the *node* a retry targets is carried
//! separately in the body, so resubmitting to a different node cannot
//! create a second logical operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{BodyReader, BodyWriter, DecodeError};
use crate::config::VALID_START_BACKDATE;
use crate::entity::{AccountId, EntityError, EntityId};
use crate::temporal::Timestamp;

/// Identity of one logical request.
///
/// # Examples
///
/// ```
/// use meridian_sdk::entity::AccountId;
/// use meridian_sdk::request::RequestId;
///
/// let id = RequestId::generate(AccountId::new(0, 0, 100));
/// assert!(id.to_string().starts_with("0.0.100@"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId {
    /// The account paying for the operation.
    pub payer: AccountId,
    /// Opening instant of the validity window.
    pub valid_start: Timestamp,
    /// `true` when the id names the inner transaction of a schedule.
    pub scheduled: bool,
    /// Disambiguates child operations spawned by a parent; `None` for
    /// ordinary top-level requests.
    pub nonce: Option<i32>,
}

impl RequestId {
    /// Builds an id from explicit parts.
    pub fn new(payer: AccountId, valid_start: Timestamp) -> Self {
        Self {
            payer,
            valid_start,
            scheduled: false,
            nonce: None,
        }
    }

    /// Generates an id for `payer` with a valid-start slightly in the
    /// past, absorbing clock skew between this client and the node.
    pub fn generate(payer: AccountId) -> Self {
        Self::new(payer, Timestamp::now().minus(VALID_START_BACKDATE))
    }

    /// Wire layout: payer=1 (nested entity), valid_start=2 (nested
    /// timestamp), scheduled=3 (varint bool, written only when set),
    /// nonce=4 (zig-zag varint, written only when present).
    pub fn encode(&self) -> BodyWriter {
        let mut w = BodyWriter::new();
        w.write_message(1, &self.payer.encode());
        w.write_message(2, &self.valid_start.encode());
        if self.scheduled {
            w.write_varint(3, 1);
        }
        if let Some(nonce) = self.nonce {
            w.write_signed_varint(4, i64::from(nonce));
        }
        w
    }

    /// Decodes from the nested wire message.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = BodyReader::new(bytes);
        let mut id = Self::new(AccountId::new(0, 0, 0), Timestamp::default());
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => id.payer = AccountId::decode(r.read_bytes()?)?,
                2 => id.valid_start = Timestamp::decode(r.read_bytes()?)?,
                3 => id.scheduled = r.read_varint()? != 0,
                4 => id.nonce = Some(r.read_signed_varint()? as i32),
                _ => r.skip_field(wt)?,
            }
        }
        Ok(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.payer, self.valid_start)?;
        if self.scheduled {
            write!(f, "?scheduled")?;
        }
        if let Some(nonce) = self.nonce {
            write!(f, "/{nonce}")?;
        }
        Ok(())
    }
}

impl FromStr for RequestId {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || EntityError::InvalidFormat(s.to_string());

        let (head, nonce) = match s.rsplit_once('/') {
            Some((head, n)) => (head, Some(n.parse::<i32>().map_err(|_| err())?)),
            None => (s, None),
        };
        let (head, scheduled) = match head.strip_suffix("?scheduled") {
            Some(head) => (head, true),
            None => (head, false),
        };
        let (payer, start) = head.split_once('@').ok_or_else(err)?;
        let payer: EntityId = payer.parse()?;
        let valid_start: Timestamp = start.parse().map_err(|_| err())?;

        Ok(Self {
            payer: payer.into(),
            valid_start,
            scheduled,
            nonce,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
