// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Entity Identifiers
//!
//! Everything addressable on the Meridian ledger — accounts, contracts,
//! files, tokens, topics, schedules — is named by the same
//! `shard.realm.number` triple. [`EntityId`] is that triple; the typed
//! wrappers ([`AccountId`], [`ContractId`], ...) exist so the compiler
//! stops you from paying a fee to a file.
//!
//! ## Checksums
//!
//! The human-readable form may carry a five-letter checksum suffix
//! (`0.0.123-vfmkw`) derived from the address digits and the ledger id.
//! Checksums catch transposed digits in copy-pasted ids; they are
//! *advisory*. Parsing keeps a checksum if present, [`EntityId::validate_checksum`]
//! verifies one on request, and nothing in the engine hard-fails on a
//! missing or mismatched checksum.
//!
//! ## Alternate address form
//!
//! Accounts created from an EVM-style key may additionally be known by a
//! 20-byte address. When both sides of a comparison carry one, equality is
//! address-based; otherwise it is structural on the triple.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{BodyReader, BodyWriter, DecodeError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures when parsing or validating an entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The string was not `shard.realm.num` with optional `-ccccc` suffix.
    #[error("invalid entity id format: {0:?}")]
    InvalidFormat(String),

    /// A checksum was present (or supplied) and does not match the one
    /// computed for the target ledger.
    #[error("checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch {
        /// Checksum computed for the ledger.
        expected: Checksum,
        /// Checksum carried by the id.
        found: Checksum,
    },
}

// ---------------------------------------------------------------------------
// LedgerId
// ---------------------------------------------------------------------------

/// Identifies which Meridian ledger an id's checksum was computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerId(Vec<u8>);

impl LedgerId {
    /// The production ledger.
    pub fn mainnet() -> Self {
        Self(vec![0x00])
    }

    /// The public test ledger.
    pub fn testnet() -> Self {
        Self(vec![0x01])
    }

    /// The preview ledger, reset between releases.
    pub fn previewnet() -> Self {
        Self(vec![0x02])
    }

    /// An arbitrary ledger id, for private deployments.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Checksum
// ---------------------------------------------------------------------------

/// Five lowercase letters summarizing an address for a given ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum([u8; 5]);

impl Checksum {
    /// Parses a five-letter checksum suffix.
    fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || !bytes.iter().all(|b| b.is_ascii_lowercase()) {
            return None;
        }
        let mut arr = [0u8; 5];
        arr.copy_from_slice(bytes);
        Some(Self(arr))
    }

    /// Computes the checksum for a dotted address string on a ledger.
    ///
    /// The algorithm folds the address digits (with `.` mapped to 10) and
    /// the ledger id bytes into a value mod 26^5, then spells it out in
    /// base 26. Weights 11 and 31 keep adjacent-digit swaps detectable.
    fn of(address: &str, ledger_id: &LedgerId) -> Self {
        const P3: u64 = 26 * 26 * 26;
        const P5: u64 = P3 * 26 * 26;
        const M: u64 = 1_000_003;
        const W: u64 = 31;

        let mut digest: Vec<u8> = ledger_id.as_bytes().to_vec();
        digest.extend_from_slice(&[0u8; 6]);

        let mut sd0: u64 = 0; // even-position digit sum mod 11
        let mut sd1: u64 = 0; // odd-position digit sum mod 11
        let mut sd: u64 = 0; // weighted digit fold mod 26^3
        for (i, c) in address.chars().enumerate() {
            let d = if c == '.' {
                10
            } else {
                u64::from(c.to_digit(10).unwrap_or(0))
            };
            if i % 2 == 0 {
                sd0 = (sd0 + d) % 11;
            } else {
                sd1 = (sd1 + d) % 11;
            }
            sd = (sd * W + d) % P3;
        }

        let mut sh: u64 = 0; // ledger id fold mod 26^5
        for b in &digest {
            sh = (sh * W + u64::from(*b)) % P5;
        }

        let len = address.len() as u64;
        let mut c = ((((len % 5) * 11 + sd0) * 11 + sd1) * P3 + sd + sh) % P5;
        c = (c * M) % P5;

        let mut letters = [0u8; 5];
        for slot in letters.iter_mut().rev() {
            *slot = b'a' + (c % 26) as u8;
            c /= 26;
        }
        Self(letters)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{}", *b as char)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A `shard.realm.number` ledger entity identifier.
///
/// Immutable value type. The checksum and alternate address are carried
/// alongside the triple but never participate in hashing; equality is
/// structural on the triple except when both sides carry an alternate
/// 20-byte address, in which case the addresses decide.
///
/// # Examples
///
/// ```
/// use meridian_sdk::entity::EntityId;
///
/// let id: EntityId = "0.0.100".parse().unwrap();
/// assert_eq!((id.shard, id.realm, id.num), (0, 0, 100));
/// assert_eq!(id.to_string(), "0.0.100");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntityId {
    /// Shard the entity lives in. Zero on today's network.
    pub shard: u64,
    /// Realm within the shard. Zero on today's network.
    pub realm: u64,
    /// The entity number, unique within shard and realm.
    pub num: u64,
    /// Checksum suffix carried from parsing, if any.
    pub checksum: Option<Checksum>,
    /// Alternate 20-byte EVM-style address, if the entity has one.
    pub evm_address: Option<[u8; 20]>,
}

impl EntityId {
    /// Creates an id from its triple.
    pub fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self {
            shard,
            realm,
            num,
            checksum: None,
            evm_address: None,
        }
    }

    /// Creates an id known only by its alternate 20-byte address.
    pub fn from_evm_address(shard: u64, realm: u64, address: [u8; 20]) -> Self {
        Self {
            shard,
            realm,
            num: 0,
            checksum: None,
            evm_address: Some(address),
        }
    }

    /// The dotted form without any checksum suffix.
    fn address_string(&self) -> String {
        format!("{}.{}.{}", self.shard, self.realm, self.num)
    }

    /// Renders the id with the checksum computed for `ledger_id`.
    pub fn to_string_with_checksum(&self, ledger_id: &LedgerId) -> String {
        let address = self.address_string();
        let checksum = Checksum::of(&address, ledger_id);
        format!("{address}-{checksum}")
    }

    /// Verifies a carried checksum against `ledger_id`.
    ///
    /// Advisory: ids without a checksum always pass, and the engine never
    /// calls this on your behalf. Callers that paste ids across networks
    /// can opt in.
    pub fn validate_checksum(&self, ledger_id: &LedgerId) -> Result<(), EntityError> {
        let Some(found) = self.checksum else {
            return Ok(());
        };
        let expected = Checksum::of(&self.address_string(), ledger_id);
        if expected == found {
            Ok(())
        } else {
            Err(EntityError::ChecksumMismatch { expected, found })
        }
    }

    /// Encodes the triple as a nested wire message (shard=1, realm=2,
    /// num=3). Checksum and alternate address are client-side niceties and
    /// never hit the wire.
    pub fn encode(&self) -> BodyWriter {
        let mut w = BodyWriter::new();
        w.write_varint(1, self.shard);
        w.write_varint(2, self.realm);
        w.write_varint(3, self.num);
        w
    }

    /// Decodes the triple from a nested wire message.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = BodyReader::new(bytes);
        let mut id = Self::new(0, 0, 0);
        while r.has_more() {
            let (field, wt) = r.read_tag()?;
            match field {
                1 => id.shard = r.read_varint()?,
                2 => id.realm = r.read_varint()?,
                3 => id.num = r.read_varint()?,
                _ => r.skip_field(wt)?,
            }
        }
        Ok(id)
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        match (self.evm_address, other.evm_address) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.shard == other.shard && self.realm == other.realm && self.num == other.num
            }
        }
    }
}

impl Eq for EntityId {}

impl std::hash::Hash for EntityId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.shard.hash(state);
        self.realm.hash(state);
        self.num.hash(state);
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, checksum) = match s.split_once('-') {
            Some((addr, suffix)) => {
                let checksum = Checksum::parse(suffix)
                    .ok_or_else(|| EntityError::InvalidFormat(s.to_string()))?;
                (addr, Some(checksum))
            }
            None => (s, None),
        };

        let mut parts = address.splitn(3, '.');
        let mut next = || -> Result<u64, EntityError> {
            parts
                .next()
                .and_then(|p| p.parse::<u64>().ok())
                .ok_or_else(|| EntityError::InvalidFormat(s.to_string()))
        };
        let shard = next()?;
        let realm = next()?;
        let num = next()?;

        Ok(Self {
            shard,
            realm,
            num,
            checksum,
            evm_address: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Typed wrappers
// ---------------------------------------------------------------------------

macro_rules! entity_id_wrapper {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub EntityId);

        impl $name {
            /// Creates an id from its triple.
            pub fn new(shard: u64, realm: u64, num: u64) -> Self {
                Self(EntityId::new(shard, realm, num))
            }

            /// The underlying untyped id.
            pub fn entity_id(&self) -> EntityId {
                self.0
            }

            /// Encodes the triple as a nested wire message.
            pub fn encode(&self) -> BodyWriter {
                self.0.encode()
            }

            /// Decodes the triple from a nested wire message.
            pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
                EntityId::decode(bytes).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = EntityError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                EntityId::from_str(s).map(Self)
            }
        }

        impl From<EntityId> for $name {
            fn from(id: EntityId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for EntityId {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id_wrapper!(
    /// Identifier of a ledger account — the thing that holds a balance,
    /// pays fees, and signs transactions.
    AccountId
);
entity_id_wrapper!(
    /// Identifier of a deployed smart contract.
    ContractId
);
entity_id_wrapper!(
    /// Identifier of a stored file.
    FileId
);
entity_id_wrapper!(
    /// Identifier of a token class.
    TokenId
);
entity_id_wrapper!(
    /// Identifier of a consensus topic.
    TopicId
);
entity_id_wrapper!(
    /// Identifier of a scheduled transaction.
    ScheduleId
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_roundtrip() {
        let id: EntityId = "0.0.100".parse().unwrap();
        assert_eq!((id.shard, id.realm, id.num), (0, 0, 100));
        assert_eq!(id.to_string(), "0.0.100");

        let big: EntityId = "3.7.4294967296".parse().unwrap();
        assert_eq!(big.num, 4_294_967_296);
    }

    #[test]
    fn parse_with_checksum_suffix() {
        let id: EntityId = "0.0.123-vfmkw".parse().unwrap();
        assert_eq!(id.num, 123);
        assert!(id.checksum.is_some());
        assert_eq!(id.checksum.unwrap().to_string(), "vfmkw");
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "0.0", "0.0.x", "a.b.c", "0.0.1-TOOLOUD", "0.0.1-abc"] {
            assert!(bad.parse::<EntityId>().is_err(), "should reject {bad:?}");
        }
    }

    #[test]
    fn checksum_roundtrip_on_same_ledger() {
        let ledger = LedgerId::mainnet();
        let id = EntityId::new(0, 0, 123);
        let with_checksum = id.to_string_with_checksum(&ledger);
        let parsed: EntityId = with_checksum.parse().unwrap();
        assert!(parsed.validate_checksum(&ledger).is_ok());
    }

    #[test]
    fn checksum_differs_across_ledgers() {
        let id = EntityId::new(0, 0, 123);
        let mainnet_form = id.to_string_with_checksum(&LedgerId::mainnet());
        let testnet_form = id.to_string_with_checksum(&LedgerId::testnet());
        assert_ne!(mainnet_form, testnet_form);

        // A mainnet checksum validated against testnet fails — advisorily.
        let parsed: EntityId = mainnet_form.parse().unwrap();
        assert!(parsed.validate_checksum(&LedgerId::testnet()).is_err());
    }

    #[test]
    fn missing_checksum_always_validates() {
        let id = EntityId::new(0, 0, 5005);
        assert!(id.validate_checksum(&LedgerId::mainnet()).is_ok());
    }

    #[test]
    fn checksum_is_deterministic() {
        let ledger = LedgerId::testnet();
        let a = EntityId::new(0, 0, 987).to_string_with_checksum(&ledger);
        let b = EntityId::new(0, 0, 987).to_string_with_checksum(&ledger);
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_structural_on_the_triple() {
        let a = EntityId::new(0, 0, 7);
        let mut b = EntityId::new(0, 0, 7);
        b.checksum = Some(Checksum::parse("abcde").unwrap());
        assert_eq!(a, b, "checksum must not affect equality");
        assert_ne!(a, EntityId::new(0, 0, 8));
    }

    #[test]
    fn equality_prefers_addresses_when_both_present() {
        let addr1 = [0x11u8; 20];
        let addr2 = [0x22u8; 20];
        let a = EntityId::from_evm_address(0, 0, addr1);
        let b = EntityId::from_evm_address(0, 0, addr1);
        let c = EntityId::from_evm_address(0, 0, addr2);
        assert_eq!(a, b);
        assert_ne!(a, c);

        // One side without an address falls back to the triple.
        let plain = EntityId::new(0, 0, 0);
        assert_eq!(plain, a, "num 0 matches when only one side has an address");
    }

    #[test]
    fn wire_roundtrip() {
        let id = EntityId::new(1, 2, 300);
        let bytes = id.encode().into_bytes();
        assert_eq!(EntityId::decode(&bytes).unwrap(), id);
    }

    #[test]
    fn wire_layout_is_three_varint_fields() {
        let bytes = EntityId::new(0, 0, 3).encode().into_bytes();
        // shard=1:0, realm=2:0, num=3:3
        assert_eq!(bytes, vec![0x08, 0x00, 0x10, 0x00, 0x18, 0x03]);
    }

    #[test]
    fn typed_wrappers_parse_and_convert() {
        let account: AccountId = "0.0.100".parse().unwrap();
        assert_eq!(account.to_string(), "0.0.100");
        let entity: EntityId = account.into();
        let token: TokenId = entity.into();
        assert_eq!(token.entity_id(), entity);
    }

    #[test]
    fn typed_wrapper_wire_roundtrip() {
        let file = FileId::new(0, 0, 111);
        let bytes = file.encode().into_bytes();
        assert_eq!(FileId::decode(&bytes).unwrap(), file);
    }

    #[test]
    fn serde_roundtrip() {
        let id = EntityId::new(0, 0, 42);
        let json = serde_json::to_string(&id).unwrap();
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
