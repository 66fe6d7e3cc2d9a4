// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Signing Capability
//!
//! The engine treats signing as an external capability: it needs
//! `sign(bytes) -> signature` and the matching public key bytes, nothing
//! more. This module provides the default Ed25519 implementation of that
//! capability plus the [`Signer`] seam for callers who keep key material
//! elsewhere (HSM, remote signer, air-gapped machine).
//!
//! Key material is never logged and never appears in `Debug` output. If
//! you add logging to this module, you will be asked to leave.

use std::fmt;

use ed25519_dalek::{
    Signature as DalekSignature, Signer as DalekSigner, SigningKey, Verifier, VerifyingKey,
    SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from key parsing and construction.
///
/// Deliberately vague about *why* — error messages that describe key
/// material are a classic leak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The secret key bytes were the wrong length or not a valid scalar.
    #[error("invalid private key bytes")]
    InvalidPrivateKey,

    /// The public key bytes were not a valid Ed25519 point.
    #[error("invalid public key bytes")]
    InvalidPublicKey,
}

// ---------------------------------------------------------------------------
// Signer capability
// ---------------------------------------------------------------------------

/// Anything that can produce a signature over a frozen request body.
///
/// The engine calls this once per frozen body at `sign` time. The default
/// implementation is [`PrivateKey`]; external key custody plugs in here.
pub trait Signer {
    /// The public key that will be paired with the produced signatures.
    fn public_key(&self) -> PublicKey;

    /// Signs the given message bytes.
    fn sign(&self, message: &[u8]) -> SignatureBytes;
}

/// A detached signature. Always 64 bytes for the built-in Ed25519 signer;
/// opaque to the engine either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBytes(pub Vec<u8>);

impl SignatureBytes {
    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// The built-in Ed25519 signing key.
///
/// Does not implement `Serialize` — exporting secret material must be a
/// deliberate call to [`PrivateKey::to_bytes`], not a side effect of
/// shoving a struct into JSON.
///
/// # Examples
///
/// ```
/// use meridian_sdk::crypto::{PrivateKey, Signer};
///
/// let key = PrivateKey::generate();
/// let sig = key.sign(b"frozen body bytes");
/// assert!(key.public_key().verify(b"frozen body bytes", &sig));
/// ```
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generates a fresh key from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Reconstructs a key from its 32-byte secret scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&arr),
        })
    }

    /// Reconstructs a key from a hex-encoded secret scalar.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPrivateKey)?;
        Self::from_bytes(&bytes)
    }

    /// Exports the raw 32-byte secret. Handle accordingly.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Signer for PrivateKey {
    fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    fn sign(&self, message: &[u8]) -> SignatureBytes {
        SignatureBytes(self.signing_key.sign(message).to_bytes().to_vec())
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material, not even "partially".
        write!(f, "PrivateKey(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// The public half of an identity, safe to share and to embed in
/// signature pairs on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; 32],
}

impl PublicKey {
    /// Validates and adopts raw public key bytes.
    ///
    /// Length and curve-point validity are both checked; 32 arbitrary
    /// bytes are not automatically a key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&arr).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes: arr })
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Hex form, for logs and config files.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verifies a signature over a message. Any malformed input simply
    /// fails verification; there is no panic path.
    pub fn verify(&self, message: &[u8], signature: &SignatureBytes) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Ok(sig) = <[u8; 64]>::try_from(signature.0.as_slice()) else {
            return false;
        };
        key.verify(message, &DalekSignature::from_bytes(&sig)).is_ok()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let key = PrivateKey::generate();
        let sig = key.sign(b"body bytes");
        assert!(key.public_key().verify(b"body bytes", &sig));
        assert!(!key.public_key().verify(b"other bytes", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let sig = a.sign(b"message");
        assert!(!b.public_key().verify(b"message", &sig));
    }

    #[test]
    fn deterministic_signatures() {
        let key = PrivateKey::generate();
        assert_eq!(key.sign(b"x"), key.sign(b"x"));
    }

    #[test]
    fn byte_and_hex_roundtrip() {
        let key = PrivateKey::generate();
        let restored = PrivateKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key.public_key(), restored.public_key());

        let restored = PrivateKey::from_hex(&hex::encode(key.to_bytes())).unwrap();
        assert_eq!(key.public_key(), restored.public_key());
    }

    #[test]
    fn invalid_key_material_rejected() {
        assert_eq!(
            PrivateKey::from_bytes(&[0u8; 16]).unwrap_err(),
            KeyError::InvalidPrivateKey
        );
        assert!(PrivateKey::from_hex("not hex").is_err());
        assert!(PublicKey::from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn malformed_signature_fails_closed() {
        let key = PrivateKey::generate();
        let truncated = SignatureBytes(vec![0u8; 10]);
        assert!(!key.public_key().verify(b"m", &truncated));
    }

    #[test]
    fn debug_never_leaks_secret() {
        let key = PrivateKey::generate();
        let secret_hex = hex::encode(key.to_bytes());
        let debug = format!("{key:?}");
        assert!(debug.starts_with("PrivateKey(pub="));
        assert!(!debug.contains(&secret_hex));
    }

    #[test]
    fn public_key_roundtrip_through_bytes() {
        let key = PrivateKey::generate();
        let pk = key.public_key();
        let restored = PublicKey::from_bytes(pk.as_bytes()).unwrap();
        assert_eq!(pk, restored);
    }
}
