// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Wire Codec
//!
//! The length-delimited binary format every Meridian message travels in.
//! Fields are encoded as a varint *tag* (field number shifted left three
//! bits, wire type in the low bits) followed by the field payload. Four
//! wire types exist and will ever exist:
//!
//! ```text
//! 0  Varint           variable-length integer (1..=10 bytes)
//! 1  Fixed64          8 bytes, little-endian
//! 2  LengthDelimited  varint length + that many raw bytes
//! 5  Fixed32          4 bytes, little-endian
//! ```
//!
//! Nested messages are themselves fully encoded first and then written as
//! a length-delimited field — there is no framing trick, no back-patching,
//! no seeking. Writing is append-only.
//!
//! ## Forward compatibility
//!
//! Unknown fields are always skippable: every wire type carries enough
//! information to advance past its payload without understanding it. A
//! reader that meets a field number it has never heard of calls
//! [`BodyReader::skip_field`] and moves on. Decoding only fails on
//! *structurally* broken input — truncation, a varint that never
//! terminates, or a declared length that runs past the end of the buffer.
//!
//! ## Round-trip law
//!
//! For every field combination used by the lifecycle and identifier types,
//! `decode(encode(x)) == x`, byte offsets included. The tests in this
//! module and its children enforce exactly that.

mod reader;
mod value;
mod writer;

pub use reader::BodyReader;
pub use value::{decode_value, Value};
pub use writer::BodyWriter;

use thiserror::Error;

/// Longest legal varint encoding. 64 bits / 7 bits-per-byte rounds up to
/// ten; an eleventh continuation byte means the input is garbage.
pub const MAX_VARINT_BYTES: usize = 10;

// ---------------------------------------------------------------------------
// WireType
// ---------------------------------------------------------------------------

/// The low three bits of a field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Variable-length integer.
    Varint,
    /// 8-byte little-endian value.
    Fixed64,
    /// Varint length prefix followed by raw bytes (strings, byte arrays,
    /// and nested messages).
    LengthDelimited,
    /// 4-byte little-endian value.
    Fixed32,
}

impl WireType {
    /// Maps a wire-type discriminant from a decoded tag.
    ///
    /// Returns `None` for discriminants the format does not define (2 and 5
    /// are real; 3 and 4 were group markers in ancestral formats and are
    /// rejected here).
    pub fn from_discriminant(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }

    /// The three-bit discriminant packed into a tag.
    pub fn discriminant(self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::LengthDelimited => 2,
            Self::Fixed32 => 5,
        }
    }
}

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// A structural decoding failure.
///
/// Carries the byte offset at which decoding gave up so that a captured
/// buffer can be diagnosed with a hex dump and a ruler. Decode errors are
/// always fatal for the message being read — the reader returns no partial
/// results — and they are never retried by the network client, because a
/// malformed response means a codec or version mismatch, not a flaky node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode error at byte {offset}: {kind}")]
pub struct DecodeError {
    /// Offset into the input buffer where the failure was detected.
    pub offset: usize,
    /// What went wrong.
    pub kind: DecodeErrorKind,
}

/// The specific way a buffer failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    /// The buffer ended in the middle of a field.
    #[error("input truncated")]
    Truncated,

    /// A varint ran past the ten-byte limit without terminating.
    #[error("varint exceeds {MAX_VARINT_BYTES} bytes")]
    VarintOverrun,

    /// A length-delimited field declared more bytes than remain.
    #[error("declared length {declared} exceeds remaining {remaining} bytes")]
    LengthOverrun {
        /// Length the field claimed to have.
        declared: u64,
        /// Bytes actually left in the buffer.
        remaining: usize,
    },

    /// A tag carried a wire-type discriminant the format does not define.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),

    /// The tag's field number was zero, which no legal encoder produces.
    #[error("field number zero")]
    ZeroFieldNumber,

    /// A length-delimited field expected to hold UTF-8 did not.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// The wire type found does not match what the caller asked to read.
    #[error("expected wire type {expected:?}, found {found:?}")]
    WireTypeMismatch {
        /// Wire type the read call requires.
        expected: WireType,
        /// Wire type the tag actually carried.
        found: WireType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_type_discriminant_roundtrip() {
        for wt in [
            WireType::Varint,
            WireType::Fixed64,
            WireType::LengthDelimited,
            WireType::Fixed32,
        ] {
            assert_eq!(WireType::from_discriminant(wt.discriminant()), Some(wt));
        }
    }

    #[test]
    fn group_wire_types_rejected() {
        // 3 and 4 were start-group/end-group in the ancestral format.
        // We never emit them and never accept them.
        assert_eq!(WireType::from_discriminant(3), None);
        assert_eq!(WireType::from_discriminant(4), None);
        assert_eq!(WireType::from_discriminant(6), None);
        assert_eq!(WireType::from_discriminant(7), None);
    }

    #[test]
    fn decode_error_displays_offset() {
        let err = DecodeError {
            offset: 17,
            kind: DecodeErrorKind::Truncated,
        };
        let msg = err.to_string();
        assert!(msg.contains("byte 17"));
        assert!(msg.contains("truncated"));
    }
}
