// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! A tagged variant over the wire-format rules.
//!
//! Operation payload builders deal in a handful of value shapes — integers
//! of both signs, fixed-width words, byte strings, text, and nested
//! messages. [`Value`] is the sum type over those shapes, with one arm per
//! wire rule and exhaustive-match encoding. Builders that assemble payloads
//! generically (rather than writing fields by hand) go through here.

use super::{BodyReader, BodyWriter, DecodeError, WireType};

/// One encodable value, tagged by its wire rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Unsigned integer, varint-encoded.
    Uint(u64),
    /// Signed integer, zig-zag varint-encoded.
    Int(i64),
    /// 8-byte little-endian word.
    Fixed64(u64),
    /// 4-byte little-endian word.
    Fixed32(u32),
    /// Opaque bytes, length-delimited.
    Bytes(Vec<u8>),
    /// UTF-8 text, length-delimited.
    Text(String),
    /// A nested message of (field, value) pairs, encoded in order and
    /// written length-delimited.
    Message(Vec<(u32, Value)>),
}

impl Value {
    /// Encodes this value as the given field into `writer`.
    pub fn encode_into(&self, writer: &mut BodyWriter, field: u32) {
        match self {
            Self::Uint(v) => writer.write_varint(field, *v),
            Self::Int(v) => writer.write_signed_varint(field, *v),
            Self::Fixed64(v) => writer.write_fixed64(field, *v),
            Self::Fixed32(v) => writer.write_fixed32(field, *v),
            Self::Bytes(v) => writer.write_bytes(field, v),
            Self::Text(v) => writer.write_str(field, v),
            Self::Message(fields) => {
                let mut inner = BodyWriter::new();
                for (f, v) in fields {
                    v.encode_into(&mut inner, *f);
                }
                writer.write_message(field, &inner);
            }
        }
    }

    /// The wire type this value encodes as.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Uint(_) | Self::Int(_) => WireType::Varint,
            Self::Fixed64(_) => WireType::Fixed64,
            Self::Fixed32(_) => WireType::Fixed32,
            Self::Bytes(_) | Self::Text(_) | Self::Message(_) => WireType::LengthDelimited,
        }
    }

    /// Encodes a message-shaped value directly to bytes.
    ///
    /// Convenience for payload builders whose top level is always a
    /// message: `Value::Message(fields).to_message_bytes()` yields the
    /// payload the lifecycle embeds verbatim into the envelope.
    pub fn to_message_bytes(&self) -> Vec<u8> {
        let mut w = BodyWriter::new();
        match self {
            Self::Message(fields) => {
                for (f, v) in fields {
                    v.encode_into(&mut w, *f);
                }
            }
            other => other.encode_into(&mut w, 1),
        }
        w.into_bytes()
    }
}

/// Decodes one field's payload into a [`Value`], given the wire type the
/// tag announced. Varint payloads come back as `Uint`; the caller applies
/// zig-zag reinterpretation where its schema says the field is signed,
/// because the wire does not record signedness.
pub fn decode_value(reader: &mut BodyReader<'_>, wire_type: WireType) -> Result<Value, DecodeError> {
    match wire_type {
        WireType::Varint => Ok(Value::Uint(reader.read_varint()?)),
        WireType::Fixed64 => Ok(Value::Fixed64(reader.read_fixed64()?)),
        WireType::Fixed32 => Ok(Value::Fixed32(reader.read_fixed32()?)),
        WireType::LengthDelimited => Ok(Value::Bytes(reader.read_bytes()?.to_vec())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
