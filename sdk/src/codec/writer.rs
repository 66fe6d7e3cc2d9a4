// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! Append-only encoder for the tag/varint wire format.
//!
//! The writer never mutates bytes it has already emitted. Field order is
//! whatever order the caller writes — not required to match field-number
//! order, but a given caller must write in a stable order so that two
//! encodings of the same value are byte-identical. Deterministic bytes are
//! what make frozen-body signing and the round-trip tests possible.

use super::WireType;

// ---------------------------------------------------------------------------
// BodyWriter
// ---------------------------------------------------------------------------

/// Encoder producing a single message's byte representation.
///
/// # Examples
///
/// ```
/// use meridian_sdk::codec::BodyWriter;
///
/// let mut inner = BodyWriter::new();
/// inner.write_varint(1, 0);
/// inner.write_varint(3, 100);
///
/// let mut outer = BodyWriter::new();
/// outer.write_message(1, &inner);
/// outer.write_str(5, "test");
/// let bytes = outer.into_bytes();
/// assert!(!bytes.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BodyWriter {
    buf: Vec<u8>,
}

impl BodyWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a writer with a pre-sized buffer, for callers that know
    /// roughly how big the message will be.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Writes an unsigned varint field.
    ///
    /// Use for counts, field-number-like values, and integers that are
    /// never negative. A negative value shoved through here as a cast
    /// would cost ten bytes — that is what [`write_signed_varint`]
    /// (zig-zag) is for.
    ///
    /// [`write_signed_varint`]: Self::write_signed_varint
    pub fn write_varint(&mut self, field: u32, value: u64) {
        self.write_tag(field, WireType::Varint);
        self.write_raw_varint(value);
    }

    /// Writes a signed varint field using zig-zag encoding.
    ///
    /// Zig-zag maps `0, -1, 1, -2, 2, ...` to `0, 1, 2, 3, 4, ...` so
    /// small negative magnitudes stay small on the wire instead of
    /// ballooning to ten bytes of sign extension.
    pub fn write_signed_varint(&mut self, field: u32, value: i64) {
        self.write_tag(field, WireType::Varint);
        self.write_raw_varint(zigzag_encode(value));
    }

    /// Writes an 8-byte little-endian fixed-width field.
    pub fn write_fixed64(&mut self, field: u32, value: u64) {
        self.write_tag(field, WireType::Fixed64);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a 4-byte little-endian fixed-width field.
    pub fn write_fixed32(&mut self, field: u32, value: u32) {
        self.write_tag(field, WireType::Fixed32);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a length-delimited field from raw bytes.
    ///
    /// This is the carrier for strings, opaque byte arrays, and
    /// pre-serialized nested messages alike — the wire does not
    /// distinguish them.
    pub fn write_bytes(&mut self, field: u32, bytes: &[u8]) {
        self.write_tag(field, WireType::LengthDelimited);
        self.write_raw_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a UTF-8 string as a length-delimited field.
    pub fn write_str(&mut self, field: u32, value: &str) {
        self.write_bytes(field, value.as_bytes());
    }

    /// Writes a nested message: the inner writer's accumulated bytes,
    /// length-prefixed. The inner message is complete before the prefix is
    /// written, so the length is exact — never an estimate.
    pub fn write_message(&mut self, field: u32, message: &BodyWriter) {
        self.write_bytes(field, message.as_bytes());
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer and returns the encoded message.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_tag(&mut self, field: u32, wire_type: WireType) {
        debug_assert!(field != 0, "field number zero is not encodable");
        let tag = (u64::from(field) << 3) | u64::from(wire_type.discriminant());
        self.write_raw_varint(tag);
    }

    fn write_raw_varint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return;
            }
            self.buf.push(byte | 0x80);
        }
    }
}

/// Zig-zag encodes a signed integer into an unsigned one.
pub(crate) fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub(crate) fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
