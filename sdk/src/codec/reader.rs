// Copyright (c) 2026 Meridian Ledger Contributors. MIT License.
// See LICENSE for details.

//! Zero-copy decoder for the tag/varint wire format.
//!
//! [`BodyReader`] walks a caller-owned byte slice and hands back borrowed
//! views into it — length-delimited reads return `&'a [u8]` subslices, not
//! copies. The borrow is valid exactly as long as the input buffer; the
//! lifetime parameter makes that explicit, which is the whole point of
//! doing this in Rust rather than hoping a garbage collector keeps the
//! backing array alive.
//!
//! The reader tracks its byte offset so every failure names the exact
//! position in the captured buffer where things went wrong.

use super::writer::zigzag_decode;
use super::{DecodeError, DecodeErrorKind, WireType, MAX_VARINT_BYTES};

// ---------------------------------------------------------------------------
// BodyReader
// ---------------------------------------------------------------------------

/// Decoder over a borrowed message buffer.
///
/// # Examples
///
/// ```
/// use meridian_sdk::codec::{BodyReader, BodyWriter, WireType};
///
/// let mut w = BodyWriter::new();
/// w.write_varint(1, 42);
/// w.write_str(2, "hello");
/// let bytes = w.into_bytes();
///
/// let mut r = BodyReader::new(&bytes);
/// let (field, wt) = r.read_tag().unwrap();
/// assert_eq!((field, wt), (1, WireType::Varint));
/// assert_eq!(r.read_varint().unwrap(), 42);
/// let (field, _) = r.read_tag().unwrap();
/// assert_eq!(field, 2);
/// assert_eq!(r.read_str().unwrap(), "hello");
/// assert!(!r.has_more());
/// ```
#[derive(Debug, Clone)]
pub struct BodyReader<'a> {
    input: &'a [u8],
    pos: usize,
    /// Wire type of the most recently read tag, consulted by the typed
    /// read calls to reject mismatched reads before touching the payload.
    pending: Option<WireType>,
}

impl<'a> BodyReader<'a> {
    /// Creates a reader positioned at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            pending: None,
        }
    }

    /// `true` while bytes remain.
    pub fn has_more(&self) -> bool {
        self.pos < self.input.len()
    }

    /// Current byte offset, mainly for diagnostics.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reads the next field tag, returning the field number and wire type.
    pub fn read_tag(&mut self) -> Result<(u32, WireType), DecodeError> {
        let start = self.pos;
        let tag = self.read_raw_varint()?;
        let wire = (tag & 0x07) as u8;
        let field = (tag >> 3) as u32;
        if field == 0 {
            return Err(self.error_at(start, DecodeErrorKind::ZeroFieldNumber));
        }
        let wire_type = WireType::from_discriminant(wire)
            .ok_or_else(|| self.error_at(start, DecodeErrorKind::InvalidWireType(wire)))?;
        self.pending = Some(wire_type);
        Ok((field, wire_type))
    }

    /// Reads an unsigned varint payload.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        self.expect_wire_type(WireType::Varint)?;
        self.read_raw_varint()
    }

    /// Reads a zig-zag encoded signed varint payload.
    pub fn read_signed_varint(&mut self) -> Result<i64, DecodeError> {
        self.expect_wire_type(WireType::Varint)?;
        Ok(zigzag_decode(self.read_raw_varint()?))
    }

    /// Reads an 8-byte little-endian payload.
    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        self.expect_wire_type(WireType::Fixed64)?;
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(arr))
    }

    /// Reads a 4-byte little-endian payload.
    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        self.expect_wire_type(WireType::Fixed32)?;
        let bytes = self.take(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(arr))
    }

    /// Reads a length-delimited payload as a borrowed slice of the input.
    ///
    /// The returned slice lives as long as the buffer the reader was
    /// constructed over. Nested messages come back through here and are
    /// decoded by constructing a fresh `BodyReader` over the slice.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        self.expect_wire_type(WireType::LengthDelimited)?;
        let start = self.pos;
        let len = self.read_raw_varint()?;
        let remaining = self.input.len() - self.pos;
        if len > remaining as u64 {
            return Err(self.error_at(
                start,
                DecodeErrorKind::LengthOverrun {
                    declared: len,
                    remaining,
                },
            ));
        }
        let slice = &self.input[self.pos..self.pos + len as usize];
        self.pos += len as usize;
        Ok(slice)
    }

    /// Reads a length-delimited payload and validates it as UTF-8.
    pub fn read_str(&mut self) -> Result<&'a str, DecodeError> {
        let start = self.pos;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| self.error_at(start, DecodeErrorKind::InvalidUtf8))
    }

    /// Advances past an unrecognized field's payload.
    ///
    /// This is what keeps old readers working against new writers: a field
    /// number nobody recognizes is skipped, never fatal.
    pub fn skip_field(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        self.pending = Some(wire_type);
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.read_fixed64()?;
            }
            WireType::LengthDelimited => {
                self.read_bytes()?;
            }
            WireType::Fixed32 => {
                self.read_fixed32()?;
            }
        }
        Ok(())
    }

    fn expect_wire_type(&mut self, expected: WireType) -> Result<(), DecodeError> {
        match self.pending.take() {
            Some(found) if found != expected => Err(self.error_at(
                self.pos,
                DecodeErrorKind::WireTypeMismatch { expected, found },
            )),
            _ => Ok(()),
        }
    }

    fn read_raw_varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift = 0u32;
        loop {
            if self.pos - start >= MAX_VARINT_BYTES {
                return Err(self.error_at(start, DecodeErrorKind::VarintOverrun));
            }
            let byte = *self
                .input
                .get(self.pos)
                .ok_or_else(|| self.error_at(start, DecodeErrorKind::Truncated))?;
            self.pos += 1;
            if shift < 64 {
                result |= u64::from(byte & 0x7F) << shift;
            }
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.input.len() - self.pos < n {
            return Err(self.error_at(self.pos, DecodeErrorKind::Truncated));
        }
        let slice = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn error_at(&self, offset: usize, kind: DecodeErrorKind) -> DecodeError {
        DecodeError { offset, kind }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BodyWriter;

    #[test]
    fn roundtrip_all_wire_types() {
        let mut w = BodyWriter::new();
        w.write_varint(1, 42);
        w.write_signed_varint(2, -42);
        w.write_fixed64(3, 0xDEADBEEF00C0FFEE);
        w.write_fixed32(4, 0xCAFEBABE);
        w.write_bytes(5, &[0x01, 0x02, 0x03]);
        w.write_str(6, "memo text");
        let bytes = w.into_bytes();

        let mut r = BodyReader::new(&bytes);
        assert_eq!(r.read_tag().unwrap(), (1, WireType::Varint));
        assert_eq!(r.read_varint().unwrap(), 42);
        assert_eq!(r.read_tag().unwrap(), (2, WireType::Varint));
        assert_eq!(r.read_signed_varint().unwrap(), -42);
        assert_eq!(r.read_tag().unwrap(), (3, WireType::Fixed64));
        assert_eq!(r.read_fixed64().unwrap(), 0xDEADBEEF00C0FFEE);
        assert_eq!(r.read_tag().unwrap(), (4, WireType::Fixed32));
        assert_eq!(r.read_fixed32().unwrap(), 0xCAFEBABE);
        assert_eq!(r.read_tag().unwrap(), (5, WireType::LengthDelimited));
        assert_eq!(r.read_bytes().unwrap(), &[0x01, 0x02, 0x03]);
        assert_eq!(r.read_tag().unwrap(), (6, WireType::LengthDelimited));
        assert_eq!(r.read_str().unwrap(), "memo text");
        assert!(!r.has_more());
    }

    #[test]
    fn nested_message_roundtrip() {
        let mut inner = BodyWriter::new();
        inner.write_varint(1, 0);
        inner.write_varint(2, 0);
        inner.write_varint(3, 100);

        let mut outer = BodyWriter::new();
        outer.write_message(1, &inner);
        let bytes = outer.into_bytes();

        let mut r = BodyReader::new(&bytes);
        r.read_tag().unwrap();
        let inner_bytes = r.read_bytes().unwrap();

        let mut ir = BodyReader::new(inner_bytes);
        let mut nums = Vec::new();
        while ir.has_more() {
            ir.read_tag().unwrap();
            nums.push(ir.read_varint().unwrap());
        }
        assert_eq!(nums, vec![0, 0, 100]);
    }

    #[test]
    fn skip_unknown_fields_of_every_wire_type() {
        let mut w = BodyWriter::new();
        w.write_varint(99, 1234);
        w.write_fixed64(98, 5678);
        w.write_bytes(97, b"opaque");
        w.write_fixed32(96, 9);
        w.write_varint(1, 7); // the one field we actually understand
        let bytes = w.into_bytes();

        let mut r = BodyReader::new(&bytes);
        let mut known = None;
        while r.has_more() {
            let (field, wt) = r.read_tag().unwrap();
            if field == 1 {
                known = Some(r.read_varint().unwrap());
            } else {
                r.skip_field(wt).unwrap();
            }
        }
        assert_eq!(known, Some(7));
    }

    #[test]
    fn truncated_varint_is_fatal() {
        // Continuation bit set with nothing following.
        let bytes = [0x08, 0x80];
        let mut r = BodyReader::new(&bytes);
        r.read_tag().unwrap();
        let err = r.read_varint().unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Truncated);
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn varint_overrun_is_fatal() {
        // Eleven continuation bytes: no legal u64 is this long.
        let mut bytes = vec![0x08];
        bytes.extend_from_slice(&[0x80; 11]);
        let mut r = BodyReader::new(&bytes);
        r.read_tag().unwrap();
        let err = r.read_varint().unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::VarintOverrun);
    }

    #[test]
    fn length_overrun_is_fatal() {
        // Length-delimited field claims 100 bytes, buffer holds 2.
        let bytes = [0x0A, 100, 0x01, 0x02];
        let mut r = BodyReader::new(&bytes);
        r.read_tag().unwrap();
        let err = r.read_bytes().unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::LengthOverrun {
                declared: 100,
                remaining: 2
            }
        );
    }

    #[test]
    fn truncated_fixed64_is_fatal() {
        let bytes = [0x11, 0x01, 0x02, 0x03];
        let mut r = BodyReader::new(&bytes);
        r.read_tag().unwrap();
        assert_eq!(
            r.read_fixed64().unwrap_err().kind,
            DecodeErrorKind::Truncated
        );
    }

    #[test]
    fn zero_field_number_is_fatal() {
        // Tag 0x00 decodes to field 0, which no encoder emits.
        let bytes = [0x00];
        let mut r = BodyReader::new(&bytes);
        assert_eq!(
            r.read_tag().unwrap_err().kind,
            DecodeErrorKind::ZeroFieldNumber
        );
    }

    #[test]
    fn invalid_wire_type_is_fatal() {
        // Tag with wire type 3 (ancestral start-group).
        let bytes = [0x0B];
        let mut r = BodyReader::new(&bytes);
        assert_eq!(
            r.read_tag().unwrap_err().kind,
            DecodeErrorKind::InvalidWireType(3)
        );
    }

    #[test]
    fn wire_type_mismatch_is_fatal() {
        let mut w = BodyWriter::new();
        w.write_bytes(1, b"abc");
        let bytes = w.into_bytes();
        let mut r = BodyReader::new(&bytes);
        r.read_tag().unwrap();
        let err = r.read_varint().unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::WireTypeMismatch {
                expected: WireType::Varint,
                found: WireType::LengthDelimited,
            }
        );
    }

    #[test]
    fn invalid_utf8_in_string_field() {
        let mut w = BodyWriter::new();
        w.write_bytes(1, &[0xFF, 0xFE]);
        let bytes = w.into_bytes();
        let mut r = BodyReader::new(&bytes);
        r.read_tag().unwrap();
        assert_eq!(r.read_str().unwrap_err().kind, DecodeErrorKind::InvalidUtf8);
    }

    #[test]
    fn borrowed_slice_points_into_input() {
        let mut w = BodyWriter::new();
        w.write_bytes(1, b"payload");
        let bytes = w.into_bytes();
        let mut r = BodyReader::new(&bytes);
        r.read_tag().unwrap();
        let slice = r.read_bytes().unwrap();
        // Zero-copy: the slice's address range sits inside the input's.
        let input_range = bytes.as_ptr() as usize..bytes.as_ptr() as usize + bytes.len();
        assert!(input_range.contains(&(slice.as_ptr() as usize)));
    }

    #[test]
    fn empty_buffer_has_no_more() {
        let r = BodyReader::new(&[]);
        assert!(!r.has_more());
    }
}
