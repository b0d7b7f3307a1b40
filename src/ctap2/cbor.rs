//! Canonical-CBOR cursor primitives.
//!
//! This is not a general CBOR library: it reads exactly the subset the
//! request parser needs (unsigned/negative integers, byte strings, text
//! strings, array/map headers, booleans), and it rejects anything that
//! is not the shortest possible encoding of its value — indefinite-length
//! items, non-minimal length prefixes, reserved additional-info values.
//! `parser.rs` is built on top of this rather than a generic `serde`-based
//! CBOR crate so that canonical-form rejection and the byte-range cursor
//! into not-yet-decoded sub-arrays stay under this crate's direct control.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CborError {
    UnexpectedEof,
    NonCanonical,
    UnexpectedType,
    IntegerOverflow,
    InvalidUtf8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Major {
    UnsignedInt,
    NegativeInt,
    ByteString,
    TextString,
    Array,
    Map,
    Simple,
}

impl Major {
    fn from_bits(bits: u8) -> Option<Major> {
        Some(match bits {
            0 => Major::UnsignedInt,
            1 => Major::NegativeInt,
            2 => Major::ByteString,
            3 => Major::TextString,
            4 => Major::Array,
            5 => Major::Map,
            7 => Major::Simple,
            _ => return None,
        })
    }
}

struct ItemHeader {
    major: Major,
    /// The decoded additional-info value: a length, count, or simple-value
    /// code depending on `major`.
    value: u64,
    /// Total bytes consumed by the header itself (not the payload).
    header_len: usize,
}

/// A read-only position into a byte slice, advanced by each `read_*` call.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Cursor<'a> {
        Cursor { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Cursor<'a> {
        Cursor { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek_byte(&self) -> Result<u8, CborError> {
        self.data.get(self.pos).copied().ok_or(CborError::UnexpectedEof)
    }

    fn read_header(&mut self) -> Result<ItemHeader, CborError> {
        let first = self.peek_byte()?;
        let major = Major::from_bits(first >> 5).ok_or(CborError::NonCanonical)?;
        let info = first & 0x1F;

        let (value, extra): (u64, usize) = match info {
            0..=23 => (info as u64, 0),
            24 => {
                let b = *self
                    .data
                    .get(self.pos + 1)
                    .ok_or(CborError::UnexpectedEof)?;
                if b < 24 {
                    return Err(CborError::NonCanonical);
                }
                (b as u64, 1)
            }
            25 => {
                let bytes = self
                    .data
                    .get(self.pos + 1..self.pos + 3)
                    .ok_or(CborError::UnexpectedEof)?;
                let v = u16::from_be_bytes([bytes[0], bytes[1]]) as u64;
                if v < 256 {
                    return Err(CborError::NonCanonical);
                }
                (v, 2)
            }
            26 => {
                let bytes = self
                    .data
                    .get(self.pos + 1..self.pos + 5)
                    .ok_or(CborError::UnexpectedEof)?;
                let v = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64;
                if v < 1 << 16 {
                    return Err(CborError::NonCanonical);
                }
                (v, 4)
            }
            27 => {
                let bytes = self
                    .data
                    .get(self.pos + 1..self.pos + 9)
                    .ok_or(CborError::UnexpectedEof)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                let v = u64::from_be_bytes(raw);
                if v < 1u64 << 32 {
                    return Err(CborError::NonCanonical);
                }
                (v, 8)
            }
            _ => return Err(CborError::NonCanonical),
        };

        Ok(ItemHeader {
            major,
            value,
            header_len: 1 + extra,
        })
    }

    /// Decode one signed integer (major type 0 or 1).
    pub fn read_integer(&mut self) -> Result<i64, CborError> {
        let header = self.read_header()?;
        self.pos += header.header_len;
        match header.major {
            Major::UnsignedInt => i64::try_from(header.value).map_err(|_| CborError::IntegerOverflow),
            Major::NegativeInt => {
                let v = i64::try_from(header.value).map_err(|_| CborError::IntegerOverflow)?;
                Ok(-1 - v)
            }
            _ => Err(CborError::UnexpectedType),
        }
    }

    /// Decode an unsigned integer (major type 0 only).
    pub fn read_uint(&mut self) -> Result<u64, CborError> {
        let header = self.read_header()?;
        if header.major != Major::UnsignedInt {
            return Err(CborError::UnexpectedType);
        }
        self.pos += header.header_len;
        Ok(header.value)
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8], CborError> {
        let header = self.read_header()?;
        if header.major != Major::ByteString {
            return Err(CborError::UnexpectedType);
        }
        let len = header.value as usize;
        let start = self.pos + header.header_len;
        let end = start.checked_add(len).ok_or(CborError::UnexpectedEof)?;
        let out = self.data.get(start..end).ok_or(CborError::UnexpectedEof)?;
        self.pos = end;
        Ok(out)
    }

    pub fn read_text(&mut self) -> Result<&'a str, CborError> {
        let header = self.read_header()?;
        if header.major != Major::TextString {
            return Err(CborError::UnexpectedType);
        }
        let len = header.value as usize;
        let start = self.pos + header.header_len;
        let end = start.checked_add(len).ok_or(CborError::UnexpectedEof)?;
        let bytes = self.data.get(start..end).ok_or(CborError::UnexpectedEof)?;
        let out = core::str::from_utf8(bytes).map_err(|_| CborError::InvalidUtf8)?;
        self.pos = end;
        Ok(out)
    }

    pub fn read_bool(&mut self) -> Result<bool, CborError> {
        let header = self.read_header()?;
        if header.major != Major::Simple {
            return Err(CborError::UnexpectedType);
        }
        self.pos += header.header_len;
        match header.value {
            20 => Ok(false),
            21 => Ok(true),
            _ => Err(CborError::UnexpectedType),
        }
    }

    /// Consume an array header, returning its declared element count.
    pub fn enter_array(&mut self) -> Result<u64, CborError> {
        let header = self.read_header()?;
        if header.major != Major::Array {
            return Err(CborError::UnexpectedType);
        }
        self.pos += header.header_len;
        Ok(header.value)
    }

    /// Consume a map header, returning its declared key-value pair count.
    pub fn enter_map(&mut self) -> Result<u64, CborError> {
        let header = self.read_header()?;
        if header.major != Major::Map {
            return Err(CborError::UnexpectedType);
        }
        self.pos += header.header_len;
        Ok(header.value)
    }

    pub fn peek_major(&self) -> Result<Major, CborError> {
        Ok(self.read_header()?.major)
    }

    /// Skip exactly one well-formed CBOR value, recursing into
    /// arrays/maps. Used to discard unrecognized map keys' values without
    /// assuming anything about their shape — a malformed skipped value is
    /// still a parse error.
    pub fn skip_value(&mut self) -> Result<(), CborError> {
        let header = self.read_header()?;
        self.pos += header.header_len;
        match header.major {
            Major::UnsignedInt | Major::NegativeInt => Ok(()),
            Major::Simple => Ok(()),
            Major::ByteString | Major::TextString => {
                let len = header.value as usize;
                let end = self.pos.checked_add(len).ok_or(CborError::UnexpectedEof)?;
                if end > self.data.len() {
                    return Err(CborError::UnexpectedEof);
                }
                self.pos = end;
                Ok(())
            }
            Major::Array => {
                for _ in 0..header.value {
                    self.skip_value()?;
                }
                Ok(())
            }
            Major::Map => {
                for _ in 0..header.value {
                    self.skip_value()?;
                    self.skip_value()?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_small_uint() {
        let mut c = Cursor::new(&[0x05]);
        assert_eq!(c.read_uint().unwrap(), 5);
    }

    #[test]
    fn rejects_non_canonical_uint() {
        // 24 followed by 10 should have been encoded directly as 0x0A.
        let mut c = Cursor::new(&[0x18, 0x0A]);
        assert_eq!(c.read_uint(), Err(CborError::NonCanonical));
    }

    #[test]
    fn reads_negative_integer() {
        let mut c = Cursor::new(&[0x26]); // -7, i.e. ES256
        assert_eq!(c.read_integer().unwrap(), -7);
    }

    #[test]
    fn reads_text_and_bytes() {
        let mut c = Cursor::new(&[0x63, b'f', b'o', b'o']);
        assert_eq!(c.read_text().unwrap(), "foo");
        let mut c = Cursor::new(&[0x42, 0xAB, 0xCD]);
        assert_eq!(c.read_bytes().unwrap(), &[0xAB, 0xCD]);
    }

    #[test]
    fn skip_value_recurses_into_maps() {
        // {"a": [1, 2]}
        let bytes = [0xA1, 0x61, b'a', 0x82, 0x01, 0x02];
        let mut c = Cursor::new(&bytes);
        let n = c.enter_map().unwrap();
        assert_eq!(n, 1);
        c.skip_value().unwrap();
        c.skip_value().unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn skip_value_detects_malformed_nested_value() {
        // map claims one entry whose value byte string length runs past the buffer.
        let bytes = [0xA1, 0x61, b'a', 0x44, 0x01, 0x02];
        let mut c = Cursor::new(&bytes);
        c.enter_map().unwrap();
        c.skip_value().unwrap();
        assert_eq!(c.skip_value(), Err(CborError::UnexpectedEof));
    }
}
