//! Bit-level writer for encoding packed binary data.

use crate::error::{BitError, BitResult};
use crate::reader::MAX_FIELD_BITS;

/// A bit-level writer for encoding packed binary data.
///
/// Writes are accumulated in an internal buffer, MSB-first. Call
/// [`finish`](Self::finish) to get the final byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, value: bool) {
        self.current_byte = (self.current_byte << 1) | u8::from(value);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes up to 32 bits from an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 32`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u32, bits: u8) -> BitResult<()> {
        if bits > MAX_FIELD_BITS {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: MAX_FIELD_BITS,
            });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 32 && value >= (1u32 << bits) {
            return Err(BitError::ValueOutOfRange {
                value: u64::from(value),
                bits,
            });
        }

        for i in (0..bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Writes a signed value as an n-bit two's-complement field.
    pub fn write_signed_bits(&mut self, value: i32, bits: u8) -> BitResult<()> {
        if bits == 0 || bits > MAX_FIELD_BITS {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: MAX_FIELD_BITS,
            });
        }
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if i64::from(value) < min || i64::from(value) > max {
            return Err(BitError::ValueOutOfRange {
                value: i64::from(value) as u64,
                bits,
            });
        }
        let mask = if bits == 32 {
            u32::MAX
        } else {
            (1u32 << bits) - 1
        };
        self.write_bits(value as u32 & mask, bits)
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        while self.bit_count != 0 {
            self.write_bit(false);
        }
    }

    /// Writes a byte-aligned `u8`.
    pub fn write_u8(&mut self, value: u8) -> BitResult<()> {
        self.write_aligned(&[value])
    }

    /// Writes a byte-aligned `u16` (big-endian).
    pub fn write_u16_be(&mut self, value: u16) -> BitResult<()> {
        self.write_aligned(&value.to_be_bytes())
    }

    /// Writes a byte-aligned `i16` (big-endian).
    pub fn write_i16_be(&mut self, value: i16) -> BitResult<()> {
        self.write_aligned(&value.to_be_bytes())
    }

    /// Writes a byte-aligned `u32` (big-endian).
    pub fn write_u32_be(&mut self, value: u32) -> BitResult<()> {
        self.write_aligned(&value.to_be_bytes())
    }

    /// Writes raw byte-aligned bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> BitResult<()> {
        self.write_aligned(bytes)
    }

    /// Writes a string followed by a NUL terminator.
    ///
    /// Interior NUL bytes would truncate the string on decode, so the text is
    /// cut at the first one.
    pub fn write_cstr(&mut self, text: &str) -> BitResult<()> {
        let bytes = text.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.write_aligned(&bytes[..end])?;
        self.write_aligned(&[0])
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.bytes.push(self.current_byte);
        }
        self.bytes
    }

    fn write_aligned(&mut self, bytes: &[u8]) -> BitResult<()> {
        if self.bit_count != 0 {
            return Err(BitError::MisalignedAccess {
                bit_position: self.bits_written(),
            });
        }
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let writer = BitWriter::new();
        assert_eq!(writer.bits_written(), 0);
        let bytes = writer.finish();
        assert!(bytes.is_empty());
    }

    #[test]
    fn write_single_bit_true() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        assert_eq!(writer.bits_written(), 1);
        let bytes = writer.finish();
        // Single bit 1, padded with 7 zeros = 0b1000_0000
        assert_eq!(bytes, vec![0b1000_0000]);
    }

    #[test]
    fn write_bits_value_too_large() {
        let mut writer = BitWriter::new();
        let err = writer.write_bits(16, 4).unwrap_err();
        assert_eq!(err, BitError::ValueOutOfRange { value: 16, bits: 4 });
    }

    #[test]
    fn write_signed_bits_range() {
        let mut writer = BitWriter::new();
        writer.write_signed_bits(-1024, 11).unwrap();
        writer.write_signed_bits(1023, 11).unwrap();
        assert!(writer.write_signed_bits(1024, 11).is_err());
        assert_eq!(writer.bits_written(), 22);
    }

    #[test]
    fn aligned_write_mid_byte_fails() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        assert!(matches!(
            writer.write_u8(1),
            Err(BitError::MisalignedAccess { bit_position: 1 })
        ));
        writer.align_to_byte();
        writer.write_u16_be(0xBEEF).unwrap();
        assert_eq!(writer.finish(), vec![0x80, 0xBE, 0xEF]);
    }

    #[test]
    fn write_cstr_appends_terminator() {
        let mut writer = BitWriter::new();
        writer.write_cstr("Bob").unwrap();
        writer.write_cstr("a\0b").unwrap();
        assert_eq!(writer.finish(), b"Bob\0a\0".to_vec());
    }
}
