//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// Widest field `read_bits` will return.
pub const MAX_FIELD_BITS: u8 = 32;

/// A bit-level reader for decoding packed binary data.
///
/// Bits are consumed MSB-first. All read operations are bounds-checked and
/// return errors on failure; a failed read leaves the cursor where it was.
/// The reader never panics on malformed input.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns the number of whole bytes remaining after the cursor.
    #[must_use]
    pub const fn bytes_remaining(&self) -> usize {
        self.bits_remaining() / 8
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Returns `true` if the cursor sits on a byte boundary.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        self.ensure_bits(1)?;
        let byte_idx = self.bit_pos / 8;
        let bit_idx = self.bit_pos % 8;
        let bit = (self.data[byte_idx] >> (7 - bit_idx)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 32 bits MSB-first as an unsigned integer.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u32> {
        if bits > MAX_FIELD_BITS {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: MAX_FIELD_BITS,
            });
        }
        if bits == 0 {
            return Ok(0);
        }
        self.ensure_bits(usize::from(bits))?;

        let mut value = 0u32;
        for _ in 0..bits {
            value = (value << 1) | u32::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Reads an n-bit two's-complement field as a signed integer.
    pub fn read_signed_bits(&mut self, bits: u8) -> BitResult<i32> {
        let raw = self.read_bits(bits)?;
        Ok(sign_extend(raw, bits))
    }

    /// Aligns to the next byte boundary.
    pub fn align_to_byte(&mut self) -> BitResult<()> {
        let rem = self.bit_pos % 8;
        if rem == 0 {
            return Ok(());
        }
        let skip = 8 - rem;
        self.ensure_bits(skip)?;
        self.bit_pos += skip;
        Ok(())
    }

    /// Reads a byte-aligned `u8`.
    pub fn read_u8(&mut self) -> BitResult<u8> {
        let [value] = self.read_aligned_bytes::<1>()?;
        Ok(value)
    }

    /// Reads a byte-aligned `u16` (big-endian).
    pub fn read_u16_be(&mut self) -> BitResult<u16> {
        let bytes = self.read_aligned_bytes::<2>()?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Reads a byte-aligned `i16` (big-endian).
    pub fn read_i16_be(&mut self) -> BitResult<i16> {
        let bytes = self.read_aligned_bytes::<2>()?;
        Ok(i16::from_be_bytes(bytes))
    }

    /// Reads a byte-aligned `u32` (big-endian).
    pub fn read_u32_be(&mut self) -> BitResult<u32> {
        let bytes = self.read_aligned_bytes::<4>()?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Reads `len` byte-aligned bytes as a borrowed slice.
    pub fn read_bytes(&mut self, len: usize) -> BitResult<&'a [u8]> {
        self.ensure_aligned()?;
        self.ensure_bits(len.saturating_mul(8))?;
        let idx = self.bit_pos / 8;
        let out = &self.data[idx..idx + len];
        self.bit_pos += len * 8;
        Ok(out)
    }

    /// Reads a NUL-terminated string and consumes the terminator.
    ///
    /// Bytes that are not valid UTF-8 are replaced, matching how the text is
    /// displayed rather than rejecting the packet.
    pub fn read_cstr(&mut self) -> BitResult<String> {
        self.ensure_aligned()?;
        let start = self.bit_pos / 8;
        let rest = &self.data[start.min(self.data.len())..];
        let Some(len) = rest.iter().position(|&b| b == 0) else {
            return Err(BitError::MissingTerminator {
                scanned: rest.len(),
            });
        };
        let text = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.bit_pos += (len + 1) * 8;
        Ok(text)
    }

    /// Returns the unread bytes without consuming them.
    pub fn peek_remaining(&self) -> BitResult<&'a [u8]> {
        self.ensure_aligned()?;
        let start = (self.bit_pos / 8).min(self.data.len());
        Ok(&self.data[start..])
    }

    fn ensure_aligned(&self) -> BitResult<()> {
        if self.bit_pos % 8 != 0 {
            return Err(BitError::MisalignedAccess {
                bit_position: self.bit_pos,
            });
        }
        Ok(())
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    fn read_aligned_bytes<const N: usize>(&mut self) -> BitResult<[u8; N]> {
        self.ensure_aligned()?;
        self.ensure_bits(N * 8)?;
        let idx = self.bit_pos / 8;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[idx..idx + N]);
        self.bit_pos += N * 8;
        Ok(out)
    }
}

/// Converts an n-bit two's-complement field into a signed value.
///
/// Bits above `bits` in `value` are ignored. `bits` of 0 yields 0 and values
/// of 32 or more are taken as already full width.
#[must_use]
pub const fn sign_extend(value: u32, bits: u8) -> i32 {
    if bits == 0 {
        return 0;
    }
    if bits >= 32 {
        return value as i32;
    }
    let shift = 32 - bits as u32;
    ((value << shift) as i32) >> shift
}
