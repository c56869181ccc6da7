//! Bit-level reading and writing primitives for the tableau draw-state protocol.
//!
//! This crate provides [`BitReader`] and [`BitWriter`] for MSB-first, byte-unaligned
//! fields mixed with byte-aligned big-endian integers and NUL-terminated strings.
//! It is designed for bounded, panic-free operation with explicit error handling.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked; an overrun is a
//!   recoverable "truncated packet" condition, not a programming error.
//! - **No domain knowledge** - This crate knows nothing about pictures, mobiles, or frames.
//!
//! # Example
//!
//! ```
//! use bitstream::{sign_extend, BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(1234, 14).unwrap();
//! writer.write_signed_bits(-5, 11).unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bits(14).unwrap(), 1234);
//! assert_eq!(sign_extend(reader.read_bits(11).unwrap(), 11), -5);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::{sign_extend, BitReader, MAX_FIELD_BITS};
pub use writer::BitWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roundtrip() {
        let writer = BitWriter::new();
        let bytes = writer.finish();
        assert!(bytes.is_empty());

        let reader = BitReader::new(&bytes);
        assert!(reader.is_empty());
    }

    #[test]
    fn unaligned_records_then_aligned_tail() {
        // Three 36-bit picture-shaped records back to back, then a byte field.
        let records = [(1u32, 0i32, 0i32), (16_383, -1024, 1023), (77, -3, 12)];
        let mut writer = BitWriter::new();
        for (id, h, v) in records {
            writer.write_bits(id, 14).unwrap();
            writer.write_signed_bits(h, 11).unwrap();
            writer.write_signed_bits(v, 11).unwrap();
        }
        writer.align_to_byte();
        writer.write_u8(0xAA).unwrap();
        let bytes = writer.finish();
        assert_eq!(bytes.len(), 15);

        let mut reader = BitReader::new(&bytes);
        for (id, h, v) in records {
            assert_eq!(reader.read_bits(14).unwrap(), id);
            assert_eq!(reader.read_signed_bits(11).unwrap(), h);
            assert_eq!(reader.read_signed_bits(11).unwrap(), v);
        }
        reader.align_to_byte().unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0xAA);
        assert!(reader.is_empty());
    }

    #[test]
    fn doctest_example() {
        let mut writer = BitWriter::new();
        writer.write_bits(1234, 14).unwrap();
        writer.write_signed_bits(-5, 11).unwrap();

        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(14).unwrap(), 1234);
        assert_eq!(sign_extend(reader.read_bits(11).unwrap(), 11), -5);
    }
}
