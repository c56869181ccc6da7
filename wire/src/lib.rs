//! Draw-state message layout and bounded decoding for the tableau client.
//!
//! This crate parses one draw-state message (transport decryption done, the
//! two-byte message tag stripped) into a [`DrawMessage`] value. It does not
//! know about frames, motion, or the scene model; applying a message to the
//! visible state is the `scene` crate's job.
//!
//! # Design Principles
//!
//! - **Staged decoding** - Header, descriptors, stats, pictures, mobiles and the
//!   trailing state block are decoded in order; every failure names its [`Stage`].
//! - **Bounded decoding** - All counts are validated against [`Limits`] before iteration.
//! - **Exact consumption** - Bytes left over after the last stage are an error.

mod error;
mod header;
mod inventory;
mod limits;
mod packet;

pub use error::{
    DecodeError, DecodeErrorKind, EncodeError, LimitKind, Stage, SubfieldError, WireResult,
};
pub use header::{
    peek_header, BubbleFlags, BubbleKind, FrameHeader, StatBlock, HEADER_SIZE, PICTURE_COORD_BITS,
    PICTURE_ID_BITS, PICT_AGAIN_ESCAPE, STATS_SIZE,
};
pub use inventory::{decode_inventory, encode_inventory, opcode, InventoryCommand, InventoryEntry};
pub use limits::Limits;
pub use packet::{
    decode_draw_message, decode_draw_message_with_layout, encode_draw_message, BubbleRecord,
    DescriptorRecord, DrawMessage, MessageLayout, MobileRecord, PictureRecord, StageSpan,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        // Verify all expected items are exported
        let _ = HEADER_SIZE;
        let _ = STATS_SIZE;
        let _ = PICT_AGAIN_ESCAPE;
        let _ = Limits::default();
        let _ = BubbleFlags::from_raw(0);
        let _ = opcode::FULL;

        // Error types
        let _: WireResult<()> = Ok(());
    }

    #[test]
    fn picture_record_packs_into_36_bits() {
        assert_eq!(
            usize::from(PICTURE_ID_BITS) + 2 * usize::from(PICTURE_COORD_BITS),
            36
        );
    }

    #[test]
    fn empty_message_encodes_to_minimum_size() {
        let bytes = encode_draw_message(&DrawMessage::default()).unwrap();
        // header, desc count, stats, pict count, mobile count, block len, block (text NUL, 2 counts)
        assert_eq!(bytes.len(), HEADER_SIZE + 1 + STATS_SIZE + 1 + 1 + 2 + 3);
        let decoded = decode_draw_message(&bytes, &Limits::default()).unwrap();
        assert_eq!(decoded, DrawMessage::default());
    }
}
