//! Draw-state message decoding and encoding.

use bitstream::{BitReader, BitWriter};

use crate::error::{
    DecodeError, DecodeErrorKind, EncodeError, LimitKind, Stage, StageExt, WireResult,
};
use crate::header::{
    BubbleFlags, FrameHeader, StatBlock, PICTURE_COORD_BITS, PICTURE_ID_BITS, PICT_AGAIN_ESCAPE,
};
use crate::inventory::{decode_inventory, encode_inventory, InventoryCommand};
use crate::limits::Limits;

/// Descriptor record as transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptorRecord {
    pub index: u8,
    pub kind: u8,
    pub sprite: u16,
    pub name: String,
    pub colors: Vec<u8>,
}

/// Bit-packed picture record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PictureRecord {
    pub sprite: u16,
    pub h: i16,
    pub v: i16,
}

/// Byte-aligned mobile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MobileRecord {
    pub index: u8,
    pub state: u8,
    pub h: i16,
    pub v: i16,
    pub colors: u8,
}

/// Bubble record from the state block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BubbleRecord {
    pub index: u8,
    pub flags: BubbleFlags,
    pub language: Option<u8>,
    pub position: Option<(i16, i16)>,
    pub text: String,
}

/// A fully parsed draw-state message.
///
/// `pictures` holds only the transmitted entries; the first `pict_again`
/// entries of the frame's picture list come from the previous frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawMessage {
    pub header: FrameHeader,
    pub descriptors: Vec<DescriptorRecord>,
    pub stats: StatBlock,
    pub pict_again: u8,
    pub pictures: Vec<PictureRecord>,
    pub mobiles: Vec<MobileRecord>,
    pub info_text: String,
    pub bubbles: Vec<BubbleRecord>,
    pub sounds: Vec<u16>,
    pub inventory: Vec<InventoryCommand>,
}

/// Bit range a stage occupied in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpan {
    pub stage: Stage,
    pub start_bit: usize,
    pub end_bit: usize,
}

impl StageSpan {
    /// Returns the span length rounded up to whole bytes.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        (self.end_bit - self.start_bit).div_ceil(8)
    }
}

/// Stage-by-stage layout of a decoded message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageLayout {
    pub spans: Vec<StageSpan>,
}

impl MessageLayout {
    fn record(&mut self, stage: Stage, start_bit: usize, end_bit: usize) {
        self.spans.push(StageSpan {
            stage,
            start_bit,
            end_bit,
        });
    }
}

/// Decodes a draw-state message (message tag already stripped).
pub fn decode_draw_message(buf: &[u8], limits: &Limits) -> WireResult<DrawMessage> {
    decode_draw_message_with_layout(buf, limits).map(|(message, _)| message)
}

/// Decodes a draw-state message and reports where each stage sat.
///
/// Stages run in wire order and each is bounds-checked before reading, so
/// the first failing stage is the one reported. A message must be consumed
/// exactly; leftover bytes after the state block are an error.
pub fn decode_draw_message_with_layout(
    buf: &[u8],
    limits: &Limits,
) -> WireResult<(DrawMessage, MessageLayout)> {
    if buf.len() > limits.max_message_bytes {
        return Err(DecodeError::corrupt_count(
            Stage::Header,
            LimitKind::MessageBytes,
            limits.max_message_bytes,
            buf.len(),
        ));
    }

    let mut reader = BitReader::new(buf);
    let mut layout = MessageLayout::default();
    let mut mark = 0usize;
    let mut step = |stage: Stage, reader: &BitReader<'_>, layout: &mut MessageLayout| {
        layout.record(stage, mark, reader.bit_position());
        mark = reader.bit_position();
    };

    let header = FrameHeader::read(&mut reader)?;
    step(Stage::Header, &reader, &mut layout);

    let descriptors = read_descriptors(&mut reader, limits)?;
    step(Stage::Descriptors, &reader, &mut layout);

    let stats = StatBlock::read(&mut reader)?;
    step(Stage::Stats, &reader, &mut layout);

    let (pict_again, pict_count) = read_picture_count(&mut reader, limits)?;
    step(Stage::PictureCount, &reader, &mut layout);

    let pictures = read_pictures(&mut reader, pict_count)?;
    step(Stage::Pictures, &reader, &mut layout);

    let mobiles = read_mobiles(&mut reader, limits)?;
    step(Stage::Mobiles, &reader, &mut layout);

    let block_len = usize::from(reader.read_u16_be().at(Stage::StateBlock)?);
    let block = reader.read_bytes(block_len).at(Stage::StateBlock)?;
    if !reader.is_empty() {
        return Err(DecodeError::new(
            Stage::StateBlock,
            DecodeErrorKind::TrailingBytes {
                remaining: reader.bytes_remaining(),
            },
        ));
    }
    step(Stage::StateBlock, &reader, &mut layout);

    // Offsets inside the block are reported relative to the whole message.
    let base = mark - block_len * 8;
    let mut block_reader = BitReader::new(block);
    let mut inner = base;
    let mut inner_step = |stage: Stage, reader: &BitReader<'_>, layout: &mut MessageLayout| {
        layout.record(stage, inner, base + reader.bit_position());
        inner = base + reader.bit_position();
    };

    let info_text = block_reader.read_cstr().at(Stage::InfoText)?;
    inner_step(Stage::InfoText, &block_reader, &mut layout);

    let bubbles = read_bubbles(&mut block_reader, limits)?;
    inner_step(Stage::Bubbles, &block_reader, &mut layout);

    let sounds = read_sounds(&mut block_reader, limits)?;
    inner_step(Stage::Sounds, &block_reader, &mut layout);

    let inventory = decode_inventory(&mut block_reader, limits)?;
    inner_step(Stage::Inventory, &block_reader, &mut layout);

    Ok((
        DrawMessage {
            header,
            descriptors,
            stats,
            pict_again,
            pictures,
            mobiles,
            info_text,
            bubbles,
            sounds,
            inventory,
        },
        layout,
    ))
}

fn read_count(
    reader: &mut BitReader<'_>,
    stage: Stage,
    kind: LimitKind,
    limit: usize,
) -> WireResult<usize> {
    let count = usize::from(reader.read_u8().at(stage)?);
    if count > limit {
        return Err(DecodeError::corrupt_count(stage, kind, limit, count));
    }
    Ok(count)
}

fn read_descriptors(
    reader: &mut BitReader<'_>,
    limits: &Limits,
) -> WireResult<Vec<DescriptorRecord>> {
    let stage = Stage::Descriptors;
    let count = read_count(reader, stage, LimitKind::Descriptors, limits.max_descriptors)?;
    let mut descriptors = Vec::with_capacity(count);
    for _ in 0..count {
        let index = reader.read_u8().at(stage)?;
        let kind = reader.read_u8().at(stage)?;
        let sprite = reader.read_u16_be().at(stage)?;
        let name = reader.read_cstr().at(stage)?;
        let color_count = read_count(reader, stage, LimitKind::Colors, limits.max_colors)?;
        let colors = reader.read_bytes(color_count).at(stage)?.to_vec();
        descriptors.push(DescriptorRecord {
            index,
            kind,
            sprite,
            name,
            colors,
        });
    }
    Ok(descriptors)
}

fn read_picture_count(reader: &mut BitReader<'_>, limits: &Limits) -> WireResult<(u8, usize)> {
    let stage = Stage::PictureCount;
    let first = reader.read_u8().at(stage)?;
    let (again, count) = if first == PICT_AGAIN_ESCAPE {
        let again = reader.read_u8().at(stage)?;
        let count = reader.read_u8().at(stage)?;
        (again, count)
    } else {
        (0, first)
    };
    let total = usize::from(again) + usize::from(count);
    if total > limits.max_pictures {
        return Err(DecodeError::corrupt_count(
            stage,
            LimitKind::Pictures,
            limits.max_pictures,
            total,
        ));
    }
    Ok((again, usize::from(count)))
}

fn read_pictures(reader: &mut BitReader<'_>, count: usize) -> WireResult<Vec<PictureRecord>> {
    let stage = Stage::Pictures;
    let mut pictures = Vec::with_capacity(count);
    for _ in 0..count {
        let sprite = reader.read_bits(PICTURE_ID_BITS).at(stage)? as u16;
        let h = reader.read_signed_bits(PICTURE_COORD_BITS).at(stage)? as i16;
        let v = reader.read_signed_bits(PICTURE_COORD_BITS).at(stage)? as i16;
        pictures.push(PictureRecord { sprite, h, v });
    }
    reader.align_to_byte().at(stage)?;
    Ok(pictures)
}

fn read_mobiles(reader: &mut BitReader<'_>, limits: &Limits) -> WireResult<Vec<MobileRecord>> {
    let stage = Stage::Mobiles;
    let count = read_count(reader, stage, LimitKind::Mobiles, limits.max_mobiles)?;
    let mut mobiles = Vec::with_capacity(count);
    for _ in 0..count {
        let index = reader.read_u8().at(stage)?;
        let state = reader.read_u8().at(stage)?;
        let h = reader.read_i16_be().at(stage)?;
        let v = reader.read_i16_be().at(stage)?;
        let colors = reader.read_u8().at(stage)?;
        mobiles.push(MobileRecord {
            index,
            state,
            h,
            v,
            colors,
        });
    }
    Ok(mobiles)
}

fn read_bubbles(reader: &mut BitReader<'_>, limits: &Limits) -> WireResult<Vec<BubbleRecord>> {
    let stage = Stage::Bubbles;
    let count = read_count(reader, stage, LimitKind::Bubbles, limits.max_bubbles)?;
    let mut bubbles = Vec::with_capacity(count);
    for _ in 0..count {
        let index = reader.read_u8().at(stage)?;
        let flags = BubbleFlags::from_raw(reader.read_u8().at(stage)?);
        let language = if flags.is_not_common() {
            Some(reader.read_u8().at(stage)?)
        } else {
            None
        };
        let position = if flags.is_far() {
            let h = reader.read_i16_be().at(stage)?;
            let v = reader.read_i16_be().at(stage)?;
            Some((h, v))
        } else {
            None
        };
        let text = reader.read_cstr().at(stage)?;
        bubbles.push(BubbleRecord {
            index,
            flags,
            language,
            position,
            text,
        });
    }
    Ok(bubbles)
}

fn read_sounds(reader: &mut BitReader<'_>, limits: &Limits) -> WireResult<Vec<u16>> {
    let stage = Stage::Sounds;
    let count = read_count(reader, stage, LimitKind::Sounds, limits.max_sounds)?;
    let mut sounds = Vec::with_capacity(count);
    for _ in 0..count {
        sounds.push(reader.read_u16_be().at(stage)?);
    }
    Ok(sounds)
}

/// Encodes a draw-state message in wire layout.
///
/// Used for recorded fixtures and tests; the client itself never sends this
/// message.
pub fn encode_draw_message(message: &DrawMessage) -> Result<Vec<u8>, EncodeError> {
    let mut writer = BitWriter::with_capacity(256);
    writer.write_u8(message.header.ack_cmd)?;
    writer.write_u32_be(message.header.ack)?;
    writer.write_u32_be(message.header.resend)?;

    writer.write_u8(count_u8(message.descriptors.len(), LimitKind::Descriptors)?)?;
    for desc in &message.descriptors {
        writer.write_u8(desc.index)?;
        writer.write_u8(desc.kind)?;
        writer.write_u16_be(desc.sprite)?;
        writer.write_cstr(&desc.name)?;
        writer.write_u8(count_u8(desc.colors.len(), LimitKind::Colors)?)?;
        writer.write_bytes(&desc.colors)?;
    }

    writer.write_bytes(&message.stats.to_bytes())?;

    let pict_count = count_u8(message.pictures.len(), LimitKind::Pictures)?;
    // A bare count of 255 would read as the escape, so it takes the extended form too.
    if message.pict_again > 0 || pict_count == PICT_AGAIN_ESCAPE {
        writer.write_u8(PICT_AGAIN_ESCAPE)?;
        writer.write_u8(message.pict_again)?;
    }
    writer.write_u8(pict_count)?;
    for pict in &message.pictures {
        writer.write_bits(u32::from(pict.sprite), PICTURE_ID_BITS)?;
        writer.write_signed_bits(i32::from(pict.h), PICTURE_COORD_BITS)?;
        writer.write_signed_bits(i32::from(pict.v), PICTURE_COORD_BITS)?;
    }
    writer.align_to_byte();

    writer.write_u8(count_u8(message.mobiles.len(), LimitKind::Mobiles)?)?;
    for mobile in &message.mobiles {
        writer.write_u8(mobile.index)?;
        writer.write_u8(mobile.state)?;
        writer.write_i16_be(mobile.h)?;
        writer.write_i16_be(mobile.v)?;
        writer.write_u8(mobile.colors)?;
    }

    let block = encode_state_block(message)?;
    let block_len =
        u16::try_from(block.len()).map_err(|_| EncodeError::StateBlockTooLarge { len: block.len() })?;
    writer.write_u16_be(block_len)?;
    writer.write_bytes(&block)?;
    Ok(writer.finish())
}

fn encode_state_block(message: &DrawMessage) -> Result<Vec<u8>, EncodeError> {
    let mut writer = BitWriter::new();
    writer.write_cstr(&message.info_text)?;
    writer.write_u8(count_u8(message.bubbles.len(), LimitKind::Bubbles)?)?;
    for bubble in &message.bubbles {
        let mut raw = bubble.flags.raw() & !(BubbleFlags::NOT_COMMON | BubbleFlags::FAR);
        if bubble.language.is_some() {
            raw |= BubbleFlags::NOT_COMMON;
        }
        if bubble.position.is_some() {
            raw |= BubbleFlags::FAR;
        }
        writer.write_u8(bubble.index)?;
        writer.write_u8(raw)?;
        if let Some(language) = bubble.language {
            writer.write_u8(language)?;
        }
        if let Some((h, v)) = bubble.position {
            writer.write_i16_be(h)?;
            writer.write_i16_be(v)?;
        }
        writer.write_cstr(&bubble.text)?;
    }
    writer.write_u8(count_u8(message.sounds.len(), LimitKind::Sounds)?)?;
    for sound in &message.sounds {
        writer.write_u16_be(*sound)?;
    }
    encode_inventory(&message.inventory, &mut writer)?;
    Ok(writer.finish())
}

fn count_u8(count: usize, kind: LimitKind) -> Result<u8, EncodeError> {
    u8::try_from(count).map_err(|_| EncodeError::CountOverflow { kind, count })
}
