//! Inventory command stream carried at the end of the state block.

use bitstream::{BitReader, BitWriter};

use crate::error::{
    DecodeError, DecodeErrorKind, EncodeError, LimitKind, Stage, StageExt, SubfieldError,
    WireResult,
};
use crate::limits::Limits;

/// Inventory opcodes. The low seven bits select the command.
pub mod opcode {
    pub const END: u8 = 0x00;
    pub const FULL: u8 = 0x01;
    pub const ADD: u8 = 0x02;
    pub const ADD_EQUIP: u8 = 0x03;
    pub const DELETE: u8 = 0x04;
    pub const EQUIP: u8 = 0x05;
    pub const UNEQUIP: u8 = 0x06;
    pub const MULTIPLE: u8 = 0x07;
    pub const RENAME: u8 = 0x08;
    /// Emitted by old servers as trailing filler; never carries a body.
    pub const LEGACY_PAD: u8 = 0x0C;
    /// Set on single-item opcodes when a 1-based slot byte follows the id.
    pub const SLOT_FLAG: u8 = 0x80;
}

/// One entry of a full inventory replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryEntry {
    pub id: u16,
    pub equipped: bool,
}

/// A decoded inventory command.
///
/// `slot` is the 1-based slot index when the server disambiguates between
/// several items sharing an id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InventoryCommand {
    Full {
        entries: Vec<InventoryEntry>,
    },
    Add {
        id: u16,
        slot: Option<u8>,
        name: String,
        equip: bool,
    },
    Delete {
        id: u16,
        slot: Option<u8>,
    },
    Equip {
        id: u16,
        slot: Option<u8>,
    },
    Unequip {
        id: u16,
        slot: Option<u8>,
    },
    Rename {
        id: u16,
        slot: Option<u8>,
        name: String,
    },
}

/// Decodes the inventory stream that fills the rest of the state block.
///
/// Parsing stops at the end of the stream or at an `END` opcode; anything
/// after `END` is reported as trailing bytes. An unrecognized opcode in the
/// final byte is tolerated as padding.
pub fn decode_inventory(
    reader: &mut BitReader<'_>,
    limits: &Limits,
) -> WireResult<Vec<InventoryCommand>> {
    let mut commands = Vec::new();
    while !reader.is_empty() {
        let op = reader.read_u8().at(Stage::Inventory)?;
        match op {
            opcode::END => {
                if !reader.is_empty() {
                    return Err(DecodeError::new(
                        Stage::Inventory,
                        DecodeErrorKind::TrailingBytes {
                            remaining: reader.bytes_remaining(),
                        },
                    ));
                }
                break;
            }
            opcode::FULL => {
                commands.push(decode_full(reader, limits)?);
            }
            opcode::MULTIPLE => {
                let count = reader.read_u8().at(Stage::Inventory)?;
                let base = reader.read_u8().at(Stage::Inventory)?;
                if !is_single_item(base) {
                    return Err(malformed(SubfieldError::InvalidMultipleBase { opcode: base }));
                }
                for _ in 0..count {
                    commands.push(decode_single(reader, base)?);
                }
            }
            _ if is_single_item(op) => commands.push(decode_single(reader, op)?),
            _ if reader.is_empty() => {
                if op == opcode::LEGACY_PAD {
                    log::debug!("inventory: legacy pad byte 0x{op:02X} at end of stream");
                } else {
                    log::warn!("inventory: ignoring unknown trailing opcode 0x{op:02X}");
                }
            }
            _ => return Err(malformed(SubfieldError::UnknownInventoryOpcode { opcode: op })),
        }
    }
    Ok(commands)
}

fn is_single_item(op: u8) -> bool {
    matches!(
        op & !opcode::SLOT_FLAG,
        opcode::ADD
            | opcode::ADD_EQUIP
            | opcode::DELETE
            | opcode::EQUIP
            | opcode::UNEQUIP
            | opcode::RENAME
    )
}

fn malformed(err: SubfieldError) -> DecodeError {
    DecodeError::new(Stage::Inventory, DecodeErrorKind::MalformedSubfield(err))
}

fn decode_full(reader: &mut BitReader<'_>, limits: &Limits) -> WireResult<InventoryCommand> {
    let count = usize::from(reader.read_u8().at(Stage::Inventory)?);
    if count > limits.max_inventory_items {
        return Err(DecodeError::corrupt_count(
            Stage::Inventory,
            LimitKind::InventoryItems,
            limits.max_inventory_items,
            count,
        ));
    }
    let bitmap = reader.read_bytes(count.div_ceil(8)).at(Stage::Inventory)?;
    let mut entries = Vec::with_capacity(count);
    for idx in 0..count {
        let id = reader.read_u16_be().at(Stage::Inventory)?;
        let equipped = bitmap[idx / 8] & (0x80 >> (idx % 8)) != 0;
        entries.push(InventoryEntry { id, equipped });
    }
    Ok(InventoryCommand::Full { entries })
}

fn decode_single(reader: &mut BitReader<'_>, op: u8) -> WireResult<InventoryCommand> {
    let id = reader.read_u16_be().at(Stage::Inventory)?;
    let slot = if op & opcode::SLOT_FLAG != 0 {
        match reader.read_u8().at(Stage::Inventory)? {
            0 => return Err(malformed(SubfieldError::ZeroSlotIndex)),
            slot => Some(slot),
        }
    } else {
        None
    };
    let command = match op & !opcode::SLOT_FLAG {
        opcode::ADD | opcode::ADD_EQUIP => InventoryCommand::Add {
            id,
            slot,
            name: reader.read_cstr().at(Stage::Inventory)?,
            equip: op & !opcode::SLOT_FLAG == opcode::ADD_EQUIP,
        },
        opcode::DELETE => InventoryCommand::Delete { id, slot },
        opcode::EQUIP => InventoryCommand::Equip { id, slot },
        opcode::UNEQUIP => InventoryCommand::Unequip { id, slot },
        opcode::RENAME => InventoryCommand::Rename {
            id,
            slot,
            name: reader.read_cstr().at(Stage::Inventory)?,
        },
        _ => return Err(malformed(SubfieldError::UnknownInventoryOpcode { opcode: op })),
    };
    Ok(command)
}

/// Encodes commands one opcode each, without a trailing `END`.
pub fn encode_inventory(
    commands: &[InventoryCommand],
    writer: &mut BitWriter,
) -> Result<(), EncodeError> {
    for command in commands {
        match command {
            InventoryCommand::Full { entries } => {
                let count = u8::try_from(entries.len()).map_err(|_| EncodeError::CountOverflow {
                    kind: LimitKind::InventoryItems,
                    count: entries.len(),
                })?;
                writer.write_u8(opcode::FULL)?;
                writer.write_u8(count)?;
                let mut bitmap = vec![0u8; entries.len().div_ceil(8)];
                for (idx, entry) in entries.iter().enumerate() {
                    if entry.equipped {
                        bitmap[idx / 8] |= 0x80 >> (idx % 8);
                    }
                }
                writer.write_bytes(&bitmap)?;
                for entry in entries {
                    writer.write_u16_be(entry.id)?;
                }
            }
            InventoryCommand::Add {
                id,
                slot,
                name,
                equip,
            } => {
                let op = if *equip {
                    opcode::ADD_EQUIP
                } else {
                    opcode::ADD
                };
                write_single(writer, op, *id, *slot)?;
                writer.write_cstr(name)?;
            }
            InventoryCommand::Delete { id, slot } => {
                write_single(writer, opcode::DELETE, *id, *slot)?;
            }
            InventoryCommand::Equip { id, slot } => {
                write_single(writer, opcode::EQUIP, *id, *slot)?;
            }
            InventoryCommand::Unequip { id, slot } => {
                write_single(writer, opcode::UNEQUIP, *id, *slot)?;
            }
            InventoryCommand::Rename { id, slot, name } => {
                write_single(writer, opcode::RENAME, *id, *slot)?;
                writer.write_cstr(name)?;
            }
        }
    }
    Ok(())
}

fn write_single(
    writer: &mut BitWriter,
    op: u8,
    id: u16,
    slot: Option<u8>,
) -> Result<(), EncodeError> {
    match slot {
        Some(slot) => {
            writer.write_u8(op | opcode::SLOT_FLAG)?;
            writer.write_u16_be(id)?;
            writer.write_u8(slot)?;
        }
        None => {
            writer.write_u8(op)?;
            writer.write_u16_be(id)?;
        }
    }
    Ok(())
}
