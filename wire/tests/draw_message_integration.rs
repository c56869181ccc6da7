use wire::{
    decode_draw_message, decode_draw_message_with_layout, encode_draw_message, opcode,
    DecodeErrorKind, DrawMessage, InventoryCommand, LimitKind, Limits, Stage,
};

fn bob_message() -> Vec<u8> {
    let mut bytes = vec![0u8];
    bytes.extend_from_slice(&5u32.to_be_bytes());
    bytes.extend_from_slice(&6u32.to_be_bytes());
    // one descriptor: index 3, kind 0, sprite 100, "Bob", no colors
    bytes.extend_from_slice(&[1, 3, 0, 0, 100]);
    bytes.extend_from_slice(b"Bob\0");
    bytes.push(0);
    bytes.extend_from_slice(&[10, 20, 5, 9, 3, 4, 0]);
    bytes.push(0);
    bytes.extend_from_slice(&[1, 3, 0, 0, 0, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 3, 0, 0, 0]);
    bytes
}

#[test]
fn concrete_scenario_decodes() {
    let message = decode_draw_message(&bob_message(), &Limits::default()).unwrap();
    assert_eq!(message.descriptors[0].index, 3);
    assert_eq!(message.descriptors[0].name, "Bob");
    assert_eq!(message.stats.hp, 10);
    assert_eq!(message.stats.hp_max, 20);
    assert_eq!(message.pict_again, 0);
    assert!(message.pictures.is_empty());
    assert_eq!(message.mobiles[0].index, 3);
    assert_eq!((message.mobiles[0].h, message.mobiles[0].v), (0, 0));
    assert!(message.info_text.is_empty());
    assert!(message.bubbles.is_empty());
    assert!(message.sounds.is_empty());
    assert!(message.inventory.is_empty());
}

#[test]
fn state_block_length_beyond_buffer_is_truncated() {
    let mut bytes = bob_message();
    let len_at = bytes.len() - 5;
    bytes[len_at + 1] = 200;
    let err = decode_draw_message(&bytes, &Limits::default()).unwrap_err();
    assert_eq!(err.stage, Stage::StateBlock);
    assert!(err.is_truncated());
}

#[test]
fn inventory_remainder_is_decoded_from_block() {
    let mut bytes = bob_message();
    bytes.truncate(bytes.len() - 5);
    let block = [0, 0, 0, opcode::ADD, 0, 7, b'K', b'e', b'y', 0, opcode::LEGACY_PAD];
    bytes.extend_from_slice(&(block.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&block);
    let message = decode_draw_message(&bytes, &Limits::default()).unwrap();
    assert_eq!(
        message.inventory,
        vec![InventoryCommand::Add {
            id: 7,
            slot: None,
            name: "Key".to_string(),
            equip: false,
        }]
    );
}

#[test]
fn bubble_count_ceiling_is_enforced() {
    let mut bytes = bob_message();
    bytes.truncate(bytes.len() - 5);
    bytes.extend_from_slice(&[0, 3, 0, 9, 0]);
    let err = decode_draw_message(&bytes, &Limits::for_testing()).unwrap_err();
    assert_eq!(err.stage, Stage::Bubbles);
    assert!(matches!(
        err.kind,
        DecodeErrorKind::CorruptCount {
            kind: LimitKind::Bubbles,
            limit: 4,
            actual: 9
        }
    ));
}

#[test]
fn layout_reports_stage_sizes() {
    let message = DrawMessage {
        sounds: vec![1, 2, 3],
        ..DrawMessage::default()
    };
    let bytes = encode_draw_message(&message).unwrap();
    let (_, layout) = decode_draw_message_with_layout(&bytes, &Limits::default()).unwrap();
    let sounds = layout
        .spans
        .iter()
        .find(|span| span.stage == Stage::Sounds)
        .unwrap();
    assert_eq!(sounds.byte_len(), 1 + 3 * 2);
}
