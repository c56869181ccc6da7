#![no_main]

use libfuzzer_sys::fuzz_target;
use scene::{
    Collaborators, Effects, NullSink, PlayerList, SceneConfig, SpriteInfo, SpriteTable, StateStore,
};

fuzz_target!(|data: &[u8]| {
    // Whole input as one message, then re-encoded.
    if let Ok(message) = wire::decode_draw_message(data, &wire::Limits::for_testing()) {
        if let Ok(bytes) = wire::encode_draw_message(&message) {
            let _ = wire::decode_draw_message(&bytes, &wire::Limits::for_testing());
        }
    }

    // Length-prefixed chunks as a frame sequence through the scene engine.
    let sprites = (0..8u16).fold(SpriteTable::new(), |table, id| {
        table.with(
            id,
            SpriteInfo {
                pixel_count: u32::from(id) * 150,
                width: 16,
                height: 16,
                plane: i16::from(id % 3) - 1,
                frame: 0,
            },
        )
    });
    let players = PlayerList::new();
    let store = StateStore::new(SceneConfig::for_testing());
    let mut sink = NullSink;
    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 120).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let _ = store.apply(
            &data[idx..end],
            Collaborators::new(&sprites, &players),
            &mut Effects::live(&mut sink),
        );
        idx = end;
    }
    let _ = store.snapshot();
});
