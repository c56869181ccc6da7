#![no_main]

use bitstream::BitReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitReader::new(data);
    let mut idx = 0usize;

    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 7;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_bit();
            }
            1 => {
                // Widths past 32 must be rejected, not panic.
                let bits = data[idx.saturating_sub(1)] % 40;
                let _ = reader.read_signed_bits(bits);
            }
            2 => {
                let _ = reader.align_to_byte();
            }
            3 => {
                let _ = reader.read_u16_be();
            }
            4 => {
                let _ = reader.read_u32_be();
            }
            5 => {
                let len = usize::from(data[idx.saturating_sub(1)] % 16);
                let _ = reader.read_bytes(len);
            }
            _ => {
                let _ = reader.read_cstr();
            }
        }
    }
});
