#![no_main]

use applet_core::ctap2::{parse_get_assertion, parse_make_credential};
use libfuzzer_sys::fuzz_target;

fn stub_hash(input: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, b) in input.iter().enumerate() {
        out[i % 32] ^= *b;
    }
    out
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let mut hasher = stub_hash;
    if data[0] & 1 == 0 {
        let _ = parse_make_credential(&data[1..], &mut hasher);
    } else {
        let _ = parse_get_assertion(&data[1..], &mut hasher);
    }
});
