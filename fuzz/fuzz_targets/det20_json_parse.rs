//! Fuzz target for BDD100K det_20 JSON parsing.
//!
//! Feeds arbitrary byte sequences to the det_20 reader, checking for panics,
//! buffer overflows, or other undefined behavior.
//!
//! Run with:
//!   cargo +nightly fuzz run det20_json_parse

#![no_main]

use armitage::bdd100k::from_det20_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for a fuzzed label file.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_det20_slice(data);
});
