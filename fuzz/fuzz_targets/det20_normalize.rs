//! Fuzz target for det_20 parsing followed by normalization.
//!
//! Whenever both steps succeed, the output must keep one record per input
//! sample and one label per input label.
//!
//! Run with:
//!   cargo +nightly fuzz run det20_normalize

#![no_main]

use armitage::bdd100k::{from_det20_slice, normalize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(raw) = from_det20_slice(data) else {
        return;
    };
    if let Ok(normalized) = normalize(&raw, "/fuzz") {
        assert_eq!(normalized.len(), raw.len());
        for (out, inp) in normalized.iter().zip(&raw) {
            assert_eq!(out.labels.len(), inp.labels.len());
        }
    }
});
