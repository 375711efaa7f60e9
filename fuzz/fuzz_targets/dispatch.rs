#![no_main]

use libfuzzer_sys::fuzz_target;
use spikewatch::{dispatch, DetectionMethod, ParamBag};

fuzz_target!(|data: &[u8]| {
    // First byte picks the method, the rest are raw little-endian f64 samples
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let method = DetectionMethod::ALL[usize::from(selector) % DetectionMethod::ALL.len()];
    let samples: Vec<f64> = rest
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect();

    // Must never panic, whatever the bit patterns
    let verdict = dispatch(&samples, method.name(), &ParamBag::new());
    assert!(verdict.is_ok());
});
