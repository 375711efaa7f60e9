#![no_main]

use libfuzzer_sys::fuzz_target;
use spikewatch::config::{FileConfig, Overrides, RunConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and resolving may fail but must not panic
        if let Ok(file) = FileConfig::from_toml_str(input) {
            let _ = RunConfig::resolve(&Overrides::default(), Some(&file));
        }
    }
});
