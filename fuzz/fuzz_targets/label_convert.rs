//! Fuzz target for whole-file label conversion.
//!
//! Parses arbitrary text in each source format and converts every record,
//! checking that geometry edge cases (NaN, huge values, flat quads) never
//! panic.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use yoloprep::convert::{convert_text, ConversionMode};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for mode in [
        ConversionMode::DetectToObb,
        ConversionMode::ObbToDetect,
        ConversionMode::XywhrToObb,
    ] {
        let _ = convert_text(text, mode, 0.0, Path::new("<fuzz>"));
    }
});
