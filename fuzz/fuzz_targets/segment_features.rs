//! Fuzz harness for the Gherkin segmenter.
//!
//! Never panics, and never yields more scenarios than there are header lines.

#![no_main]

use bddrun_segment::segment;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let segmented = segment(text);
    let scenarios: usize = segmented.features.iter().map(|f| f.scenarios.len()).sum();
    let headers = text
        .lines()
        .filter(|l| l.trim_start().starts_with("Scenario:"))
        .count();
    assert!(scenarios <= headers);
});
