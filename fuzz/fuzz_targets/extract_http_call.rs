//! Fuzz harness for request and status extraction from scenario text.

#![no_main]

use bddrun_extract::Extractor;
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

static EXTRACTOR: OnceLock<Extractor> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let extractor = EXTRACTOR.get_or_init(|| Extractor::new().expect("phrase grammar compiles"));
    if let Ok(call) = extractor.http_call(text) {
        assert!(call.path.starts_with('/'));
    }
    let _ = extractor.expectations(text);
});
