//! Fuzz harness for picking the base URL out of an API description.

#![no_main]

use bddrun_openapi::base_url;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(url) = base_url(&doc) {
        assert!(!url.ends_with('/'));
    }
});
