//! Fuzz harness for tag normalization.
//!
//! Normalizing already normalized text must not change it.

#![no_main]

use bddrun_normalize::normalize;
use bddrun_tags::TagVocabulary;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let vocabulary = TagVocabulary::builtin();
    let once = normalize(text, &vocabulary);
    let twice = normalize(&once.text, &vocabulary);
    assert_eq!(once.text, twice.text);
});
