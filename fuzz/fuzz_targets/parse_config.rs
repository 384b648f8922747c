//! Fuzz harness for bddrun.yaml.

#![no_main]

use bddrun_config::BddrunConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = serde_yaml::from_str::<BddrunConfig>(input) {
        let _ = config.vocabulary();
    }
});
