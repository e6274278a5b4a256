//! Fuzz target: stored config blobs
//!
//! Writes arbitrary bytes as the persisted config and loads them back
//! through the host NVS backend.  A load must either fail cleanly or
//! return a config that passes validation.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use garagedoor::adapters::nvs::NvsAdapter;
use garagedoor::app::ports::ConfigPort;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(nvs) = NvsAdapter::new() else {
        return;
    };
    nvs.write_raw(data);
    if let Ok(cfg) = nvs.load() {
        assert!(cfg.validate().is_ok(), "load returned an invalid config");
    }
    let _ = nvs.load_or_default();
});
