//! Fuzz target: `DutyCycleConfig::from_blob`
//!
//! A stored config blob may be truncated or corrupted. Decoding must
//! never panic, and anything it accepts must pass validation.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use pmsd::config::DutyCycleConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = DutyCycleConfig::from_blob(data) {
        assert!(cfg.validate().is_ok());
        assert!(cfg.discard_samples < cfg.samples_per_cycle);
    }
});
