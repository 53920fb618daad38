//! Fuzz target: config parsing and validation
//!
//! Any JSON that parses into a `ControllerConfig` and passes `validate()`
//! must be safe to build a controller from.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use ledmux::app::controller::Controller;
use ledmux::config::ControllerConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<ControllerConfig>(data) else {
        return;
    };
    if config.validate().is_ok() {
        assert!(Controller::with_standard_sources(config).is_ok());
    }
});
