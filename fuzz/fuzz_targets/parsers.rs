#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(value) = statkeep::fuzzing::parse_positive_usize_input(input) {
            debug_assert!(value >= 1);
        }
        if let Ok(value) = statkeep::fuzzing::parse_percentile_input(input) {
            debug_assert!(value <= 100);
        }
        if let Ok((key, _)) = statkeep::fuzzing::parse_param_input(input) {
            debug_assert!(!key.is_empty());
        }
        drop(statkeep::fuzzing::parse_duration_value_input(input));
    }
});
