#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    statkeep::fuzzing::decode_plugin_line(data);
});
