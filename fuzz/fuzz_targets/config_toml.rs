#![no_main]

use libfuzzer_sys::fuzz_target;
use statkeep::args::Command;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(cli) = statkeep::fuzzing::apply_config_from_toml(input) {
            if let Command::Ingest(args) = cli.command {
                debug_assert!(args.cache.recent >= 1);
                debug_assert!(args.cache.samples >= 1);
                debug_assert!(args.cache.samples <= args.cache.window);
            }
        }
    }
});
