#![no_main]

use libfuzzer_sys::fuzz_target;
use statkeep::args::Command;

fuzz_target!(|data: &[u8]| {
    if let Ok(cli) = statkeep::fuzzing::apply_config_from_json(data) {
        if let Command::Ingest(args) = cli.command {
            debug_assert!(args.cache.samples <= args.cache.window);
            if let Some(config) = args.backend.driver_config() {
                debug_assert!(!config.engine.is_empty());
            }
        }
    }
});
