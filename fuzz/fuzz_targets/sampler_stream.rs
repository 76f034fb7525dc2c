#![no_main]

use std::collections::BTreeSet;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [samples, window, seed, rest @ ..] = data else {
        return;
    };
    let samples = usize::from(*samples % 16).saturating_add(1);
    let window = samples.saturating_add(usize::from(*window));
    let mut sequence = 0u64;
    let mut sequences = Vec::with_capacity(rest.len());
    for byte in rest {
        // Mostly increasing, with the occasional regression to exercise rejection.
        if *byte == 0 {
            sequences.push(sequence.saturating_sub(1));
        } else {
            sequence = sequence.saturating_add(u64::from(*byte));
            sequences.push(sequence);
        }
    }
    if let Ok(snapshot) =
        statkeep::fuzzing::sample_sequence_input(samples, window, u64::from(*seed), &sequences)
    {
        debug_assert!(snapshot.len() <= samples);
        let unique: BTreeSet<u64> = snapshot.iter().copied().collect();
        debug_assert_eq!(unique.len(), snapshot.len());
    }
});
