#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmconf_core::core_codec::{decode, encode, DecodeLimits};
use swarmconf_core::core_merge::Snapshot;

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must be canonical: re-encoding gives the input back
    if let Ok(value) = decode(data) {
        assert_eq!(encode(&value), data);
    }

    // Snapshot validation must reject garbage without panicking
    let _ = Snapshot::from_plaintext(data, &DecodeLimits::default());
});
