#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmconf_core::core_crypto::{derive_key, open, seal, IdentitySeed};

fuzz_target!(|data: &[u8]| {
    let seed = IdentitySeed::from_secret(&[1u8; 32]).expect("valid seed");
    let key = derive_key(&seed, "UserProfile", 2).expect("key derivation");

    // Opening arbitrary bytes must fail cleanly
    let _ = open(&key, data);

    // Small inputs: round trip, then a flipped bit must fail authentication
    if data.len() <= 4096 {
        let sealed = seal(&key, data).expect("seal");
        assert_eq!(open(&key, &sealed).expect("open"), data);

        let mut tampered = sealed.clone();
        let i = data.first().map_or(0, |b| *b as usize) % tampered.len();
        tampered[i] ^= 0x80;
        assert!(open(&key, &tampered).is_err());
    }
});
