#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmconf_core::core_config::ConfigType;
use swarmconf_core::core_groups::UserGroups;

fuzz_target!(|data: &[u8]| {
    // A dump either loads into a usable object or is rejected
    if let Ok(mut groups) = UserGroups::new(&[2u8; 32], Some(data)) {
        let _ = groups.size();
        let _ = groups.iter().count();

        // A loaded dump must survive another round
        let again = groups.dump();
        assert!(UserGroups::new(&[2u8; 32], Some(&again)).is_ok());
        let _ = groups.push();
    }
});
