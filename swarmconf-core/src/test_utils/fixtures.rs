//! Test fixtures for config objects
//!
//! Builders for devices sharing one identity and a relay helper that hands
//! a pushed snapshot to another device the way a replica would.

use super::deterministic_rng::{random_secret, test_rng_with_seed};
use crate::core_config::{ConfigType, IncomingSnapshot, PushData, UserProfile};
use crate::core_groups::UserGroups;

/// Identity secret shared by every device of one test account
pub fn test_secret(seed: u64) -> [u8; 32] {
    random_secret(&mut test_rng_with_seed(seed))
}

/// Snapshot as a replica returns it
pub fn as_incoming(push: &PushData) -> IncomingSnapshot {
    IncomingSnapshot {
        hash: push.hash,
        ciphertext: push.ciphertext.clone(),
        parents: push.parents.clone(),
    }
}

/// Push `from` and return what another device would fetch
pub fn relay<C: ConfigType>(from: &mut C) -> IncomingSnapshot {
    let push = from.push().expect("push in test");
    as_incoming(&push)
}

/// Builder for a set of devices logged into the same account
pub struct TestAccountBuilder {
    seed: u64,
    devices: usize,
}

impl TestAccountBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed, devices: 2 }
    }

    pub fn with_devices(mut self, devices: usize) -> Self {
        self.devices = devices;
        self
    }

    pub fn profiles(self) -> Vec<UserProfile> {
        let secret = test_secret(self.seed);
        (0..self.devices)
            .map(|_| UserProfile::new(&secret, None).expect("fresh profile"))
            .collect()
    }

    pub fn user_groups(self) -> Vec<UserGroups> {
        let secret = test_secret(self.seed);
        (0..self.devices)
            .map(|_| UserGroups::new(&secret, None).expect("fresh user groups"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_between_devices() {
        let mut devices = TestAccountBuilder::new(7).with_devices(2).profiles();
        devices[0].set_name("Bob");
        let snapshot = relay(&mut devices[0]);

        let outcome = devices[1].merge(vec![snapshot]);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(devices[1].name(), Some("Bob"));
    }

    #[test]
    fn test_secret_is_stable() {
        assert_eq!(test_secret(3), test_secret(3));
        assert_ne!(test_secret(3), test_secret(4));
    }
}
