/// Multi-device sync integration tests
///
/// These tests drive whole config objects the way a client does:
/// - Concurrent edits on several devices
/// - Exchange of sealed snapshots through a simulated replica
/// - Obsolete tracking and replica compaction
/// - Restoring from dumps between rounds
///
/// Run with: cargo test --test multi_device_sync

#[cfg(test)]
mod multi_device_sync {
    use swarmconf_core::core_config::{ConfigType, IncomingSnapshot, PushData, UserProfile};
    use swarmconf_core::core_merge::SnapshotHash;
    use std::collections::BTreeMap;

    const SECRET: [u8; 64] = [0x5a; 64];

    /// Replica that keeps every stored blob until told to delete it
    #[derive(Default)]
    struct Replica {
        blobs: BTreeMap<SnapshotHash, IncomingSnapshot>,
    }

    impl Replica {
        fn store(&mut self, push: &PushData) {
            for hash in &push.obsolete {
                self.blobs.remove(hash);
            }
            self.blobs.insert(
                push.hash,
                IncomingSnapshot {
                    hash: push.hash,
                    ciphertext: push.ciphertext.clone(),
                    parents: push.parents.clone(),
                },
            );
        }

        fn fetch(&self) -> Vec<IncomingSnapshot> {
            self.blobs.values().cloned().collect()
        }
    }

    fn device() -> UserProfile {
        UserProfile::new(&SECRET, None).unwrap()
    }

    fn sync(device: &mut UserProfile, replica: &mut Replica) {
        device.merge(replica.fetch());
        if device.needs_push() {
            let push = device.push().unwrap();
            replica.store(&push);
            device.confirm_pushed(&push.hash);
        }
    }

    #[test]
    fn test_three_devices_converge() {
        let mut replica = Replica::default();
        let mut devices = vec![device(), device(), device()];

        devices[0].set_name("Alice");
        devices[1].set_profile_pic("https://example.org/a.png", &[3u8; 32]).unwrap();
        devices[2].set_nts_priority(4);

        // Everyone pushes before seeing anyone else
        let pushes: Vec<PushData> = devices.iter_mut().map(|d| d.push().unwrap()).collect();
        for push in &pushes {
            replica.store(push);
        }

        for d in devices.iter_mut() {
            sync(d, &mut replica);
        }
        for d in devices.iter_mut() {
            sync(d, &mut replica);
        }

        for d in &devices {
            assert_eq!(d.name(), Some("Alice"));
            assert_eq!(d.profile_pic().unwrap().key, [3u8; 32]);
            assert_eq!(d.nts_priority(), 4);
            assert!(!d.needs_push());
        }

        // The merge heads were identical, so the replica was compacted to one
        assert_eq!(replica.blobs.len(), 1);
        let heads: Vec<_> = devices.iter().map(|d| d.base().merge_state().active).collect();
        assert!(heads.iter().all(|h| h == &heads[0]));
    }

    #[test]
    fn test_later_edit_wins_over_earlier() {
        let mut replica = Replica::default();
        let mut phone = device();
        let mut laptop = device();

        phone.set_name("first");
        sync(&mut phone, &mut replica);
        sync(&mut laptop, &mut replica);
        assert_eq!(laptop.name(), Some("first"));

        laptop.set_name("second");
        sync(&mut laptop, &mut replica);
        sync(&mut phone, &mut replica);
        assert_eq!(phone.name(), Some("second"));

        // A straight line of edits never needs a merge head
        assert_eq!(replica.blobs.len(), 1);
        assert_eq!(phone.seqno(), laptop.seqno());
    }

    #[test]
    fn test_duplicate_and_reordered_delivery() {
        let mut source = device();
        source.set_name("v1");
        let first = source.push().unwrap();
        source.set_name("v2");
        let second = source.push().unwrap();
        assert_eq!(second.obsolete, vec![first.hash]);

        let as_incoming = |p: &PushData| IncomingSnapshot {
            hash: p.hash,
            ciphertext: p.ciphertext.clone(),
            parents: p.parents.clone(),
        };

        let mut a = device();
        a.merge(vec![as_incoming(&second), as_incoming(&first), as_incoming(&second)]);

        let mut b = device();
        b.merge(vec![as_incoming(&first)]);
        b.merge(vec![as_incoming(&second)]);
        b.merge(vec![as_incoming(&first)]);

        assert_eq!(a.name(), Some("v2"));
        assert_eq!(b.name(), Some("v2"));
        assert_eq!(a.base().store().data(), b.base().store().data());
        assert!(a.base().merge_state().obsolete.contains(&first.hash));
        assert!(!a.needs_push());
    }

    #[test]
    fn test_bad_snapshot_does_not_block_others() {
        let mut source = device();
        source.set_name("good");
        let good = source.push().unwrap();

        let mut other = device();
        other.set_nts_priority(1);
        let tampered = other.push().unwrap();
        let mut ciphertext = tampered.ciphertext.clone();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        let mut target = device();
        let outcome = target.merge(vec![
            IncomingSnapshot {
                hash: tampered.hash,
                ciphertext,
                parents: tampered.parents.clone(),
            },
            IncomingSnapshot {
                hash: good.hash,
                ciphertext: good.ciphertext.clone(),
                parents: good.parents.clone(),
            },
        ]);

        assert_eq!(outcome.accepted, vec![good.hash]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].hash, tampered.hash);
        assert_eq!(target.name(), Some("good"));
        assert_eq!(target.nts_priority(), 0);
    }

    #[test]
    fn test_dump_between_rounds() {
        let mut replica = Replica::default();
        let mut phone = device();
        let mut laptop = device();

        phone.set_name("before restart");
        sync(&mut phone, &mut replica);

        // Unpushed edit survives a restart
        laptop.set_nts_priority(2);
        let dump = laptop.dump();
        let mut laptop = UserProfile::new(&SECRET, Some(&dump)).unwrap();
        assert!(laptop.needs_push());
        assert!(!laptop.needs_dump());

        sync(&mut laptop, &mut replica);
        sync(&mut phone, &mut replica);

        for d in [&phone, &laptop] {
            assert_eq!(d.name(), Some("before restart"));
            assert_eq!(d.nts_priority(), 2);
        }
    }

    #[test]
    fn test_confirm_pushed_forgets_obsolete() {
        let mut d = device();
        d.set_name("a");
        let first = d.push().unwrap();
        d.set_name("b");
        let second = d.push().unwrap();

        assert!(d.base().merge_state().obsolete.contains(&first.hash));
        assert!(d.confirm_pushed(&second.hash));
        assert!(d.base().merge_state().obsolete.is_empty());
        assert!(!d.confirm_pushed(&second.hash));
    }
}
