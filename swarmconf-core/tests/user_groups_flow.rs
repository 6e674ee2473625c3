/// User groups integration tests
///
/// Conversation-list scenarios across devices:
/// - Community lookup by any spelling of URL and room
/// - Legacy group membership edits merged field by field
/// - Cursor erase followed by sync
///
/// Run with: cargo test --test user_groups_flow

#[cfg(test)]
mod user_groups_flow {
    use swarmconf_core::core_config::{ConfigType, IncomingSnapshot};
    use swarmconf_core::core_groups::{Community, GroupEntry, NotificationMode, UserGroups};
    use swarmconf_core::SyncError;

    const SECRET: [u8; 32] = [0x17; 32];
    const SERVER_KEY: [u8; 32] = [0xa0; 32];

    fn session_id(n: u8) -> String {
        format!("05{}{:02x}", "1".repeat(62), n)
    }

    fn relay(from: &mut UserGroups) -> IncomingSnapshot {
        let push = from.push().unwrap();
        IncomingSnapshot {
            hash: push.hash,
            ciphertext: push.ciphertext,
            parents: push.parents,
        }
    }

    #[test]
    fn test_community_found_by_any_spelling() {
        let mut phone = UserGroups::new(&SECRET, None).unwrap();
        let mut laptop = UserGroups::new(&SECRET, None).unwrap();

        let mut community = phone
            .get_or_construct_community("https://Example.com:443/", "Room", &SERVER_KEY)
            .unwrap();
        community.joined_at = 1_650_000_000;
        phone.set_community(community);

        laptop.merge(vec![relay(&mut phone)]);

        for room in ["room", "ROOM", "Room"] {
            let found = laptop.get_community("example.com", room).unwrap();
            assert_eq!(found.room(), "Room");
            assert_eq!(found.base_url(), "https://example.com");
            assert_eq!(found.joined_at, 1_650_000_000);
        }
    }

    #[test]
    fn test_concurrent_member_edits_merge() {
        let mut phone = UserGroups::new(&SECRET, None).unwrap();
        let mut laptop = UserGroups::new(&SECRET, None).unwrap();

        let mut group = phone.get_or_construct_legacy_group(&session_id(0)).unwrap();
        group.set_name("Hikers");
        group.members.add(&session_id(1), true);
        phone.set_legacy_group(group);
        laptop.merge(vec![relay(&mut phone)]);

        // Different members added on each device
        let mut on_phone = phone.get_legacy_group(&session_id(0)).unwrap();
        on_phone.members.add(&session_id(2), false);
        phone.set_legacy_group(on_phone);

        let mut on_laptop = laptop.get_legacy_group(&session_id(0)).unwrap();
        on_laptop.members.add(&session_id(3), false);
        on_laptop.notifications = NotificationMode::Disabled;
        laptop.set_legacy_group(on_laptop);

        let from_phone = relay(&mut phone);
        let from_laptop = relay(&mut laptop);
        phone.merge(vec![from_laptop]);
        laptop.merge(vec![from_phone]);

        for device in [&phone, &laptop] {
            let group = device.get_legacy_group(&session_id(0)).unwrap();
            assert_eq!(group.name(), "Hikers");
            assert_eq!(group.members.count(), (3, 1, 2));
            assert_eq!(group.notifications, NotificationMode::Disabled);
        }
    }

    #[test]
    fn test_cursor_erase_then_sync() {
        let mut phone = UserGroups::new(&SECRET, None).unwrap();
        let mut laptop = UserGroups::new(&SECRET, None).unwrap();

        for n in 0..4u8 {
            let mut group = phone.get_or_construct_legacy_group(&session_id(n)).unwrap();
            group.priority = n as i64;
            phone.set_legacy_group(group);
        }
        phone.set_community(Community::new("chat.example", "general", &SERVER_KEY).unwrap());
        laptop.merge(vec![relay(&mut phone)]);
        assert_eq!(laptop.size(), 5);

        // Drop every pinned legacy group through the cursor
        let mut cursor = laptop.cursor();
        while let Some(entry) = cursor.current() {
            match entry {
                GroupEntry::LegacyGroup(g) if g.priority > 0 => {
                    cursor.erase_current().unwrap();
                }
                _ => {
                    cursor.advance();
                }
            }
        }
        assert!(matches!(
            cursor.erase_current(),
            Err(SyncError::ContractViolation(_))
        ));

        phone.merge(vec![relay(&mut laptop)]);
        assert_eq!(phone.size_legacy_groups(), 1);
        assert_eq!(phone.size_communities(), 1);
        assert!(phone.get_legacy_group(&session_id(0)).is_some());
        assert!(phone.get_legacy_group(&session_id(3)).is_none());
    }

    #[test]
    fn test_restore_from_dump() {
        let mut groups = UserGroups::new(&SECRET, None).unwrap();
        let mut community = Community::new("example.net", "Lobby", &SERVER_KEY).unwrap();
        community.mute_until = 1_700_000_000;
        community.notifications = NotificationMode::MentionsOnly;
        groups.set_community(community.clone());
        assert!(groups.needs_dump());

        let dump = groups.dump();
        let restored = UserGroups::new(&SECRET, Some(&dump)).unwrap();
        assert_eq!(restored.get_community("EXAMPLE.NET", "lobby"), Some(community));
        assert!(restored.needs_push());
    }
}
