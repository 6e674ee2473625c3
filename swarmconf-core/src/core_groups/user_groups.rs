//! The user's group and community memberships
//!
//! Keys:
//! - `C` legacy groups by session id, see [`LegacyGroup`]
//! - `o` communities by base URL without scheme, see [`Community`]
//!
//! Records are plain values: read one with `get_*`, edit it, and hand it
//! back with `set_*`. Nothing is written until then.

use super::communities::{self, Community, KEY_PUBKEY, KEY_ROOMS};
use super::legacy_group::LegacyGroup;
use super::session_id::SessionId;
use crate::core_codec::{Dict, Value};
use crate::core_config::{ConfigBase, ConfigType, Namespace};
use crate::errors::{SyncError, SyncResult};
use crate::settings::Settings;
use std::ops::Bound;
use tracing::debug;

const KEY_LEGACY_GROUPS: &str = "C";
const KEY_COMMUNITIES: &str = "o";

/// One conversation of the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEntry {
    LegacyGroup(LegacyGroup),
    Community(Community),
}

/// Position of a conversation in iteration order: legacy groups by
/// session id, then communities by (url key, room key)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum EntryKey {
    LegacyGroup(String),
    Community(String, String),
}

pub struct UserGroups {
    base: ConfigBase,
}

impl UserGroups {
    pub fn new(secret: &[u8], dump: Option<&[u8]>) -> SyncResult<Self> {
        Self::with_settings(secret, dump, Settings::default())
    }

    pub fn with_settings(
        secret: &[u8],
        dump: Option<&[u8]>,
        settings: Settings,
    ) -> SyncResult<Self> {
        Ok(UserGroups {
            base: ConfigBase::with_settings(Self::NAMESPACE, secret, dump, settings)?,
        })
    }

    fn legacy_dict(&self) -> Option<&Dict> {
        self.base.dict_at(&[KEY_LEGACY_GROUPS])
    }

    fn communities_dict(&self) -> Option<&Dict> {
        self.base.dict_at(&[KEY_COMMUNITIES])
    }

    // Legacy groups

    /// Stored group, None if absent or the id is invalid
    pub fn get_legacy_group(&self, session_id: &str) -> Option<LegacyGroup> {
        let id = SessionId::parse(session_id).ok()?;
        let dict = self.legacy_dict()?.get(id.as_str())?.as_dict()?;
        Some(LegacyGroup::from_dict(id, dict))
    }

    /// Stored group, or a new unsaved one with default fields
    pub fn get_or_construct_legacy_group(&self, session_id: &str) -> SyncResult<LegacyGroup> {
        match self.get_legacy_group(session_id) {
            Some(group) => Ok(group),
            None => LegacyGroup::new(session_id),
        }
    }

    /// Insert or replace a group
    pub fn set_legacy_group(&mut self, group: LegacyGroup) {
        let id = group.session_id().to_string();
        let changed = self
            .base
            .set_path(&[KEY_LEGACY_GROUPS, id.as_str()], Value::Dict(group.to_dict()));
        debug!(group = %id, changed, "Set legacy group");
    }

    pub fn erase_legacy_group(&mut self, session_id: &str) -> bool {
        let Ok(id) = SessionId::parse(session_id) else {
            return false;
        };
        self.base
            .set_path(&[KEY_LEGACY_GROUPS, id.as_str()], Value::Null)
    }

    // Communities

    /// Stored community. The base URL is normalized and the room matched
    /// case-insensitively; the result carries the stored room case.
    pub fn get_community(&self, base_url: &str, room: &str) -> Option<Community> {
        communities::find(self.communities_dict()?, base_url, room)
    }

    /// Stored community, or a new unsaved one with the room exactly as
    /// given. The pubkey only applies to a new record.
    pub fn get_or_construct_community(
        &self,
        base_url: &str,
        room: &str,
        pubkey: &[u8],
    ) -> SyncResult<Community> {
        match self.get_community(base_url, room) {
            Some(community) => Ok(community),
            None => Community::new(base_url, room, pubkey),
        }
    }

    /// Insert or replace a community; the stored room case becomes the
    /// record's.
    pub fn set_community(&mut self, community: Community) {
        let (server, room) = community.key();
        let mut changed = self.base.set_path(
            &[KEY_COMMUNITIES, server, KEY_PUBKEY],
            Value::from(&community.pubkey()[..]),
        );
        changed |= self.base.set_path(
            &[KEY_COMMUNITIES, server, KEY_ROOMS, room.as_str()],
            Value::Dict(community.room_dict()),
        );
        debug!(server, room = %room, changed, "Set community");
    }

    pub fn erase_community(&mut self, base_url: &str, room: &str) -> bool {
        match communities::lookup_key(base_url, room) {
            Some((server, room)) => self.erase_community_key(&server, &room),
            None => false,
        }
    }

    /// Remove a room, and the server entry with its last room
    fn erase_community_key(&mut self, server: &str, room: &str) -> bool {
        let erased = self
            .base
            .set_path(&[KEY_COMMUNITIES, server, KEY_ROOMS, room], Value::Null);
        let rooms_left = self
            .base
            .dict_at(&[KEY_COMMUNITIES, server, KEY_ROOMS])
            .is_some_and(|rooms| !rooms.is_empty());
        if erased && !rooms_left {
            self.base.set_path(&[KEY_COMMUNITIES, server], Value::Null);
        }
        erased
    }

    // Listing

    pub fn size_legacy_groups(&self) -> usize {
        self.iter_legacy_groups().count()
    }

    pub fn size_communities(&self) -> usize {
        self.iter_communities().count()
    }

    pub fn size(&self) -> usize {
        self.size_legacy_groups() + self.size_communities()
    }

    /// Legacy groups by session id. Malformed entries are skipped.
    pub fn iter_legacy_groups(&self) -> impl Iterator<Item = LegacyGroup> + '_ {
        self.legacy_dict().into_iter().flat_map(|groups| {
            groups.iter().filter_map(|(id, dict)| {
                Some(LegacyGroup::from_dict(
                    SessionId::parse(id).ok()?,
                    dict.as_dict()?,
                ))
            })
        })
    }

    pub fn iter_communities(&self) -> impl Iterator<Item = Community> + '_ {
        self.communities_dict()
            .into_iter()
            .flat_map(communities::all)
            .map(|(_, _, community)| community)
    }

    /// Every conversation: legacy groups, then communities
    pub fn iter(&self) -> impl Iterator<Item = GroupEntry> + '_ {
        self.iter_legacy_groups()
            .map(GroupEntry::LegacyGroup)
            .chain(self.iter_communities().map(GroupEntry::Community))
    }

    /// Cursor over every conversation that can erase as it goes
    pub fn cursor(&mut self) -> GroupsCursor<'_> {
        let current = self.entry_after(None);
        GroupsCursor {
            groups: self,
            current,
        }
    }

    /// Next conversation after `after` in iteration order
    fn entry_after(&self, after: Option<&EntryKey>) -> Option<EntryKey> {
        let legacy_after = match after {
            Some(EntryKey::Community(server, room)) => {
                return self.community_after(Some((server.as_str(), room.as_str())));
            }
            Some(EntryKey::LegacyGroup(id)) => Some(id.as_str()),
            None => None,
        };
        self.legacy_dict()
            .and_then(|groups| {
                next_key(groups, legacy_after, |id, group| {
                    group.is_dict() && SessionId::parse(id).is_ok_and(|p| p.as_str() == id)
                })
            })
            .map(|id| EntryKey::LegacyGroup(id.to_string()))
            .or_else(|| self.community_after(None))
    }

    /// Next community after `(server, room)`: the rest of that server's
    /// rooms, then the servers that follow it
    fn community_after(&self, after: Option<(&str, &str)>) -> Option<EntryKey> {
        let start = after.map_or(Bound::Unbounded, |(server, _)| Bound::Included(server));
        self.communities_dict()?
            .range::<str, _>((start, Bound::Unbounded))
            .find_map(|(server_key, server)| {
                let server = server.as_dict()?;
                let rooms = server.get(KEY_ROOMS)?.as_dict()?;
                let room_after = after
                    .filter(|(s, _)| *s == server_key.as_str())
                    .map(|(_, room)| room);
                let room = next_key(rooms, room_after, |_, room| {
                    room.as_dict()
                        .and_then(|r| Community::from_dicts(server, r))
                        .is_some()
                })?;
                Some(EntryKey::Community(server_key.clone(), room.to_string()))
            })
    }

    fn entry(&self, key: &EntryKey) -> Option<GroupEntry> {
        match key {
            EntryKey::LegacyGroup(id) => self.get_legacy_group(id).map(GroupEntry::LegacyGroup),
            EntryKey::Community(server, room) => {
                let server = self.communities_dict()?.get(server)?.as_dict()?;
                let room = server.get(KEY_ROOMS)?.as_dict()?.get(room)?.as_dict()?;
                Community::from_dicts(server, room).map(GroupEntry::Community)
            }
        }
    }

    fn erase_entry(&mut self, key: &EntryKey) -> bool {
        match key {
            EntryKey::LegacyGroup(id) => self.erase_legacy_group(id),
            EntryKey::Community(server, room) => self.erase_community_key(server, room),
        }
    }
}

/// First key of `dict` past `after` whose entry is `usable`
fn next_key<'a>(
    dict: &'a Dict,
    after: Option<&str>,
    usable: impl Fn(&str, &Value) -> bool,
) -> Option<&'a str> {
    let start = after.map_or(Bound::Unbounded, Bound::Excluded);
    dict.range::<str, _>((start, Bound::Unbounded))
        .find(|(key, value)| usable(key.as_str(), *value))
        .map(|(key, _)| key.as_str())
}

impl ConfigType for UserGroups {
    const NAMESPACE: Namespace = Namespace::UserGroups;

    fn base(&self) -> &ConfigBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConfigBase {
        &mut self.base
    }
}

/// Iteration over the conversation list that may erase as it goes.
///
/// Holds the config mutably, so no other edit can happen while it lives.
pub struct GroupsCursor<'a> {
    groups: &'a mut UserGroups,
    current: Option<EntryKey>,
}

impl GroupsCursor<'_> {
    /// Conversation under the cursor, None once exhausted
    pub fn current(&self) -> Option<GroupEntry> {
        self.groups.entry(self.current.as_ref()?)
    }

    pub fn is_done(&self) -> bool {
        self.current.is_none()
    }

    /// Move to the next conversation; returns false once exhausted
    pub fn advance(&mut self) -> bool {
        if let Some(key) = self.current.take() {
            self.current = self.groups.entry_after(Some(&key));
        }
        self.current.is_some()
    }

    /// Remove the conversation under the cursor and move to the next one
    pub fn erase_current(&mut self) -> SyncResult<GroupEntry> {
        let key = self.current.take().ok_or_else(|| {
            SyncError::ContractViolation("erase through an exhausted group cursor".to_string())
        })?;
        let entry = self.groups.entry(&key).ok_or_else(|| {
            SyncError::ContractViolation("cursor entry vanished".to_string())
        })?;
        self.groups.erase_entry(&key);
        self.current = self.groups.entry_after(Some(&key));
        Ok(entry)
    }
}
