/*
    communities.rs - Community records and their normalized lookup

    Stored under `o`, keyed by the base URL without its scheme:

        o: { "example.com": {
                #   server public key, 32 bytes
                R   { lower(room): {
                        u   normalized base URL, scheme included
                        n   room token as last written
                        + j @ !
                } }
        } }

    Lookups normalize the base URL and lower-case the room, so any spelling
    of the same community finds the same record while `room` and `u` keep
    what the most recent write of that room used. Rooms on one server share
    its public key.
*/

use super::notifications::NotificationMode;
use super::url::{normalize_base_url, room_key, url_key, validate_room};
use crate::core_codec::defaults::{JOINED_AT, MUTE_UNTIL, PRIORITY};
use crate::core_codec::{Dict, Value};
use crate::errors::{SyncError, SyncResult};

const KEY_URL: &str = "u";
pub(crate) const KEY_PUBKEY: &str = "#";
pub(crate) const KEY_ROOMS: &str = "R";
const KEY_ROOM_NAME: &str = "n";

/// Length of a community server public key
pub const COMMUNITY_PUBKEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    base_url: String,
    room: String,
    pubkey: [u8; COMMUNITY_PUBKEY_LEN],
    pub priority: i64,
    pub joined_at: i64,
    pub notifications: NotificationMode,
    pub mute_until: i64,
}

impl Community {
    /// New community with default fields. The base URL is normalized and
    /// the room kept exactly as given.
    pub fn new(base_url: &str, room: &str, pubkey: &[u8]) -> SyncResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        validate_room(room)?;
        Ok(Community {
            base_url,
            room: room.to_string(),
            pubkey: parse_pubkey(pubkey)?,
            priority: 0,
            joined_at: 0,
            notifications: NotificationMode::Defaulted,
            mute_until: 0,
        })
    }

    /// Normalized base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn pubkey(&self) -> &[u8; COMMUNITY_PUBKEY_LEN] {
        &self.pubkey
    }

    pub fn set_pubkey(&mut self, pubkey: &[u8]) -> SyncResult<()> {
        self.pubkey = parse_pubkey(pubkey)?;
        Ok(())
    }

    /// Change the case of the room token. Renaming to a different room is
    /// rejected.
    pub fn set_room(&mut self, room: &str) -> SyncResult<()> {
        validate_room(room)?;
        if room_key(room) != room_key(&self.room) {
            return Err(SyncError::Validation(format!(
                "{} is a different room than {}",
                room, self.room
            )));
        }
        self.room = room.to_string();
        Ok(())
    }

    /// Joinable URL: `<base_url>/<room>?public_key=<hex>`
    pub fn full_url(&self) -> String {
        format!(
            "{}/{}?public_key={}",
            self.base_url,
            self.room,
            hex::encode(self.pubkey)
        )
    }

    pub(crate) fn key(&self) -> (&str, String) {
        (url_key(&self.base_url), room_key(&self.room))
    }

    pub(crate) fn room_dict(&self) -> Dict {
        let mut dict = Dict::new();
        dict.insert(KEY_URL.to_string(), Value::from(self.base_url.as_str()));
        dict.insert(KEY_ROOM_NAME.to_string(), Value::from(self.room.as_str()));
        PRIORITY.put(&mut dict, self.priority);
        JOINED_AT.put(&mut dict, self.joined_at);
        self.notifications.write(&mut dict);
        MUTE_UNTIL.put(&mut dict, self.mute_until);
        dict
    }

    /// Rebuild a record from a server entry and one of its rooms.
    /// None if the stored entry is malformed.
    pub(crate) fn from_dicts(server: &Dict, room: &Dict) -> Option<Self> {
        let base_url = room.get(KEY_URL).and_then(Value::as_str)?;
        let pubkey = server.get(KEY_PUBKEY).and_then(Value::as_bytes)?;
        let room_name = room.get(KEY_ROOM_NAME).and_then(Value::as_str)?;
        Some(Community {
            base_url: base_url.to_string(),
            room: room_name.to_string(),
            pubkey: pubkey.try_into().ok()?,
            priority: PRIORITY.get(room),
            joined_at: JOINED_AT.get(room),
            notifications: NotificationMode::read(room),
            mute_until: MUTE_UNTIL.get(room),
        })
    }
}

fn parse_pubkey(pubkey: &[u8]) -> SyncResult<[u8; COMMUNITY_PUBKEY_LEN]> {
    pubkey.try_into().map_err(|_| {
        SyncError::Validation(format!(
            "community pubkey must be {} bytes, got {}",
            COMMUNITY_PUBKEY_LEN,
            pubkey.len()
        ))
    })
}

/// Normalized lookup key for `(base_url, room)`, None for invalid input
pub(crate) fn lookup_key(base_url: &str, room: &str) -> Option<(String, String)> {
    let url = normalize_base_url(base_url).ok()?;
    validate_room(room).ok()?;
    Some((url_key(&url).to_string(), room_key(room)))
}

/// Find a community in the `o` dictionary
pub(crate) fn find(communities: &Dict, base_url: &str, room: &str) -> Option<Community> {
    let (server_key, room_key) = lookup_key(base_url, room)?;
    let server = communities.get(&server_key)?.as_dict()?;
    let room = server
        .get(KEY_ROOMS)?
        .as_dict()?
        .get(&room_key)?
        .as_dict()?;
    Community::from_dicts(server, room)
}

/// Every well-formed community in the `o` dictionary with its server and
/// room keys, in key order
pub(crate) fn all(communities: &Dict) -> impl Iterator<Item = (&str, &str, Community)> + '_ {
    communities
        .iter()
        .filter_map(|(server_key, server)| Some((server_key, server.as_dict()?)))
        .flat_map(|(server_key, server)| {
            server
                .get(KEY_ROOMS)
                .and_then(Value::as_dict)
                .into_iter()
                .flatten()
                .filter_map(move |(room_key, room)| {
                    let community = Community::from_dicts(server, room.as_dict()?)?;
                    Some((server_key.as_str(), room_key.as_str(), community))
                })
        })
}
