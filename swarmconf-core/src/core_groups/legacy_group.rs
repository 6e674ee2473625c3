/*
    legacy_group.rs - Legacy closed group record

    Stored under `C` keyed by the group's session id:

        n   name (always present, possibly empty)
        k   encryption public key, 32 bytes
        K   encryption secret key, 32 bytes
        E   disappearing message timer in minutes
        m   members {session_id: is_admin}
        +   priority
        j   joined-at timestamp
        @   notification mode
        !   mute-until timestamp

    The keypair is written only when both halves are present.
*/

use super::member_table::MemberTable;
use super::notifications::NotificationMode;
use super::session_id::SessionId;
use crate::core_codec::defaults::{DISAPPEARING_TIMER, JOINED_AT, MUTE_UNTIL, PRIORITY};
use crate::core_codec::{Dict, Value};
use crate::core_config::truncate_utf8;
use crate::errors::SyncResult;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const KEY_NAME: &str = "n";
const KEY_ENC_PUB: &str = "k";
const KEY_ENC_SEC: &str = "K";
const KEY_MEMBERS: &str = "m";

/// Shared encryption keypair of a legacy group
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKeypair {
    pub pubkey: [u8; 32],
    pub seckey: [u8; 32],
}

impl fmt::Debug for EncryptionKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKeypair")
            .field("pubkey", &hex::encode(self.pubkey))
            .field("seckey", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyGroup {
    session_id: SessionId,
    name: String,
    pub encryption_keypair: Option<EncryptionKeypair>,
    pub disappearing_timer_minutes: i64,
    pub priority: i64,
    pub joined_at: i64,
    pub notifications: NotificationMode,
    pub mute_until: i64,
    pub members: MemberTable,
}

impl LegacyGroup {
    /// Names longer than this are truncated at a char boundary
    pub const MAX_NAME_LEN: usize = 100;

    /// Empty group with default fields; fails on an invalid session id
    pub fn new(session_id: &str) -> SyncResult<Self> {
        Ok(Self::empty(SessionId::parse(session_id)?))
    }

    fn empty(session_id: SessionId) -> Self {
        LegacyGroup {
            session_id,
            name: String::new(),
            encryption_keypair: None,
            disappearing_timer_minutes: 0,
            priority: 0,
            joined_at: 0,
            notifications: NotificationMode::Defaulted,
            mute_until: 0,
            members: MemberTable::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name, truncated to MAX_NAME_LEN bytes
    pub fn set_name(&mut self, name: &str) {
        self.name = truncate_utf8(name, Self::MAX_NAME_LEN).to_string();
    }

    pub fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        dict.insert(KEY_NAME.to_string(), Value::from(self.name.as_str()));
        if let Some(keys) = &self.encryption_keypair {
            dict.insert(KEY_ENC_PUB.to_string(), Value::from(&keys.pubkey[..]));
            dict.insert(KEY_ENC_SEC.to_string(), Value::from(&keys.seckey[..]));
        }
        DISAPPEARING_TIMER.put(&mut dict, self.disappearing_timer_minutes);
        if !self.members.is_empty() {
            dict.insert(KEY_MEMBERS.to_string(), Value::Dict(self.members.to_dict()));
        }
        PRIORITY.put(&mut dict, self.priority);
        JOINED_AT.put(&mut dict, self.joined_at);
        self.notifications.write(&mut dict);
        MUTE_UNTIL.put(&mut dict, self.mute_until);
        dict
    }

    /// Read a stored record. Missing or mistyped fields take their defaults.
    pub fn from_dict(session_id: SessionId, dict: &Dict) -> Self {
        let mut group = Self::empty(session_id);
        if let Some(name) = dict.get(KEY_NAME).and_then(Value::as_str) {
            group.set_name(name);
        }
        let pubkey = dict.get(KEY_ENC_PUB).and_then(Value::as_bytes);
        let seckey = dict.get(KEY_ENC_SEC).and_then(Value::as_bytes);
        if let (Some(Ok(pubkey)), Some(Ok(seckey))) = (
            pubkey.map(<[u8; 32]>::try_from),
            seckey.map(<[u8; 32]>::try_from),
        ) {
            group.encryption_keypair = Some(EncryptionKeypair { pubkey, seckey });
        }
        group.disappearing_timer_minutes = DISAPPEARING_TIMER.get(dict);
        if let Some(members) = dict.get(KEY_MEMBERS).and_then(Value::as_dict) {
            group.members = MemberTable::from_dict(members);
        }
        group.priority = PRIORITY.get(dict);
        group.joined_at = JOINED_AT.get(dict);
        group.notifications = NotificationMode::read(dict);
        group.mute_until = MUTE_UNTIL.get(dict);
        group
    }
}
