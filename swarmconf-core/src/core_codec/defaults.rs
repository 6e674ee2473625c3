/*
    defaults.rs - Omit-default field rules

    Integer fields that hold their default are left out of the tree
    entirely; reading a missing field yields the default. Every typed record
    writes its defaultable fields through one of these rules so the wire form
    stays minimal and two devices never disagree on "0" vs "absent".
*/

use super::value::{Dict, Value};

/// An integer field omitted from its dictionary while at its default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub key: &'static str,
    pub default: i64,
}

impl FieldRule {
    pub const fn int(key: &'static str, default: i64) -> Self {
        FieldRule { key, default }
    }

    /// Store `value`, or remove the key when it equals the default
    pub fn put(&self, dict: &mut Dict, value: i64) {
        if value == self.default {
            dict.remove(self.key);
        } else {
            dict.insert(self.key.to_string(), Value::Int(value));
        }
    }

    /// Value to store for `value`: null (removal) at the default
    pub fn to_value(&self, value: i64) -> Value {
        if value == self.default {
            Value::Null
        } else {
            Value::Int(value)
        }
    }

    /// Read the field, falling back to the default when missing or mistyped
    pub fn get(&self, dict: &Dict) -> i64 {
        dict.get(self.key)
            .and_then(Value::as_int)
            .unwrap_or(self.default)
    }
}

/// Pin priority: <0 hidden, 0 unpinned, >0 pinned
pub const PRIORITY: FieldRule = FieldRule::int("+", 0);

/// Unix timestamp the conversation was joined
pub const JOINED_AT: FieldRule = FieldRule::int("j", 0);

/// Notification mode discriminant
pub const NOTIFICATIONS: FieldRule = FieldRule::int("@", 0);

/// Unix timestamp notifications are muted until
pub const MUTE_UNTIL: FieldRule = FieldRule::int("!", 0);

/// Disappearing message timer in minutes, 0 = disabled
pub const DISAPPEARING_TIMER: FieldRule = FieldRule::int("E", 0);
