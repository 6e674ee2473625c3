//! Per-conversation notification setting

use crate::core_codec::defaults::NOTIFICATIONS;
use crate::core_codec::Dict;

/// How a conversation notifies; stored under `@`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i64)]
pub enum NotificationMode {
    /// Follow the client's global setting
    #[default]
    Defaulted = 0,
    All = 1,
    Disabled = 2,
    MentionsOnly = 3,
}

impl NotificationMode {
    /// Unknown values read as `Defaulted`
    pub fn from_int(value: i64) -> Self {
        match value {
            1 => NotificationMode::All,
            2 => NotificationMode::Disabled,
            3 => NotificationMode::MentionsOnly,
            _ => NotificationMode::Defaulted,
        }
    }

    pub fn as_int(self) -> i64 {
        self as i64
    }

    pub(crate) fn read(dict: &Dict) -> Self {
        Self::from_int(NOTIFICATIONS.get(dict))
    }

    pub(crate) fn write(self, dict: &mut Dict) {
        NOTIFICATIONS.put(dict, self.as_int());
    }
}
