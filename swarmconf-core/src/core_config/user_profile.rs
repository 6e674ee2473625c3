//! The user's own profile
//!
//! Keys:
//! - `n` display name
//! - `p` profile picture URL
//! - `q` 32-byte profile picture decryption key
//! - `+` priority of the Note to Self conversation

use super::base::{ConfigBase, ConfigType};
use super::namespace::Namespace;
use super::truncate_utf8;
use crate::core_codec::defaults::PRIORITY;
use crate::core_codec::Value;
use crate::errors::{SyncError, SyncResult};
use crate::settings::Settings;

const KEY_NAME: &str = "n";
const KEY_PIC_URL: &str = "p";
const KEY_PIC_KEY: &str = "q";

/// Length of a profile picture key
pub const PIC_KEY_LEN: usize = 32;

/// Profile picture location and decryption key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePic {
    pub url: String,
    pub key: [u8; PIC_KEY_LEN],
}

/// Display name, avatar and Note to Self priority
pub struct UserProfile {
    base: ConfigBase,
}

impl UserProfile {
    /// Names longer than this are truncated at a char boundary
    pub const MAX_NAME_LEN: usize = 100;

    pub fn new(secret: &[u8], dump: Option<&[u8]>) -> SyncResult<Self> {
        Self::with_settings(secret, dump, Settings::default())
    }

    pub fn with_settings(
        secret: &[u8],
        dump: Option<&[u8]>,
        settings: Settings,
    ) -> SyncResult<Self> {
        Ok(UserProfile {
            base: ConfigBase::with_settings(Self::NAMESPACE, secret, dump, settings)?,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.base.get(KEY_NAME).and_then(Value::as_str)
    }

    /// Set the display name; an empty name clears it
    pub fn set_name(&mut self, name: &str) {
        let name = truncate_utf8(name, Self::MAX_NAME_LEN);
        let value = if name.is_empty() {
            Value::Null
        } else {
            Value::from(name)
        };
        self.base.set(KEY_NAME, value);
    }

    /// The profile picture, if both URL and key are set
    pub fn profile_pic(&self) -> Option<ProfilePic> {
        let url = self.base.get(KEY_PIC_URL).and_then(Value::as_str)?;
        let key = self.base.get(KEY_PIC_KEY).and_then(Value::as_bytes)?;
        Some(ProfilePic {
            url: url.to_string(),
            key: key.try_into().ok()?,
        })
    }

    /// Set the profile picture. An empty URL or key clears both.
    pub fn set_profile_pic(&mut self, url: &str, key: &[u8]) -> SyncResult<()> {
        if url.is_empty() || key.is_empty() {
            self.base.set(KEY_PIC_URL, Value::Null);
            self.base.set(KEY_PIC_KEY, Value::Null);
            return Ok(());
        }
        if key.len() != PIC_KEY_LEN {
            return Err(SyncError::Validation(format!(
                "profile picture key must be {} bytes, got {}",
                PIC_KEY_LEN,
                key.len()
            )));
        }
        self.base.set(KEY_PIC_URL, Value::from(url));
        self.base.set(KEY_PIC_KEY, Value::from(key));
        Ok(())
    }

    /// Note to Self priority: <0 hidden, 0 unpinned, >0 pinned
    pub fn nts_priority(&self) -> i64 {
        PRIORITY.get(self.base.store().data())
    }

    pub fn set_nts_priority(&mut self, priority: i64) {
        self.base.set(PRIORITY.key, PRIORITY.to_value(priority));
    }
}

impl ConfigType for UserProfile {
    const NAMESPACE: Namespace = Namespace::UserProfile;

    fn base(&self) -> &ConfigBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConfigBase {
        &mut self.base
    }
}
