//! Session ID module
//!
//! A session id is the account's public key in hex with a one-byte `05`
//! prefix: 66 hex characters in total.

use crate::errors::{SyncError, SyncResult};
use std::fmt;
use std::str::FromStr;

/// Hex length of a session id, prefix included
pub const SESSION_ID_LEN: usize = 66;

const PREFIX: &str = "05";

/// Validated session id, always stored in lower-case hex
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Parse a session id. Upper-case hex is accepted and lower-cased.
    pub fn parse(s: &str) -> SyncResult<Self> {
        if s.len() != SESSION_ID_LEN {
            return Err(SyncError::Validation(format!(
                "session id must be {} hex characters, got {}",
                SESSION_ID_LEN,
                s.len()
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SyncError::Validation(format!(
                "session id is not hex: {}",
                s
            )));
        }
        if !s.starts_with(PREFIX) {
            return Err(SyncError::Validation(format!(
                "session id must start with {}: {}",
                PREFIX, s
            )));
        }
        Ok(SessionId(s.to_ascii_lowercase()))
    }

    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = SyncError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(fill: char) -> String {
        format!("05{}", fill.to_string().repeat(64))
    }

    #[test]
    fn test_parse_valid() {
        let sid = SessionId::parse(&id('a')).unwrap();
        assert_eq!(sid.as_str(), id('a'));
    }

    #[test]
    fn test_upper_case_is_normalized() {
        let sid: SessionId = id('F').parse().unwrap();
        assert_eq!(sid.to_string(), id('f'));
        assert_eq!(sid, SessionId::parse(&id('f')).unwrap());
    }

    #[test]
    fn test_rejects_bad_ids() {
        // wrong length
        assert!(SessionId::parse("05abcd").is_err());
        // wrong prefix
        assert!(SessionId::parse(&format!("03{}", "a".repeat(64))).is_err());
        // not hex
        assert!(SessionId::parse(&format!("05{}", "g".repeat(64))).is_err());
        // multibyte chars must not sneak past the length check
        assert!(!SessionId::is_valid(&format!("05{}", "é".repeat(32))));
    }
}
