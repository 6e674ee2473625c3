//! Storage namespaces of the config types

use crate::errors::SyncError;
use std::fmt;

/// Replica storage bucket of a config type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i16)]
pub enum Namespace {
    UserProfile = 2,
    Contacts = 3,
    ConvoInfoVolatile = 4,
    UserGroups = 5,
    ClosedGroupInfo = 11,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::UserProfile,
        Namespace::Contacts,
        Namespace::ConvoInfoVolatile,
        Namespace::UserGroups,
        Namespace::ClosedGroupInfo,
    ];

    pub fn id(self) -> i16 {
        self as i16
    }

    /// String mixed into key derivation for this config type
    pub fn encryption_domain(self) -> &'static str {
        match self {
            Namespace::UserProfile => "UserProfile",
            Namespace::Contacts => "Contacts",
            Namespace::ConvoInfoVolatile => "ConvoInfoVolatile",
            Namespace::UserGroups => "UserGroups",
            Namespace::ClosedGroupInfo => "ClosedGroupInfo",
        }
    }
}

impl TryFrom<i16> for Namespace {
    type Error = SyncError;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.id() == id)
            .ok_or_else(|| SyncError::Validation(format!("unknown namespace {}", id)))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.encryption_domain(), self.id())
    }
}
