/*
    core_groups - Group and community memberships

    Components:
    - SessionId: validated `05`-prefixed account ids
    - MemberTable: ordered member set with cursor erase
    - LegacyGroup / Community: typed records stored in the tree
    - url: base URL and room token normalization for community lookup
    - UserGroups: the config type holding both record kinds
*/

pub mod communities;
pub mod legacy_group;
pub mod member_table;
pub mod notifications;
pub mod session_id;
pub mod url;
pub mod user_groups;

pub use communities::Community;
pub use legacy_group::{EncryptionKeypair, LegacyGroup};
pub use member_table::{Member, MemberCursor, MemberTable};
pub use notifications::NotificationMode;
pub use session_id::SessionId;
pub use url::normalize_base_url;
pub use user_groups::{GroupEntry, GroupsCursor, UserGroups};
