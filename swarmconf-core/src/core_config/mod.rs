/*
    core_config - Config objects and their sync lifecycle

    Each config type wraps a ConfigBase: construction from the identity
    secret and an optional dump, dump/needs_dump, push/needs_push,
    confirm_pushed and merge. Typed accessors read and write the reserved
    keys of their namespace.
*/

pub mod base;
pub mod namespace;
pub mod user_profile;

pub use base::{ConfigBase, ConfigType, IncomingSnapshot, MergeOutcome, MergeState, PushData};
pub use namespace::Namespace;
pub use user_profile::{ProfilePic, UserProfile};

/// Longest prefix of `s` that fits in `max` bytes without splitting a char
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
