pub mod core_codec;
pub mod core_config;
pub mod core_crypto;
pub mod core_groups;
pub mod core_merge;
pub mod core_store;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod settings;

#[cfg(test)]
pub mod test_utils;

pub use core_config::{ConfigBase, ConfigType, IncomingSnapshot, Namespace, PushData, UserProfile};
pub use core_groups::{Community, LegacyGroup, UserGroups};
pub use errors::{DecodeError, SyncError, SyncResult};
pub use logging::{init_logging, LogLevel};
pub use settings::Settings;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Ensure the main exports are accessible
        let _ = LogLevel::Info;
        let _ = Namespace::UserGroups;
        let _ = Settings::default();
    }
}
