//! Two devices editing one profile and converging
//!
//! Run with:
//! ```bash
//! SWARMCONF_LOG_LEVEL=debug cargo run --example sync_demo
//! ```

use swarmconf_core::core_config::{ConfigType, IncomingSnapshot, PushData, UserProfile};
use swarmconf_core::logging::{init_logging_with_config, LogConfig};
use swarmconf_core::Settings;
use tracing::info;

fn relay(push: &PushData) -> IncomingSnapshot {
    IncomingSnapshot {
        hash: push.hash,
        ciphertext: push.ciphertext.clone(),
        parents: push.parents.clone(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_logging_with_config(LogConfig::from_settings(&settings.logging)?)?;
    swarmconf_core::metrics::init_metrics();

    let secret = [0x42u8; 32];
    let mut phone = UserProfile::with_settings(&secret, None, settings.clone())?;
    let mut laptop = UserProfile::with_settings(&secret, None, settings)?;

    // Concurrent edits on both devices
    phone.set_name("Alice");
    laptop.set_nts_priority(1);

    let from_phone = phone.push()?;
    let from_laptop = laptop.push()?;
    info!(phone = %from_phone.hash, laptop = %from_laptop.hash, "Both devices pushed");

    phone.merge(vec![relay(&from_laptop)]);
    laptop.merge(vec![relay(&from_phone)]);

    // Both built the same merge snapshot
    let merged_phone = phone.push()?;
    let merged_laptop = laptop.push()?;
    info!(
        hash = %merged_phone.hash,
        identical = merged_phone.hash == merged_laptop.hash,
        obsolete = merged_phone.obsolete.len(),
        "Merged"
    );
    info!(
        name = phone.name().unwrap_or_default(),
        priority = laptop.nts_priority(),
        "Converged profile"
    );

    Ok(())
}
