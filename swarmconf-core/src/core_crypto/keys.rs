//! Key derivation for config encryption
//!
//! Every config type derives its own symmetric key from the identity seed.
//! The encryption domain and storage namespace are mixed into the HKDF info
//! string, so two config types under the same identity get unrelated keys and
//! leaking one of them exposes nothing about the others.

use crate::errors::{SyncError, SyncResult};
use hkdf::Hkdf;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the identity seed and of derived keys
pub const KEY_LEN: usize = 32;

/// Application-specific salt for HKDF
const HKDF_SALT: &[u8] = b"swarmconf-HKDF-Salt-v1";

/// Label prefixed to the HKDF info parameter
const CONFIG_KEY_LABEL: &[u8] = b"swarmconf-config-key-v1";

/// The 32-byte Ed25519 seed of the user's identity key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct IdentitySeed([u8; KEY_LEN]);

impl IdentitySeed {
    /// Accepts either the bare 32-byte seed or the 64-byte libsodium-style
    /// secret key (seed followed by the public key).
    pub fn from_secret(secret: &[u8]) -> SyncResult<Self> {
        match secret.len() {
            32 | 64 => {
                let mut seed = [0u8; KEY_LEN];
                seed.copy_from_slice(&secret[..KEY_LEN]);
                Ok(IdentitySeed(seed))
            }
            n => Err(SyncError::InvalidKey(format!(
                "identity secret must be 32 or 64 bytes, got {}",
                n
            ))),
        }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for IdentitySeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentitySeed(<redacted>)")
    }
}

/// Symmetric key for one config type
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ConfigKey([u8; KEY_LEN]);

impl ConfigKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        ConfigKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConfigKey(<redacted>)")
    }
}

/// Derive the encryption key for a config type.
///
/// info = label || domain || 0x00 || namespace (big-endian i16). The zero byte
/// keeps `("ab", n)` and `("a", n')` from colliding.
pub fn derive_key(seed: &IdentitySeed, domain: &str, namespace: i16) -> SyncResult<ConfigKey> {
    let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), seed.as_bytes());

    let mut info = Vec::with_capacity(CONFIG_KEY_LABEL.len() + domain.len() + 3);
    info.extend_from_slice(CONFIG_KEY_LABEL);
    info.extend_from_slice(domain.as_bytes());
    info.push(0);
    info.extend_from_slice(&namespace.to_be_bytes());

    let mut key = [0u8; KEY_LEN];
    hkdf.expand(&info, &mut key)
        .map_err(|e| SyncError::InvalidKey(format!("key derivation failed: {}", e)))?;
    Ok(ConfigKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> IdentitySeed {
        IdentitySeed::from_secret(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_secret_lengths() {
        assert!(IdentitySeed::from_secret(&[1u8; 32]).is_ok());
        assert!(IdentitySeed::from_secret(&[1u8; 64]).is_ok());
        assert!(matches!(
            IdentitySeed::from_secret(&[1u8; 31]),
            Err(SyncError::InvalidKey(_))
        ));
        assert!(matches!(
            IdentitySeed::from_secret(&[]),
            Err(SyncError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_full_secret_uses_seed_half() {
        let mut full = [0u8; 64];
        full[..32].copy_from_slice(&[7u8; 32]);
        full[32..].copy_from_slice(&[9u8; 32]);

        let a = derive_key(&IdentitySeed::from_secret(&full).unwrap(), "UserProfile", 2).unwrap();
        let b = derive_key(&seed(), "UserProfile", 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_key(&seed(), "UserProfile", 2).unwrap();
        let b = derive_key(&seed(), "UserProfile", 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_domain_separation() {
        let profile = derive_key(&seed(), "UserProfile", 2).unwrap();
        let groups = derive_key(&seed(), "UserGroups", 5).unwrap();
        let same_domain_other_ns = derive_key(&seed(), "UserProfile", 3).unwrap();

        assert_ne!(profile, groups);
        assert_ne!(profile, same_domain_other_ns);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = derive_key(&seed(), "UserProfile", 2).unwrap();
        assert_eq!(format!("{:?}", key), "ConfigKey(<redacted>)");
    }
}
