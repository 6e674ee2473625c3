//! Authenticated encryption of config snapshots
//!
//! Output format: nonce (24 bytes) || ciphertext || tag (16 bytes)
//!
//! XChaCha20-Poly1305 is used so the nonce can be drawn at random for every
//! seal without tracking counters across devices. The plaintext is padded
//! (see `padding`) before encryption.

use super::keys::ConfigKey;
use super::padding;
use crate::errors::{SyncError, SyncResult};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Key, XChaCha20Poly1305, XNonce,
};

/// Length of the random nonce prepended to every ciphertext
pub const NONCE_LEN: usize = 24;

/// Length of the Poly1305 authentication tag
pub const TAG_LEN: usize = 16;

fn cipher(key: &ConfigKey) -> XChaCha20Poly1305 {
    XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
}

/// Pad and encrypt `plaintext` under a fresh random nonce
pub fn seal(key: &ConfigKey, plaintext: &[u8]) -> SyncResult<Vec<u8>> {
    seal_with_padding(key, plaintext, true)
}

/// Same as `seal`, with control over bucket zero fill
pub fn seal_with_padding(key: &ConfigKey, plaintext: &[u8], fill: bool) -> SyncResult<Vec<u8>> {
    let padded = padding::pad(plaintext, fill)?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher(key)
        .encrypt(&nonce, padded.as_slice())
        .map_err(|e| SyncError::Authentication(format!("encryption failed: {}", e)))?;

    let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Verify and decrypt data produced by `seal`
pub fn open(key: &ConfigKey, data: &[u8]) -> SyncResult<Vec<u8>> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(SyncError::Authentication(format!(
            "ciphertext too short: {} bytes",
            data.len()
        )));
    }

    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    let padded = cipher(key)
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| SyncError::Authentication("authentication tag mismatch".to_string()))?;

    padding::unpad(&padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_crypto::keys::{derive_key, IdentitySeed};

    fn key(domain: &str) -> ConfigKey {
        let seed = IdentitySeed::from_secret(&[42u8; 32]).unwrap();
        derive_key(&seed, domain, 2).unwrap()
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let k = key("UserProfile");
        for msg in [&b""[..], &b"x"[..], &b"d1:ni1ee"[..], &[0u8; 5000][..]] {
            let sealed = seal(&k, msg).unwrap();
            assert_eq!(open(&k, &sealed).unwrap(), msg);
        }
    }

    #[test]
    fn test_nonce_uniqueness() {
        let k = key("UserProfile");
        let a = seal(&k, b"same").unwrap();
        let b = seal(&k, b"same").unwrap();

        assert_ne!(&a[..NONCE_LEN], &b[..NONCE_LEN]);
        assert_eq!(open(&k, &a).unwrap(), open(&k, &b).unwrap());
    }

    #[test]
    fn test_every_single_bit_flip_fails() {
        let k = key("UserProfile");
        let sealed = seal_with_padding(&k, b"d1:n5:alicee", false).unwrap();

        for byte in 0..sealed.len() {
            for bit in 0..8 {
                let mut corrupted = sealed.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    matches!(open(&k, &corrupted), Err(SyncError::Authentication(_))),
                    "flip of bit {} in byte {} was accepted",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = seal(&key("UserProfile"), b"secret").unwrap();
        assert!(matches!(
            open(&key("UserGroups"), &sealed),
            Err(SyncError::Authentication(_))
        ));
    }

    #[test]
    fn test_short_input_fails() {
        let k = key("UserProfile");
        assert!(open(&k, b"").is_err());
        assert!(open(&k, &[0u8; NONCE_LEN + TAG_LEN - 1]).is_err());
        assert!(open(&k, &[0u8; NONCE_LEN + TAG_LEN]).is_err());
    }

    #[test]
    fn test_padding_hides_length() {
        let k = key("UserProfile");
        let small = seal(&k, b"a").unwrap();
        let larger = seal(&k, &[b'a'; 200]).unwrap();
        assert_eq!(small.len(), larger.len());
    }
}
