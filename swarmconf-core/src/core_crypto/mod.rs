/*
    core_crypto - Key derivation and authenticated encryption

    Each config type's blobs are sealed under a key derived from the
    identity seed, the config's encryption domain and its namespace.
*/

pub mod keys;
pub mod padding;
pub mod sealed_box;

pub use keys::{derive_key, ConfigKey, IdentitySeed, KEY_LEN};
pub use sealed_box::{open, seal, seal_with_padding, NONCE_LEN, TAG_LEN};
