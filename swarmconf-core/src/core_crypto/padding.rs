//! Plaintext padding before encryption
//!
//! Config snapshots are padded to bucket sizes so replicas cannot infer how
//! many groups or contacts a user has from ciphertext length.
//!
//! Format: [VERSION:1][ORIGINAL_LEN:4][PAYLOAD:N][ZERO FILL:M]
//!
//! Buckets: 256, 1024, 4096, 16384, 65536; above that, the next multiple of
//! 65536.

use crate::errors::{SyncError, SyncResult};

const PADDING_BUCKETS: &[usize] = &[256, 1024, 4096, 16384, 65536];

/// Payloads above the largest bucket round up to multiples of this
const LARGE_STEP: usize = 65536;

const PADDING_VERSION: u8 = 0x01;

const HEADER_SIZE: usize = 5;

/// Size of the padded buffer for a payload of `len` bytes
pub fn padded_size(len: usize) -> usize {
    let content = HEADER_SIZE + len;
    PADDING_BUCKETS
        .iter()
        .find(|&&size| size >= content)
        .copied()
        .unwrap_or_else(|| content.div_ceil(LARGE_STEP) * LARGE_STEP)
}

/// Prefix the payload with the padding header and, if `fill` is set, zero
/// fill it to the bucket size.
pub fn pad(plaintext: &[u8], fill: bool) -> SyncResult<Vec<u8>> {
    let len = u32::try_from(plaintext.len()).map_err(|_| SyncError::Capacity {
        field: "plaintext",
        actual: plaintext.len(),
        max: u32::MAX as usize,
    })?;

    let target = if fill {
        padded_size(plaintext.len())
    } else {
        HEADER_SIZE + plaintext.len()
    };

    let mut padded = Vec::with_capacity(target);
    padded.push(PADDING_VERSION);
    padded.extend_from_slice(&len.to_be_bytes());
    padded.extend_from_slice(plaintext);
    padded.resize(target, 0);
    Ok(padded)
}

/// Strip padding; the fill must be all zeros
pub fn unpad(padded: &[u8]) -> SyncResult<Vec<u8>> {
    if padded.len() < HEADER_SIZE {
        return Err(SyncError::Authentication(format!(
            "padded payload too short: {} bytes",
            padded.len()
        )));
    }
    if padded[0] != PADDING_VERSION {
        return Err(SyncError::Authentication(format!(
            "unsupported padding version: 0x{:02x}",
            padded[0]
        )));
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&padded[1..HEADER_SIZE]);
    let original_len = u32::from_be_bytes(len_bytes) as usize;

    let body = &padded[HEADER_SIZE..];
    if original_len > body.len() {
        return Err(SyncError::Authentication(format!(
            "claimed length {} exceeds payload size {}",
            original_len,
            body.len()
        )));
    }
    if body[original_len..].iter().any(|&b| b != 0) {
        return Err(SyncError::Authentication("non-zero padding".to_string()));
    }

    Ok(body[..original_len].to_vec())
}
