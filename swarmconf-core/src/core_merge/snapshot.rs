/*
    snapshot.rs - Content-addressed config snapshots

    Plaintext layout (a canonical dictionary):
        "#"  seqno
        "&"  data tree
        "<"  parent hashes, ascending, 32 bytes each
        "~"  stamps tree

    The hash is BLAKE3 over the canonical encoding of that dictionary, so it
    covers the parents and cannot be forged by a replica.
*/

use crate::core_codec::{decode_with_limits, encode, DecodeLimits, Dict, Value};
use crate::core_store::stamps::{check_coverage, max_seqno, HASH_LEN};
use crate::errors::{SyncError, SyncResult};
use std::collections::BTreeSet;
use std::fmt;

const KEY_SEQNO: &str = "#";
const KEY_DATA: &str = "&";
const KEY_PARENTS: &str = "<";
const KEY_STAMPS: &str = "~";

/// Highest seqno a snapshot may carry
pub const MAX_SEQNO: i64 = 1 << 62;

/// BLAKE3 hash identifying a snapshot
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotHash([u8; HASH_LEN]);

impl SnapshotHash {
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        SnapshotHash(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(SnapshotHash)
    }

    pub fn from_hex(s: &str) -> SyncResult<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| SyncError::Validation(format!("invalid snapshot hash: {}", e)))?;
        Self::from_slice(&bytes).ok_or_else(|| {
            SyncError::Validation(format!("snapshot hash must be {} bytes", HASH_LEN))
        })
    }

    /// Hash of a snapshot plaintext
    pub fn of(plaintext: &[u8]) -> Self {
        SnapshotHash(*blake3::hash(plaintext).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SnapshotHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SnapshotHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotHash({}..)", &self.to_hex()[..12])
    }
}

/// One version of a config tree as published by a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub hash: SnapshotHash,
    pub seqno: i64,
    pub parents: BTreeSet<SnapshotHash>,
    pub data: Dict,
    pub stamps: Dict,
}

impl Snapshot {
    /// Assemble a snapshot and compute its hash
    pub fn build(seqno: i64, parents: BTreeSet<SnapshotHash>, data: Dict, stamps: Dict) -> Self {
        let plaintext = plaintext_value(seqno, &parents, &data, &stamps);
        Snapshot {
            hash: SnapshotHash::of(&encode(&plaintext)),
            seqno,
            parents,
            data,
            stamps,
        }
    }

    pub fn to_value(&self) -> Value {
        plaintext_value(self.seqno, &self.parents, &self.data, &self.stamps)
    }

    /// Canonical plaintext bytes, the input to sealing and hashing
    pub fn plaintext(&self) -> Vec<u8> {
        encode(&self.to_value())
    }

    /// Decode and validate a snapshot plaintext
    pub fn from_plaintext(plaintext: &[u8], limits: &DecodeLimits) -> SyncResult<Self> {
        let value = decode_with_limits(plaintext, limits)?;
        Self::from_value(value)
    }

    /// Validate a decoded plaintext dictionary
    pub fn from_value(value: Value) -> SyncResult<Self> {
        let Value::Dict(mut dict) = value else {
            return Err(invalid("snapshot is not a dictionary"));
        };

        let seqno = match dict.remove(KEY_SEQNO) {
            Some(Value::Int(n)) if (1..=MAX_SEQNO).contains(&n) => n,
            _ => return Err(invalid("missing or invalid seqno")),
        };
        let data = match dict.remove(KEY_DATA) {
            Some(Value::Dict(d)) => d,
            _ => return Err(invalid("missing data tree")),
        };
        let stamps = match dict.remove(KEY_STAMPS) {
            Some(Value::Dict(d)) => d,
            _ => return Err(invalid("missing stamps tree")),
        };
        let parents = match dict.remove(KEY_PARENTS) {
            Some(Value::List(list)) => parse_parents(&list)?,
            _ => return Err(invalid("missing parent list")),
        };
        if let Some(key) = dict.keys().next() {
            return Err(invalid(&format!("unknown snapshot key '{}'", key)));
        }

        check_coverage(&data, &stamps).map_err(|e| invalid(&e))?;
        if max_seqno(&stamps) > seqno {
            return Err(invalid("stamp newer than snapshot"));
        }

        Ok(Self::build(seqno, parents, data, stamps))
    }
}

fn plaintext_value(
    seqno: i64,
    parents: &BTreeSet<SnapshotHash>,
    data: &Dict,
    stamps: &Dict,
) -> Value {
    let mut dict = Dict::new();
    dict.insert(KEY_SEQNO.to_string(), Value::Int(seqno));
    dict.insert(KEY_DATA.to_string(), Value::Dict(data.clone()));
    dict.insert(
        KEY_PARENTS.to_string(),
        Value::List(
            parents
                .iter()
                .map(|h| Value::Bytes(h.as_bytes().to_vec()))
                .collect(),
        ),
    );
    dict.insert(KEY_STAMPS.to_string(), Value::Dict(stamps.clone()));
    Value::Dict(dict)
}

/// Parent lists must be strictly ascending so their encoding is unique
fn parse_parents(list: &[Value]) -> SyncResult<BTreeSet<SnapshotHash>> {
    let mut parents = BTreeSet::new();
    let mut last: Option<SnapshotHash> = None;
    for item in list {
        let hash = item
            .as_bytes()
            .and_then(SnapshotHash::from_slice)
            .ok_or_else(|| invalid("malformed parent hash"))?;
        if last.is_some_and(|prev| prev >= hash) {
            return Err(invalid("parent hashes not strictly ascending"));
        }
        last = Some(hash);
        parents.insert(hash);
    }
    Ok(parents)
}

fn invalid(reason: &str) -> SyncError {
    SyncError::Validation(format!("invalid snapshot: {}", reason))
}
