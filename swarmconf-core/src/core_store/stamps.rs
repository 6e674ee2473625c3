/*
    stamps.rs - Per-field write stamps

    The stamps tree mirrors the data tree. Every non-dictionary leaf of the
    data has a stamp at the same path recording which snapshot last wrote
    it: [seqno, data_hash]. A stamp with no data beside it is a tombstone
    and records a deletion.

    Stamps are totally ordered by (seqno, data_hash). Two stamps can only be
    equal if they come from snapshots with identical data trees, so equal
    stamps always carry equal values.
*/

use crate::core_codec::{encode, Dict, Value};
use std::collections::BTreeSet;

/// Length of a BLAKE3 digest
pub const HASH_LEN: usize = 32;

/// Stamp attached to a leaf of the data tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp {
    /// Depth of the writing snapshot in the snapshot DAG
    pub seqno: i64,

    /// BLAKE3 of the writing snapshot's data tree
    pub data_hash: [u8; HASH_LEN],
}

impl Stamp {
    pub fn to_value(&self) -> Value {
        Value::List(vec![
            Value::Int(self.seqno),
            Value::Bytes(self.data_hash.to_vec()),
        ])
    }

    pub fn from_value(value: &Value) -> Option<Stamp> {
        match value.as_list()? {
            [Value::Int(seqno), Value::Bytes(hash)] if *seqno >= 1 => {
                let data_hash: [u8; HASH_LEN] = hash.as_slice().try_into().ok()?;
                Some(Stamp {
                    seqno: *seqno,
                    data_hash,
                })
            }
            _ => None,
        }
    }
}

/// BLAKE3 over the canonical encoding of a data tree
pub fn data_hash(data: &Dict) -> [u8; HASH_LEN] {
    let bytes = encode(&Value::Dict(data.clone()));
    *blake3::hash(&bytes).as_bytes()
}

/// Stamp every leaf that differs between `base` and `data`.
///
/// New and changed leaves get `stamp`; leaves present in `base` but gone from
/// `data` get `stamp` as a tombstone. Existing stamps of unchanged leaves and
/// older tombstones are kept.
pub fn stamp_changes(base: &Dict, data: &Dict, stamps: &mut Dict, stamp: &Stamp) {
    let empty = Dict::new();
    let keys: BTreeSet<&String> = base.keys().chain(data.keys()).collect();

    for key in keys {
        match (base.get(key), data.get(key)) {
            (Some(b), Some(d)) if b == d => {}
            (Some(Value::Dict(b)), Some(Value::Dict(d))) => {
                stamp_changes(b, d, subtree_mut(stamps, key), stamp);
            }
            (Some(Value::Dict(b)), None) => {
                stamp_changes(b, &empty, subtree_mut(stamps, key), stamp);
            }
            (_, Some(Value::Dict(d))) => {
                stamp_changes(&empty, d, subtree_mut(stamps, key), stamp);
            }
            _ => {
                stamps.insert(key.clone(), stamp.to_value());
            }
        }
    }
}

/// Make `stamps[key]` a dictionary (replacing a leaf stamp) and return it
fn subtree_mut<'a>(stamps: &'a mut Dict, key: &str) -> &'a mut Dict {
    let entry = stamps
        .entry(key.to_string())
        .or_insert_with(|| Value::Dict(Dict::new()));
    if !entry.is_dict() {
        *entry = Value::Dict(Dict::new());
    }
    match entry {
        Value::Dict(d) => d,
        _ => unreachable!("stamp entry was just made a dictionary"),
    }
}

/// Verify that every data leaf has a stamp and the stamps tree is well formed
pub fn check_coverage(data: &Dict, stamps: &Dict) -> Result<(), String> {
    for (key, value) in data {
        match (value, stamps.get(key)) {
            (Value::Null, _) => return Err(format!("null value at '{}'", key)),
            (Value::Dict(d), _) if d.is_empty() => {
                return Err(format!("empty dictionary at '{}'", key));
            }
            (Value::Dict(d), Some(Value::Dict(s))) => check_coverage(d, s)?,
            (Value::Dict(_), _) => return Err(format!("missing stamp subtree for '{}'", key)),
            (_, Some(s)) if Stamp::from_value(s).is_some() => {}
            _ => return Err(format!("missing stamp for '{}'", key)),
        }
    }

    for (key, s) in stamps {
        if !data.contains_key(key) && !is_stamp_tree(s) {
            return Err(format!("malformed tombstone for '{}'", key));
        }
    }
    Ok(())
}

fn is_stamp_tree(value: &Value) -> bool {
    match value {
        Value::Dict(d) => d.values().all(is_stamp_tree),
        other => Stamp::from_value(other).is_some(),
    }
}

/// Greatest stamp found anywhere in a stamps tree
pub fn max_stamp(stamps: &Dict) -> Option<Stamp> {
    stamps
        .values()
        .filter_map(|v| match v {
            Value::Dict(d) => max_stamp(d),
            other => Stamp::from_value(other),
        })
        .max()
}

/// Highest seqno found anywhere in a stamps tree
pub fn max_seqno(stamps: &Dict) -> i64 {
    max_stamp(stamps).map_or(0, |s| s.seqno)
}
