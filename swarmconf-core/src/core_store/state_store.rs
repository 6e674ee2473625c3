/*
    state_store.rs - Mutable config tree with dirty tracking

    Holds the live data tree plus the last stamped copy of it. Edits only
    touch `data`; stamps are assigned lazily by `commit_pending`, which
    diffs `data` against the stamped copy. This keeps every `set` a plain
    map update and lets one push cover any number of edits.

    seqno is the depth of the snapshot currently being built. The first edit
    after a clean state opens a new snapshot (seqno + 1); further edits join
    it until the store is pushed.
*/

use super::stamps::{data_hash, stamp_changes, Stamp};
use crate::core_codec::{Dict, Value};

/// The mutable tree under one config object
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateStore {
    data: Dict,
    stamped: Dict,
    stamps: Dict,
    seqno: i64,
    dirty: bool,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from its persisted parts
    pub fn from_parts(data: Dict, stamped: Dict, stamps: Dict, seqno: i64, dirty: bool) -> Self {
        StateStore {
            data,
            stamped,
            stamps,
            seqno,
            dirty,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set a top-level key. Null or an empty dictionary removes it.
    ///
    /// Returns whether the tree changed.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        self.set_path(&[key], value)
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut dict = &self.data;
        for key in parents {
            dict = dict.get(*key)?.as_dict()?;
        }
        dict.get(*last)
    }

    /// Set a nested value, creating intermediate dictionaries as needed.
    ///
    /// A leaf standing where an intermediate dictionary is required gets
    /// replaced. Dictionaries emptied by a removal are pruned all the way up.
    pub fn set_path(&mut self, path: &[&str], value: Value) -> bool {
        if path.is_empty() {
            return false;
        }
        let changed = set_in(&mut self.data, path, value.pruned());
        if changed {
            self.mark_dirty();
        }
        changed
    }

    /// Look up the dictionary at `path`, if there is one
    pub fn dict_at(&self, path: &[&str]) -> Option<&Dict> {
        if path.is_empty() {
            return Some(&self.data);
        }
        self.get_path(path)?.as_dict()
    }

    pub fn data(&self) -> &Dict {
        &self.data
    }

    pub fn stamped(&self) -> &Dict {
        &self.stamped
    }

    pub fn stamps(&self) -> &Dict {
        &self.stamps
    }

    pub fn seqno(&self) -> i64 {
        self.seqno
    }

    /// Whether the store holds state that has not been pushed
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Whether `data` carries edits that have no stamps yet
    pub fn has_pending(&self) -> bool {
        self.data != self.stamped
    }

    /// Stamp every edit made since the last commit.
    ///
    /// Returns the stamp used, or None if nothing was pending.
    pub fn commit_pending(&mut self) -> Option<Stamp> {
        if !self.has_pending() {
            return None;
        }
        let stamp = Stamp {
            seqno: self.seqno,
            data_hash: data_hash(&self.data),
        };
        stamp_changes(&self.stamped, &self.data, &mut self.stamps, &stamp);
        self.stamped = self.data.clone();
        Some(stamp)
    }

    /// Replace the whole state with a merge result
    pub fn install(&mut self, data: Dict, stamps: Dict, seqno: i64, dirty: bool) {
        self.stamped = data.clone();
        self.data = data;
        self.stamps = stamps;
        self.seqno = seqno;
        self.dirty = dirty;
    }

    fn mark_dirty(&mut self) {
        if !self.dirty {
            self.seqno = self.seqno.saturating_add(1);
            self.dirty = true;
        }
    }
}

fn set_in(dict: &mut Dict, path: &[&str], value: Value) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };

    if rest.is_empty() {
        if value.is_vacant() {
            return dict.remove(*first).is_some();
        }
        if dict.get(*first) == Some(&value) {
            return false;
        }
        dict.insert(first.to_string(), value);
        return true;
    }

    let child_is_dict = matches!(dict.get(*first), Some(Value::Dict(_)));
    if !child_is_dict {
        if value.is_vacant() {
            return false;
        }
        dict.insert(first.to_string(), Value::Dict(Dict::new()));
    }

    let changed = match dict.get_mut(*first) {
        Some(Value::Dict(child)) => set_in(child, rest, value),
        _ => false,
    };
    if dict.get(*first).is_some_and(Value::is_vacant) {
        dict.remove(*first);
    }
    changed || !child_is_dict
}
