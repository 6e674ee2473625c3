/*
    base.rs - Lifecycle shared by every config object

    A ConfigBase owns the state tree of one config type, the key it is
    sealed under and its position in the snapshot DAG:

    - parents   the snapshots the local snapshot supersedes
    - obsolete  hashes that replicas may delete

    When the store is clean the local snapshot is published and `active` is
    its hash; when dirty, `active` is the parent set the next push names.

    Dump layout (canonical dictionary, never encrypted):
        "#"  seqno            "&"  data          "~"  stamps
        "<"  parents          "-"  obsolete      "!"  dirty (omitted if false)
        "="  stamped data (omitted when equal to "&")
*/

use super::namespace::Namespace;
use crate::core_codec::{decode_with_limits, encode, Dict, Value};
use crate::core_crypto::{derive_key, open, seal_with_padding, ConfigKey, IdentitySeed};
use crate::core_merge::{
    merge_engine, HeadChange, LocalHead, MergeRejection, Snapshot, SnapshotHash, MAX_SEQNO,
};
use crate::core_store::stamps::check_coverage;
use crate::core_store::StateStore;
use crate::errors::{DecodeError, SyncError, SyncResult};
use crate::metrics::{self, Timer};
use crate::settings::Settings;
use std::collections::BTreeSet;
use tracing::{debug, warn};

const DUMP_SEQNO: &str = "#";
const DUMP_DATA: &str = "&";
const DUMP_STAMPS: &str = "~";
const DUMP_PARENTS: &str = "<";
const DUMP_OBSOLETE: &str = "-";
const DUMP_DIRTY: &str = "!";
const DUMP_STAMPED: &str = "=";

/// Sealed snapshot ready to be stored on a replica
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushData {
    pub namespace: Namespace,
    pub seqno: i64,
    pub hash: SnapshotHash,
    pub parents: Vec<SnapshotHash>,
    pub ciphertext: Vec<u8>,

    /// Hashes the replica may delete once this snapshot is stored
    pub obsolete: Vec<SnapshotHash>,
}

/// Snapshot as fetched from a replica
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingSnapshot {
    pub hash: SnapshotHash,
    pub ciphertext: Vec<u8>,

    /// Parent list as reported by the replica
    pub parents: Vec<SnapshotHash>,
}

/// Per-snapshot outcome of a merge call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub accepted: Vec<SnapshotHash>,
    pub rejected: Vec<MergeRejection>,
}

/// Position of the local state in the snapshot DAG
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeState {
    pub active: BTreeSet<SnapshotHash>,
    pub obsolete: BTreeSet<SnapshotHash>,
}

/// The state, key and sync bookkeeping of one config object
pub struct ConfigBase {
    namespace: Namespace,
    key: ConfigKey,
    settings: Settings,
    store: StateStore,
    parents: BTreeSet<SnapshotHash>,
    obsolete: BTreeSet<SnapshotHash>,
    /// Latest push and the obsolete hashes it handed out
    last_push: Option<(SnapshotHash, BTreeSet<SnapshotHash>)>,
    needs_dump: bool,
}

impl ConfigBase {
    /// Create a config object from the identity secret and an optional dump
    pub fn new(namespace: Namespace, secret: &[u8], dump: Option<&[u8]>) -> SyncResult<Self> {
        Self::with_settings(namespace, secret, dump, Settings::default())
    }

    pub fn with_settings(
        namespace: Namespace,
        secret: &[u8],
        dump: Option<&[u8]>,
        settings: Settings,
    ) -> SyncResult<Self> {
        settings
            .validate()
            .map_err(|e| SyncError::Validation(e.to_string()))?;

        let seed = IdentitySeed::from_secret(secret)?;
        let key = derive_key(&seed, namespace.encryption_domain(), namespace.id())?;

        let mut base = ConfigBase {
            namespace,
            key,
            settings,
            store: StateStore::new(),
            parents: BTreeSet::new(),
            obsolete: BTreeSet::new(),
            last_push: None,
            needs_dump: false,
        };
        if let Some(bytes) = dump {
            base.load_dump(bytes)?;
            debug!(namespace = %namespace, seqno = base.store.seqno(), "Loaded config dump");
        }
        Ok(base)
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn seqno(&self) -> i64 {
        self.store.seqno()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        self.store.get_path(path)
    }

    pub fn dict_at(&self, path: &[&str]) -> Option<&Dict> {
        self.store.dict_at(path)
    }

    pub fn set(&mut self, key: &str, value: Value) -> bool {
        self.set_path(&[key], value)
    }

    /// Set a nested value. The first edit after a clean state makes the
    /// published head the parent of the snapshot being built.
    pub fn set_path(&mut self, path: &[&str], value: Value) -> bool {
        let head = if self.store.dirty() {
            None
        } else {
            self.published_head().map(|s| s.hash)
        };

        let changed = self.store.set_path(path, value);
        if changed {
            if let Some(hash) = head {
                self.parents = BTreeSet::from([hash]);
            }
            self.needs_dump = true;
        }
        changed
    }

    pub fn needs_dump(&self) -> bool {
        self.needs_dump
    }

    pub fn needs_push(&self) -> bool {
        self.store.dirty()
    }

    pub fn merge_state(&self) -> MergeState {
        let active = if self.store.dirty() {
            self.parents.clone()
        } else {
            self.published_head().map(|s| s.hash).into_iter().collect()
        };
        MergeState {
            active,
            obsolete: self.obsolete.clone(),
        }
    }

    fn published_head(&self) -> Option<Snapshot> {
        (self.store.seqno() > 0 && !self.store.has_pending()).then(|| {
            Snapshot::build(
                self.store.seqno(),
                self.parents.clone(),
                self.store.data().clone(),
                self.store.stamps().clone(),
            )
        })
    }

    /// Stamp pending edits and describe the local snapshot
    fn local_head(&mut self) -> Option<LocalHead> {
        self.store.commit_pending();
        if self.store.seqno() == 0 {
            return None;
        }
        Some(LocalHead {
            snapshot: Snapshot::build(
                self.store.seqno(),
                self.parents.clone(),
                self.store.data().clone(),
                self.store.stamps().clone(),
            ),
            pushed: !self.store.dirty(),
        })
    }

    /// Seal the local snapshot for storage on a replica.
    ///
    /// A dirty store becomes clean: the snapshot is treated as published and
    /// the heads it supersedes become obsolete. Pushing a clean store
    /// re-seals the current head.
    pub fn push(&mut self) -> SyncResult<PushData> {
        let head = self
            .local_head()
            .ok_or_else(|| SyncError::ContractViolation("nothing to push".to_string()))?;
        let snapshot = head.snapshot;
        if snapshot.seqno >= MAX_SEQNO {
            return Err(SyncError::Validation(format!(
                "seqno {} leaves no room for descendants",
                snapshot.seqno
            )));
        }

        let ciphertext = seal_with_padding(
            &self.key,
            &snapshot.plaintext(),
            self.settings.crypto.pad_plaintext,
        )?;

        if !head.pushed {
            self.obsolete.extend(self.parents.iter().copied());
            self.store.clear_dirty();
            self.needs_dump = true;
            metrics::record_counter(metrics::PUSHES, 1);
        }
        self.obsolete.remove(&snapshot.hash);
        self.last_push = Some((snapshot.hash, self.obsolete.clone()));

        debug!(
            namespace = %self.namespace,
            hash = %snapshot.hash,
            seqno = snapshot.seqno,
            obsolete = self.obsolete.len(),
            "Prepared push"
        );

        Ok(PushData {
            namespace: self.namespace,
            seqno: snapshot.seqno,
            hash: snapshot.hash,
            parents: snapshot.parents.into_iter().collect(),
            ciphertext,
            obsolete: self.obsolete.iter().copied().collect(),
        })
    }

    /// Acknowledge that the push of `hash` was stored by the replica.
    ///
    /// The obsolete hashes handed out with that push are forgotten. Only the
    /// latest push can be confirmed; its obsolete list repeats every earlier
    /// unconfirmed one. Returns false for any other hash.
    pub fn confirm_pushed(&mut self, hash: &SnapshotHash) -> bool {
        if self.last_push.as_ref().map(|(pushed, _)| pushed) != Some(hash) {
            return false;
        }
        let Some((_, handed)) = self.last_push.take() else {
            return false;
        };
        let before = self.obsolete.len();
        self.obsolete.retain(|h| !handed.contains(h));
        self.needs_dump |= self.obsolete.len() != before;
        true
    }

    /// Fold snapshots fetched from replicas into the local state.
    ///
    /// Each snapshot is opened and validated on its own; a bad one is
    /// reported in `rejected` and the rest still merge.
    pub fn merge(&mut self, incoming: Vec<IncomingSnapshot>) -> MergeOutcome {
        let timer = Timer::new(metrics::MERGE_DURATION);
        let limit = self.settings.merge.max_snapshots_per_merge;

        let mut rejected = Vec::new();
        let mut snapshots = Vec::new();
        for (i, message) in incoming.into_iter().enumerate() {
            if i >= limit {
                rejected.push(MergeRejection {
                    hash: message.hash,
                    reason: format!("more than {} snapshots in one merge", limit),
                });
                continue;
            }
            match self.open_snapshot(&message) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    warn!(hash = %message.hash, error = %e, "Rejected snapshot");
                    rejected.push(MergeRejection {
                        hash: message.hash,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let local = self.local_head();
        let was_dirty = self.store.dirty();
        let result = merge_engine::merge(local, snapshots, &self.obsolete);
        rejected.extend(result.rejected);

        if let Some(head) = result.head {
            match result.change {
                HeadChange::Unchanged => {
                    if head.pushed && was_dirty {
                        self.store.clear_dirty();
                        self.needs_dump = true;
                    }
                }
                HeadChange::FastForward | HeadChange::Synthesized => {
                    if result.change == HeadChange::FastForward {
                        metrics::record_counter(metrics::FAST_FORWARDS, 1);
                    } else {
                        metrics::record_counter(metrics::MERGE_HEADS, 1);
                    }
                    let snapshot = head.snapshot;
                    self.store
                        .install(snapshot.data, snapshot.stamps, snapshot.seqno, !head.pushed);
                    self.parents = snapshot.parents;
                    self.needs_dump = true;
                }
            }
        }

        let before = self.obsolete.len();
        self.obsolete.extend(result.obsolete);
        self.needs_dump |= self.obsolete.len() != before;

        metrics::record_counter(metrics::SNAPSHOTS_ACCEPTED, result.accepted.len() as u64);
        metrics::record_counter(metrics::SNAPSHOTS_REJECTED, rejected.len() as u64);
        timer.stop();

        debug!(
            namespace = %self.namespace,
            accepted = result.accepted.len(),
            rejected = rejected.len(),
            seqno = self.store.seqno(),
            needs_push = self.store.dirty(),
            "Merged snapshots"
        );

        MergeOutcome {
            accepted: result.accepted,
            rejected,
        }
    }

    fn open_snapshot(&self, message: &IncomingSnapshot) -> SyncResult<Snapshot> {
        let plaintext = open(&self.key, &message.ciphertext)?;
        let snapshot = Snapshot::from_plaintext(&plaintext, &self.settings.codec.limits())?;

        if snapshot.hash != message.hash {
            return Err(SyncError::Validation(format!(
                "content hash {} does not match {}",
                snapshot.hash, message.hash
            )));
        }
        let claimed: BTreeSet<SnapshotHash> = message.parents.iter().copied().collect();
        if claimed != snapshot.parents {
            return Err(SyncError::Validation(
                "replica parent list does not match snapshot".to_string(),
            ));
        }
        Ok(snapshot)
    }

    /// Serialize the full local state; clears `needs_dump`
    pub fn dump(&mut self) -> Vec<u8> {
        let hashes = |set: &BTreeSet<SnapshotHash>| {
            Value::List(
                set.iter()
                    .map(|h| Value::Bytes(h.as_bytes().to_vec()))
                    .collect(),
            )
        };

        let mut dict = Dict::new();
        dict.insert(DUMP_SEQNO.to_string(), Value::Int(self.store.seqno()));
        dict.insert(DUMP_DATA.to_string(), Value::Dict(self.store.data().clone()));
        dict.insert(DUMP_STAMPS.to_string(), Value::Dict(self.store.stamps().clone()));
        dict.insert(DUMP_PARENTS.to_string(), hashes(&self.parents));
        dict.insert(DUMP_OBSOLETE.to_string(), hashes(&self.obsolete));
        if self.store.dirty() {
            dict.insert(DUMP_DIRTY.to_string(), Value::Bool(true));
        }
        if self.store.has_pending() {
            dict.insert(
                DUMP_STAMPED.to_string(),
                Value::Dict(self.store.stamped().clone()),
            );
        }

        self.needs_dump = false;
        encode(&Value::Dict(dict))
    }

    fn load_dump(&mut self, bytes: &[u8]) -> SyncResult<()> {
        let value = decode_with_limits(bytes, &self.settings.codec.limits())?;
        let Value::Dict(mut dict) = value else {
            return Err(corrupt("dump is not a dictionary"));
        };

        let seqno = match dict.remove(DUMP_SEQNO) {
            Some(Value::Int(n)) if n >= 0 => n,
            _ => return Err(corrupt("missing seqno")),
        };
        let data = take_dict(&mut dict, DUMP_DATA)?;
        let stamps = take_dict(&mut dict, DUMP_STAMPS)?;
        let parents = take_hashes(&mut dict, DUMP_PARENTS)?;
        let obsolete = take_hashes(&mut dict, DUMP_OBSOLETE)?;
        let dirty = match dict.remove(DUMP_DIRTY) {
            None => false,
            Some(Value::Bool(true)) => true,
            Some(_) => return Err(corrupt("malformed dirty flag")),
        };
        let stamped = match dict.remove(DUMP_STAMPED) {
            None => data.clone(),
            Some(Value::Dict(d)) => d,
            Some(_) => return Err(corrupt("malformed stamped tree")),
        };
        if let Some(key) = dict.keys().next() {
            return Err(corrupt(&format!("unknown key '{}'", key)));
        }

        if Value::Dict(data.clone()).pruned() != Value::Dict(data.clone()) {
            return Err(corrupt("data tree holds vacant values"));
        }
        check_coverage(&stamped, &stamps).map_err(|e| corrupt(&e))?;
        if seqno == 0 && !(data.is_empty() && stamps.is_empty()) {
            return Err(corrupt("content without a seqno"));
        }

        self.store = StateStore::from_parts(data, stamped, stamps, seqno, dirty);
        self.parents = parents;
        self.obsolete = obsolete;
        Ok(())
    }
}

fn corrupt(reason: &str) -> SyncError {
    SyncError::Decode(DecodeError::Structure(format!("corrupt dump: {}", reason)))
}

fn take_dict(dict: &mut Dict, key: &str) -> SyncResult<Dict> {
    match dict.remove(key) {
        Some(Value::Dict(d)) => Ok(d),
        _ => Err(corrupt(&format!("missing '{}'", key))),
    }
}

fn take_hashes(dict: &mut Dict, key: &str) -> SyncResult<BTreeSet<SnapshotHash>> {
    let Some(Value::List(items)) = dict.remove(key) else {
        return Err(corrupt(&format!("missing '{}'", key)));
    };
    items
        .iter()
        .map(|item| {
            item.as_bytes()
                .and_then(SnapshotHash::from_slice)
                .ok_or_else(|| corrupt("malformed hash"))
        })
        .collect()
}

/// Shared surface of the typed config objects
pub trait ConfigType {
    /// Namespace (and encryption domain) of this config type
    const NAMESPACE: Namespace;

    fn base(&self) -> &ConfigBase;

    fn base_mut(&mut self) -> &mut ConfigBase;

    fn needs_dump(&self) -> bool {
        self.base().needs_dump()
    }

    fn needs_push(&self) -> bool {
        self.base().needs_push()
    }

    fn dump(&mut self) -> Vec<u8> {
        self.base_mut().dump()
    }

    fn push(&mut self) -> SyncResult<PushData> {
        self.base_mut().push()
    }

    fn confirm_pushed(&mut self, hash: &SnapshotHash) -> bool {
        self.base_mut().confirm_pushed(hash)
    }

    fn merge(&mut self, incoming: Vec<IncomingSnapshot>) -> MergeOutcome {
        self.base_mut().merge(incoming)
    }

    fn seqno(&self) -> i64 {
        self.base().seqno()
    }
}
