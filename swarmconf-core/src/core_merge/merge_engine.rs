/*
    merge_engine.rs - Convergent reconciliation of concurrent snapshots

    Any set of snapshots folds into one deterministic tree:
    1. Drop snapshots already known obsolete or equal to the local head
    2. Reject snapshots with no seqno left for descendants, and those
       whose seqno does not exceed a known parent's
    3. Heads = snapshots no other snapshot names as a parent
    4. Join the heads leaf by leaf; the greatest stamp wins
    5. Adopt a published head equal to the join, or synthesize a merge head

    The join is a semilattice (commutative, associative, idempotent), so
    devices that have seen the same snapshots end up with the same tree no
    matter how the snapshots were batched or ordered.
*/

use super::snapshot::{Snapshot, SnapshotHash, MAX_SEQNO};
use crate::core_codec::{encode, Dict, Value};
use crate::core_store::stamps::{max_stamp, Stamp};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace, warn};

/// The local device's current snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHead {
    pub snapshot: Snapshot,

    /// Whether this snapshot has been published to a replica
    pub pushed: bool,
}

/// A snapshot that was refused, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRejection {
    pub hash: SnapshotHash,
    pub reason: String,
}

/// How the local head moved during a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadChange {
    /// The local head stayed as it was
    Unchanged,
    /// The local head was replaced by a published snapshot
    FastForward,
    /// A new merge head was built and needs pushing
    Synthesized,
}

/// Result of folding snapshots into the local state
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// New local head, None only when there was nothing at all
    pub head: Option<LocalHead>,
    pub change: HeadChange,

    /// Hashes that no longer need to be stored
    pub obsolete: BTreeSet<SnapshotHash>,

    pub accepted: Vec<SnapshotHash>,
    pub rejected: Vec<MergeRejection>,
}

/// Fold `incoming` snapshots into the local head.
pub fn merge(
    local: Option<LocalHead>,
    incoming: Vec<Snapshot>,
    known_obsolete: &BTreeSet<SnapshotHash>,
) -> MergeResult {
    let mut local = local;
    let mut accepted = Vec::new();
    let mut candidates: BTreeMap<SnapshotHash, Snapshot> = BTreeMap::new();

    for snapshot in incoming {
        if known_obsolete.contains(&snapshot.hash) {
            trace!(hash = %snapshot.hash, "Skipping obsolete snapshot");
            accepted.push(snapshot.hash);
            continue;
        }
        if let Some(head) = local.as_mut() {
            if head.snapshot.hash == snapshot.hash {
                // Someone published exactly our unpushed head
                head.pushed = true;
                accepted.push(snapshot.hash);
                continue;
            }
        }
        candidates.entry(snapshot.hash).or_insert(snapshot);
    }

    let mut rejected = reject_exhausted(&mut candidates);
    rejected.extend(reject_rank_inversions(
        local.as_ref().map(|l| &l.snapshot),
        &mut candidates,
    ));
    accepted.extend(candidates.keys().copied());

    let mut all: Vec<&Snapshot> = candidates.values().collect();
    if let Some(head) = &local {
        all.push(&head.snapshot);
    }

    let named: BTreeSet<SnapshotHash> = all
        .iter()
        .flat_map(|s| s.parents.iter().copied())
        .collect();
    let heads: Vec<&Snapshot> = all
        .iter()
        .copied()
        .filter(|s| !named.contains(&s.hash))
        .collect();

    let unpushed_local = local
        .as_ref()
        .filter(|l| !l.pushed)
        .map(|l| l.snapshot.hash);
    let is_published = |hash: SnapshotHash| Some(hash) != unpushed_local;
    let local_hash = local.as_ref().map(|l| l.snapshot.hash);

    let mut obsolete = named.clone();

    let (head, change) = match heads.as_slice() {
        [] => (None, HeadChange::Unchanged),
        [only] => adopt(only, local_hash, is_published(only.hash)),
        _ => {
            let (data, stamps) = join_heads(&heads);

            let adoptable = heads
                .iter()
                .filter(|h| is_published(h.hash) && h.data == data && h.stamps == stamps)
                .max_by_key(|h| (h.seqno, h.hash));

            match adoptable {
                Some(winner) => {
                    debug!(hash = %winner.hash, heads = heads.len(), "Heads collapse onto one snapshot");
                    obsolete.extend(
                        heads
                            .iter()
                            .map(|h| h.hash)
                            .filter(|h| *h != winner.hash && Some(*h) != unpushed_local),
                    );
                    adopt(winner, local_hash, true)
                }
                None => {
                    let seqno = heads
                        .iter()
                        .map(|h| h.seqno)
                        .max()
                        .unwrap_or(0)
                        .saturating_add(1);
                    let parents: BTreeSet<SnapshotHash> = heads
                        .iter()
                        .flat_map(|h| {
                            if is_published(h.hash) {
                                vec![h.hash]
                            } else {
                                h.parents.iter().copied().collect()
                            }
                        })
                        .collect();
                    let merged = Snapshot::build(seqno, parents, data, stamps);
                    debug!(
                        hash = %merged.hash,
                        seqno,
                        heads = heads.len(),
                        "Synthesized merge head"
                    );
                    (
                        Some(LocalHead {
                            snapshot: merged,
                            pushed: false,
                        }),
                        HeadChange::Synthesized,
                    )
                }
            }
        }
    };

    if let Some(h) = &head {
        obsolete.remove(&h.snapshot.hash);
    }

    MergeResult {
        head,
        change,
        obsolete,
        accepted,
        rejected,
    }
}

fn adopt(
    snapshot: &Snapshot,
    local_hash: Option<SnapshotHash>,
    published: bool,
) -> (Option<LocalHead>, HeadChange) {
    let change = if Some(snapshot.hash) == local_hash {
        HeadChange::Unchanged
    } else {
        debug!(hash = %snapshot.hash, seqno = snapshot.seqno, "Fast-forward");
        HeadChange::FastForward
    };
    (
        Some(LocalHead {
            snapshot: snapshot.clone(),
            pushed: published,
        }),
        change,
    )
}

/// Drop snapshots at or past `MAX_SEQNO`; nothing could ever follow them
fn reject_exhausted(candidates: &mut BTreeMap<SnapshotHash, Snapshot>) -> Vec<MergeRejection> {
    let exhausted: Vec<SnapshotHash> = candidates
        .values()
        .filter(|s| s.seqno >= MAX_SEQNO)
        .map(|s| s.hash)
        .collect();
    exhausted
        .into_iter()
        .filter_map(|hash| {
            let snapshot = candidates.remove(&hash)?;
            warn!(hash = %hash, seqno = snapshot.seqno, "Rejected snapshot");
            Some(MergeRejection {
                hash,
                reason: format!("seqno {} leaves no room for descendants", snapshot.seqno),
            })
        })
        .collect()
}

/// Drop snapshots whose seqno does not exceed that of a parent we hold.
///
/// Any parent cycle contains such an edge. When the offending child is the
/// local head, the parent is dropped instead.
fn reject_rank_inversions(
    local: Option<&Snapshot>,
    candidates: &mut BTreeMap<SnapshotHash, Snapshot>,
) -> Vec<MergeRejection> {
    let mut bad: BTreeMap<SnapshotHash, String> = BTreeMap::new();

    let seqno_of = |hash: &SnapshotHash| -> Option<i64> {
        candidates
            .get(hash)
            .map(|s| s.seqno)
            .or_else(|| local.filter(|l| l.hash == *hash).map(|l| l.seqno))
    };

    for child in candidates.values().chain(local) {
        for parent in &child.parents {
            let Some(parent_seqno) = seqno_of(parent) else {
                continue;
            };
            if child.seqno > parent_seqno {
                continue;
            }
            let is_local = local.is_some_and(|l| l.hash == child.hash);
            let (culprit, reason) = if is_local {
                (*parent, format!("seqno {} not below its descendant's", parent_seqno))
            } else {
                (
                    child.hash,
                    format!(
                        "seqno {} does not exceed parent seqno {}",
                        child.seqno, parent_seqno
                    ),
                )
            };
            bad.entry(culprit).or_insert(reason);
        }
    }

    bad.into_iter()
        .filter_map(|(hash, reason)| {
            candidates.remove(&hash)?;
            warn!(hash = %hash, reason = %reason, "Rejected snapshot");
            Some(MergeRejection { hash, reason })
        })
        .collect()
}

/// Join the (data, stamps) trees of several heads
pub fn join_heads(heads: &[&Snapshot]) -> (Dict, Dict) {
    let trees: Vec<(Option<&Dict>, &Dict)> = heads
        .iter()
        .map(|h| (Some(&h.data), &h.stamps))
        .collect();
    join_level(&trees)
}

/// Rank of a node: its own stamp, or the greatest stamp beneath it
fn rank(stamp: &Value) -> Option<Stamp> {
    match stamp {
        Value::Dict(d) => max_stamp(d),
        other => Stamp::from_value(other),
    }
}

fn join_level(trees: &[(Option<&Dict>, &Dict)]) -> (Dict, Dict) {
    let mut data = Dict::new();
    let mut stamps = Dict::new();

    let keys: BTreeSet<&String> = trees.iter().flat_map(|(_, s)| s.keys()).collect();
    for key in keys {
        let nodes: Vec<(Option<&Value>, &Value)> = trees
            .iter()
            .filter_map(|(d, s)| s.get(key).map(|stamp| (d.and_then(|d| d.get(key)), stamp)))
            .collect();

        // Shape comes from the highest ranked node; dictionaries win ties
        let dict_shaped = nodes
            .iter()
            .map(|(_, stamp)| (rank(stamp), stamp.is_dict()))
            .max()
            .is_some_and(|(_, is_dict)| is_dict);

        if dict_shaped {
            let children: Vec<(Option<&Dict>, &Dict)> = nodes
                .iter()
                .filter_map(|(d, stamp)| {
                    stamp.as_dict().map(|s| (d.and_then(Value::as_dict), s))
                })
                .collect();
            let (child_data, child_stamps) = join_level(&children);
            if !child_data.is_empty() {
                data.insert(key.clone(), Value::Dict(child_data));
            }
            if !child_stamps.is_empty() {
                stamps.insert(key.clone(), Value::Dict(child_stamps));
            }
        } else {
            let winner = nodes
                .iter()
                .filter(|(_, stamp)| !stamp.is_dict())
                .max_by_key(|(value, stamp)| (Stamp::from_value(stamp), value.map(encode)));
            if let Some((value, stamp)) = winner {
                stamps.insert(key.clone(), (*stamp).clone());
                if let Some(v) = value {
                    data.insert(key.clone(), (*v).clone());
                }
            }
        }
    }

    (data, stamps)
}
