/*
    core_merge - Snapshots and convergent reconciliation

    Devices publish hash-identified snapshots of their config tree to
    replicas that do not order writes. Any set of such snapshots, received
    in any batches and any order, reconciles to the same tree on every
    device.
*/

pub mod merge_engine;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use merge_engine::{merge, HeadChange, LocalHead, MergeRejection, MergeResult};
pub use snapshot::{Snapshot, SnapshotHash, MAX_SEQNO};
