/*
    core_store - The mutable tree under every config object

    Handles:
    - Keyed and nested get/set with pruning of emptied dictionaries
    - Dirty tracking and sequence numbers
    - Per-field write stamps used by the merge
*/

pub mod stamps;
pub mod state_store;

pub use stamps::{data_hash, Stamp, HASH_LEN};
pub use state_store::StateStore;
