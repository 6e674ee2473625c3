//! Test utilities and helpers for swarmconf
//!
//! Deterministic randomness and fixtures shared by the unit tests.

pub mod deterministic_rng;
pub mod fixtures;

pub use deterministic_rng::*;
pub use fixtures::*;
