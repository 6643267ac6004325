//! Small-vector re-exports.
//!
//! Field lists of a single type rarely exceed a handful of entries, so
//! [`FastVec`] with an inline capacity keeps them off the heap.

pub use fastvec::{FastVec, fast_vec};
