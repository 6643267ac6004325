//! Provide hash containers, re-exports *hashbrown* and *foldhash*.
//!
//! Every container here defaults to [`FixedHashState`], so iteration order
//! only depends on the inserted keys and never on a process-random seed.

// -----------------------------------------------------------------------------
// Modules

mod hasher;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};
pub use hasher::{IdHashState, IdHasher};

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`] by default.
pub type HashSet<T, S = FixedHashState> = hashbrown::HashSet<T, S>;

/// A map keyed by sequential integers, e.g. node ids.
pub type IdHashMap<K, V> = hashbrown::HashMap<K, V, IdHashState>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;
