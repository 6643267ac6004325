//! Hash builders with no per-process randomness.
//!
//! [`FixedHashState`] wraps `foldhash` with a constant seed. [`IdHashState`]
//! passes integer keys through untouched, which suits the sequential node
//! ids handed out during a session.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHashState

const SEED: u64 = 0x6A09_E667_F3BC_C908;

/// The hasher built by [`FixedHashState`].
pub type FixedHasher = FoldHasher<'static>;

/// A `foldhash` state with a constant seed.
///
/// Two maps filled with the same keys in the same order iterate identically,
/// across runs and processes.
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use cask_utils::hash::FixedHashState;
///
/// let mut a = FixedHashState.build_hasher();
/// let mut b = FixedHashState.build_hasher();
/// "node".hash(&mut a);
/// "node".hash(&mut b);
///
/// assert_eq!(a.finish(), b.finish());
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        const STATE: FixedState = FixedState::with_seed(SEED);
        STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// IdHashState

/// Pass-through hasher for integer keys.
#[derive(Copy, Clone, Default, Debug)]
pub struct IdHasher {
    hash: u64,
}

impl Hasher for IdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    /// Little-endian fold, so `write(&n.to_le_bytes())` agrees with the
    /// integer writes below.
    fn write(&mut self, bytes: &[u8]) {
        self.hash = bytes
            .iter()
            .rev()
            .fold(0, |acc, &byte| (acc << 8) | u64::from(byte));
    }

    #[inline]
    fn write_u32(&mut self, n: u32) {
        self.hash = u64::from(n);
    }

    #[inline]
    fn write_u64(&mut self, n: u64) {
        self.hash = n;
    }

    #[inline]
    fn write_usize(&mut self, n: usize) {
        self.hash = n as u64;
    }
}

/// Builds [`IdHasher`]s.
///
/// Only sound for keys that hash a single integer, such as node ids.
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use cask_utils::hash::IdHashState;
///
/// let mut hasher = IdHashState.build_hasher();
/// 3_u32.hash(&mut hasher);
///
/// assert_eq!(hasher.finish(), 3);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct IdHashState;

impl BuildHasher for IdHashState {
    type Hasher = IdHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        IdHasher::default()
    }
}

// -----------------------------------------------------------------------------
// Tests
