//! Shared containers for the `cask` crates.
//!
//! - [`hash`]: `hashbrown` maps with fixed, seed-stable hashers.
//! - [`vec`]: small-vector re-exports used on hot serialization paths.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

pub mod hash;
pub mod vec;
