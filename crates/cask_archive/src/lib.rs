//! The archive side of `cask`: a tree of typed, keyed, identified nodes.
//!
//! The serialization engine never talks to a concrete encoding. It drives the
//! object safe [`Archive`] trait, which any tree-structured backend can
//! implement. [`TreeArchive`] is the bundled backend: it keeps the tree in
//! memory and renders it through any `serde` data format.
//!
//! # Examples
//!
//! ```
//! use cask_archive::{Archive, NodeHeader, NodeId, NodeKind, TreeArchive};
//!
//! let mut archive = TreeArchive::new();
//! archive.begin_node(NodeHeader::new(NodeKind::Primitive, "i32", "root", NodeId::new(0))).unwrap();
//! archive.write_leaf_value("42").unwrap();
//! archive.end_node().unwrap();
//!
//! let header = archive.read_next_node().unwrap().unwrap();
//! assert_eq!(header.static_type, "i32");
//! assert_eq!(archive.read_leaf_value().unwrap(), "42");
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod archive;
mod error;
mod kind;
mod node;
mod serde;
mod tree;

// -----------------------------------------------------------------------------
// Exports

pub use archive::Archive;
pub use error::ArchiveError;
pub use kind::NodeKind;
pub use node::{ArchiveNode, NodeHeader, NodeId};
pub use tree::TreeArchive;
