//! Object graph (de)serialization on top of [`cask_archive`].
//!
//! Values live in a [`Heap`](value::Heap) arena: arrays, maps, objects and
//! boxed pointers are heap cells with identity, while primitives, strings,
//! structs and enums are plain [`Value`](value::Value)s. A [`Serializer`]
//! walks a value graph and emits archive nodes, writing a reference node
//! whenever a heap cell is reached a second time; a [`Deserializer`] rebuilds
//! an equivalent graph, aliasing and cycles included.
//!
//! Types are described at runtime through a
//! [`TypeRegistry`](registry::TypeRegistry): struct fields, object
//! inheritance chains, enum members and lifecycle hooks.
//!
//! # Examples
//!
//! ```
//! use cask_archive::TreeArchive;
//! use cask_serial::info::{FieldInfo, TypeDescriptor};
//! use cask_serial::registry::TypeRegistry;
//! use cask_serial::value::{Heap, Value};
//! use cask_serial::{Deserializer, Serializer};
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(TypeDescriptor::object("Node").with_field(FieldInfo::new("next", "Node")));
//!
//! // A node pointing at itself.
//! let mut heap = Heap::new();
//! let node = registry.instantiate("Node", &mut heap).unwrap();
//! heap.object_mut(node).unwrap().set_field("next", Value::Ref(node));
//!
//! let mut archive = TreeArchive::new();
//! Serializer::new(&registry, &mut heap, &mut archive)
//!     .serialize(&Value::Ref(node))
//!     .unwrap();
//!
//! let mut out = Heap::new();
//! let value = Deserializer::new(&registry, &mut out, &mut archive)
//!     .deserialize(Some("Node"))
//!     .unwrap();
//!
//! let handle = value.handle().unwrap();
//! assert_eq!(out.object(handle).unwrap().field("next"), Some(&Value::Ref(handle)));
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

pub mod identity;
pub mod info;
pub mod registry;
pub mod value;

mod config;
mod de;
mod error;
mod ser;
mod session;

#[cfg(test)]
mod tests;

// -----------------------------------------------------------------------------
// Exports

pub use config::Config;
pub use de::Deserializer;
pub use error::{Error, Location};
pub use ser::Serializer;

/// Key given to the root node of every archive.
pub const ROOT_KEY: &str = "root";

/// Declared type that accepts a value of any type.
pub const ANY_TYPE: &str = "any";
