//! Lookup of [`TypeDescriptor`](crate::info::TypeDescriptor)s by name.

mod error;
mod type_registry;

#[cfg(feature = "std")]
mod global;

pub use error::RegistryError;
pub use type_registry::TypeRegistry;

pub(crate) use type_registry::shell_from_chain;

#[cfg(feature = "std")]
pub use global::{TypeRegistryArc, global_registry, register_type, reset_registered_types};
