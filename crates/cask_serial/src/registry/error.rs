use alloc::string::String;

use thiserror::Error;

/// Failures of [`TypeRegistry`](crate::registry::TypeRegistry) lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("type `{0}` is not registered")]
    Unregistered(String),

    #[error("inheritance chain of `{0}` is cyclic")]
    CyclicHierarchy(String),

    #[error("`{0}` is not an object type")]
    NotAnObject(String),
}
