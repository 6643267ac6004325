use alloc::sync::Arc;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::info::TypeDescriptor;
use crate::registry::TypeRegistry;

// -----------------------------------------------------------------------------
// TypeRegistryArc

/// A shared, lockable [`TypeRegistry`].
#[derive(Debug, Clone, Default)]
pub struct TypeRegistryArc {
    /// The wrapped [`TypeRegistry`].
    pub internal: Arc<RwLock<TypeRegistry>>,
}

impl TypeRegistryArc {
    /// Takes a read lock on the underlying [`TypeRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`TypeRegistry`].
    ///
    /// Holding it blocks every session reading the registry.
    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// -----------------------------------------------------------------------------
// Process-wide registry

static GLOBAL: OnceLock<TypeRegistryArc> = OnceLock::new();

/// The process-wide registry, created empty on first use.
///
/// # Examples
///
/// ```
/// use cask_serial::info::TypeDescriptor;
/// use cask_serial::registry::{global_registry, register_type};
///
/// register_type(TypeDescriptor::object("Widget"));
/// assert!(global_registry().read().contains("Widget"));
/// ```
pub fn global_registry() -> &'static TypeRegistryArc {
    GLOBAL.get_or_init(TypeRegistryArc::default)
}

/// Registers a descriptor in the [`global_registry`].
pub fn register_type(descriptor: TypeDescriptor) -> bool {
    global_registry().write().register(descriptor)
}

/// Clears the [`global_registry`].
pub fn reset_registered_types() {
    global_registry().write().reset();
}

// -----------------------------------------------------------------------------
// Tests
