use alloc::string::String;
use alloc::vec::Vec;

use cask_utils::hash::HashMap;
use cask_utils::hash::hashbrown::hash_map::Entry;

use crate::info::{TypeDescriptor, TypeInfo};
use crate::registry::RegistryError;
use crate::value::{Heap, HeapKey, ObjectCell, ObjectLayer};

// -----------------------------------------------------------------------------
// TypeRegistry

/// The central store of type descriptors, keyed by type name.
///
/// Sessions borrow a registry for their whole duration, so it cannot change
/// while data is being (de)serialized.
///
/// # Examples
///
/// ```
/// use cask_serial::info::{FieldInfo, TypeDescriptor};
/// use cask_serial::registry::TypeRegistry;
/// use cask_serial::value::{Heap, Value};
///
/// let mut registry = TypeRegistry::new();
/// registry.register(TypeDescriptor::object("Base").with_field(FieldInfo::new("id", "u32").with_default(0_u32)));
/// registry.register(TypeDescriptor::object("Derived").with_base("Base"));
///
/// let names: Vec<&str> = registry.chain("Derived").unwrap().iter().map(|d| d.name()).collect();
/// assert_eq!(names, ["Base", "Derived"]);
/// assert!(registry.is_subtype("Derived", "Base"));
///
/// let mut heap = Heap::new();
/// let object = registry.instantiate("Derived", &mut heap).unwrap();
/// assert_eq!(heap.object(object).unwrap().field("id"), Some(&Value::from(0_u32)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor unless its name is taken.
    ///
    /// Returns `false`, keeping the existing descriptor, if the name was
    /// already registered. Use [`insert`](Self::insert) to overwrite.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> bool {
        match self.types.entry(descriptor.name().into()) {
            Entry::Occupied(_) => {
                log::debug!("type `{}` is already registered", descriptor.name());
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(descriptor);
                true
            }
        }
    }

    /// Registers a descriptor, returning the one it replaces.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        self.types.insert(descriptor.name().into(), descriptor)
    }

    /// Removes every registration.
    pub fn reset(&mut self) {
        log::debug!("clearing {} registered types", self.types.len());
        self.types.clear();
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Like [`get`](Self::get), failing with [`RegistryError::Unregistered`].
    pub fn lookup(&self, name: &str) -> Result<&TypeDescriptor, RegistryError> {
        self.types
            .get(name)
            .ok_or_else(|| RegistryError::Unregistered(name.into()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over the registered descriptors in unspecified order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    /// Resolves the inheritance chain of an object type, base first.
    ///
    /// Every type along the chain must be a registered object type.
    pub fn chain(&self, name: &str) -> Result<Vec<&TypeDescriptor>, RegistryError> {
        let mut chain: Vec<&TypeDescriptor> = Vec::new();
        let mut current = name;
        loop {
            let descriptor = self.lookup(current)?;
            let TypeInfo::Object(info) = descriptor.info() else {
                return Err(RegistryError::NotAnObject(current.into()));
            };
            if chain.iter().any(|d| d.name() == current) {
                return Err(RegistryError::CyclicHierarchy(name.into()));
            }
            chain.push(descriptor);
            match info.base() {
                Some(base) => current = base,
                None => break,
            }
        }
        chain.reverse();
        Ok(chain)
    }

    /// Whether `derived` is `base` or inherits from it.
    ///
    /// Unregistered or malformed chains are never subtypes.
    pub fn is_subtype(&self, derived: &str, base: &str) -> bool {
        self.chain(derived)
            .is_ok_and(|chain| chain.iter().any(|d| d.name() == base))
    }

    /// Builds an object with one layer per type of its chain, each field set
    /// to its initial value.
    pub fn shell(&self, name: &str) -> Result<ObjectCell, RegistryError> {
        let chain = self.chain(name)?;
        Ok(shell_from_chain(name, &chain))
    }

    /// Allocates a [`shell`](Self::shell) on `heap`.
    pub fn instantiate(&self, name: &str, heap: &mut Heap) -> Result<HeapKey, RegistryError> {
        let shell = self.shell(name)?;
        Ok(heap.alloc(shell))
    }
}

pub(crate) fn shell_from_chain(name: &str, chain: &[&TypeDescriptor]) -> ObjectCell {
    chain.iter().fold(ObjectCell::new(name), |object, descriptor| {
        let layer = descriptor
            .fields()
            .iter()
            .fold(ObjectLayer::new(descriptor.name()), |layer, field| {
                layer.with_field(field.name(), field.initial_value())
            });
        object.with_layer(layer)
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TypeRegistry;
    use crate::info::{FieldInfo, TypeDescriptor};
    use crate::registry::RegistryError;
    use crate::value::{Heap, PrimitiveType, Value};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(TypeDescriptor::object("A").with_field(FieldInfo::new("a", "i32")));
        registry.register(
            TypeDescriptor::object("B")
                .with_base("A")
                .with_field(FieldInfo::new("b", "string").with_default("x")),
        );
        registry.register(TypeDescriptor::object("C").with_base("B"));
        registry
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = registry();
        assert!(!registry.register(TypeDescriptor::object("A")));
        // The original descriptor is kept.
        assert_eq!(registry.get("A").unwrap().fields().len(), 1);

        assert!(registry.insert(TypeDescriptor::object("A")).is_some());
        assert!(registry.get("A").unwrap().fields().is_empty());

        assert_eq!(registry.len(), 3);
        registry.reset();
        assert!(registry.is_empty());
        assert!(!registry.contains("A"));
    }

    #[test]
    fn chains() {
        let registry = registry();
        let names: alloc::vec::Vec<&str> =
            registry.chain("C").unwrap().iter().map(|d| d.name()).collect();
        assert_eq!(names, ["A", "B", "C"]);

        assert!(registry.is_subtype("C", "A"));
        assert!(registry.is_subtype("B", "B"));
        assert!(!registry.is_subtype("A", "B"));
        assert!(!registry.is_subtype("Z", "A"));
    }

    #[test]
    fn chain_errors() {
        let mut registry = registry();
        registry.register(TypeDescriptor::object("Orphan").with_base("Missing"));
        registry.register(TypeDescriptor::object("X").with_base("Y"));
        registry.register(TypeDescriptor::object("Y").with_base("X"));
        registry.register(TypeDescriptor::enumeration("E", PrimitiveType::I32));
        registry.register(TypeDescriptor::object("FromEnum").with_base("E"));

        assert_eq!(
            registry.chain("Orphan").unwrap_err(),
            RegistryError::Unregistered("Missing".into())
        );
        assert_eq!(
            registry.chain("X").unwrap_err(),
            RegistryError::CyclicHierarchy("X".into())
        );
        assert_eq!(
            registry.chain("FromEnum").unwrap_err(),
            RegistryError::NotAnObject("E".into())
        );
        assert!(registry.lookup("Nope").is_err());
    }

    #[test]
    fn instantiate_uses_defaults() {
        let registry = registry();
        let mut heap = Heap::new();
        let key = registry.instantiate("C", &mut heap).unwrap();

        let object = heap.object(key).unwrap();
        assert_eq!(object.runtime_type(), "C");
        assert_eq!(object.layers().len(), 3);
        assert_eq!(object.field("a"), Some(&Value::Null));
        assert_eq!(object.field("b"), Some(&Value::from("x")));

        assert!(registry.instantiate("Nope", &mut heap).is_err());
        assert_eq!(heap.len(), 1);
    }
}
