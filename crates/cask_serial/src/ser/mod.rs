//! The serializing half of the engine.

mod cells;
mod typed;

use alloc::string::ToString;

use cask_archive::{Archive, NodeHeader, NodeId, NodeKind};

use crate::identity::IdentityTracker;
use crate::registry::TypeRegistry;
use crate::session::Session;
use crate::value::{Heap, Value};
use crate::{ANY_TYPE, Config, Error, Location, ROOT_KEY};

// -----------------------------------------------------------------------------
// Serializer

/// Writes a value graph into an [`Archive`].
///
/// One serializer is one session: node ids are unique across everything it
/// writes, and a heap cell reached a second time is written as a reference
/// to its first node. Values are written with [`serialize`](Self::serialize)
/// as the root of the archive.
///
/// The heap is borrowed mutably because `on_serializing` and
/// `on_serialized` hooks may update objects.
///
/// # Examples
///
/// ```
/// use cask_archive::{Archive, NodeKind, TreeArchive};
/// use cask_serial::registry::TypeRegistry;
/// use cask_serial::value::{ArrayCell, Heap, Value};
/// use cask_serial::Serializer;
///
/// let registry = TypeRegistry::new();
/// let mut heap = Heap::new();
/// let inner = heap.alloc(ArrayCell::new("i32").with_elements([1_i32, 2]));
/// let outer = heap.alloc(ArrayCell::new("i32[]").with_elements([inner, inner]));
///
/// let mut archive = TreeArchive::new();
/// Serializer::new(&registry, &mut heap, &mut archive)
///     .serialize(&Value::Ref(outer))
///     .unwrap();
///
/// let root = archive.root().unwrap();
/// assert_eq!(root.header.static_type, "i32[][]");
/// assert_eq!(root.children[0].kind(), NodeKind::Array);
/// assert_eq!(root.children[1].kind(), NodeKind::Reference);
/// assert_eq!(root.children[1].value(), Some(root.children[0].id().to_string().as_str()));
/// ```
pub struct Serializer<'a> {
    registry: &'a TypeRegistry,
    heap: &'a mut Heap,
    archive: &'a mut dyn Archive,
    ids: IdentityTracker,
    session: Session,
}

impl<'a> Serializer<'a> {
    pub fn new(registry: &'a TypeRegistry, heap: &'a mut Heap, archive: &'a mut dyn Archive) -> Self {
        Self {
            registry,
            heap,
            archive,
            ids: IdentityTracker::new(),
            session: Session::new(Config::default()),
        }
    }

    #[inline]
    pub fn with_config(mut self, config: Config) -> Self {
        self.session.set_config(config);
        self
    }

    /// Writes `value` as the root node and returns its id.
    #[inline]
    pub fn serialize(&mut self, value: &Value) -> Result<NodeId, Error> {
        self.write_value(ROOT_KEY, value, None)
    }

    /// Writes `value` as the root node under the declared type `static_type`.
    ///
    /// For objects the declared type must be the runtime type or one of its
    /// bases.
    #[inline]
    pub fn serialize_as(&mut self, value: &Value, static_type: &str) -> Result<NodeId, Error> {
        self.write_value(ROOT_KEY, value, Some(static_type))
    }

    /// Writes `value` as a child of the node being written.
    ///
    /// Meant for [`CustomSerde`](crate::info::CustomSerde) overrides.
    #[inline]
    pub fn serialize_field(&mut self, key: &str, value: &Value) -> Result<NodeId, Error> {
        self.write_value(key, value, None)
    }

    /// Like [`serialize_field`](Self::serialize_field) with a declared type.
    #[inline]
    pub fn serialize_field_as(&mut self, key: &str, value: &Value, static_type: &str) -> Result<NodeId, Error> {
        self.write_value(key, value, Some(static_type))
    }

    #[inline]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        &*self.heap
    }

    #[inline]
    pub fn identity(&self) -> &IdentityTracker {
        &self.ids
    }

    /// Forgets every id handed out and clears the archive.
    pub fn reset(&mut self) {
        self.ids.reset();
        self.session.reset();
        self.archive.reset();
    }

    fn write_value(&mut self, key: &str, value: &Value, declared: Option<&str>) -> Result<NodeId, Error> {
        self.session.enter(key, None)?;
        let result = self.write_checked(key, value, declared);
        self.session.leave();
        result
    }

    fn write_checked(&mut self, key: &str, value: &Value, declared: Option<&str>) -> Result<NodeId, Error> {
        let found = match value {
            Value::Primitive(p) => Some(p.ty().name()),
            Value::Str(s) => Some(s.width.type_name()),
            Value::Struct(s) => Some(s.type_name.as_str()),
            Value::Enum(e) => Some(e.type_name.as_str()),
            Value::Null | Value::Ref(_) => None,
        };
        if let Some(found) = found
            && let Some(expected) = declared.filter(|d| *d != ANY_TYPE)
            && found != expected
        {
            return Err(Error::KindMismatch {
                expected: expected.into(),
                found: found.into(),
                at: self.at(key, None),
            });
        }

        match value {
            Value::Null => self.write_null(key, declared),
            Value::Primitive(p) => self.write_leaf(NodeKind::Primitive, p.ty().name(), key, &p.to_string()),
            Value::Str(s) => self.write_leaf(NodeKind::String, s.width.type_name(), key, &s.text),
            Value::Struct(s) => self.write_struct(key, s),
            Value::Enum(e) => self.write_enum(key, e),
            Value::Ref(handle) => self.write_handle(key, *handle, declared),
        }
    }

    fn write_null(&mut self, key: &str, declared: Option<&str>) -> Result<NodeId, Error> {
        let id = self.ids.next_id();
        let static_type = declared.unwrap_or(NodeKind::Null.as_str());
        self.archive.begin_node(NodeHeader::new(NodeKind::Null, static_type, key, id))?;
        self.archive.end_node()?;
        Ok(id)
    }

    fn write_leaf(&mut self, kind: NodeKind, static_type: &str, key: &str, raw: &str) -> Result<NodeId, Error> {
        let id = self.ids.next_id();
        self.archive.begin_node(NodeHeader::new(kind, static_type, key, id))?;
        self.archive.write_leaf_value(raw)?;
        self.archive.end_node()?;
        Ok(id)
    }

    #[inline]
    fn at(&self, key: &str, id: Option<NodeId>) -> Location {
        self.session.at(key, id)
    }
}
