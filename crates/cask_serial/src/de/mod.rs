//! The deserializing half of the engine.

mod cells;
mod typed;
mod types;

use alloc::format;

use cask_archive::{Archive, NodeHeader, NodeId, NodeKind};

use crate::identity::IdentityResolver;
use crate::registry::TypeRegistry;
use crate::session::Session;
use crate::value::{EnumValue, Heap, Primitive, PrimitiveType, StrValue, StrWidth, Value};
use crate::{ANY_TYPE, Config, Error, Location};

// -----------------------------------------------------------------------------
// Deserializer

/// Rebuilds a value graph from an [`Archive`].
///
/// Cells with identity are allocated on the given heap. Every reference node
/// resolves to the handle allocated for its target, so aliasing and cycles of
/// the original graph are restored. A reference may precede its target: the
/// target's shell is allocated on the spot and filled in when its node is
/// reached.
///
/// # Examples
///
/// ```
/// use cask_archive::TreeArchive;
/// use cask_serial::registry::TypeRegistry;
/// use cask_serial::value::{Heap, MapCell, Value};
/// use cask_serial::{Deserializer, Serializer};
///
/// let registry = TypeRegistry::new();
/// let mut heap = Heap::new();
/// let mut scores = MapCell::new("string", "u32");
/// scores.insert("ada", 10_u32);
/// let scores = heap.alloc(scores);
///
/// let mut archive = TreeArchive::new();
/// Serializer::new(&registry, &mut heap, &mut archive)
///     .serialize(&Value::Ref(scores))
///     .unwrap();
///
/// let mut out = Heap::new();
/// let value = Deserializer::new(&registry, &mut out, &mut archive)
///     .deserialize(Some("map<string,u32>"))
///     .unwrap();
/// assert!(heap.deep_eq(&Value::Ref(scores), &out, &value));
/// ```
pub struct Deserializer<'a> {
    registry: &'a TypeRegistry,
    heap: &'a mut Heap,
    archive: &'a mut dyn Archive,
    ids: IdentityResolver,
    session: Session,
}

impl<'a> Deserializer<'a> {
    pub fn new(registry: &'a TypeRegistry, heap: &'a mut Heap, archive: &'a mut dyn Archive) -> Self {
        Self {
            registry,
            heap,
            archive,
            ids: IdentityResolver::new(),
            session: Session::new(Config::default()),
        }
    }

    #[inline]
    pub fn with_config(mut self, config: Config) -> Self {
        self.session.set_config(config);
        self
    }

    /// Reads the root node.
    ///
    /// With a `target` type, the root must be of that type; an object root
    /// may also be of a subtype. Null roots match any target.
    pub fn deserialize(&mut self, target: Option<&str>) -> Result<Value, Error> {
        let Some(header) = self.archive.read_next_node()? else {
            return Err(Error::parse("archive has no root node", Location::default()));
        };
        let value = self.read_value(header, target)?;
        if let Some(id) = self.ids.first_undefined() {
            return Err(Error::parse(
                format!("referenced id {id} is never defined"),
                self.at(crate::ROOT_KEY, Some(id)),
            ));
        }
        Ok(value)
    }

    /// Reads the next child of the node being read, which must have the key
    /// `key`.
    ///
    /// Meant for [`CustomSerde`](crate::info::CustomSerde) overrides.
    pub fn deserialize_field(&mut self, key: &str, static_type: Option<&str>) -> Result<Value, Error> {
        let Some(header) = self.archive.read_next_node()? else {
            return Err(Error::parse(format!("field `{key}` is absent"), self.at(key, None)));
        };
        if header.key != key {
            let reason = format!("expected field `{key}`, found `{}`", header.key);
            return Err(Error::parse(reason, self.at(&header.key, Some(header.id))));
        }
        self.read_value(header, static_type)
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
    pub fn identity(&self) -> &IdentityResolver {
        &self.ids
    }

    /// Reads the node just entered, and leaves it.
    fn read_value(&mut self, header: NodeHeader, declared: Option<&str>) -> Result<Value, Error> {
        self.session.enter(&header.key, Some(header.id))?;
        let value = self.read_checked(&header, declared);
        self.session.leave();
        let value = value?;
        self.archive.leave_node()?;
        Ok(value)
    }

    fn read_checked(&mut self, header: &NodeHeader, declared: Option<&str>) -> Result<Value, Error> {
        // Objects are checked against their resolved chain, references
        // against their target.
        if !matches!(header.kind, NodeKind::Object | NodeKind::Reference)
            && !self.accepts(header.kind, &header.static_type, declared)
        {
            return Err(self.mismatch(header, header.kind, &header.static_type, declared));
        }

        match header.kind {
            NodeKind::Null => Ok(Value::Null),
            NodeKind::Primitive => self.read_primitive(header),
            NodeKind::String => self.read_string(header),
            NodeKind::Enum => self.read_enum(header),
            NodeKind::Struct => self.read_struct(header),
            NodeKind::Array => self.read_array(header),
            NodeKind::Map => self.read_map(header),
            NodeKind::Object => self.read_object(header, declared),
            NodeKind::Pointer => self.read_pointer(header),
            NodeKind::Reference => self.read_reference(header, declared),
            NodeKind::Entry | NodeKind::Base => Err(self.parse_error(
                header,
                format!("`{}` node where a value was expected", header.kind),
            )),
        }
    }

    /// Whether a node of `kind` and type `type_name` may stand where
    /// `declared` is expected. Objects name their runtime type.
    fn accepts(&self, kind: NodeKind, type_name: &str, declared: Option<&str>) -> bool {
        let Some(declared) = declared.filter(|d| *d != ANY_TYPE) else {
            return true;
        };
        match kind {
            NodeKind::Null => true,
            NodeKind::Object => self.registry.is_subtype(type_name, declared),
            _ => type_name == declared,
        }
    }

    fn mismatch(&self, header: &NodeHeader, kind: NodeKind, type_name: &str, declared: Option<&str>) -> Error {
        let expected = declared.unwrap_or(ANY_TYPE);
        self.parse_error(header, format!("expected `{expected}`, found {kind} `{type_name}`"))
    }

    fn read_primitive(&mut self, header: &NodeHeader) -> Result<Value, Error> {
        let Some(ty) = PrimitiveType::from_name(&header.static_type) else {
            return Err(self.parse_error(header, format!("`{}` is not a primitive type", header.static_type)));
        };
        let raw = self.archive.read_leaf_value()?;
        match Primitive::parse(ty, &raw) {
            Some(primitive) => Ok(Value::Primitive(primitive)),
            None => Err(self.parse_error(header, format!("`{raw}` is not a valid `{ty}`"))),
        }
    }

    fn read_string(&mut self, header: &NodeHeader) -> Result<Value, Error> {
        let Some(width) = StrWidth::from_type_name(&header.static_type) else {
            return Err(self.parse_error(header, format!("`{}` is not a string type", header.static_type)));
        };
        let text = self.archive.read_leaf_value()?;
        Ok(Value::Str(StrValue::new(width, text)))
    }

    fn read_enum(&mut self, header: &NodeHeader) -> Result<Value, Error> {
        let registry = self.registry;
        let descriptor = registry
            .lookup(&header.static_type)
            .map_err(|e| Error::from_registry(e, self.header_at(header)))?;
        let Some(info) = descriptor.as_enum() else {
            return Err(Error::KindMismatch {
                expected: "an enum type".into(),
                found: header.static_type.clone(),
                at: self.header_at(header),
            });
        };
        if let Some(base) = &header.base_type
            && base != info.base().name()
        {
            let reason = format!("enum `{}` is based on `{}`, not `{base}`", descriptor.name(), info.base());
            return Err(self.parse_error(header, reason));
        }

        let member = self.archive.read_leaf_value()?;
        if info.ordinal_of(&member).is_none() {
            return Err(Error::UnknownMember {
                type_name: header.static_type.clone(),
                member,
                at: self.header_at(header),
            });
        }
        Ok(Value::Enum(EnumValue::new(descriptor.name(), member)))
    }

    fn read_reference(&mut self, header: &NodeHeader, declared: Option<&str>) -> Result<Value, Error> {
        let raw = self.archive.read_leaf_value()?;
        let Some(target) = NodeId::parse(&raw) else {
            return Err(self.parse_error(header, format!("`{raw}` is not a node id")));
        };
        if let Some(handle) = self.ids.resolve(target) {
            let Some(cell) = self.heap.get(handle) else {
                return Err(Error::DanglingHandle { at: self.header_at(header) });
            };
            let (kind, type_name) = (cell.kind(), cell.static_type());
            if !self.accepts(kind, &type_name, declared) {
                return Err(self.mismatch(header, kind, &type_name, declared));
            }
            return Ok(Value::Ref(handle));
        }

        // Forward reference: allocate the target now, its node fills it later.
        let Some(target_header) = self.archive.find_node(target) else {
            return Err(self.parse_error(header, format!("reference to unknown id {target}")));
        };
        if !target_header.kind.has_identity() {
            let reason = format!("reference to {} node {target}, which has no identity", target_header.kind);
            return Err(self.parse_error(header, reason));
        }
        let cell = self.shell_for(&target_header)?;
        if !self.accepts(target_header.kind, target_header.type_name(), declared) {
            return Err(self.mismatch(header, target_header.kind, target_header.type_name(), declared));
        }
        let handle = self.heap.alloc(cell);
        self.ids
            .reserve(target, handle, target_header.kind)
            .map_err(|c| Error::from_conflict(c, self.header_at(header)))?;
        log::debug!("allocated `{}` for forward reference to id {target}", target_header.type_name());
        Ok(Value::Ref(handle))
    }

    #[inline]
    fn at(&self, key: &str, id: Option<NodeId>) -> Location {
        self.session.at(key, id)
    }

    #[inline]
    fn header_at(&self, header: &NodeHeader) -> Location {
        self.session.at(&header.key, Some(header.id))
    }

    fn parse_error(&self, header: &NodeHeader, reason: impl core::fmt::Display) -> Error {
        Error::parse(reason, self.header_at(header))
    }
}
