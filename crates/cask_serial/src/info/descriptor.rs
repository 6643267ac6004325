use alloc::string::String;
use alloc::vec::Vec;

use cask_archive::NodeKind;

use crate::info::{CustomSerde, FieldInfo, HookPoint, LifecycleHooks};
use crate::value::{ObjectCell, PrimitiveType};

// -----------------------------------------------------------------------------
// StructInfo

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructInfo {
    fields: Vec<FieldInfo>,
}

impl StructInfo {
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

// -----------------------------------------------------------------------------
// ObjectInfo

/// A class-like type: its own fields plus the name of its base type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectInfo {
    base: Option<String>,
    fields: Vec<FieldInfo>,
}

impl ObjectInfo {
    #[inline]
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// The fields declared by this type, not including inherited ones.
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

// -----------------------------------------------------------------------------
// EnumInfo

/// Members of an enum with their ordinals, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumInfo {
    base: PrimitiveType,
    members: Vec<(String, i64)>,
}

impl EnumInfo {
    /// The underlying integral type.
    #[inline]
    pub fn base(&self) -> PrimitiveType {
        self.base
    }

    #[inline]
    pub fn members(&self) -> &[(String, i64)] {
        &self.members
    }

    pub fn ordinal_of(&self, member: &str) -> Option<i64> {
        self.members.iter().find(|(n, _)| n == member).map(|(_, o)| *o)
    }

    pub fn member_of(&self, ordinal: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, o)| *o == ordinal)
            .map(|(n, _)| n.as_str())
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo {
    Struct(StructInfo),
    Object(ObjectInfo),
    Enum(EnumInfo),
}

impl TypeInfo {
    /// The archive node kind values of this type are written as.
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Struct(_) => NodeKind::Struct,
            Self::Object(_) => NodeKind::Object,
            Self::Enum(_) => NodeKind::Enum,
        }
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Everything the engine knows about one named type.
///
/// Descriptors are built with the `with_*` methods and handed to a
/// [`TypeRegistry`](crate::registry::TypeRegistry).
///
/// # Examples
///
/// ```
/// use cask_serial::info::{FieldInfo, TypeDescriptor};
/// use cask_serial::value::PrimitiveType;
///
/// let shape = TypeDescriptor::object("Shape").with_field(FieldInfo::new("name", "string"));
/// let circle = TypeDescriptor::object("Circle")
///     .with_base("Shape")
///     .with_field(FieldInfo::new("radius", "f64").with_default(1.0));
/// let color = TypeDescriptor::enumeration("Color", PrimitiveType::U8)
///     .with_member("Red", 0)
///     .with_member("Green", 1);
///
/// assert_eq!(circle.base(), Some("Shape"));
/// assert_eq!(shape.fields().len(), 1);
/// assert_eq!(color.as_enum().unwrap().ordinal_of("Green"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    info: TypeInfo,
    hooks: LifecycleHooks,
    custom: Option<CustomSerde>,
}

impl TypeDescriptor {
    fn new(name: impl Into<String>, info: TypeInfo) -> Self {
        Self {
            name: name.into(),
            info,
            hooks: LifecycleHooks::new(),
            custom: None,
        }
    }

    /// Describes a struct, a value type with named fields.
    #[inline]
    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, TypeInfo::Struct(StructInfo::default()))
    }

    /// Describes a class-like type with identity and optional inheritance.
    #[inline]
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, TypeInfo::Object(ObjectInfo::default()))
    }

    /// Describes an enum backed by the integral type `base`.
    #[inline]
    pub fn enumeration(name: impl Into<String>, base: PrimitiveType) -> Self {
        Self::new(
            name,
            TypeInfo::Enum(EnumInfo {
                base,
                members: Vec::new(),
            }),
        )
    }

    /// Adds a field. Has no effect on enums.
    pub fn with_field(mut self, field: FieldInfo) -> Self {
        match &mut self.info {
            TypeInfo::Struct(info) => info.fields.push(field),
            TypeInfo::Object(info) => info.fields.push(field),
            TypeInfo::Enum(_) => {}
        }
        self
    }

    /// Sets the base type. Has no effect on anything but objects.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        if let TypeInfo::Object(info) = &mut self.info {
            info.base = Some(base.into());
        }
        self
    }

    /// Adds an enum member. Has no effect on anything but enums.
    pub fn with_member(mut self, name: impl Into<String>, ordinal: i64) -> Self {
        if let TypeInfo::Enum(info) = &mut self.info {
            info.members.push((name.into(), ordinal));
        }
        self
    }

    /// Sets one lifecycle hook.
    #[inline]
    pub fn with_hook(
        mut self,
        point: HookPoint,
        hook: impl Fn(&mut ObjectCell) + Send + Sync + 'static,
    ) -> Self {
        self.hooks = self.hooks.on(point, hook);
        self
    }

    #[inline]
    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the field walk of a struct with user functions.
    #[inline]
    pub fn with_custom(mut self, custom: CustomSerde) -> Self {
        self.custom = Some(custom);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    #[inline]
    pub const fn kind(&self) -> NodeKind {
        self.info.kind()
    }

    /// Own fields of a struct or object; empty for enums.
    pub fn fields(&self) -> &[FieldInfo] {
        match &self.info {
            TypeInfo::Struct(info) => info.fields(),
            TypeInfo::Object(info) => info.fields(),
            TypeInfo::Enum(_) => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields().iter().find(|f| f.name() == name)
    }

    #[inline]
    pub fn base(&self) -> Option<&str> {
        match &self.info {
            TypeInfo::Object(info) => info.base(),
            _ => None,
        }
    }

    #[inline]
    pub fn as_enum(&self) -> Option<&EnumInfo> {
        match &self.info {
            TypeInfo::Enum(info) => Some(info),
            _ => None,
        }
    }

    #[inline]
    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }

    /// The custom override. Only consulted for structs.
    #[inline]
    pub fn custom(&self) -> Option<&CustomSerde> {
        self.custom.as_ref()
    }
}
