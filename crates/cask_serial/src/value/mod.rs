//! The value model handled by the engine.
//!
//! [`Value`] is a closed sum over the shapes the engine knows. Identity bearing
//! data (arrays, maps, objects and boxed pointers) is owned by a [`Heap`] and
//! referenced through [`Value::Ref`]; everything else is held inline.

mod eq;
mod heap;
mod primitive;

pub use heap::{ArrayCell, Heap, HeapCell, HeapKey, MapCell, ObjectCell, ObjectLayer};
pub use primitive::{Primitive, PrimitiveType};

use alloc::string::String;
use alloc::vec::Vec;

// -----------------------------------------------------------------------------
// StrWidth

/// Element width of a string, kept so it survives a round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StrWidth {
    /// 8-bit code units.
    #[default]
    Narrow,
    /// 16-bit code units.
    Wide,
    /// 32-bit code units.
    Full,
}

impl StrWidth {
    /// The static type written into archives.
    #[inline]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Narrow => "string",
            Self::Wide => "wstring",
            Self::Full => "dstring",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::Narrow),
            "wstring" => Some(Self::Wide),
            "dstring" => Some(Self::Full),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// StrValue

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StrValue {
    pub width: StrWidth,
    pub text: String,
}

impl StrValue {
    #[inline]
    pub fn new(width: StrWidth, text: impl Into<String>) -> Self {
        Self {
            width,
            text: text.into(),
        }
    }

    #[inline]
    pub fn narrow(text: impl Into<String>) -> Self {
        Self::new(StrWidth::Narrow, text)
    }

    #[inline]
    pub fn wide(text: impl Into<String>) -> Self {
        Self::new(StrWidth::Wide, text)
    }

    #[inline]
    pub fn full(text: impl Into<String>) -> Self {
        Self::new(StrWidth::Full, text)
    }
}

// -----------------------------------------------------------------------------
// StructValue

/// A value type with named fields.
///
/// Structs are copied, never shared: box one in a [`HeapCell::Boxed`] to give
/// it identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructValue {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    #[inline]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    #[inline]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Sets a field, keeping its position if it already exists.
    ///
    /// Returns the previous value.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.field_mut(&name) {
            Some(slot) => Some(core::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }
}

// -----------------------------------------------------------------------------
// EnumValue

/// A member of a registered enum, held by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: String,
    pub member: String,
}

impl EnumValue {
    #[inline]
    pub fn new(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// Value

/// Any value the engine can (de)serialize.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Primitive(Primitive),
    Str(StrValue),
    Struct(StructValue),
    Enum(EnumValue),
    /// A cell owned by a [`Heap`].
    Ref(HeapKey),
}

impl Value {
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the heap handle of a [`Value::Ref`].
    #[inline]
    pub const fn handle(&self) -> Option<HeapKey> {
        match self {
            Self::Ref(key) => Some(*key),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(&s.text),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Primitive> for Value {
    #[inline]
    fn from(value: Primitive) -> Self {
        Self::Primitive(value)
    }
}

impl From<StrValue> for Value {
    #[inline]
    fn from(value: StrValue) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(StrValue::narrow(value))
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::Str(StrValue::narrow(value))
    }
}

impl From<StructValue> for Value {
    #[inline]
    fn from(value: StructValue) -> Self {
        Self::Struct(value)
    }
}

impl From<EnumValue> for Value {
    #[inline]
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

impl From<HeapKey> for Value {
    #[inline]
    fn from(value: HeapKey) -> Self {
        Self::Ref(value)
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Primitive {
            #[inline]
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl From<$ty> for Value {
            #[inline]
            fn from(value: $ty) -> Self {
                Self::Primitive(Primitive::$variant(value))
            }
        }
    )*};
}

impl_from_primitive! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

// -----------------------------------------------------------------------------
// Tests
