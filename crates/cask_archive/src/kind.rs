use core::fmt;

// -----------------------------------------------------------------------------
// NodeKind

/// The shape tag of an [`ArchiveNode`](crate::ArchiveNode).
///
/// `Entry` and `Base` never stand for a value on their own: an `Entry` groups
/// the `key` and `value` children of one map pair, a `Base` groups the fields
/// declared by one layer of an object's inheritance chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Primitive,
    String,
    Array,
    Map,
    Entry,
    Struct,
    Object,
    Base,
    Enum,
    Pointer,
    Reference,
}

impl NodeKind {
    /// Every kind name, in declaration order.
    pub const NAMES: &'static [&'static str] = &[
        "null",
        "primitive",
        "string",
        "array",
        "map",
        "entry",
        "struct",
        "object",
        "base",
        "enum",
        "pointer",
        "reference",
    ];

    /// Returns the name used in rendered archives.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Primitive => "primitive",
            Self::String => "string",
            Self::Array => "array",
            Self::Map => "map",
            Self::Entry => "entry",
            Self::Struct => "struct",
            Self::Object => "object",
            Self::Base => "base",
            Self::Enum => "enum",
            Self::Pointer => "pointer",
            Self::Reference => "reference",
        }
    }

    /// Parses a name produced by [`as_str`](Self::as_str).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "primitive" => Self::Primitive,
            "string" => Self::String,
            "array" => Self::Array,
            "map" => Self::Map,
            "entry" => Self::Entry,
            "struct" => Self::Struct,
            "object" => Self::Object,
            "base" => Self::Base,
            "enum" => Self::Enum,
            "pointer" => Self::Pointer,
            "reference" => Self::Reference,
            _ => return None,
        })
    }

    /// Whether nodes of this kind stand for a value with identity,
    /// i.e. may be the target of a [`Reference`](Self::Reference).
    #[inline]
    pub const fn has_identity(self) -> bool {
        matches!(self, Self::Array | Self::Map | Self::Object | Self::Pointer)
    }
}

impl fmt::Display for NodeKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// Tests
