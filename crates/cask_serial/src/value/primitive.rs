use core::fmt;

// -----------------------------------------------------------------------------
// PrimitiveType

/// The primitive types, named the way archives spell them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 12] = [
        Self::Bool,
        Self::Char,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }

    /// Whether the type can back an enum.
    #[inline]
    pub const fn is_integral(self) -> bool {
        !matches!(self, Self::Bool | Self::Char | Self::F32 | Self::F64)
    }
}

impl fmt::Display for PrimitiveType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Primitive

/// A primitive value.
///
/// Its [`Display`](fmt::Display) output is the raw text stored in archives and
/// is read back by [`Primitive::parse`]. Floats print their shortest exact
/// representation, so they round-trip bit for bit.
///
/// # Examples
///
/// ```
/// use cask_serial::value::{Primitive, PrimitiveType};
///
/// let raw = Primitive::F64(0.1).to_string();
/// assert_eq!(Primitive::parse(PrimitiveType::F64, &raw), Some(Primitive::F64(0.1)));
/// assert_eq!(Primitive::parse(PrimitiveType::U8, "256"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Primitive {
    pub const fn ty(&self) -> PrimitiveType {
        match self {
            Self::Bool(_) => PrimitiveType::Bool,
            Self::Char(_) => PrimitiveType::Char,
            Self::I8(_) => PrimitiveType::I8,
            Self::I16(_) => PrimitiveType::I16,
            Self::I32(_) => PrimitiveType::I32,
            Self::I64(_) => PrimitiveType::I64,
            Self::U8(_) => PrimitiveType::U8,
            Self::U16(_) => PrimitiveType::U16,
            Self::U32(_) => PrimitiveType::U32,
            Self::U64(_) => PrimitiveType::U64,
            Self::F32(_) => PrimitiveType::F32,
            Self::F64(_) => PrimitiveType::F64,
        }
    }

    /// Parses raw archive text as a value of type `ty`.
    pub fn parse(ty: PrimitiveType, raw: &str) -> Option<Self> {
        Some(match ty {
            PrimitiveType::Bool => Self::Bool(raw.parse().ok()?),
            PrimitiveType::Char => {
                let mut chars = raw.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                Self::Char(c)
            }
            PrimitiveType::I8 => Self::I8(raw.parse().ok()?),
            PrimitiveType::I16 => Self::I16(raw.parse().ok()?),
            PrimitiveType::I32 => Self::I32(raw.parse().ok()?),
            PrimitiveType::I64 => Self::I64(raw.parse().ok()?),
            PrimitiveType::U8 => Self::U8(raw.parse().ok()?),
            PrimitiveType::U16 => Self::U16(raw.parse().ok()?),
            PrimitiveType::U32 => Self::U32(raw.parse().ok()?),
            PrimitiveType::U64 => Self::U64(raw.parse().ok()?),
            PrimitiveType::F32 => Self::F32(raw.parse().ok()?),
            PrimitiveType::F64 => Self::F64(raw.parse().ok()?),
        })
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => fmt::Display::fmt(v, f),
            Self::Char(v) => fmt::Display::fmt(v, f),
            Self::I8(v) => fmt::Display::fmt(v, f),
            Self::I16(v) => fmt::Display::fmt(v, f),
            Self::I32(v) => fmt::Display::fmt(v, f),
            Self::I64(v) => fmt::Display::fmt(v, f),
            Self::U8(v) => fmt::Display::fmt(v, f),
            Self::U16(v) => fmt::Display::fmt(v, f),
            Self::U32(v) => fmt::Display::fmt(v, f),
            Self::U64(v) => fmt::Display::fmt(v, f),
            Self::F32(v) => fmt::Display::fmt(v, f),
            Self::F64(v) => fmt::Display::fmt(v, f),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
