use core::fmt;

use crate::value::StructValue;
use crate::{Deserializer, Error, Serializer};

/// Writes the content of a struct node in place of the field walk.
pub type SerializeFn = fn(&StructValue, &mut Serializer<'_>) -> Result<(), Error>;

/// Reads the content of a struct node into a value holding the declared
/// defaults.
pub type DeserializeFn = fn(&mut StructValue, &mut Deserializer<'_>) -> Result<(), Error>;

// -----------------------------------------------------------------------------
// CustomSerde

/// A user supplied replacement for the field walk of a struct.
///
/// Both functions run inside the struct's node: the serializer side emits
/// children with [`Serializer::serialize_field`] and the deserializer side
/// reads them back with [`Deserializer::deserialize_field`].
///
/// # Examples
///
/// ```
/// use cask_serial::info::CustomSerde;
/// use cask_serial::value::{StructValue, Value};
/// use cask_serial::{Deserializer, Error, Serializer};
///
/// // Stores a `Point { x, y }` as a single "x,y" string.
/// fn save(point: &StructValue, ser: &mut Serializer<'_>) -> Result<(), Error> {
///     let coord = |name| point.field(name).and_then(Value::as_primitive).map(ToString::to_string);
///     let packed = format!("{},{}", coord("x").unwrap_or_default(), coord("y").unwrap_or_default());
///     ser.serialize_field("xy", &Value::from(packed))?;
///     Ok(())
/// }
///
/// fn load(point: &mut StructValue, de: &mut Deserializer<'_>) -> Result<(), Error> {
///     let packed = de.deserialize_field("xy", Some("string"))?;
///     let text = packed.as_str().ok_or_else(|| Error::custom("`xy` is not a string"))?;
///     let (x, y) = text.split_once(',').ok_or_else(|| Error::custom("`xy` lacks a comma"))?;
///     point.set_field("x", x.parse::<i32>().map_err(Error::custom)?);
///     point.set_field("y", y.parse::<i32>().map_err(Error::custom)?);
///     Ok(())
/// }
///
/// let custom = CustomSerde::new(save, load);
/// ```
#[derive(Clone, Copy)]
pub struct CustomSerde {
    pub serialize: SerializeFn,
    pub deserialize: DeserializeFn,
}

impl CustomSerde {
    #[inline]
    pub const fn new(serialize: SerializeFn, deserialize: DeserializeFn) -> Self {
        Self {
            serialize,
            deserialize,
        }
    }
}

impl fmt::Debug for CustomSerde {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSerde").finish_non_exhaustive()
    }
}
