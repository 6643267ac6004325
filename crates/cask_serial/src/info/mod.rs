//! Runtime descriptions of the types the engine can handle.
//!
//! A [`TypeDescriptor`] names a type and says what shape it has: a struct
//! with fields, an object with a base type and fields, or an enum with
//! members. Descriptors also carry [`LifecycleHooks`] and, for structs, an
//! optional [`CustomSerde`] override.

mod custom;
mod descriptor;
mod field;
mod hooks;

pub use custom::{CustomSerde, DeserializeFn, SerializeFn};
pub use descriptor::{EnumInfo, ObjectInfo, StructInfo, TypeDescriptor, TypeInfo};
pub use field::FieldInfo;
pub use hooks::{Hook, HookPoint, LifecycleHooks};
