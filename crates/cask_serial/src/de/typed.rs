use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use cask_archive::{NodeHeader, NodeKind};

use super::Deserializer;
use crate::{ANY_TYPE, Error};
use crate::info::{FieldInfo, HookPoint, TypeDescriptor};
use crate::value::{HeapKey, StructValue, Value};

// -----------------------------------------------------------------------------
// Registered types

impl Deserializer<'_> {
    pub(super) fn read_struct(&mut self, header: &NodeHeader) -> Result<Value, Error> {
        let registry = self.registry;
        let type_name = header.static_type.as_str();
        let descriptor = registry.get(type_name);
        if let Some(descriptor) = descriptor
            && descriptor.kind() != NodeKind::Struct
        {
            return Err(Error::KindMismatch {
                expected: "a struct type".into(),
                found: type_name.into(),
                at: self.header_at(header),
            });
        }

        let mut value = StructValue::new(type_name);
        match descriptor {
            Some(descriptor) => {
                for field in descriptor.fields() {
                    value.set_field(field.name(), field.initial_value());
                }
                match descriptor.custom() {
                    Some(custom) => (custom.deserialize)(&mut value, self)?,
                    None => {
                        for (name, field_value) in self.read_fields(header, type_name, descriptor.fields())? {
                            value.set_field(name, field_value);
                        }
                    }
                }
            }
            None => {
                while let Some(child) = self.archive.read_next_node()? {
                    let name = child.key.clone();
                    let field_value = self.read_value(child, None)?;
                    value.set_field(name, field_value);
                }
            }
        }
        Ok(Value::Struct(value))
    }

    pub(super) fn read_object(&mut self, header: &NodeHeader, declared: Option<&str>) -> Result<Value, Error> {
        let registry = self.registry;
        let runtime_type = header.type_name();
        // Resolve before allocating anything.
        let chain = registry
            .chain(runtime_type)
            .map_err(|e| Error::from_registry(e, self.header_at(header)))?;
        if let Some(declared) = declared.filter(|d| *d != ANY_TYPE)
            && !chain.iter().any(|d| d.name() == declared)
        {
            return Err(self.mismatch(header, NodeKind::Object, runtime_type, Some(declared)));
        }

        let handle = self.define(header)?;
        self.run_hooks(&chain, handle, HookPoint::Deserializing);

        let mut seen: Vec<&str> = Vec::new();
        while let Some(layer) = self.archive.read_next_node()? {
            if layer.kind != NodeKind::Base {
                let reason = format!("expected a base layer, found a {} node", layer.kind);
                return Err(self.parse_error(&layer, reason));
            }
            let Some(descriptor) = chain.iter().find(|d| d.name() == layer.static_type) else {
                let reason = format!("`{}` is not in the inheritance chain of `{runtime_type}`", layer.static_type);
                return Err(self.parse_error(&layer, reason));
            };
            if seen.contains(&descriptor.name()) {
                let reason = format!("layer `{}` appears twice", descriptor.name());
                return Err(self.parse_error(&layer, reason));
            }
            seen.push(descriptor.name());

            self.session.enter(&layer.key, Some(layer.id))?;
            let fields = self.read_fields(&layer, descriptor.name(), descriptor.fields());
            self.session.leave();
            let fields = fields?;
            self.archive.leave_node()?;

            if let Some(target) = self
                .heap
                .object_mut(handle)
                .and_then(|o| o.layer_mut(descriptor.name()))
            {
                for (name, value) in fields {
                    target.set_field(name, value);
                }
            }
        }

        // Layers absent from the archive keep their defaults.
        for descriptor in chain.iter().filter(|d| !seen.contains(&d.name())) {
            if let Some(field) = descriptor.fields().iter().find(|f| f.is_required()) {
                return Err(Error::MissingField {
                    type_name: descriptor.name().into(),
                    field: field.name().into(),
                    at: self.header_at(header),
                });
            }
        }

        self.run_hooks(&chain, handle, HookPoint::Deserialized);
        Ok(Value::Ref(handle))
    }

    /// Reads the children of a struct or layer node as fields of `type_name`.
    ///
    /// Unknown keys fail, absent fields are left out of the result and must
    /// have a default.
    fn read_fields(
        &mut self,
        owner: &NodeHeader,
        type_name: &str,
        fields: &[FieldInfo],
    ) -> Result<Vec<(String, Value)>, Error> {
        let mut read: Vec<(String, Value)> = Vec::new();
        while let Some(child) = self.archive.read_next_node()? {
            let Some(field) = fields.iter().find(|f| f.name() == child.key && !f.is_skipped()) else {
                let reason = format!("`{type_name}` has no field `{}`", child.key);
                return Err(self.parse_error(&child, reason));
            };
            if read.iter().any(|(name, _)| name == field.name()) {
                let reason = format!("field `{}` appears twice", field.name());
                return Err(self.parse_error(&child, reason));
            }
            let value = self.read_value(child, Some(field.type_name()))?;
            read.push((field.name().into(), value));
        }

        let missing = fields
            .iter()
            .find(|f| f.is_required() && !read.iter().any(|(name, _)| name == f.name()));
        if let Some(field) = missing {
            return Err(Error::MissingField {
                type_name: type_name.into(),
                field: field.name().into(),
                at: self.header_at(owner),
            });
        }
        Ok(read)
    }

    fn run_hooks(&mut self, chain: &[&TypeDescriptor], handle: HeapKey, point: HookPoint) {
        if let Some(object) = self.heap.object_mut(handle) {
            for descriptor in chain {
                descriptor.hooks().invoke(point, object);
            }
        }
    }
}
