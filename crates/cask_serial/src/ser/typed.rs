use alloc::borrow::ToOwned;

use cask_archive::{NodeHeader, NodeId, NodeKind};
use cask_utils::vec::FastVec;

use super::Serializer;
use crate::{ANY_TYPE, Error};
use crate::info::{HookPoint, TypeDescriptor, TypeInfo};
use crate::value::{EnumValue, HeapKey, StructValue};

// -----------------------------------------------------------------------------
// Registered types

impl Serializer<'_> {
    pub(super) fn write_struct(&mut self, key: &str, value: &StructValue) -> Result<NodeId, Error> {
        let registry = self.registry;
        let descriptor = registry.get(&value.type_name);
        if let Some(descriptor) = descriptor
            && !matches!(descriptor.info(), TypeInfo::Struct(_))
        {
            return Err(Error::KindMismatch {
                expected: "a struct type".into(),
                found: value.type_name.clone(),
                at: self.at(key, None),
            });
        }

        let id = self.ids.next_id();
        self.archive.begin_node(NodeHeader::new(NodeKind::Struct, &value.type_name, key, id))?;
        match descriptor {
            Some(descriptor) => match descriptor.custom() {
                Some(custom) => (custom.serialize)(value, self)?,
                None => {
                    let fields = descriptor
                        .fields()
                        .iter()
                        .filter(|f| !f.is_skipped())
                        .collect::<FastVec<_, 8>>();
                    for &field in fields.as_slice() {
                        let Some(field_value) = value.field(field.name()) else {
                            return Err(Error::MissingField {
                                type_name: value.type_name.clone(),
                                field: field.name().into(),
                                at: self.at(key, Some(id)),
                            });
                        };
                        self.write_value(field.name(), field_value, Some(field.type_name()))?;
                    }
                }
            },
            // Unregistered structs are self-describing.
            None => {
                for (name, field_value) in &value.fields {
                    self.write_value(name, field_value, None)?;
                }
            }
        }
        self.archive.end_node()?;
        Ok(id)
    }

    pub(super) fn write_enum(&mut self, key: &str, value: &EnumValue) -> Result<NodeId, Error> {
        let registry = self.registry;
        let descriptor = registry
            .lookup(&value.type_name)
            .map_err(|e| Error::from_registry(e, self.at(key, None)))?;
        let Some(info) = descriptor.as_enum() else {
            return Err(Error::KindMismatch {
                expected: "an enum type".into(),
                found: value.type_name.clone(),
                at: self.at(key, None),
            });
        };
        if info.ordinal_of(&value.member).is_none() {
            return Err(Error::UnknownMember {
                type_name: value.type_name.clone(),
                member: value.member.clone(),
                at: self.at(key, None),
            });
        }

        let id = self.ids.next_id();
        let header = NodeHeader::new(NodeKind::Enum, &value.type_name, key, id).with_base_type(info.base().name());
        self.archive.begin_node(header)?;
        self.archive.write_leaf_value(&value.member)?;
        self.archive.end_node()?;
        Ok(id)
    }

    /// Writes an object seen for the first time.
    pub(super) fn write_object(
        &mut self,
        key: &str,
        handle: HeapKey,
        id: NodeId,
        declared: Option<&str>,
    ) -> Result<NodeId, Error> {
        let registry = self.registry;
        let Some(runtime_type) = self.heap.object(handle).map(|o| o.runtime_type().to_owned()) else {
            return Err(Error::DanglingHandle { at: self.at(key, Some(id)) });
        };
        let chain = registry
            .chain(&runtime_type)
            .map_err(|e| Error::from_registry(e, self.at(key, Some(id))))?;
        if let Some(declared) = declared.filter(|d| *d != ANY_TYPE)
            && !chain.iter().any(|d| d.name() == declared)
        {
            return Err(Error::KindMismatch {
                expected: declared.into(),
                found: runtime_type,
                at: self.at(key, Some(id)),
            });
        }
        log::trace!("writing `{runtime_type}` object {id} at `{key}`");

        self.run_hooks(&chain, handle, HookPoint::Serializing);

        let header = NodeHeader::new(NodeKind::Object, declared.unwrap_or(&runtime_type), key, id)
            .with_runtime_type(runtime_type.as_str());
        self.archive.begin_node(header)?;
        for descriptor in &chain {
            self.write_layer(descriptor, handle)?;
        }
        self.archive.end_node()?;

        self.run_hooks(&chain, handle, HookPoint::Serialized);
        Ok(id)
    }

    fn write_layer(&mut self, descriptor: &TypeDescriptor, handle: HeapKey) -> Result<(), Error> {
        let name = descriptor.name();
        let id = self.ids.next_id();
        self.session.enter(name, Some(id))?;
        let result = self.write_layer_fields(descriptor, handle, id);
        self.session.leave();
        result
    }

    fn write_layer_fields(&mut self, descriptor: &TypeDescriptor, handle: HeapKey, id: NodeId) -> Result<(), Error> {
        let name = descriptor.name();
        self.archive.begin_node(NodeHeader::new(NodeKind::Base, name, name, id))?;
        let fields = descriptor
            .fields()
            .iter()
            .filter(|f| !f.is_skipped())
            .collect::<FastVec<_, 8>>();
        for &field in fields.as_slice() {
            let value = self
                .heap
                .object(handle)
                .and_then(|o| o.layer(name))
                .and_then(|l| l.field(field.name()))
                .cloned();
            let Some(value) = value else {
                return Err(Error::MissingField {
                    type_name: name.into(),
                    field: field.name().into(),
                    at: self.at(name, Some(id)),
                });
            };
            self.write_value(field.name(), &value, Some(field.type_name()))?;
        }
        self.archive.end_node()?;
        Ok(())
    }

    fn run_hooks(&mut self, chain: &[&TypeDescriptor], handle: HeapKey, point: HookPoint) {
        if let Some(object) = self.heap.object_mut(handle) {
            for descriptor in chain {
                descriptor.hooks().invoke(point, object);
            }
        }
    }
}
