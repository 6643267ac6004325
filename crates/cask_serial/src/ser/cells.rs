use alloc::string::ToString;

use cask_archive::{NodeHeader, NodeId, NodeKind};

use super::Serializer;
use crate::value::{HeapCell, HeapKey, Value};
use crate::{ANY_TYPE, Error};

// -----------------------------------------------------------------------------
// Heap cells

impl Serializer<'_> {
    /// Writes the cell behind `handle`, or a reference if it was written
    /// before in this session.
    pub(super) fn write_handle(
        &mut self,
        key: &str,
        handle: HeapKey,
        declared: Option<&str>,
    ) -> Result<NodeId, Error> {
        let Some(cell) = self.heap.get(handle) else {
            return Err(Error::DanglingHandle { at: self.at(key, None) });
        };
        let kind = cell.kind();
        let static_type = cell.static_type();
        let seen = self.ids.get(handle).is_some();

        // First writes of objects are checked against their resolved chain.
        if let Some(expected) = declared.filter(|d| *d != ANY_TYPE)
            && (seen || kind != NodeKind::Object)
        {
            let accepted = match cell {
                HeapCell::Object(object) => self.registry.is_subtype(object.runtime_type(), expected),
                _ => static_type == expected,
            };
            if !accepted {
                return Err(Error::KindMismatch {
                    expected: expected.into(),
                    found: static_type,
                    at: self.at(key, None),
                });
            }
        }

        let (id, is_new) = self.ids.id_for(handle);
        if !is_new {
            return self.write_reference(key, id, declared.unwrap_or(&static_type));
        }

        match kind {
            NodeKind::Array => self.write_array(key, handle, id),
            NodeKind::Map => self.write_map(key, handle, id),
            NodeKind::Object => self.write_object(key, handle, id, declared),
            _ => self.write_pointer(key, handle, id),
        }
    }

    fn write_reference(&mut self, key: &str, target: NodeId, static_type: &str) -> Result<NodeId, Error> {
        let id = self.ids.next_id();
        self.archive.begin_node(NodeHeader::new(NodeKind::Reference, static_type, key, id))?;
        self.archive.write_leaf_value(&target.to_string())?;
        self.archive.end_node()?;
        Ok(id)
    }

    fn write_array(&mut self, key: &str, handle: HeapKey, id: NodeId) -> Result<NodeId, Error> {
        let Some(array) = self.heap.array(handle) else {
            return Err(Error::DanglingHandle { at: self.at(key, Some(id)) });
        };
        let static_type = array.static_type();
        let element_type = array.element_type.clone();
        let elements = array.elements.clone();

        let header = NodeHeader::new(NodeKind::Array, static_type, key, id).with_length(elements.len());
        self.archive.begin_node(header)?;
        for (index, element) in elements.iter().enumerate() {
            self.write_value(&index.to_string(), element, Some(&element_type))?;
        }
        self.archive.end_node()?;
        Ok(id)
    }

    fn write_map(&mut self, key: &str, handle: HeapKey, id: NodeId) -> Result<NodeId, Error> {
        let Some(map) = self.heap.map(handle) else {
            return Err(Error::DanglingHandle { at: self.at(key, Some(id)) });
        };
        let static_type = map.static_type();
        let (key_type, value_type) = (map.key_type.clone(), map.value_type.clone());
        let entries = map.entries.clone();

        let header = NodeHeader::new(NodeKind::Map, static_type, key, id).with_length(entries.len());
        self.archive.begin_node(header)?;
        for (index, (entry_key, entry_value)) in entries.iter().enumerate() {
            let index = index.to_string();
            let entry_id = self.ids.next_id();
            self.session.enter(&index, Some(entry_id))?;
            let result = self.write_entry(
                &index,
                entry_id,
                (entry_key, key_type.as_str()),
                (entry_value, value_type.as_str()),
            );
            self.session.leave();
            result?;
        }
        self.archive.end_node()?;
        Ok(id)
    }

    fn write_entry(
        &mut self,
        index: &str,
        id: NodeId,
        (key, key_type): (&Value, &str),
        (value, value_type): (&Value, &str),
    ) -> Result<(), Error> {
        self.archive
            .begin_node(NodeHeader::new(NodeKind::Entry, NodeKind::Entry.as_str(), index, id))?;
        self.write_value("key", key, Some(key_type))?;
        self.write_value("value", value, Some(value_type))?;
        self.archive.end_node()?;
        Ok(())
    }

    fn write_pointer(&mut self, key: &str, handle: HeapKey, id: NodeId) -> Result<NodeId, Error> {
        let Some(HeapCell::Boxed(value)) = self.heap.get(handle) else {
            return Err(Error::DanglingHandle { at: self.at(key, Some(id)) });
        };
        let value = value.clone();

        self.archive.begin_node(NodeHeader::new(NodeKind::Pointer, NodeKind::Pointer.as_str(), key, id))?;
        self.write_value("value", &value, None)?;
        self.archive.end_node()?;
        Ok(id)
    }
}
