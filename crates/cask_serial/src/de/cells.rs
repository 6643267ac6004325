use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use cask_archive::{NodeHeader, NodeKind};

use super::{Deserializer, types};
use crate::Error;
use crate::registry::shell_from_chain;
use crate::value::{ArrayCell, HeapCell, HeapKey, MapCell, Value};

// -----------------------------------------------------------------------------
// Heap cells

impl Deserializer<'_> {
    /// Returns the cell a node with identity defines: the shell reserved by an
    /// earlier forward reference, or a fresh one.
    ///
    /// The id is registered before any child is read, so children can refer
    /// back to it.
    pub(super) fn define(&mut self, header: &NodeHeader) -> Result<HeapKey, Error> {
        let claimed = self
            .ids
            .claim(header.id, header.kind)
            .map_err(|c| Error::from_conflict(c, self.header_at(header)))?;
        let handle = match claimed {
            Some(shell) => shell,
            None => {
                let cell = self.shell_for(header)?;
                self.heap.alloc(cell)
            }
        };
        self.ids.define(header.id, handle, header.kind);
        Ok(handle)
    }

    /// An empty cell of the right kind and type for `header`.
    pub(super) fn shell_for(&self, header: &NodeHeader) -> Result<HeapCell, Error> {
        match header.kind {
            NodeKind::Array => {
                let element_type = self.element_type(header)?;
                Ok(HeapCell::Array(ArrayCell::new(element_type)))
            }
            NodeKind::Map => {
                let (key_type, value_type) = self.entry_types(header)?;
                Ok(HeapCell::Map(MapCell::new(key_type, value_type)))
            }
            NodeKind::Object => {
                let runtime_type = header.type_name();
                let chain = self
                    .registry
                    .chain(runtime_type)
                    .map_err(|e| Error::from_registry(e, self.header_at(header)))?;
                Ok(HeapCell::Object(shell_from_chain(runtime_type, &chain)))
            }
            NodeKind::Pointer => Ok(HeapCell::Boxed(Value::Null)),
            kind => Err(self.parse_error(header, format!("{kind} nodes have no identity"))),
        }
    }

    pub(super) fn read_array(&mut self, header: &NodeHeader) -> Result<Value, Error> {
        let element_type = self.element_type(header)?;
        let length = self.length(header)?;
        let handle = self.define(header)?;

        let mut elements = Vec::new();
        while let Some(child) = self.archive.read_next_node()? {
            if child.key.parse::<usize>().ok() != Some(elements.len()) {
                let reason = format!("array element `{}` is out of order", child.key);
                return Err(self.parse_error(&child, reason));
            }
            elements.push(self.read_value(child, Some(&element_type))?);
        }
        if elements.len() != length {
            let reason = format!("array declares {length} elements but holds {}", elements.len());
            return Err(self.parse_error(header, reason));
        }

        if let Some(array) = self.heap.array_mut(handle) {
            array.elements = elements;
        }
        Ok(Value::Ref(handle))
    }

    pub(super) fn read_map(&mut self, header: &NodeHeader) -> Result<Value, Error> {
        let (key_type, value_type) = self.entry_types(header)?;
        let length = self.length(header)?;
        let handle = self.define(header)?;

        let mut entries = Vec::new();
        while let Some(entry) = self.archive.read_next_node()? {
            if entry.kind != NodeKind::Entry {
                let reason = format!("expected a map entry, found a {} node", entry.kind);
                return Err(self.parse_error(&entry, reason));
            }
            self.session.enter(&entry.key, Some(entry.id))?;
            let pair = self.read_entry(&entry, &key_type, &value_type);
            self.session.leave();
            entries.push(pair?);
            self.archive.leave_node()?;
        }
        if entries.len() != length {
            let reason = format!("map declares {length} entries but holds {}", entries.len());
            return Err(self.parse_error(header, reason));
        }

        if let Some(map) = self.heap.map_mut(handle) {
            map.entries = entries;
        }
        Ok(Value::Ref(handle))
    }

    fn read_entry(
        &mut self,
        entry: &NodeHeader,
        key_type: &str,
        value_type: &str,
    ) -> Result<(Value, Value), Error> {
        let (mut key, mut value) = (None, None);
        while let Some(child) = self.archive.read_next_node()? {
            let (slot, declared) = match child.key.as_str() {
                "key" => (&mut key, key_type),
                "value" => (&mut value, value_type),
                other => {
                    let reason = format!("unexpected `{other}` in a map entry");
                    return Err(self.parse_error(&child, reason));
                }
            };
            if slot.is_some() {
                let reason = format!("map entry holds `{}` twice", child.key);
                return Err(self.parse_error(&child, reason));
            }
            *slot = Some(self.read_value(child, Some(declared))?);
        }
        match (key, value) {
            (Some(key), Some(value)) => Ok((key, value)),
            _ => Err(self.parse_error(entry, "map entry lacks its key or its value")),
        }
    }

    pub(super) fn read_pointer(&mut self, header: &NodeHeader) -> Result<Value, Error> {
        let handle = self.define(header)?;
        let Some(child) = self.archive.read_next_node()? else {
            return Err(self.parse_error(header, "pointer node holds no value"));
        };
        if child.key != "value" {
            let reason = format!("unexpected `{}` in a pointer", child.key);
            return Err(self.parse_error(&child, reason));
        }
        let value = self.read_value(child, None)?;

        if let Some(slot) = self.heap.boxed_mut(handle) {
            *slot = value;
        }
        Ok(Value::Ref(handle))
    }

    fn element_type(&self, header: &NodeHeader) -> Result<String, Error> {
        match types::array_element(&header.static_type) {
            Some(element_type) => Ok(element_type.into()),
            None => {
                let reason = format!("`{}` is not an array type", header.static_type);
                Err(self.parse_error(header, reason))
            }
        }
    }

    fn entry_types(&self, header: &NodeHeader) -> Result<(String, String), Error> {
        match types::map_parts(&header.static_type) {
            Some((key_type, value_type)) => Ok((key_type.into(), value_type.into())),
            None => {
                let reason = format!("`{}` is not a map type", header.static_type);
                Err(self.parse_error(header, reason))
            }
        }
    }

    fn length(&self, header: &NodeHeader) -> Result<usize, Error> {
        header
            .length
            .ok_or_else(|| self.parse_error(header, format!("{} node without a length", header.kind)))
    }
}
