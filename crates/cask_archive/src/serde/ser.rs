use serde_core::ser::SerializeStruct;
use serde_core::{Serialize, Serializer};

use crate::{ArchiveNode, NodeId, NodeKind, TreeArchive};

impl Serialize for NodeKind {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for NodeId {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.get())
    }
}

impl Serialize for ArchiveNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let header = &self.header;
        let len = 4
            + usize::from(header.runtime_type.is_some())
            + usize::from(header.base_type.is_some())
            + usize::from(header.length.is_some())
            + usize::from(self.value.is_some())
            + usize::from(!self.children.is_empty());

        let mut state = serializer.serialize_struct("ArchiveNode", len)?;
        state.serialize_field("kind", &header.kind)?;
        state.serialize_field("type", &header.static_type)?;
        match &header.runtime_type {
            Some(runtime_type) => state.serialize_field("runtime_type", runtime_type)?,
            None => state.skip_field("runtime_type")?,
        }
        match &header.base_type {
            Some(base_type) => state.serialize_field("base_type", base_type)?,
            None => state.skip_field("base_type")?,
        }
        state.serialize_field("key", &header.key)?;
        state.serialize_field("id", &header.id)?;
        match &header.length {
            Some(length) => state.serialize_field("length", length)?,
            None => state.skip_field("length")?,
        }
        match &self.value {
            Some(value) => state.serialize_field("value", value)?,
            None => state.skip_field("value")?,
        }
        if self.children.is_empty() {
            state.skip_field("children")?;
        } else {
            state.serialize_field("children", &self.children)?;
        }
        state.end()
    }
}

impl Serialize for TreeArchive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TreeArchive", 2)?;
        state.serialize_field("version", crate::Archive::version(self))?;
        state.serialize_field("root", &self.root())?;
        state.end()
    }
}
