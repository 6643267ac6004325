use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde_core::de::{Error, IgnoredAny, MapAccess, Visitor};
use serde_core::{Deserialize, Deserializer};

use super::{ARCHIVE_FIELDS, NODE_FIELDS};
use crate::{ArchiveNode, NodeHeader, NodeId, NodeKind, TreeArchive};

// -----------------------------------------------------------------------------
// Scalars

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KindVisitor;

        impl<'de> Visitor<'de> for KindVisitor {
            type Value = NodeKind;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("node kind")
            }

            fn visit_str<E: Error>(self, value: &str) -> Result<Self::Value, E> {
                NodeKind::from_name(value).ok_or_else(|| E::unknown_variant(value, NodeKind::NAMES))
            }
        }

        deserializer.deserialize_str(KindVisitor)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(NodeId::new)
    }
}

// -----------------------------------------------------------------------------
// Field identifiers

enum NodeField {
    Kind,
    Type,
    RuntimeType,
    BaseType,
    Key,
    Id,
    Length,
    Value,
    Children,
    Ignore,
}

impl<'de> Deserialize<'de> for NodeField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl<'de> Visitor<'de> for FieldVisitor {
            type Value = NodeField;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("node field identifier")
            }

            fn visit_str<E: Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(match value {
                    "kind" => NodeField::Kind,
                    "type" => NodeField::Type,
                    "runtime_type" => NodeField::RuntimeType,
                    "base_type" => NodeField::BaseType,
                    "key" => NodeField::Key,
                    "id" => NodeField::Id,
                    "length" => NodeField::Length,
                    "value" => NodeField::Value,
                    "children" => NodeField::Children,
                    _ => NodeField::Ignore,
                })
            }
        }

        deserializer.deserialize_identifier(FieldVisitor)
    }
}

enum ArchiveField {
    Version,
    Root,
    Ignore,
}

impl<'de> Deserialize<'de> for ArchiveField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl<'de> Visitor<'de> for FieldVisitor {
            type Value = ArchiveField;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("archive field identifier")
            }

            fn visit_str<E: Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(match value {
                    "version" => ArchiveField::Version,
                    "root" => ArchiveField::Root,
                    _ => ArchiveField::Ignore,
                })
            }
        }

        deserializer.deserialize_identifier(FieldVisitor)
    }
}

// -----------------------------------------------------------------------------
// ArchiveNode

impl<'de> Deserialize<'de> for ArchiveNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = ArchiveNode;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("archive node")
            }

            fn visit_map<V: MapAccess<'de>>(self, mut map: V) -> Result<Self::Value, V::Error> {
                let mut kind: Option<NodeKind> = None;
                let mut static_type: Option<String> = None;
                let mut runtime_type: Option<String> = None;
                let mut base_type: Option<String> = None;
                let mut key: Option<String> = None;
                let mut id: Option<NodeId> = None;
                let mut length: Option<usize> = None;
                let mut value: Option<String> = None;
                let mut children: Vec<ArchiveNode> = Vec::new();

                while let Some(field) = map.next_key::<NodeField>()? {
                    match field {
                        NodeField::Kind => kind = Some(map.next_value()?),
                        NodeField::Type => static_type = Some(map.next_value()?),
                        NodeField::RuntimeType => runtime_type = Some(map.next_value()?),
                        NodeField::BaseType => base_type = Some(map.next_value()?),
                        NodeField::Key => key = Some(map.next_value()?),
                        NodeField::Id => id = Some(map.next_value()?),
                        NodeField::Length => length = Some(map.next_value()?),
                        NodeField::Value => value = Some(map.next_value()?),
                        NodeField::Children => children = map.next_value()?,
                        NodeField::Ignore => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }

                let kind = kind.ok_or_else(|| V::Error::missing_field("kind"))?;
                let static_type = static_type.ok_or_else(|| V::Error::missing_field("type"))?;
                let key = key.ok_or_else(|| V::Error::missing_field("key"))?;
                let id = id.ok_or_else(|| V::Error::missing_field("id"))?;

                Ok(ArchiveNode {
                    header: NodeHeader {
                        kind,
                        static_type,
                        runtime_type,
                        base_type,
                        key,
                        id,
                        length,
                    },
                    value,
                    children,
                })
            }
        }

        deserializer.deserialize_struct("ArchiveNode", NODE_FIELDS, NodeVisitor)
    }
}

// -----------------------------------------------------------------------------
// Archive

/// An archive as decoded, before its version is checked.
pub(crate) struct ArchiveParts {
    pub version: String,
    pub root: Option<ArchiveNode>,
}

impl<'de> Deserialize<'de> for ArchiveParts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ArchiveVisitor;

        impl<'de> Visitor<'de> for ArchiveVisitor {
            type Value = ArchiveParts;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("archive")
            }

            fn visit_map<V: MapAccess<'de>>(self, mut map: V) -> Result<Self::Value, V::Error> {
                let mut version: Option<String> = None;
                let mut root: Option<ArchiveNode> = None;

                while let Some(field) = map.next_key::<ArchiveField>()? {
                    match field {
                        ArchiveField::Version => version = Some(map.next_value()?),
                        ArchiveField::Root => root = map.next_value()?,
                        ArchiveField::Ignore => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }

                Ok(ArchiveParts {
                    version: version.ok_or_else(|| V::Error::missing_field("version"))?,
                    root,
                })
            }
        }

        deserializer.deserialize_struct("TreeArchive", ARCHIVE_FIELDS, ArchiveVisitor)
    }
}

impl<'de> Deserialize<'de> for TreeArchive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = ArchiveParts::deserialize(deserializer)?;
        TreeArchive::with_version(&parts.version, parts.root).map_err(D::Error::custom)
    }
}
