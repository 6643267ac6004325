use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::NodeKind;

// -----------------------------------------------------------------------------
// NodeId

/// Identifier of one node, unique within an archive.
///
/// Ids are handed out in traversal order starting at `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Parses the textual form written into reference nodes.
    #[inline]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().map(Self)
    }
}

impl fmt::Display for NodeId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// -----------------------------------------------------------------------------
// NodeHeader

/// Everything about a node except its content.
///
/// - `static_type`: the declared type at the point of use.
/// - `runtime_type`: the actual type of an object, which may be a subtype of
///   `static_type`. Only objects carry it.
/// - `base_type`: the underlying integral type of an enum.
/// - `length`: element count of arrays and maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHeader {
    pub kind: NodeKind,
    pub static_type: String,
    pub runtime_type: Option<String>,
    pub base_type: Option<String>,
    pub key: String,
    pub id: NodeId,
    pub length: Option<usize>,
}

impl NodeHeader {
    pub fn new(
        kind: NodeKind,
        static_type: impl Into<String>,
        key: impl Into<String>,
        id: NodeId,
    ) -> Self {
        Self {
            kind,
            static_type: static_type.into(),
            runtime_type: None,
            base_type: None,
            key: key.into(),
            id,
            length: None,
        }
    }

    #[inline]
    pub fn with_runtime_type(mut self, runtime_type: impl Into<String>) -> Self {
        self.runtime_type = Some(runtime_type.into());
        self
    }

    #[inline]
    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    #[inline]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// The most derived type known for this node.
    #[inline]
    pub fn type_name(&self) -> &str {
        self.runtime_type.as_deref().unwrap_or(&self.static_type)
    }
}

// -----------------------------------------------------------------------------
// ArchiveNode

/// One node of an archive tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveNode {
    pub header: NodeHeader,
    pub value: Option<String>,
    pub children: Vec<ArchiveNode>,
}

impl ArchiveNode {
    #[inline]
    pub const fn new(header: NodeHeader) -> Self {
        Self {
            header,
            value: None,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.header.kind
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.header.id
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.header.key
    }

    /// Returns the raw leaf value, if any.
    #[inline]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the first direct child with the given key.
    pub fn child(&self, key: &str) -> Option<&ArchiveNode> {
        self.children.iter().find(|c| c.header.key == key)
    }

    /// Finds the node with the given id in this subtree.
    pub fn find(&self, id: NodeId) -> Option<&ArchiveNode> {
        self.descendants().into_iter().find(|n| n.header.id == id)
    }

    /// Collects this node and every node below it in pre-order.
    pub fn descendants(&self) -> Vec<&ArchiveNode> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

// -----------------------------------------------------------------------------
// Tests
