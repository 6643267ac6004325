use alloc::borrow::ToOwned;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use cask_utils::hash::IdHashMap;

use crate::{Archive, ArchiveError, ArchiveNode, NodeHeader, NodeId};

// -----------------------------------------------------------------------------
// TreeArchive

#[derive(Debug, Clone, Copy)]
struct Frame {
    // Index of this node in its parent, unused for the root.
    child: usize,
    // Next child to hand out.
    next: usize,
}

/// An [`Archive`] that keeps the node tree in memory.
///
/// The tree renders through `serde`, so any data format can carry it:
///
/// ```
/// use cask_archive::{Archive, NodeHeader, NodeId, NodeKind, TreeArchive};
///
/// let mut archive = TreeArchive::new();
/// archive.begin_node(NodeHeader::new(NodeKind::String, "string", "root", NodeId::new(0))).unwrap();
/// archive.write_leaf_value("hello").unwrap();
/// archive.end_node().unwrap();
///
/// let json = serde_json::to_string(archive.data()).unwrap();
/// let back: TreeArchive = serde_json::from_str(&json).unwrap();
///
/// assert_eq!(back.root(), archive.root());
/// ```
#[derive(Debug, Clone)]
pub struct TreeArchive {
    version: String,
    root: Option<ArchiveNode>,
    // Nodes opened by `begin_node` and not closed yet.
    open: Vec<ArchiveNode>,
    cursor: Vec<Frame>,
    root_read: bool,
    // Path of child indices from the root, per id.
    index: IdHashMap<NodeId, Vec<usize>>,
}

impl Default for TreeArchive {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArchive {
    /// The format version written by this backend.
    ///
    /// Archives sharing the major component can be read; a newer minor
    /// component is accepted with a warning.
    pub const VERSION: &'static str = "1.0.0";

    /// Creates an empty archive ready for writing.
    pub fn new() -> Self {
        Self {
            version: Self::VERSION.to_owned(),
            root: None,
            open: Vec::new(),
            cursor: Vec::new(),
            root_read: false,
            index: IdHashMap::default(),
        }
    }

    /// Creates an archive holding an already built tree.
    pub fn from_root(root: ArchiveNode) -> Self {
        let mut archive = Self::new();
        archive.root = Some(root);
        archive.rebuild_index();
        archive
    }

    /// Creates an archive from decoded parts, checking the version.
    pub fn with_version(version: &str, root: Option<ArchiveNode>) -> Result<Self, ArchiveError> {
        check_version(version)?;
        let mut archive = Self::new();
        archive.version = version.to_owned();
        archive.root = root;
        archive.rebuild_index();
        Ok(archive)
    }

    /// Returns the root node once it has been closed.
    #[inline]
    pub fn root(&self) -> Option<&ArchiveNode> {
        self.root.as_ref()
    }

    #[inline]
    pub fn into_root(self) -> Option<ArchiveNode> {
        self.root
    }

    /// Moves the read cursor back before the root.
    pub fn rewind(&mut self) {
        self.cursor.clear();
        self.root_read = false;
    }

    fn rebuild_index(&mut self) {
        fn visit(
            node: &ArchiveNode,
            path: &mut Vec<usize>,
            index: &mut IdHashMap<NodeId, Vec<usize>>,
        ) {
            // The first occurrence wins, duplicates are left to the reader.
            index.entry(node.header.id).or_insert_with(|| path.clone());
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                visit(child, path, index);
                path.pop();
            }
        }

        self.index.clear();
        if let Some(root) = &self.root {
            visit(root, &mut Vec::new(), &mut self.index);
        }
    }

    fn node_at(&self, path: &[usize]) -> Option<&ArchiveNode> {
        let mut node = self.root.as_ref()?;
        for &i in path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    fn current(&self) -> Option<&ArchiveNode> {
        if self.cursor.is_empty() {
            return None;
        }
        let mut node = self.root.as_ref()?;
        for frame in &self.cursor[1..] {
            node = node.children.get(frame.child)?;
        }
        Some(node)
    }
}

fn major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor))
}

fn check_version(found: &str) -> Result<(), ArchiveError> {
    let unsupported = || ArchiveError::UnsupportedVersion {
        found: found.to_owned(),
        expected: TreeArchive::VERSION,
    };
    let (major, minor) = major_minor(found).ok_or_else(unsupported)?;
    let (own_major, own_minor) = major_minor(TreeArchive::VERSION).ok_or_else(unsupported)?;
    if major != own_major {
        return Err(unsupported());
    }
    if minor > own_minor {
        log::warn!(
            "archive version `{found}` is newer than `{}`, unknown data may be ignored",
            TreeArchive::VERSION
        );
    }
    Ok(())
}

impl Archive for TreeArchive {
    fn begin_node(&mut self, header: NodeHeader) -> Result<(), ArchiveError> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(ArchiveError::RootExists);
        }
        self.open.push(ArchiveNode::new(header));
        Ok(())
    }

    fn write_leaf_value(&mut self, raw: &str) -> Result<(), ArchiveError> {
        let node = self.open.last_mut().ok_or(ArchiveError::NoOpenNode)?;
        node.value = Some(raw.to_owned());
        Ok(())
    }

    fn end_node(&mut self) -> Result<(), ArchiveError> {
        let node = self.open.pop().ok_or(ArchiveError::UnbalancedEnd)?;
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => {
                self.root = Some(node);
                self.rebuild_index();
            }
        }
        Ok(())
    }

    fn read_next_node(&mut self) -> Result<Option<NodeHeader>, ArchiveError> {
        let Some(root) = &self.root else {
            return Err(ArchiveError::Empty);
        };

        if self.cursor.is_empty() {
            if self.root_read {
                return Ok(None);
            }
            let header = root.header.clone();
            self.root_read = true;
            self.cursor.push(Frame { child: 0, next: 0 });
            return Ok(Some(header));
        }

        let (header, index) = {
            let current = self.current().ok_or(ArchiveError::NoCurrentNode)?;
            let next = self.cursor.last().map_or(0, |f| f.next);
            match current.children.get(next) {
                Some(child) => (child.header.clone(), next),
                None => return Ok(None),
            }
        };

        if let Some(frame) = self.cursor.last_mut() {
            frame.next += 1;
        }
        self.cursor.push(Frame {
            child: index,
            next: 0,
        });
        Ok(Some(header))
    }

    fn read_leaf_value(&mut self) -> Result<String, ArchiveError> {
        let node = self.current().ok_or(ArchiveError::NoCurrentNode)?;
        node.value
            .clone()
            .ok_or(ArchiveError::MissingValue(node.header.id))
    }

    fn leave_node(&mut self) -> Result<(), ArchiveError> {
        self.cursor.pop().map(|_| ()).ok_or(ArchiveError::NoCurrentNode)
    }

    fn find_node(&self, id: NodeId) -> Option<NodeHeader> {
        let path = self.index.get(&id)?;
        self.node_at(path).map(|node| node.header.clone())
    }

    #[inline]
    fn version(&self) -> &str {
        &self.version
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    fn data(&self) -> &dyn erased_serde::Serialize {
        self
    }

    fn load(&mut self, data: &mut dyn erased_serde::Deserializer<'_>) -> Result<(), ArchiveError> {
        let parts: crate::serde::ArchiveParts =
            erased_serde::deserialize(data).map_err(|e| ArchiveError::Decode(e.to_string()))?;
        *self = Self::with_version(&parts.version, parts.root)?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
