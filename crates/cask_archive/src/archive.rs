use alloc::string::String;

use crate::{ArchiveError, NodeHeader, NodeId};

// -----------------------------------------------------------------------------
// Archive

/// A backend able to store and replay a tree of archive nodes.
///
/// The trait is object safe; the serialization engine only ever holds a
/// `&mut dyn Archive`, so any tree-shaped store can sit behind it.
///
/// # Writing
///
/// Nodes are written depth first: [`begin_node`] opens a node as a child of
/// the currently open one, [`write_leaf_value`] sets its raw content and
/// [`end_node`] closes it. An archive holds exactly one root.
///
/// # Reading
///
/// Reading is cursor based and mirrors writing. [`read_next_node`] enters the
/// next unread child of the current node (the root on the first call) and
/// returns its header, or `None` once the children are exhausted.
/// [`leave_node`] returns to the parent, skipping whatever was not read.
///
/// [`find_node`] gives random access to headers by id, which is what lets a
/// reader resolve a reference to a node it has not reached yet.
///
/// [`begin_node`]: Archive::begin_node
/// [`write_leaf_value`]: Archive::write_leaf_value
/// [`end_node`]: Archive::end_node
/// [`read_next_node`]: Archive::read_next_node
/// [`leave_node`]: Archive::leave_node
/// [`find_node`]: Archive::find_node
pub trait Archive {
    fn begin_node(&mut self, header: NodeHeader) -> Result<(), ArchiveError>;

    fn write_leaf_value(&mut self, raw: &str) -> Result<(), ArchiveError>;

    fn end_node(&mut self) -> Result<(), ArchiveError>;

    fn read_next_node(&mut self) -> Result<Option<NodeHeader>, ArchiveError>;

    /// Returns the raw content of the node the cursor is in.
    fn read_leaf_value(&mut self) -> Result<String, ArchiveError>;

    fn leave_node(&mut self) -> Result<(), ArchiveError>;

    fn find_node(&self, id: NodeId) -> Option<NodeHeader>;

    /// The format version of the data held by this archive.
    fn version(&self) -> &str;

    /// Drops all data and rewinds the cursor.
    fn reset(&mut self);

    /// The serialized form, renderable with any `serde` data format.
    fn data(&self) -> &dyn erased_serde::Serialize;

    /// Replaces the content with data previously rendered from [`data`](Archive::data).
    fn load(&mut self, data: &mut dyn erased_serde::Deserializer<'_>) -> Result<(), ArchiveError>;
}
