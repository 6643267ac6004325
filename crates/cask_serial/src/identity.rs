//! Identity bookkeeping for one session.
//!
//! The serializing side hands out node ids and remembers which heap handle
//! got which id, so a handle reached twice becomes a reference. The
//! deserializing side maps ids back to the handles it allocated, including
//! shells allocated early for forward references.

use alloc::format;
use alloc::string::String;

use cask_archive::{NodeId, NodeKind};
use cask_utils::hash::{HashMap, IdHashMap};
use thiserror::Error;

use crate::value::HeapKey;

// -----------------------------------------------------------------------------
// IdentityTracker

/// Serialize-side identity map: handle to id.
///
/// Ids come from one counter shared by every node of the session, so they are
/// unique and increase in traversal order.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    seen: HashMap<HeapKey, NodeId>,
    next: u32,
}

impl IdentityTracker {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh id for a node without identity.
    #[inline]
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next);
        self.next += 1;
        id
    }

    /// The id of `handle`, and whether it was assigned by this call.
    ///
    /// # Examples
    ///
    /// ```
    /// use cask_serial::identity::IdentityTracker;
    /// use cask_serial::value::{Heap, HeapCell, Value};
    ///
    /// let mut heap = Heap::new();
    /// let key = heap.alloc(HeapCell::Boxed(Value::Null));
    ///
    /// let mut ids = IdentityTracker::new();
    /// let (first, is_new) = ids.id_for(key);
    /// assert!(is_new);
    /// assert_eq!(ids.id_for(key), (first, false));
    /// ```
    pub fn id_for(&mut self, handle: HeapKey) -> (NodeId, bool) {
        if let Some(&id) = self.seen.get(&handle) {
            return (id, false);
        }
        let id = self.next_id();
        self.seen.insert(handle, id);
        (id, true)
    }

    #[inline]
    pub fn get(&self, handle: HeapKey) -> Option<NodeId> {
        self.seen.get(&handle).copied()
    }

    /// Number of handles seen so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
        self.next = 0;
    }
}

// -----------------------------------------------------------------------------
// IdentityResolver

/// Two nodes disagree about one id.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("id {id}: {reason}")]
pub struct IdentityConflict {
    pub id: NodeId,
    pub reason: String,
}

#[derive(Debug, Clone, Copy)]
struct Resolved {
    handle: HeapKey,
    kind: NodeKind,
    defined: bool,
}

/// Deserialize-side identity map: id to handle.
///
/// An id is *reserved* when a reference reaches it before its node, and
/// *defined* once its node is read. Defining an id twice, or under another
/// kind than it was reserved with, is a conflict.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    entries: IdHashMap<NodeId, Resolved>,
}

impl IdentityResolver {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle registered for `id`, defined or not.
    #[inline]
    pub fn resolve(&self, id: NodeId) -> Option<HeapKey> {
        self.entries.get(&id).map(|e| e.handle)
    }

    /// Registers a shell allocated for a node not read yet.
    pub fn reserve(&mut self, id: NodeId, handle: HeapKey, kind: NodeKind) -> Result<(), IdentityConflict> {
        if self.entries.contains_key(&id) {
            return Err(IdentityConflict {
                id,
                reason: "is already registered".into(),
            });
        }
        self.entries.insert(
            id,
            Resolved {
                handle,
                kind,
                defined: false,
            },
        );
        Ok(())
    }

    /// Starts the definition of `id` by a node of `kind`.
    ///
    /// Returns the reserved shell to populate, or `None` if the caller should
    /// allocate a new cell. The id must then be [`define`](Self::define)d
    /// before any child node is read.
    pub fn claim(&self, id: NodeId, kind: NodeKind) -> Result<Option<HeapKey>, IdentityConflict> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(None);
        };
        if entry.defined {
            return Err(IdentityConflict {
                id,
                reason: "is defined by more than one node".into(),
            });
        }
        if entry.kind != kind {
            return Err(IdentityConflict {
                id,
                reason: format!("was referenced as {} but is defined as {kind}", entry.kind),
            });
        }
        Ok(Some(entry.handle))
    }

    /// Marks `id` as defined by the cell `handle`.
    pub fn define(&mut self, id: NodeId, handle: HeapKey, kind: NodeKind) {
        self.entries.insert(
            id,
            Resolved {
                handle,
                kind,
                defined: true,
            },
        );
    }

    /// The smallest id that was reserved and never defined.
    pub fn first_undefined(&self) -> Option<NodeId> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.defined)
            .map(|(id, _)| *id)
            .min()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

// -----------------------------------------------------------------------------
// Tests
