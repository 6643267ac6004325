use alloc::string::{String, ToString};
use core::fmt;

use cask_archive::{ArchiveError, NodeId};
use thiserror::Error;

use crate::identity::IdentityConflict;
use crate::registry::RegistryError;

// -----------------------------------------------------------------------------
// Location

/// Where in the archive an error was raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Key of the node being processed.
    pub key: String,
    /// Id of that node, when it was known.
    pub id: Option<NodeId>,
    /// Keys from the root down to the node.
    ///
    /// Only recorded with the `debug` feature in debug builds.
    pub trail: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at `{}`", self.key)?;
        if let Some(id) = self.id {
            write!(f, " (id {id})")?;
        }
        if let Some(trail) = &self.trail {
            write!(f, ", path: {trail}")?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Error

/// Failures of a serialization or deserialization session.
///
/// Sessions stop at the first error. Nodes already written to an archive are
/// not rolled back.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("type `{type_name}` is not registered, {at}")]
    UnregisteredType { type_name: String, at: Location },

    #[error("malformed archive: {reason}, {at}")]
    ArchiveParse { reason: String, at: Location },

    #[error("identity conflict on id {id}: {reason}, {at}")]
    IdentityConflict {
        id: NodeId,
        reason: String,
        at: Location,
    },

    #[error("field `{field}` of `{type_name}` is missing, {at}")]
    MissingField {
        type_name: String,
        field: String,
        at: Location,
    },

    #[error("`{member}` is not a member of enum `{type_name}`, {at}")]
    UnknownMember {
        type_name: String,
        member: String,
        at: Location,
    },

    #[error("expected {expected}, found `{found}`, {at}")]
    KindMismatch {
        expected: String,
        found: String,
        at: Location,
    },

    #[error("handle does not point to a live heap cell, {at}")]
    DanglingHandle { at: Location },

    #[error("nesting exceeds {limit} levels, {at}")]
    DepthLimit { limit: usize, at: Location },

    #[error("inheritance chain of `{type_name}` is cyclic, {at}")]
    CyclicHierarchy { type_name: String, at: Location },

    #[error("{message}")]
    Custom { message: String, at: Location },

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl Error {
    /// Creates an [`Error::Custom`], for use in custom (de)serialize overrides.
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::Custom {
            message: message.to_string(),
            at: Location::default(),
        }
    }

    /// Returns where the error was raised, if the error carries a location.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::UnregisteredType { at, .. }
            | Self::ArchiveParse { at, .. }
            | Self::IdentityConflict { at, .. }
            | Self::MissingField { at, .. }
            | Self::UnknownMember { at, .. }
            | Self::KindMismatch { at, .. }
            | Self::DanglingHandle { at }
            | Self::DepthLimit { at, .. }
            | Self::CyclicHierarchy { at, .. }
            | Self::Custom { at, .. } => Some(at),
            Self::Archive(_) => None,
        }
    }

    pub(crate) fn parse(reason: impl fmt::Display, at: Location) -> Self {
        Self::ArchiveParse {
            reason: reason.to_string(),
            at,
        }
    }

    pub(crate) fn from_registry(err: RegistryError, at: Location) -> Self {
        match err {
            RegistryError::Unregistered(type_name) => Self::UnregisteredType { type_name, at },
            RegistryError::CyclicHierarchy(type_name) => Self::CyclicHierarchy { type_name, at },
            RegistryError::NotAnObject(found) => Self::KindMismatch {
                expected: "an object type".into(),
                found,
                at,
            },
        }
    }

    pub(crate) fn from_conflict(conflict: IdentityConflict, at: Location) -> Self {
        Self::IdentityConflict {
            id: conflict.id,
            reason: conflict.reason,
            at,
        }
    }
}
