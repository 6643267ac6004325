use alloc::string::String;

use thiserror::Error;

use crate::NodeId;

// -----------------------------------------------------------------------------
// ArchiveError

/// Failures raised by an [`Archive`](crate::Archive) backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("archive already holds a root node")]
    RootExists,

    #[error("`end_node` called without an open node")]
    UnbalancedEnd,

    #[error("no node is open for writing")]
    NoOpenNode,

    #[error("no node is open for reading")]
    NoCurrentNode,

    #[error("archive holds no data")]
    Empty,

    #[error("node {0} carries no leaf value")]
    MissingValue(NodeId),

    #[error("archive version `{found}` is not supported (expected `{expected}`)")]
    UnsupportedVersion {
        found: String,
        expected: &'static str,
    },

    #[error("failed to decode archive: {0}")]
    Decode(String),
}
