//! Error types for tree resolution.

use std::path::PathBuf;

/// Errors that can occur while resolving the archive tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The item has no `type` property.
    #[error("item {id} has no type")]
    MissingType { id: String },

    /// A non-folder item carries ordinal child references.
    #[error("item {id} is a {kind} but carries {ordinals} child reference(s)")]
    InvariantViolation {
        id: String,
        kind: String,
        ordinals: usize,
    },

    /// An ordinal child does not point to an existing item.
    #[error("folder {parent} child #{ordinal} references missing item {target:?}")]
    UnresolvedReference {
        parent: String,
        ordinal: usize,
        target: String,
    },

    /// A folder lists one of its own ancestors as a child.
    #[error("cycle detected: folder {parent} lists ancestor {id} as a child")]
    CycleDetected { id: String, parent: String },

    /// Two siblings ended up with the same output name.
    #[error("name collision in folder {folder}: {name:?}")]
    NameCollision { folder: String, name: String },

    /// The requested id is not part of the graph.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The item failed earlier in this run.
    #[error("item {id} failed to resolve earlier")]
    AlreadyFailed { id: String },

    /// Filesystem failure while scanning the data store.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TreeError {
    /// The item id the error is about, when there is one.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::MissingType { id }
            | Self::InvariantViolation { id, .. }
            | Self::CycleDetected { id, .. }
            | Self::AlreadyFailed { id } => Some(id),
            Self::UnresolvedReference { parent, .. } => Some(parent),
            Self::NameCollision { folder, .. } => Some(folder),
            Self::UnknownItem(id) => Some(id),
            Self::Io { .. } => None,
        }
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
