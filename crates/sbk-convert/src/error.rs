use std::path::PathBuf;

use thiserror::Error;

use sbk_graph::GraphError;
use sbk_mht::MhtError;
use sbk_tree::TreeError;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("container error: {0}")]
    Mht(#[from] MhtError),

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("item {id}: data not found at {}", path.display())]
    MissingData { id: String, path: PathBuf },

    #[error("item {id}: note has no <pre> text")]
    NoteText { id: String },

    #[error("output already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("item {id}: I/O error at {}: {source}", path.display())]
    Io {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn io(id: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            id: id.to_string(),
            path: path.into(),
            source,
        }
    }

    /// The item the failure is about, when there is one.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::Tree(err) => err.item_id(),
            Self::MissingData { id, .. } | Self::NoteText { id } | Self::Io { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Returns `true` if the error happened while loading the graph.
    pub fn is_graph_error(&self) -> bool {
        matches!(self, Self::Graph(_))
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;
