//! Error types for the graph crate.

/// Errors that can occur while loading or indexing the archive graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A triple's subject could not be classified as item, search or root.
    #[error("malformed graph: unclassifiable subject {subject:?}")]
    MalformedGraph {
        /// The offending subject, as written in the graph.
        subject: String,
    },

    /// The RDF/XML document could not be parsed.
    #[error("RDF parse error: {0}")]
    Parse(String),

    /// I/O error while reading the index file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
