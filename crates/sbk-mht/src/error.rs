use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MhtError {
    #[error("multipart container has no boundary parameter")]
    MissingBoundary,

    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("unsupported transfer encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("invalid base64 in part {location}: {reason}")]
    InvalidBase64 { location: String, reason: String },

    #[error("unsafe part location: {0:?}")]
    UnsafeLocation(String),

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("refusing to overwrite existing file: {}", .0.display())]
    Exists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<walkdir::Error> for MhtError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(err.into())
    }
}

pub type MhtResult<T> = Result<T, MhtError>;
