//! MHTML container codec.
//!
//! Packs a directory of arbitrary files into one `multipart/related`
//! message and unpacks it again. `index.html` at the top of the directory is
//! the root document; every other file travels base64-encoded under its
//! relative path.
//!
//! # Key Types
//!
//! - [`Container`] -- metadata plus ordered [`Part`]s
//! - [`ContainerMeta`] -- subject, source, comments, icon and date headers
//! - [`Part`] -- one file: location, content type, raw bytes
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let bytes = sbk_mht::encode_dir(Path::new("data/20150101000000"))?;
//! for (path, data) in sbk_mht::decode(&bytes)? {
//!     println!("{path}: {} bytes", data.len());
//! }
//! # Ok::<(), sbk_mht::MhtError>(())
//! ```

pub mod container;
pub mod error;
pub mod header;
pub mod part;
pub mod reader;
pub mod transfer;
pub mod writer;

pub use container::{parse_stamp, Container, ContainerMeta};
pub use error::{MhtError, MhtResult};
pub use part::{Part, ROOT_CONTENT_TYPE, ROOT_DOCUMENT};
pub use reader::{decode, safe_join, write_atomic, write_parts};
pub use writer::encode_dir;
