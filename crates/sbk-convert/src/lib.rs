//! Conversion of resolved ScrapBook trees into plain files.
//!
//! # Key Types
//!
//! - [`Archive`] -- an archive root: RDF index plus data store
//! - [`ConvertConfig`] -- output mode, sidecars, strictness, overwrite
//! - [`Converter`] -- writes a [`Tree`](sbk_tree::Tree) to an output directory
//! - [`ConvertReport`] -- counters and skipped failures of a run

pub mod archive;
pub mod config;
pub mod convert;
pub mod error;
pub mod note;
pub mod pack;
pub mod sidecar;

#[cfg(test)]
mod fixture;

pub use archive::Archive;
pub use config::{ConvertConfig, OutputMode};
pub use convert::{convert, ConvertReport, ConvertSummary, Converter};
pub use error::{ConvertError, ConvertResult};
pub use note::extract_pre_text;
pub use pack::{pack, unpack, Endpoint};
