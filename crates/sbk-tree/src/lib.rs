//! Tree resolution for ScrapBook archives.
//!
//! Turns a [`TripleIndex`](sbk_graph::TripleIndex) into an ordered tree of
//! nodes rooted at the synthetic root folder, then reconciles it with the
//! graph and the data store: items no folder lists and data directories no
//! item owns are attached to the root.
//!
//! # Key Types
//!
//! - [`TreeResolver`] -- memoized, stack-based resolver
//! - [`Tree`] -- the finished arena of [`Node`]s
//! - [`ResolveReport`] -- lost item/folder counts and skipped failures
//! - [`NameAllocator`] -- collision-free sibling names

pub mod error;
pub mod node;
pub mod reconcile;
pub mod resolver;
pub mod sanitize;

#[cfg(test)]
mod fixture;

pub use error::{TreeError, TreeResult};
pub use node::{Node, NodeId, NodeOrigin, ReportSummary, ResolveReport, Tree};
pub use resolver::{build_tree, ResolveOptions, TreeResolver};
pub use sanitize::{sanitize, sanitize_name, NameAllocator, SanitizedName, RESERVED_CHARS};
