//! Triple index for ScrapBook archives.
//!
//! Reads the archive's RDF index into raw triples and groups them into one
//! property map per item, with a typed [`Item`] view validated once at
//! construction.
//!
//! # Key Types
//!
//! - [`Triple`] -- a raw `(subject, predicate, object)` fact
//! - [`TripleIndex`] -- item id → properties, with the root kept apart
//! - [`Item`] -- typed optional-field view of one item
//! - [`Value`] -- literal, item reference, or other resource

pub mod error;
pub mod index;
pub mod item;
pub mod namespace;
pub mod rdf;
pub mod triple;

pub use error::{GraphError, GraphResult};
pub use index::{IndexOptions, IndexStats, TripleIndex};
pub use item::{Item, ItemKind, PropertyMap, Value};
pub use namespace::{ITEM_PREFIX, ROOT_URI, SEARCH_PREFIX};
pub use rdf::{load_rdf_file, read_rdf_xml};
pub use triple::{Term, Triple};
