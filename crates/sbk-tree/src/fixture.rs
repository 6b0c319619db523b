//! Small graph builder shared by the unit tests.

use sbk_graph::namespace::{RDF_NS, SCRAPBOOK_NS};
use sbk_graph::{IndexOptions, Term, Triple, TripleIndex, ITEM_PREFIX, ROOT_URI};

#[derive(Default)]
pub(crate) struct GraphBuilder {
    triples: Vec<Triple>,
}

fn subject(id: &str) -> Term {
    if id.is_empty() {
        Term::iri(ROOT_URI)
    } else {
        Term::iri(format!("{ITEM_PREFIX}{id}"))
    }
}

impl GraphBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Declare an item with a type.
    pub(crate) fn item(self, id: &str, kind: &str) -> Self {
        self.prop(id, "type", kind)
    }

    /// Declare an item without a type.
    pub(crate) fn untyped(self, id: &str, title: &str) -> Self {
        self.prop(id, "title", title)
    }

    pub(crate) fn prop(mut self, id: &str, name: &str, value: &str) -> Self {
        self.triples.push(Triple::new(
            subject(id),
            format!("{SCRAPBOOK_NS}{name}"),
            Term::literal(value),
        ));
        self
    }

    /// `parent` lists `child` at `ordinal`; an empty parent is the root.
    pub(crate) fn child(mut self, parent: &str, ordinal: u32, child: &str) -> Self {
        self.triples.push(Triple::new(
            subject(parent),
            format!("{RDF_NS}_{ordinal}"),
            subject(child),
        ));
        self
    }

    /// `parent` lists a literal instead of an item reference.
    pub(crate) fn literal_child(mut self, parent: &str, ordinal: u32, value: &str) -> Self {
        self.triples.push(Triple::new(
            subject(parent),
            format!("{RDF_NS}_{ordinal}"),
            Term::literal(value),
        ));
        self
    }

    pub(crate) fn build(self) -> TripleIndex {
        TripleIndex::build(self.triples, IndexOptions::default()).unwrap()
    }
}
