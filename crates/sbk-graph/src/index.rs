//! The triple index: raw triples grouped by item.
//!
//! [`TripleIndex`] classifies every subject (item, search pseudo-item, root),
//! shortens predicates, rewrites item references to bare ids and keeps one
//! [`PropertyMap`] per item. The typed [`Item`] view is derived once here.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{GraphError, GraphResult};
use crate::item::{Item, ItemKind, PropertyMap, Value};
use crate::namespace::{shorten_predicate, ITEM_PREFIX, ROOT_URI, SEARCH_PREFIX};
use crate::triple::{Term, Triple};

/// Options controlling how strictly the graph is indexed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexOptions {
    /// Fail on unclassifiable subjects instead of keeping them as items.
    pub strict: bool,
}

/// Counters collected while indexing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Triples consumed.
    pub triples: usize,
    /// Triples about search pseudo-items that were dropped.
    pub search_discarded: usize,
    /// Distinct subjects kept as items despite an unknown form.
    pub unclassified: usize,
}

/// Classification of a triple subject.
enum Subject {
    Root,
    Item(String),
    Search,
    Unclassified(String),
}

fn classify(term: &Term) -> GraphResult<Subject> {
    match term {
        Term::Iri(iri) if iri == ROOT_URI => Ok(Subject::Root),
        Term::Iri(iri) if iri.starts_with(SEARCH_PREFIX) => Ok(Subject::Search),
        Term::Iri(iri) => match iri.strip_prefix(ITEM_PREFIX) {
            Some("") => Err(GraphError::MalformedGraph {
                subject: iri.clone(),
            }),
            Some(id) => Ok(Subject::Item(id.to_string())),
            None => Ok(Subject::Unclassified(iri.clone())),
        },
        Term::Blank(id) => Ok(Subject::Unclassified(format!("_:{id}"))),
        Term::Literal(value) => Ok(Subject::Unclassified(value.clone())),
    }
}

fn object_value(term: Term) -> Value {
    match term {
        Term::Iri(iri) => match iri.strip_prefix(ITEM_PREFIX) {
            Some(id) if !id.is_empty() => Value::Ref(id.to_string()),
            _ => Value::Resource(iri),
        },
        Term::Blank(id) => Value::Resource(format!("_:{id}")),
        Term::Literal(value) => Value::Literal(value),
    }
}

/// Item id → property map, plus the root folder kept apart.
#[derive(Clone, Debug)]
pub struct TripleIndex {
    root_properties: PropertyMap,
    root: Item,
    properties: BTreeMap<String, PropertyMap>,
    items: BTreeMap<String, Item>,
    stats: IndexStats,
}

impl TripleIndex {
    /// Group triples by subject.
    ///
    /// Same `(id, predicate)` twice keeps the last value.
    pub fn build(
        triples: impl IntoIterator<Item = Triple>,
        options: IndexOptions,
    ) -> GraphResult<Self> {
        let mut root_properties = PropertyMap::new();
        let mut properties: BTreeMap<String, PropertyMap> = BTreeMap::new();
        let mut stats = IndexStats::default();
        let mut unclassified = BTreeSet::new();

        for triple in triples {
            stats.triples += 1;
            let target = match classify(&triple.subject)? {
                Subject::Search => {
                    stats.search_discarded += 1;
                    continue;
                }
                Subject::Root => &mut root_properties,
                Subject::Item(id) => properties.entry(id).or_default(),
                Subject::Unclassified(subject) => {
                    if options.strict {
                        return Err(GraphError::MalformedGraph { subject });
                    }
                    if unclassified.insert(subject.clone()) {
                        warn!(subject = %subject, "keeping unclassified subject as an item");
                    }
                    properties.entry(subject).or_default()
                }
            };
            target.insert(shorten_predicate(&triple.predicate), object_value(triple.object));
        }
        stats.unclassified = unclassified.len();

        let mut root = Item::from_properties(ROOT_URI, &root_properties);
        root.kind = Some(ItemKind::Folder);

        let items = properties
            .iter()
            .map(|(id, props)| (id.clone(), Item::from_properties(id.clone(), props)))
            .collect::<BTreeMap<_, _>>();

        debug!(
            triples = stats.triples,
            items = items.len(),
            discarded = stats.search_discarded,
            "indexed archive graph"
        );

        Ok(Self {
            root_properties,
            root,
            properties,
            items,
            stats,
        })
    }

    /// The root folder item; always of kind [`ItemKind::Folder`].
    pub fn root(&self) -> &Item {
        &self.root
    }

    /// Raw properties of the root folder.
    pub fn root_properties(&self) -> &PropertyMap {
        &self.root_properties
    }

    /// Look up an item by bare id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Raw properties of an item.
    pub fn properties(&self, id: &str) -> Option<&PropertyMap> {
        self.properties.get(id)
    }

    /// Returns `true` if an item with this id exists (the root excluded).
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// All items in id order, the root excluded.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// All item ids in sorted order, the root excluded.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Number of items, the root excluded.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the graph holds no items besides the root.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indexing counters.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}
