//! Raw triples as handed over by the RDF parser.

use serde::{Deserialize, Serialize};

/// A subject or object position in a triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A named resource.
    Iri(String),
    /// An anonymous resource.
    Blank(String),
    /// A literal value (datatype and language are not used by the archive).
    Literal(String),
}

impl Term {
    /// Convenience constructor for an IRI term.
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri(value.into())
    }

    /// Convenience constructor for a literal term.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// The lexical form of the term.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Iri(s) | Self::Blank(s) | Self::Literal(s) => s,
        }
    }
}

/// A single `(subject, predicate, object)` fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    /// Full predicate IRI.
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    /// Create a triple.
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}
