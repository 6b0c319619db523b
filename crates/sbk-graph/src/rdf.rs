//! RDF/XML loading: turns the archive's index file into raw [`Triple`]s.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use oxrdf::{Subject, Term as RdfTerm};
use oxrdfxml::RdfXmlParser;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::triple::{Term, Triple};

/// Parse an RDF/XML document into triples.
pub fn read_rdf_xml<R: Read>(reader: R) -> GraphResult<Vec<Triple>> {
    let mut triples = Vec::new();
    for parsed in RdfXmlParser::new().for_reader(reader) {
        let triple = parsed.map_err(|e| GraphError::Parse(e.to_string()))?;
        let subject = match triple.subject {
            Subject::NamedNode(node) => Term::Iri(node.as_str().to_string()),
            Subject::BlankNode(node) => Term::Blank(node.as_str().to_string()),
            #[allow(unreachable_patterns)]
            other => Term::Iri(other.to_string()),
        };
        let object = match triple.object {
            RdfTerm::NamedNode(node) => Term::Iri(node.as_str().to_string()),
            RdfTerm::BlankNode(node) => Term::Blank(node.as_str().to_string()),
            RdfTerm::Literal(literal) => Term::Literal(literal.value().to_string()),
            #[allow(unreachable_patterns)]
            other => Term::Literal(other.to_string()),
        };
        triples.push(Triple::new(subject, triple.predicate.as_str(), object));
    }
    Ok(triples)
}

/// Read and parse an RDF/XML file.
pub fn load_rdf_file(path: &Path) -> GraphResult<Vec<Triple>> {
    let file = File::open(path)?;
    let triples = read_rdf_xml(BufReader::new(file))?;
    debug!(path = %path.display(), count = triples.len(), "loaded RDF triples");
    Ok(triples)
}
