//! Fixed URI vocabulary of the ScrapBook index file.

/// Prefix of every item subject; the remainder is the bare item id.
pub const ITEM_PREFIX: &str = "urn:scrapbook:item";

/// Prefix of transient search pseudo-items, which are discarded.
pub const SEARCH_PREFIX: &str = "urn:scrapbook:search";

/// Subject of the root folder.
pub const ROOT_URI: &str = "urn:scrapbook:root";

/// RDF syntax namespace (sequences and ordinal members).
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// ScrapBook property namespace.
pub const SCRAPBOOK_NS: &str = "http://amb.vis.ne.jp/mozilla/scrapbook-rdf#";

/// Netscape namespace, used by legacy bookmark separators.
pub const NC_NS: &str = "http://home.netscape.com/NC-rdf#";

/// Known namespaces and their short tags.
const NAMESPACES: &[(&str, &str)] = &[(RDF_NS, "RDF"), (SCRAPBOOK_NS, "NS1"), (NC_NS, "NC")];

/// Short names of the distinguished properties.
pub mod prop {
    pub const TYPE: &str = "NS1:type";
    pub const TITLE: &str = "NS1:title";
    pub const COMMENT: &str = "NS1:comment";
    pub const SOURCE: &str = "NS1:source";
    pub const ICON: &str = "NS1:icon";
    pub const CREATE: &str = "NS1:create";
    pub const MODIFY: &str = "NS1:modify";
    pub const CHARS: &str = "NS1:chars";

    /// Prefix of ordinal child predicates (`RDF:_1`, `RDF:_2`, ...).
    pub const ORDINAL_PREFIX: &str = "RDF:_";
}

/// Shorten a predicate IRI to `"<tag>:<local>"` by longest-prefix match.
///
/// Predicates outside the known namespaces are returned unchanged.
pub fn shorten_predicate(predicate: &str) -> String {
    NAMESPACES
        .iter()
        .filter(|(ns, _)| predicate.starts_with(ns))
        .max_by_key(|(ns, _)| ns.len())
        .map(|(ns, tag)| format!("{tag}:{}", &predicate[ns.len()..]))
        .unwrap_or_else(|| predicate.to_string())
}

/// Parse the 1-based index of an ordinal property name (`RDF:_3` → 3).
pub fn ordinal_index(property: &str) -> Option<u32> {
    let digits = property.strip_prefix(prop::ORDINAL_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n| *n > 0)
}

/// Ordinal property name for a 1-based index.
pub fn ordinal_property(index: u32) -> String {
    format!("{}{index}", prop::ORDINAL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_known_namespaces() {
        assert_eq!(
            shorten_predicate("http://amb.vis.ne.jp/mozilla/scrapbook-rdf#title"),
            "NS1:title"
        );
        assert_eq!(
            shorten_predicate("http://www.w3.org/1999/02/22-rdf-syntax-ns#_12"),
            "RDF:_12"
        );
        assert_eq!(
            shorten_predicate("http://home.netscape.com/NC-rdf#BookmarkSeparator"),
            "NC:BookmarkSeparator"
        );
    }

    #[test]
    fn unknown_namespace_kept_verbatim() {
        assert_eq!(
            shorten_predicate("http://example.org/vocab#thing"),
            "http://example.org/vocab#thing"
        );
    }

    #[test]
    fn ordinal_parsing() {
        assert_eq!(ordinal_index("RDF:_1"), Some(1));
        assert_eq!(ordinal_index("RDF:_42"), Some(42));
        assert_eq!(ordinal_index("RDF:_0"), None);
        assert_eq!(ordinal_index("RDF:_"), None);
        assert_eq!(ordinal_index("RDF:_1a"), None);
        assert_eq!(ordinal_index("RDF:type"), None);
        assert_eq!(ordinal_property(7), "RDF:_7");
    }
}
