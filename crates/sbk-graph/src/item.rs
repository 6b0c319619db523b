//! Item property maps and the typed item view built from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::namespace::{ordinal_index, ordinal_property, prop};

/// A property value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// A plain string.
    Literal(String),
    /// A reference to another item, by bare id.
    Ref(String),
    /// Any other resource (non-item IRI or blank node).
    Resource(String),
}

impl Value {
    /// The lexical form of the value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) | Self::Ref(s) | Self::Resource(s) => s,
        }
    }

    /// The referenced item id, if this value is an item reference.
    pub fn as_item_ref(&self) -> Option<&str> {
        match self {
            Self::Ref(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties of one item, keyed by short predicate name.
pub type PropertyMap = BTreeMap<String, Value>;

/// Item type as declared by the `NS1:type` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Container of ordered children.
    Folder,
    /// Plain-text note stored as `<pre>` HTML.
    Note,
    /// Note with limited formatting, stored as a saved page.
    NoteEx,
    /// Saved web page or file capture.
    Page,
    /// Anything else; written out as an opaque page.
    Unknown,
}

impl ItemKind {
    /// Map a raw `NS1:type` value onto a kind.
    pub fn from_type(raw: &str) -> Self {
        match raw {
            "folder" => Self::Folder,
            "note" => Self::Note,
            "notex" => Self::NoteEx,
            "" | "marked" | "site" | "combine" | "file" | "image" => Self::Page,
            _ => Self::Unknown,
        }
    }

    /// Returns `true` for folders.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder => write!(f, "folder"),
            Self::Note => write!(f, "note"),
            Self::NoteEx => write!(f, "notex"),
            Self::Page => write!(f, "page"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Typed view of an item, validated once when the index is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Bare item id.
    pub id: String,
    /// Declared kind; `None` when the item has no `NS1:type` property.
    pub kind: Option<ItemKind>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub source: Option<String>,
    pub icon: Option<String>,
    pub create: Option<String>,
    pub modify: Option<String>,
    /// Charset of a saved page.
    pub chars: Option<String>,
    /// Ordinal children `_1.._n`, truncated at the first gap.
    pub children: Vec<Value>,
    /// Number of ordinal properties present, including any past a gap.
    pub ordinal_count: usize,
}

impl Item {
    /// Build the typed view from a property map.
    pub fn from_properties(id: impl Into<String>, props: &PropertyMap) -> Self {
        let text = |name: &str| props.get(name).map(|v| v.as_str().to_string());

        let mut children = Vec::new();
        let mut index = 1;
        while let Some(value) = props.get(&ordinal_property(index)) {
            children.push(value.clone());
            index += 1;
        }
        let ordinal_count = props.keys().filter(|k| ordinal_index(k).is_some()).count();

        let id = id.into();
        if ordinal_count > children.len() {
            tracing::debug!(
                id = %id,
                kept = children.len(),
                dropped = ordinal_count - children.len(),
                "ordinal sequence has a gap; later children are ignored"
            );
        }

        Self {
            kind: text(prop::TYPE).map(|t| ItemKind::from_type(&t)),
            title: text(prop::TITLE),
            comment: text(prop::COMMENT),
            source: text(prop::SOURCE),
            icon: text(prop::ICON),
            create: text(prop::CREATE),
            modify: text(prop::MODIFY),
            chars: text(prop::CHARS),
            children,
            ordinal_count,
            id,
        }
    }

    /// Returns `true` if the item carries any ordinal child reference.
    pub fn has_ordinals(&self) -> bool {
        self.ordinal_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, Value)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn lit(s: &str) -> Value {
        Value::Literal(s.into())
    }

    fn item_ref(s: &str) -> Value {
        Value::Ref(s.into())
    }

    #[test]
    fn kind_vocabulary() {
        assert_eq!(ItemKind::from_type("folder"), ItemKind::Folder);
        assert_eq!(ItemKind::from_type("note"), ItemKind::Note);
        assert_eq!(ItemKind::from_type("notex"), ItemKind::NoteEx);
        assert_eq!(ItemKind::from_type(""), ItemKind::Page);
        assert_eq!(ItemKind::from_type("marked"), ItemKind::Page);
        assert_eq!(ItemKind::from_type("separator"), ItemKind::Unknown);
        assert_eq!(ItemKind::from_type("bookmark"), ItemKind::Unknown);
    }

    #[test]
    fn typed_fields_are_extracted() {
        let item = Item::from_properties(
            "20150101000000",
            &props(&[
                ("NS1:type", lit("note")),
                ("NS1:title", lit("Shopping")),
                ("NS1:comment", lit("weekly")),
                ("NS1:create", lit("20150101000000")),
            ]),
        );
        assert_eq!(item.kind, Some(ItemKind::Note));
        assert_eq!(item.title.as_deref(), Some("Shopping"));
        assert_eq!(item.comment.as_deref(), Some("weekly"));
        assert_eq!(item.create.as_deref(), Some("20150101000000"));
        assert!(item.source.is_none());
        assert!(!item.has_ordinals());
    }

    #[test]
    fn missing_type_is_none_and_empty_type_is_page() {
        let missing = Item::from_properties("a", &props(&[("NS1:title", lit("x"))]));
        assert_eq!(missing.kind, None);

        let empty = Item::from_properties("b", &props(&[("NS1:type", lit(""))]));
        assert_eq!(empty.kind, Some(ItemKind::Page));
    }

    #[test]
    fn children_follow_ordinal_order() {
        let item = Item::from_properties(
            "f",
            &props(&[
                ("NS1:type", lit("folder")),
                ("RDF:_2", item_ref("b")),
                ("RDF:_1", item_ref("a")),
                ("RDF:_3", item_ref("c")),
            ]),
        );
        let ids: Vec<_> = item.children.iter().map(|v| v.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(item.ordinal_count, 3);
    }

    #[test]
    fn gap_truncates_children() {
        let item = Item::from_properties(
            "f",
            &props(&[
                ("NS1:type", lit("folder")),
                ("RDF:_1", item_ref("a")),
                ("RDF:_2", item_ref("b")),
                ("RDF:_4", item_ref("d")),
            ]),
        );
        assert_eq!(item.children.len(), 2);
        assert_eq!(item.ordinal_count, 3);
    }

    #[test]
    fn sparse_sequence_without_first_ordinal_has_no_children() {
        let item = Item::from_properties("f", &props(&[("RDF:_2", item_ref("b"))]));
        assert!(item.children.is_empty());
        assert!(item.has_ordinals());
    }

    #[test]
    fn value_serializes_with_tag() {
        let json = serde_json::to_string(&item_ref("x")).unwrap();
        assert_eq!(json, r#"{"kind":"ref","value":"x"}"#);
    }
}
