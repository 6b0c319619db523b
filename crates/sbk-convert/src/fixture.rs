//! On-disk archive builder shared by the unit tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use sbk_tree::{Node, Tree};

use crate::archive::Archive;
use crate::config::ConvertConfig;

pub(crate) struct ArchiveBuilder {
    dir: TempDir,
    order: Vec<String>,
    attrs: BTreeMap<String, Vec<(String, String)>>,
    children: BTreeMap<String, Vec<String>>,
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn about(id: &str) -> String {
    if id.is_empty() {
        "urn:scrapbook:root".to_string()
    } else {
        format!("urn:scrapbook:item{id}")
    }
}

impl ArchiveBuilder {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            order: Vec::new(),
            attrs: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Declare an item listed under `parent` ("" is the root).
    pub(crate) fn item(mut self, parent: &str, id: &str, kind: &str, title: &str) -> Self {
        self.order.push(id.to_string());
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(id.to_string());
        let builder = self.with(id, "type", kind);
        if title.is_empty() {
            builder
        } else {
            builder.with(id, "title", title)
        }
    }

    pub(crate) fn with(mut self, id: &str, name: &str, value: &str) -> Self {
        self.attrs
            .entry(id.to_string())
            .or_default()
            .push((name.to_string(), value.to_string()));
        self
    }

    /// A note whose `index.html` holds `text` in a `<pre>`.
    pub(crate) fn note(self, parent: &str, id: &str, title: &str, text: &str) -> Self {
        let html = format!("<html><body><pre>\n{}</pre></body></html>", escape(text));
        self.item(parent, id, "note", title)
            .file(&format!("{id}/index.html"), html.as_bytes())
    }

    /// A file under the data store.
    pub(crate) fn file(self, relative: &str, data: &[u8]) -> Self {
        let path = self.dir.path().join("data").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
        self
    }

    pub(crate) fn build(self) -> TempDir {
        let mut xml = String::from(
            "<?xml version=\"1.0\"?>\n<RDF:RDF xmlns:NS1=\"http://amb.vis.ne.jp/mozilla/scrapbook-rdf#\" \
             xmlns:NC=\"http://home.netscape.com/NC-rdf#\" \
             xmlns:RDF=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n",
        );
        for (parent, kids) in &self.children {
            xml.push_str(&format!("  <RDF:Seq RDF:about=\"{}\">\n", about(parent)));
            for kid in kids {
                xml.push_str(&format!("    <RDF:li RDF:resource=\"{}\"/>\n", about(kid)));
            }
            xml.push_str("  </RDF:Seq>\n");
        }
        for id in &self.order {
            xml.push_str(&format!("  <RDF:Description RDF:about=\"{}\"", about(id)));
            for (name, value) in self.attrs.get(id).into_iter().flatten() {
                xml.push_str(&format!(" NS1:{name}=\"{}\"", escape(value)));
            }
            xml.push_str("/>\n");
        }
        xml.push_str("</RDF:RDF>\n");
        fs::write(self.dir.path().join("scrapbook.rdf"), xml).unwrap();
        self.dir
    }
}

pub(crate) fn load(root: &Path) -> Tree {
    Archive::open(root, ConvertConfig::default())
        .load_tree()
        .unwrap()
}

/// Resolve a one-item archive and return its node.
pub(crate) fn single_node(kind: &str, attrs: &[(&str, &str)]) -> Node {
    let mut builder = ArchiveBuilder::new().item("", "1", kind, "");
    for (name, value) in attrs {
        builder = builder.with("1", name, value);
    }
    let dir = builder.build();
    load(dir.path()).get("1").unwrap().clone()
}
