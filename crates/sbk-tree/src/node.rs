//! Resolved nodes and the finished tree.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A node that is
//! listed by several folders appears once in the arena and once in every
//! referencing folder's child list.

use std::collections::HashMap;

use serde::Serialize;

use sbk_graph::{Item, ItemKind};

use crate::error::TreeError;
use crate::sanitize::sanitize_name;

/// Position of a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// How a node got into the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeOrigin {
    /// The synthetic root folder.
    Root,
    /// Reached through a folder's ordinal children.
    Graph,
    /// Never referenced as a child; attached to the root.
    LostItem,
    /// Data directory with no item; synthesized and attached to the root.
    LostFolder,
}

/// A resolved item.
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub id: String,
    pub kind: ItemKind,
    /// Sanitized output name (empty for the root).
    pub name: String,
    /// The title as stored in the graph.
    pub title: Option<String>,
    /// Original title, kept only when sanitizing altered it.
    pub custom_title: Option<String>,
    /// Ordered children; always empty for non-folders.
    pub children: Vec<NodeId>,
    pub comment: Option<String>,
    pub source: Option<String>,
    pub icon: Option<String>,
    pub create: Option<String>,
    pub modify: Option<String>,
    pub origin: NodeOrigin,
    #[serde(skip)]
    pub(crate) references: usize,
}

impl Node {
    pub(crate) fn from_item(item: &Item, kind: ItemKind, origin: NodeOrigin) -> Self {
        let (name, custom_title) = match origin {
            NodeOrigin::Root => (String::new(), None),
            _ => {
                let sanitized = sanitize_name(item.title.as_deref(), &item.id);
                (sanitized.name, sanitized.custom_title)
            }
        };
        Self {
            id: item.id.clone(),
            kind,
            name,
            title: item.title.clone(),
            custom_title,
            children: Vec::new(),
            comment: non_empty(&item.comment),
            source: non_empty(&item.source),
            icon: non_empty(&item.icon),
            create: non_empty(&item.create),
            modify: non_empty(&item.modify),
            origin,
            references: 0,
        }
    }

    pub(crate) fn lost_folder(id: &str, kind: ItemKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: sanitize_name(None, id).name,
            title: None,
            custom_title: None,
            children: Vec::new(),
            comment: None,
            source: None,
            icon: None,
            create: None,
            modify: None,
            origin: NodeOrigin::LostFolder,
            references: 0,
        }
    }

    /// Returns `true` for folders.
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// Title for display and container headers: the stored title, else the name.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => &self.name,
        }
    }

    /// Number of folders listing this node.
    pub fn references(&self) -> usize {
        self.references
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Outcome counters of a resolution run.
#[derive(Debug, Default)]
pub struct ResolveReport {
    /// Items reattached to the root because no folder listed them.
    pub lost_items: usize,
    /// Data directories without an item, synthesized under the root.
    pub lost_folders: usize,
    /// Extra references to nodes already listed by another folder.
    pub shared: usize,
    /// Items skipped because they failed to resolve.
    pub failures: Vec<TreeError>,
}

/// Serializable form of a [`ResolveReport`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub lost_items: usize,
    pub lost_folders: usize,
    pub shared: usize,
    pub failures: Vec<String>,
}

impl ResolveReport {
    /// Returns `true` if no item failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Counts and failure messages, for printing.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            lost_items: self.lost_items,
            lost_folders: self.lost_folders,
            shared: self.shared,
            failures: self.failures.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// The resolved archive tree.
#[derive(Debug)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) memo: HashMap<String, NodeId>,
    pub(crate) report: ResolveReport,
}

impl Tree {
    /// The root folder.
    pub fn root(&self) -> &Node {
        &self.nodes[self.root.0]
    }

    /// Id of the root folder.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Node by arena id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node by item id.
    pub fn find(&self, item_id: &str) -> Option<NodeId> {
        self.memo.get(item_id).copied()
    }

    /// Node by item id.
    pub fn get(&self, item_id: &str) -> Option<&Node> {
        self.find(item_id).map(|id| self.node(id))
    }

    /// Children of a node, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Node)> {
        self.node(id)
            .children
            .iter()
            .map(move |child| (*child, self.node(*child)))
    }

    /// Number of nodes in the arena that were resolved successfully.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// Returns `true` if the tree has only the root.
    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    /// Reconciliation counters and failures.
    pub fn report(&self) -> &ResolveReport {
        &self.report
    }

    /// Pre-order walk from the root as `(node, depth)` pairs.
    ///
    /// Shared nodes are visited once per referencing folder.
    pub fn walk(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for child in self.node(id).children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }

    /// Number of distinct nodes reachable from the root, the root included.
    pub fn reachable(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.node(id).children.iter().copied());
            }
        }
        seen.len()
    }
}
