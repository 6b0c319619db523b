//! Memoized, stack-based resolution of the item graph into a [`Tree`].
//!
//! Every item id moves through `Unvisited → Resolving → Resolved` (or
//! `Failed`). The memo table guarantees each id becomes exactly one node;
//! meeting an id that is still `Resolving` means the current path loops back
//! to an ancestor, reported as [`TreeError::CycleDetected`].
//!
//! Descent uses an explicit work stack, so folder nesting depth never grows
//! the native call stack.
//!
//! # Failure policy
//!
//! In lenient mode (the default) a failing item is marked `Failed`, its
//! subtree is skipped and the error is kept in [`ResolveReport::failures`];
//! siblings carry on. In strict mode the first error is returned and every
//! item still in progress is marked `Failed`.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use sbk_graph::{ItemKind, TripleIndex, Value, ROOT_URI};

use crate::error::{TreeError, TreeResult};
use crate::node::{Node, NodeId, NodeOrigin, ResolveReport, Tree};

/// Options for a resolution run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Abort on the first structural error instead of skipping the item.
    pub strict: bool,
}

/// Per-id resolution state; absence from the memo means unvisited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Resolving,
    Resolved(NodeId),
    Failed,
}

/// A folder whose children are being walked.
struct Frame {
    node: NodeId,
    item_id: String,
    children: Vec<Value>,
    next: usize,
}

enum Opened {
    Leaf(NodeId),
    Folder(Frame),
}

/// Owns the index, the node arena and the id → node memo.
pub struct TreeResolver {
    index: TripleIndex,
    options: ResolveOptions,
    pub(crate) nodes: Vec<Node>,
    memo: HashMap<String, Slot>,
    root: Option<NodeId>,
    pub(crate) report: ResolveReport,
}

impl TreeResolver {
    /// Create a resolver over an index; nothing is resolved yet.
    pub fn new(index: TripleIndex, options: ResolveOptions) -> Self {
        Self {
            index,
            options,
            nodes: Vec::new(),
            memo: HashMap::new(),
            root: None,
            report: ResolveReport::default(),
        }
    }

    /// The underlying index.
    pub fn index(&self) -> &TripleIndex {
        &self.index
    }

    /// Node by arena id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node id of an already resolved item.
    pub fn lookup(&self, item_id: &str) -> Option<NodeId> {
        match self.memo.get(item_id) {
            Some(Slot::Resolved(id)) => Some(*id),
            _ => None,
        }
    }

    /// Counters and failures so far.
    pub fn report(&self) -> &ResolveReport {
        &self.report
    }

    /// Resolve one item and, for folders, its whole subtree.
    ///
    /// Resolving an id a second time returns the node built the first time.
    pub fn resolve(&mut self, id: &str) -> TreeResult<NodeId> {
        self.run(id, NodeOrigin::Graph)
    }

    /// Resolve the synthetic root folder.
    pub fn resolve_root(&mut self) -> TreeResult<NodeId> {
        let root = self.run(ROOT_URI, NodeOrigin::Root)?;
        self.root = Some(root);
        Ok(root)
    }

    pub(crate) fn ensure_root(&mut self) -> TreeResult<NodeId> {
        match self.root {
            Some(root) => Ok(root),
            None => self.resolve_root(),
        }
    }

    /// Attach every never-visited item to the root, in id order.
    ///
    /// Returns the number of items attached.
    pub fn reconcile_lost_items(&mut self) -> TreeResult<usize> {
        let root = self.ensure_root()?;
        let unvisited: Vec<String> = self
            .index
            .ids()
            .filter(|id| !self.memo.contains_key(*id))
            .map(str::to_string)
            .collect();

        let mut attached = 0;
        for id in unvisited {
            // An earlier lost folder item may have pulled this one in already.
            if self.memo.contains_key(&id) {
                continue;
            }
            match self.run(&id, NodeOrigin::LostItem) {
                Ok(node) => {
                    warn!(id = %id, "attaching lost item to root");
                    self.attach(root, node);
                    attached += 1;
                }
                Err(err) if self.options.strict => return Err(err),
                Err(err) => self.record(err),
            }
        }
        self.report.lost_items += attached;
        Ok(attached)
    }

    /// Finish the run and hand out the tree.
    pub fn finish(mut self) -> TreeResult<Tree> {
        let root = self.ensure_root()?;
        let memo = self
            .memo
            .into_iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Resolved(node) => Some((id, node)),
                _ => None,
            })
            .collect();
        Ok(Tree {
            nodes: self.nodes,
            root,
            memo,
            report: self.report,
        })
    }

    // ---------------------------------------------------------------
    // Engine
    // ---------------------------------------------------------------

    fn run(&mut self, id: &str, origin: NodeOrigin) -> TreeResult<NodeId> {
        match self.memo.get(id) {
            Some(Slot::Resolved(node)) => return Ok(*node),
            Some(Slot::Resolving) => {
                return Err(TreeError::CycleDetected {
                    id: id.to_string(),
                    parent: id.to_string(),
                })
            }
            Some(Slot::Failed) => {
                return Err(TreeError::AlreadyFailed { id: id.to_string() })
            }
            None => {}
        }

        let mut stack = match self.open(id, origin)? {
            Opened::Leaf(node) => return Ok(node),
            Opened::Folder(frame) => vec![frame],
        };
        let top = stack[0].node;

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.get(frame.next).cloned() else {
                self.memo
                    .insert(frame.item_id.clone(), Slot::Resolved(frame.node));
                stack.pop();
                continue;
            };
            frame.next += 1;
            let ordinal = frame.next;
            let parent = frame.node;
            let parent_id = frame.item_id.clone();

            match self.step(parent, &parent_id, ordinal, &child) {
                Ok(Some(next)) => stack.push(next),
                Ok(None) => {}
                Err(err) if self.options.strict => {
                    for frame in stack.drain(..) {
                        self.memo.insert(frame.item_id, Slot::Failed);
                    }
                    return Err(err);
                }
                Err(err) => self.record(err),
            }
        }
        Ok(top)
    }

    /// Handle one ordinal child of `parent`.
    fn step(
        &mut self,
        parent: NodeId,
        parent_id: &str,
        ordinal: usize,
        child: &Value,
    ) -> TreeResult<Option<Frame>> {
        let unresolved = || TreeError::UnresolvedReference {
            parent: parent_id.to_string(),
            ordinal,
            target: child.as_str().to_string(),
        };
        let child_id = child.as_item_ref().ok_or_else(unresolved)?;

        match self.memo.get(child_id).copied() {
            Some(Slot::Resolved(node)) => {
                self.attach(parent, node);
                Ok(None)
            }
            Some(Slot::Resolving) => Err(TreeError::CycleDetected {
                id: child_id.to_string(),
                parent: parent_id.to_string(),
            }),
            // Already reported when it failed.
            Some(Slot::Failed) => Ok(None),
            None => {
                if !self.index.contains(child_id) {
                    return Err(unresolved());
                }
                match self.open(child_id, NodeOrigin::Graph)? {
                    Opened::Leaf(node) => {
                        self.attach(parent, node);
                        Ok(None)
                    }
                    Opened::Folder(frame) => {
                        self.attach(parent, frame.node);
                        Ok(Some(frame))
                    }
                }
            }
        }
    }

    /// Validate an item and allocate its node.
    fn open(&mut self, id: &str, origin: NodeOrigin) -> TreeResult<Opened> {
        let item = if id == ROOT_URI {
            self.index.root()
        } else {
            self.index
                .item(id)
                .ok_or_else(|| TreeError::UnknownItem(id.to_string()))?
        };

        let kind = match item.kind {
            Some(kind) => kind,
            None => {
                self.memo.insert(id.to_string(), Slot::Failed);
                return Err(TreeError::MissingType { id: id.to_string() });
            }
        };
        if !kind.is_folder() && item.has_ordinals() {
            let ordinals = item.ordinal_count;
            self.memo.insert(id.to_string(), Slot::Failed);
            return Err(TreeError::InvariantViolation {
                id: id.to_string(),
                kind: kind.to_string(),
                ordinals,
            });
        }

        let node = Node::from_item(item, kind, origin);
        let children = match kind {
            ItemKind::Folder => item.children.clone(),
            _ => Vec::new(),
        };
        let node_id = self.push(node);
        debug!(id = %id, kind = %kind, children = children.len(), "resolving item");

        if kind.is_folder() {
            self.memo.insert(id.to_string(), Slot::Resolving);
            Ok(Opened::Folder(Frame {
                node: node_id,
                item_id: id.to_string(),
                children,
                next: 0,
            }))
        } else {
            self.memo.insert(id.to_string(), Slot::Resolved(node_id));
            Ok(Opened::Leaf(node_id))
        }
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn mark_resolved(&mut self, item_id: &str, node: NodeId) {
        self.memo.insert(item_id.to_string(), Slot::Resolved(node));
    }

    pub(crate) fn is_known(&self, item_id: &str) -> bool {
        self.index.contains(item_id) || self.memo.contains_key(item_id)
    }

    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        let node = &mut self.nodes[child.0];
        node.references += 1;
        if node.references > 1 {
            debug!(id = %node.id, references = node.references, "item listed by more than one folder");
            self.report.shared += 1;
        }
    }

    fn record(&mut self, err: TreeError) {
        warn!(error = %err, "skipping item");
        self.report.failures.push(err);
    }
}

/// Resolve the whole archive: root, lost items, then lost folders.
pub fn build_tree(
    index: TripleIndex,
    data_dir: Option<&Path>,
    options: ResolveOptions,
) -> TreeResult<Tree> {
    let mut resolver = TreeResolver::new(index, options);
    resolver.resolve_root()?;
    resolver.reconcile_lost_items()?;
    if let Some(dir) = data_dir {
        resolver.reconcile_lost_folders(dir)?;
    }
    let tree = resolver.finish()?;
    let report = tree.report();
    info!(
        nodes = tree.len(),
        lost_items = report.lost_items,
        lost_folders = report.lost_folders,
        failures = report.failures.len(),
        "resolved archive tree"
    );
    Ok(tree)
}
