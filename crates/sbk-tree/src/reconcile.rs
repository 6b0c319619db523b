//! Lost folder reconciliation against the on-disk data store.
//!
//! Every subdirectory of the data store is named after an item id. A
//! directory whose name matches no item is synthesized as a node under the
//! root so its contents are not silently dropped.

use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use sbk_graph::ItemKind;

use crate::error::{TreeError, TreeResult};
use crate::node::Node;
use crate::resolver::TreeResolver;

/// File that marks a data directory as a saved note.
const NOTE_ENTRY: &str = "index.html";

impl TreeResolver {
    /// Attach every data directory that matches no item to the root.
    ///
    /// Directories are visited in name order. A missing data store is not an
    /// error. Returns the number of folders attached.
    pub fn reconcile_lost_folders(&mut self, data_dir: &Path) -> TreeResult<usize> {
        if !data_dir.is_dir() {
            debug!(path = %data_dir.display(), "no data directory; skipping lost folder scan");
            return Ok(0);
        }
        let root = self.ensure_root()?;

        let mut attached = 0;
        for entry in WalkDir::new(data_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| walk_error(data_dir, e))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                warn!(path = %entry.path().display(), "skipping data directory with non-UTF-8 name");
                continue;
            };
            if self.is_known(name) {
                continue;
            }

            let kind = infer_kind(entry.path())?;
            let node = self.push(Node::lost_folder(name, kind));
            self.mark_resolved(name, node);
            self.attach(root, node);
            warn!(id = %name, kind = %kind, "attaching lost folder to root");
            attached += 1;
        }
        self.report.lost_folders += attached;
        Ok(attached)
    }
}

/// A directory holding nothing but `index.html` is a note; anything else is
/// kept as an opaque page.
fn infer_kind(dir: &Path) -> TreeResult<ItemKind> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        entries.push(entry);
        if entries.len() > 1 {
            return Ok(ItemKind::Unknown);
        }
    }
    let is_note = match entries.first() {
        Some(entry) => {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| n.eq_ignore_ascii_case(NOTE_ENTRY))
        }
        None => false,
    };
    Ok(if is_note {
        ItemKind::Note
    } else {
        ItemKind::Unknown
    })
}

fn walk_error(root: &Path, err: walkdir::Error) -> TreeError {
    let path = err.path().unwrap_or(root).to_path_buf();
    TreeError::Io {
        path,
        source: io::Error::from(err),
    }
}
