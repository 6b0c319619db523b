//! Writes a resolved [`Tree`] to disk.
//!
//! Folders become directories, notes become UTF-8 text files, and saved pages
//! are either copied as directories or packed into `.mht` containers.
//! Traversal uses an explicit stack of pending folders; every file is
//! written atomically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use sbk_graph::ItemKind;
use sbk_mht::{parse_stamp, write_atomic, Container, ContainerMeta};
use sbk_tree::{NameAllocator, Node, NodeId, Tree};

use crate::config::{ConvertConfig, OutputMode};
use crate::error::{ConvertError, ConvertResult};
use crate::note::extract_pre_text;
use crate::sidecar::{
    desktop_ini, folder_index, item_dat, IndexEntry, DAT_EXTENSION, DESKTOP_INI, INDEX_FILE,
};

/// File inside a note's data directory that holds its text.
const NOTE_DOCUMENT: &str = "index.html";

/// Counters of a conversion run.
#[derive(Debug, Default)]
pub struct ConvertReport {
    pub folders: usize,
    pub notes: usize,
    pub pages: usize,
    pub containers: usize,
    pub sidecars: usize,
    /// Items with neither data nor metadata, left out of the output.
    pub skipped: usize,
    /// Items skipped in lenient mode.
    pub failures: Vec<ConvertError>,
}

/// Serializable form of a [`ConvertReport`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConvertSummary {
    pub folders: usize,
    pub notes: usize,
    pub pages: usize,
    pub containers: usize,
    pub sidecars: usize,
    pub skipped: usize,
    pub failures: Vec<String>,
}

impl ConvertReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> ConvertSummary {
        ConvertSummary {
            folders: self.folders,
            notes: self.notes,
            pages: self.pages,
            containers: self.containers,
            sidecars: self.sidecars,
            skipped: self.skipped,
            failures: self.failures.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// What a node turns into on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Output {
    Folder,
    Text,
    CopiedPage,
    Container,
    /// Unknown item without a data directory: metadata only.
    SidecarOnly,
}

impl Output {
    /// Suffix of the main entry; empty for directories.
    fn extension(self) -> &'static str {
        match self {
            Self::Folder | Self::CopiedPage => "",
            Self::Text => ".txt",
            Self::Container => ".mht",
            Self::SidecarOnly => DAT_EXTENSION,
        }
    }
}

struct FolderJob {
    node: NodeId,
    dir: PathBuf,
}

/// One conversion run over a tree.
pub struct Converter<'a> {
    tree: &'a Tree,
    data_dir: PathBuf,
    config: &'a ConvertConfig,
    report: ConvertReport,
}

impl<'a> Converter<'a> {
    pub fn new(tree: &'a Tree, data_dir: impl Into<PathBuf>, config: &'a ConvertConfig) -> Self {
        Self {
            tree,
            data_dir: data_dir.into(),
            config,
            report: ConvertReport::default(),
        }
    }

    /// Write the whole tree under `out`; the root folder maps to `out` itself.
    pub fn run(mut self, out: &Path) -> ConvertResult<ConvertReport> {
        let mut stack = vec![FolderJob {
            node: self.tree.root_id(),
            dir: out.to_path_buf(),
        }];
        while let Some(job) = stack.pop() {
            match self.write_folder(&job) {
                Ok(subfolders) => stack.extend(subfolders.into_iter().rev()),
                Err(err) => self.fail(err)?,
            }
        }
        info!(
            out = %out.display(),
            folders = self.report.folders,
            notes = self.report.notes,
            pages = self.report.pages,
            containers = self.report.containers,
            failures = self.report.failures.len(),
            "conversion finished"
        );
        Ok(self.report)
    }

    /// Strict mode propagates; lenient mode records and carries on.
    fn fail(&mut self, err: ConvertError) -> ConvertResult<()> {
        if self.config.strict {
            return Err(err);
        }
        warn!(item = err.item_id().unwrap_or("-"), error = %err, "skipping item");
        self.report.failures.push(err);
        Ok(())
    }

    fn item_data(&self, node: &Node) -> PathBuf {
        self.data_dir.join(&node.id)
    }

    fn output_for(&self, node: &Node) -> Output {
        match node.kind {
            ItemKind::Folder => Output::Folder,
            ItemKind::Note => Output::Text,
            ItemKind::Unknown if !self.item_data(node).is_dir() => Output::SidecarOnly,
            ItemKind::Page | ItemKind::NoteEx | ItemKind::Unknown => match self.config.mode {
                OutputMode::Folder => Output::CopiedPage,
                OutputMode::Container => Output::Container,
            },
        }
    }

    /// Names to claim for a node: its main entry plus its sidecar.
    fn claimed_extensions(&self, output: Output) -> Vec<&'static str> {
        let mut extensions = vec![output.extension()];
        if self.config.sidecars && !matches!(output, Output::Folder | Output::SidecarOnly) {
            extensions.push(DAT_EXTENSION);
        }
        extensions
    }

    fn write_folder(&mut self, job: &FolderJob) -> ConvertResult<Vec<FolderJob>> {
        let tree = self.tree;
        let node = tree.node(job.node);
        fs::create_dir_all(&job.dir).map_err(|e| ConvertError::io(&node.id, &job.dir, e))?;
        self.report.folders += 1;
        debug!(id = %node.id, dir = %job.dir.display(), "writing folder");

        let mut names = NameAllocator::new(node.id.clone(), self.config.strict);
        names.reserve(INDEX_FILE);
        names.reserve(DESKTOP_INI);

        let mut entries = Vec::new();
        let mut subfolders = Vec::new();
        for (child_id, child) in tree.children(job.node) {
            let output = self.output_for(child);
            if output == Output::SidecarOnly && !(self.config.sidecars && item_dat(child).is_some()) {
                debug!(id = %child.id, "unknown item has neither data nor metadata");
                self.report.skipped += 1;
                continue;
            }
            let stem = match names.claim(&child.name, &self.claimed_extensions(output)) {
                Ok(stem) => stem,
                Err(err) => {
                    self.fail(err.into())?;
                    continue;
                }
            };
            let entry_name = format!("{stem}{}", output.extension());
            let title = child
                .custom_title
                .clone()
                .or_else(|| (stem != child.name).then(|| child.display_title().to_string()));
            entries.push(IndexEntry {
                name: entry_name.clone(),
                title,
            });

            if output == Output::Folder {
                subfolders.push(FolderJob {
                    node: child_id,
                    dir: job.dir.join(&entry_name),
                });
            } else if let Err(err) = self.write_leaf(child, &job.dir, &stem, output) {
                self.fail(err)?;
            }
        }

        if let Err(err) = self.write_folder_sidecars(node, &job.dir, &entries) {
            self.fail(err)?;
        }
        Ok(subfolders)
    }

    fn write_folder_sidecars(
        &mut self,
        node: &Node,
        dir: &Path,
        entries: &[IndexEntry],
    ) -> ConvertResult<()> {
        write_atomic(&dir.join(INDEX_FILE), &folder_index(entries), self.config.overwrite)?;
        self.report.sidecars += 1;
        if !self.config.sidecars {
            return Ok(());
        }
        if let Some(ini) = desktop_ini(node) {
            write_atomic(&dir.join(DESKTOP_INI), &ini.to_utf16(), self.config.overwrite)?;
            self.report.sidecars += 1;
        }
        Ok(())
    }

    fn write_leaf(&mut self, node: &Node, dir: &Path, stem: &str, output: Output) -> ConvertResult<()> {
        let source = self.item_data(node);
        match output {
            Output::Text => {
                let text = read_note(node, &source)?;
                let target = dir.join(format!("{stem}.txt"));
                write_atomic(&target, text.as_bytes(), self.config.overwrite)?;
                self.report.notes += 1;
            }
            Output::CopiedPage => {
                require_dir(node, &source)?;
                let files = copy_dir(node, &source, &dir.join(stem), self.config.overwrite)?;
                debug!(id = %node.id, files, "copied page");
                self.report.pages += 1;
            }
            Output::Container => {
                require_dir(node, &source)?;
                let container = Container::from_dir(&source)?.with_meta(container_meta(node));
                let target = dir.join(format!("{stem}.mht"));
                write_atomic(&target, &container.to_bytes(), self.config.overwrite)?;
                self.report.containers += 1;
            }
            Output::SidecarOnly => {
                debug!(id = %node.id, "unknown item has no data; writing metadata only");
            }
            Output::Folder => return Ok(()),
        }

        if self.config.sidecars {
            if let Some(dat) = item_dat(node) {
                let target = dir.join(format!("{stem}{DAT_EXTENSION}"));
                write_atomic(&target, &dat.to_utf16(), self.config.overwrite)?;
                self.report.sidecars += 1;
            }
        }
        Ok(())
    }
}

/// Convert a tree into `out`.
pub fn convert(
    tree: &Tree,
    data_dir: &Path,
    out: &Path,
    config: &ConvertConfig,
) -> ConvertResult<ConvertReport> {
    Converter::new(tree, data_dir, config).run(out)
}

fn require_dir(node: &Node, path: &Path) -> ConvertResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConvertError::MissingData {
            id: node.id.clone(),
            path: path.to_path_buf(),
        })
    }
}

/// The note document, matched case-insensitively like lost-folder inference.
fn note_document(data: &Path) -> Option<PathBuf> {
    let exact = data.join(NOTE_DOCUMENT);
    if exact.is_file() {
        return Some(exact);
    }
    fs::read_dir(data)
        .ok()?
        .filter_map(Result::ok)
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.eq_ignore_ascii_case(NOTE_DOCUMENT))
                && entry.path().is_file()
        })
        .map(|entry| entry.path())
}

fn read_note(node: &Node, data: &Path) -> ConvertResult<String> {
    let Some(path) = note_document(data) else {
        return Err(ConvertError::MissingData {
            id: node.id.clone(),
            path: data.join(NOTE_DOCUMENT),
        });
    };
    let bytes = fs::read(&path).map_err(|e| ConvertError::io(&node.id, &path, e))?;
    let html = String::from_utf8_lossy(&bytes);
    extract_pre_text(&html).ok_or_else(|| ConvertError::NoteText {
        id: node.id.clone(),
    })
}

fn container_meta(node: &Node) -> ContainerMeta {
    let date = node.create.as_deref().and_then(|stamp| {
        let date = parse_stamp(stamp);
        if date.is_none() {
            debug!(id = %node.id, stamp, "ignoring malformed create stamp");
        }
        date
    });
    ContainerMeta {
        subject: Some(node.display_title().to_string()),
        source: node.source.clone(),
        comments: node.comment.clone(),
        icon: node.icon.clone(),
        date,
    }
}

/// Copy `src` to `target` through a staging directory beside the target.
fn copy_dir(node: &Node, src: &Path, target: &Path, overwrite: bool) -> ConvertResult<usize> {
    if target.exists() && !overwrite {
        return Err(ConvertError::OutputExists(target.to_path_buf()));
    }
    let parent = target.parent().unwrap_or(Path::new("."));
    let staging = tempfile::Builder::new()
        .prefix(".sbk-stage-")
        .tempdir_in(parent)
        .map_err(|e| ConvertError::io(&node.id, parent, e))?;

    let mut files = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            ConvertError::io(&node.id, path, io::Error::from(e))
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let dest = staging.path().join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| ConvertError::io(&node.id, &dest, e))?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &dest).map_err(|e| ConvertError::io(&node.id, entry.path(), e))?;
            files += 1;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    if target.is_dir() {
        fs::remove_dir_all(target).map_err(|e| ConvertError::io(&node.id, target, e))?;
    } else if target.exists() {
        fs::remove_file(target).map_err(|e| ConvertError::io(&node.id, target, e))?;
    }
    fs::rename(staging.path(), target).map_err(|e| ConvertError::io(&node.id, target, e))?;
    Ok(files)
}
