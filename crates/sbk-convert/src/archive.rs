//! Loading an archive root: RDF index plus data store.

use std::path::{Path, PathBuf};

use tracing::info;

use sbk_graph::{load_rdf_file, IndexOptions, TripleIndex};
use sbk_tree::{build_tree, ResolveOptions, Tree};

use crate::config::ConvertConfig;
use crate::error::ConvertResult;

/// An archive directory holding `scrapbook.rdf` and `data/`.
#[derive(Clone, Debug)]
pub struct Archive {
    root: PathBuf,
    config: ConvertConfig,
}

impl Archive {
    pub fn open(root: impl Into<PathBuf>, config: ConvertConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn index_path(&self) -> PathBuf {
        self.config.index_path(&self.root)
    }

    pub fn data_path(&self) -> PathBuf {
        self.config.data_path(&self.root)
    }

    /// Parse and index the RDF graph.
    pub fn load_index(&self) -> ConvertResult<TripleIndex> {
        let path = self.index_path();
        let triples = load_rdf_file(&path)?;
        let index = TripleIndex::build(
            triples,
            IndexOptions {
                strict: self.config.strict,
            },
        )?;
        info!(path = %path.display(), items = index.len(), "loaded archive index");
        Ok(index)
    }

    /// Index the graph and resolve it against the data store.
    pub fn load_tree(&self) -> ConvertResult<Tree> {
        let index = self.load_index()?;
        let data = self.data_path();
        let tree = build_tree(
            index,
            Some(&data),
            ResolveOptions {
                strict: self.config.strict,
            },
        )?;
        Ok(tree)
    }
}
