use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, ConvertResult};

/// How saved pages are written out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Copy each page's data directory.
    #[default]
    Folder,
    /// Pack each page's data directory into one `.mht` file.
    Container,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub mode: OutputMode,
    /// Write `desktop.ini` and `.dat` sidecars; `index` is always written.
    pub sidecars: bool,
    /// Abort on the first failure instead of skipping the item.
    pub strict: bool,
    /// Replace existing output files.
    pub overwrite: bool,
    /// RDF index, relative to the archive root.
    pub index_file: PathBuf,
    /// Data store, relative to the archive root.
    pub data_dir: PathBuf,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Folder,
            sidecars: true,
            strict: false,
            overwrite: false,
            index_file: PathBuf::from("scrapbook.rdf"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ConvertConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a TOML config file; missing keys take their defaults.
    pub fn load(path: &Path) -> ConvertResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConvertError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text).map_err(|e| ConvertError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn index_path(&self, root: &Path) -> PathBuf {
        root.join(&self.index_file)
    }

    pub fn data_path(&self, root: &Path) -> PathBuf {
        root.join(&self.data_dir)
    }
}
