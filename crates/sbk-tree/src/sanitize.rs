//! Title → filesystem-safe name conversion and per-folder name allocation.
//!
//! [`sanitize_name`] is pure: the same title and id always give the same
//! name. [`NameAllocator`] resolves sibling collisions after sanitizing.

use std::collections::HashSet;

use crate::error::{TreeError, TreeResult};

/// Characters that are removed from every name.
///
/// `=` is not a filesystem hazard; it is removed so that `key=value`
/// sidecar lines stay parseable.
pub const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '='];

/// Result of sanitizing a title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizedName {
    /// Safe name, never empty.
    pub name: String,
    /// The original title, present only if sanitizing changed it.
    pub custom_title: Option<String>,
}

/// Strip reserved and control characters, then trim.
///
/// Leading whitespace goes, and so does trailing whitespace or dots (names
/// ending in either are invalid on Windows). The result may be empty.
pub fn sanitize(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| !RESERVED_CHARS.contains(c) && !c.is_control())
        .collect();
    stripped
        .trim_start()
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string()
}

/// Sanitize a title, falling back to the item id when nothing is left.
///
/// Item ids are alphanumeric and therefore always safe.
pub fn sanitize_name(title: Option<&str>, fallback_id: &str) -> SanitizedName {
    let title = title.unwrap_or("");
    let mut name = sanitize(title);
    if name.is_empty() {
        name = fallback_id.to_string();
    }
    let custom_title = (!title.is_empty() && name != title).then(|| title.to_string());
    SanitizedName { name, custom_title }
}

/// Hands out unique output names within one folder.
///
/// Comparison is case-insensitive. A clash is resolved with a ` (2)`,
/// ` (3)`, ... suffix unless the allocator is strict.
#[derive(Clone, Debug)]
pub struct NameAllocator {
    folder: String,
    strict: bool,
    taken: HashSet<String>,
}

impl NameAllocator {
    /// Create an allocator for the folder with the given item id.
    pub fn new(folder: impl Into<String>, strict: bool) -> Self {
        Self {
            folder: folder.into(),
            strict,
            taken: HashSet::new(),
        }
    }

    /// Mark a file name as used, e.g. a sidecar owned by the folder itself.
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_lowercase());
    }

    /// Returns `true` if the file name is already used.
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&name.to_lowercase())
    }

    /// Claim `stem + ext` for every extension in `extensions` at once.
    ///
    /// Returns the stem actually granted. An empty extension stands for the
    /// bare stem (a directory).
    pub fn claim(&mut self, stem: &str, extensions: &[&str]) -> TreeResult<String> {
        let fits = |candidate: &str, taken: &HashSet<String>| {
            extensions
                .iter()
                .all(|ext| !taken.contains(&format!("{candidate}{ext}").to_lowercase()))
        };

        let mut candidate = stem.to_string();
        let mut n = 2;
        while !fits(&candidate, &self.taken) {
            if self.strict {
                return Err(TreeError::NameCollision {
                    folder: self.folder.clone(),
                    name: stem.to_string(),
                });
            }
            candidate = format!("{stem} ({n})");
            n += 1;
        }

        for ext in extensions {
            self.taken.insert(format!("{candidate}{ext}").to_lowercase());
        }
        if candidate != stem {
            tracing::debug!(folder = %self.folder, name = stem, granted = %candidate, "renamed colliding sibling");
        }
        Ok(candidate)
    }
}
