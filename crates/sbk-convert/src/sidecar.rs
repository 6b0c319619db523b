//! Sidecar files that carry item metadata next to the converted output.
//!
//! - `index`: UTF-8, one child entry per line, `name` or `name=<title>`.
//! - `desktop.ini`: UTF-16LE with BOM, `[Scrapbook]` and `[.ShellClassInfo]`.
//! - `<name>.dat`: UTF-16LE with BOM, `Key=value` lines.
//!
//! Every line ends in CRLF.

use sbk_graph::ItemKind;
use sbk_tree::Node;

/// Per-folder order file.
pub const INDEX_FILE: &str = "index";
/// Per-folder Windows metadata file.
pub const DESKTOP_INI: &str = "desktop.ini";
/// Extension of per-item metadata files.
pub const DAT_EXTENSION: &str = ".dat";

/// Lines of a `Key=value` sidecar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sidecar {
    lines: Vec<String>,
}

impl Sidecar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&mut self, name: &str) -> &mut Self {
        self.lines.push(format!("[{name}]"));
        self
    }

    /// Add `key=value`; line breaks inside the value become spaces.
    pub fn entry(&mut self, key: &str, value: &str) -> &mut Self {
        self.lines.push(format!("{key}={}", single_line(value)));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The sidecar text with CRLF line endings.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push_str("\r\n");
        }
        text
    }

    /// UTF-16LE bytes with a byte order mark.
    pub fn to_utf16(&self) -> Vec<u8> {
        encode_utf16le(&self.text())
    }
}

fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'].as_slice())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// UTF-16LE with a leading byte order mark.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&[0xFF, 0xFE]);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// One line of a folder's `index` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// File or directory name as written.
    pub name: String,
    /// Title to show instead of the name.
    pub title: Option<String>,
}

/// Contents of a folder's `index` file.
pub fn folder_index(entries: &[IndexEntry]) -> Vec<u8> {
    let mut text = String::new();
    for entry in entries {
        text.push_str(&entry.name);
        if let Some(title) = &entry.title {
            text.push('=');
            text.push_str(&single_line(title));
        }
        text.push_str("\r\n");
    }
    text.into_bytes()
}

/// `desktop.ini` for a folder, or `None` when there is nothing to record.
pub fn desktop_ini(node: &Node) -> Option<Sidecar> {
    let mut ini = Sidecar::new();
    let custom = node.custom_title.as_deref();
    if custom.is_some() || node.source.is_some() || node.icon.is_some() {
        ini.section("Scrapbook");
        if let Some(title) = custom {
            ini.entry("Title", title);
        }
        if let Some(source) = &node.source {
            ini.entry("Source", source);
        }
        if let Some(icon) = &node.icon {
            ini.entry("Icon", icon);
        }
        ini.blank();
    }
    if let Some(comment) = &node.comment {
        ini.section(".ShellClassInfo");
        ini.entry("InfoTip", comment);
    }
    (!ini.is_empty()).then_some(ini)
}

/// `<name>.dat` for a note or page, or `None` when there is nothing to record.
///
/// Notes take their title from their first line, so only pages record a
/// custom title.
pub fn item_dat(node: &Node) -> Option<Sidecar> {
    let mut dat = Sidecar::new();
    if node.kind != ItemKind::Note {
        if let Some(title) = &node.custom_title {
            dat.entry("Title", title);
        }
    }
    if let Some(comment) = &node.comment {
        dat.entry("Comment", comment);
    }
    if let Some(source) = &node.source {
        dat.entry("Source", source);
    }
    if let Some(icon) = &node.icon {
        dat.entry("Icon", icon);
    }
    (!dat.is_empty()).then_some(dat)
}
