//! Packing: directory → [`Container`] → bytes.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::container::{header_name, Container};
use crate::error::{MhtError, MhtResult};
use crate::header::Headers;
use crate::part::{Part, ROOT_DOCUMENT};
use crate::transfer::encode_base64_lines;

/// Boundary prefix; followed by 24 hex digits of the part digest.
pub const BOUNDARY_PREFIX: &str = "----=_Part_";

impl Container {
    /// Read every file under `dir`, recursively.
    ///
    /// `index.html` directly in `dir` becomes the root part; every other file
    /// is located by its forward-slash relative path.
    pub fn from_dir(dir: &Path) -> MhtResult<Self> {
        let mut parts = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(|_| MhtError::NonUtf8Path(entry.path().to_path_buf()))?;
            let mut segments = Vec::new();
            for component in relative.components() {
                let segment = component
                    .as_os_str()
                    .to_str()
                    .ok_or_else(|| MhtError::NonUtf8Path(entry.path().to_path_buf()))?;
                segments.push(segment);
            }
            let location = segments.join("/");
            let data = std::fs::read(entry.path())?;
            if location == ROOT_DOCUMENT {
                parts.push(Part::root(data));
            } else {
                parts.push(Part::located(location, data));
            }
        }
        debug!(dir = %dir.display(), parts = parts.len(), "read directory into container");
        Ok(Self::new(parts))
    }

    /// Deterministic boundary derived from the parts.
    pub fn boundary(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in &self.parts {
            hasher.update(part.location.as_deref().unwrap_or("").as_bytes());
            hasher.update(&[0]);
            hasher.update(part.content_type.as_deref().unwrap_or("").as_bytes());
            hasher.update(&[0]);
            hasher.update(&(part.data.len() as u64).to_be_bytes());
            hasher.update(&part.data);
        }
        let digest = hasher.finalize();
        format!("{BOUNDARY_PREFIX}{}", hex::encode(&digest.as_bytes()[..12]))
    }

    /// Serialize as a `multipart/related` message with CRLF line endings.
    pub fn to_bytes(&self) -> Vec<u8> {
        let boundary = self.boundary();

        let mut headers = Headers::new();
        headers.push("MIME-Version", "1.0");
        if let Some(subject) = &self.meta.subject {
            headers.push(header_name::SUBJECT, subject);
        }
        if let Some(date) = &self.meta.date {
            headers.push(header_name::DATE, &date.to_rfc2822());
        }
        if let Some(source) = &self.meta.source {
            headers.push(header_name::SOURCE, source);
        }
        if let Some(comments) = &self.meta.comments {
            headers.push(header_name::COMMENTS, comments);
        }
        if let Some(icon) = &self.meta.icon {
            headers.push(header_name::ICON, icon);
        }
        let content_type = match self.root() {
            Some(_) => format!("multipart/related; type=\"text/html\"; boundary=\"{boundary}\""),
            None => format!("multipart/related; boundary=\"{boundary}\""),
        };
        headers.push("Content-Type", &content_type);

        let mut out = Vec::new();
        headers.write_to(&mut out);
        out.extend_from_slice(b"\r\n");

        for part in &self.parts {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            let mut part_headers = Headers::new();
            if let Some(content_type) = &part.content_type {
                part_headers.push("Content-Type", content_type);
            }
            part_headers.push("Content-Transfer-Encoding", "base64");
            if let Some(location) = &part.location {
                part_headers.push("Content-Location", location);
            }
            part_headers.write_to(&mut out);
            out.extend_from_slice(b"\r\n");
            encode_base64_lines(&part.data, &mut out);
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        out
    }
}

/// Pack a directory into container bytes.
pub fn encode_dir(dir: &Path) -> MhtResult<Vec<u8>> {
    Ok(Container::from_dir(dir)?.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("index.html"), "<html>hi</html>").unwrap();
        fs::write(dir.path().join("img/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        dir
    }

    #[test]
    fn page_with_image_packs_into_two_parts() {
        let dir = sample_dir();
        let container = Container::from_dir(dir.path()).unwrap();
        assert_eq!(container.len(), 2);

        let root = &container.parts[0];
        assert!(root.location.is_none());
        assert_eq!(root.content_type.as_deref(), Some("text/html; charset=utf-8"));

        let logo = &container.parts[1];
        assert_eq!(logo.location.as_deref(), Some("img/logo.png"));
        assert!(logo.content_type.as_deref().unwrap().starts_with("image/"));
    }

    #[test]
    fn serialized_form_uses_crlf_and_declares_root_type() {
        let dir = sample_dir();
        let bytes = encode_dir(dir.path()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("MIME-Version: 1.0\r\n"));
        assert!(text.contains("multipart/related; type=\"text/html\"; boundary=\"----=_Part_"));
        assert!(text.contains("Content-Location: img/logo.png\r\n"));
        assert!(!text.replace("\r\n", "").contains('\n'));
        assert!(text.ends_with("--\r\n"));
    }

    #[test]
    fn no_root_part_means_no_type_parameter() {
        let container = Container::new(vec![Part::located("a.txt", b"a".to_vec())]);
        let text = String::from_utf8(container.to_bytes()).unwrap();
        assert!(!text.contains("type=\"text/html\""));
    }

    #[test]
    fn boundary_is_deterministic_and_content_dependent() {
        let a = Container::new(vec![Part::located("a.txt", b"one".to_vec())]);
        let b = Container::new(vec![Part::located("a.txt", b"two".to_vec())]);
        assert_eq!(a.boundary(), a.clone().boundary());
        assert_ne!(a.boundary(), b.boundary());
        assert_eq!(a.boundary().len(), BOUNDARY_PREFIX.len() + 24);
        assert_eq!(a.to_bytes(), a.to_bytes());
    }

    #[test]
    fn nested_index_html_is_not_the_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/index.html"), "x").unwrap();
        let container = Container::from_dir(dir.path()).unwrap();
        assert!(container.root().is_none());
        assert_eq!(container.parts[0].location.as_deref(), Some("sub/index.html"));
    }
}
