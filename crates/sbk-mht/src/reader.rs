//! Unpacking: bytes → [`Container`] → files on disk.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::container::{header_name, Container, ContainerMeta};
use crate::error::{MhtError, MhtResult};
use crate::header::{split_entity, ContentType, Headers};
use crate::part::{Part, ROOT_DOCUMENT};
use crate::transfer::decode_body;

impl Container {
    /// Parse container bytes.
    ///
    /// A message that is not multipart yields a single root part holding its
    /// decoded body.
    pub fn from_bytes(bytes: &[u8]) -> MhtResult<Self> {
        let (head, body) = split_entity(bytes);
        let headers = Headers::parse(head)?;
        let meta = read_meta(&headers);
        let content_type = headers
            .get("Content-Type")
            .map(|v| ContentType::parse(&v))
            .unwrap_or_else(|| ContentType::parse("text/plain"));

        if !content_type.is_multipart() {
            let encoding = headers.get("Content-Transfer-Encoding");
            let data = decode_body(encoding.as_deref(), body, ROOT_DOCUMENT)?;
            let part = Part {
                location: None,
                content_type: headers.get("Content-Type"),
                data,
            };
            return Ok(Self {
                meta,
                parts: vec![part],
            });
        }

        let boundary = content_type
            .param("boundary")
            .ok_or(MhtError::MissingBoundary)?;
        let mut parts = Vec::new();
        for raw in split_multipart(body, boundary) {
            parts.push(read_part(raw)?);
        }
        debug!(parts = parts.len(), "parsed container");
        Ok(Self { meta, parts })
    }
}

/// Decode container bytes into `(relative path, bytes)` pairs.
pub fn decode(bytes: &[u8]) -> MhtResult<Vec<(String, Vec<u8>)>> {
    Ok(Container::from_bytes(bytes)?.into_files())
}

fn read_meta(headers: &Headers) -> ContainerMeta {
    let date = headers.get(header_name::DATE).and_then(|raw| {
        match DateTime::parse_from_rfc2822(raw.trim()) {
            Ok(date) => Some(date.with_timezone(&Utc)),
            Err(err) => {
                warn!(date = %raw, error = %err, "ignoring unparseable Date header");
                None
            }
        }
    });
    ContainerMeta {
        subject: headers.get(header_name::SUBJECT),
        source: headers.get(header_name::SOURCE),
        comments: headers.get(header_name::COMMENTS),
        icon: headers.get(header_name::ICON),
        date,
    }
}

fn read_part(raw: &[u8]) -> MhtResult<Part> {
    let (head, body) = split_entity(raw);
    let headers = Headers::parse(head)?;
    let location = headers
        .get("Content-Location")
        .filter(|l| !l.is_empty());
    let encoding = headers.get("Content-Transfer-Encoding");
    let name = location.as_deref().unwrap_or(ROOT_DOCUMENT);
    let data = decode_body(encoding.as_deref(), body, name)?;
    Ok(Part {
        location,
        content_type: headers.get("Content-Type"),
        data,
    })
}

/// Body slices between delimiter lines, preamble and epilogue dropped.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut pos = 0;
    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i);
        let next = (line_end + 1).min(body.len());
        let line = &body[pos..line_end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let line = trim_trailing_space(line);

        let is_close = line == close.as_bytes();
        if is_close || line == delimiter.as_bytes() {
            if let Some(start) = current.take() {
                // The line break before a delimiter belongs to the delimiter.
                parts.push(strip_final_newline(&body[start..pos]));
            }
            if is_close {
                return parts;
            }
            current = Some(next);
        }
        pos = next;
    }
    if let Some(start) = current {
        warn!("container ends without a closing delimiter");
        parts.push(&body[start..]);
    }
    parts
}

fn trim_trailing_space(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| *b != b' ' && *b != b'\t')
        .map_or(0, |p| p + 1);
    &line[..end]
}

fn strip_final_newline(slice: &[u8]) -> &[u8] {
    let slice = slice.strip_suffix(b"\n").unwrap_or(slice);
    slice.strip_suffix(b"\r").unwrap_or(slice)
}

/// Map a part location onto a path under `dir`, rejecting escapes.
pub fn safe_join(dir: &Path, location: &str) -> MhtResult<PathBuf> {
    let unsafe_location = || MhtError::UnsafeLocation(location.to_string());
    if location.is_empty() || location.contains("://") || location.contains('\0') {
        return Err(unsafe_location());
    }
    let mut path = dir.to_path_buf();
    for segment in location.split(|c: char| c == '/' || c == '\\') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => path.push(name),
            _ => return Err(unsafe_location()),
        }
    }
    if location.starts_with(|c: char| c == '/' || c == '\\') || path == dir {
        return Err(unsafe_location());
    }
    Ok(path)
}

/// Write parts under `dir`, creating subdirectories as needed.
///
/// Each file is written to a temporary file beside it and renamed into
/// place. Without `overwrite`, an existing file aborts with
/// [`MhtError::Exists`]. Returns the written paths.
pub fn write_parts(dir: &Path, parts: &[Part], overwrite: bool) -> MhtResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(parts.len());
    for part in parts {
        let target = safe_join(dir, part.relative_path())?;
        write_atomic(&target, &part.data, overwrite)?;
        written.push(target);
    }
    debug!(dir = %dir.display(), files = written.len(), "unpacked container");
    Ok(written)
}

/// All-or-nothing file write.
pub fn write_atomic(target: &Path, data: &[u8], overwrite: bool) -> MhtResult<()> {
    if !overwrite && target.exists() {
        return Err(MhtError::Exists(target.to_path_buf()));
    }
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    if overwrite {
        tmp.persist(target).map_err(|e| MhtError::Io(e.error))?;
    } else {
        tmp.persist_noclobber(target).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                MhtError::Exists(target.to_path_buf())
            } else {
                MhtError::Io(e.error)
            }
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::encode_dir;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::fs;

    #[test]
    fn round_trip_preserves_every_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("img/deep")).unwrap();
        fs::write(dir.path().join("index.html"), "<html>héllo</html>").unwrap();
        fs::write(dir.path().join("img/logo.png"), [0u8, 1, 2, 255]).unwrap();
        fs::write(dir.path().join("img/deep/--x.bin"), b"--boundary-like\r\n--").unwrap();
        fs::write(dir.path().join("empty.txt"), b"").unwrap();

        let files: BTreeMap<_, _> = decode(&encode_dir(dir.path()).unwrap())
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(files.len(), 4);
        assert_eq!(files["index.html"], "<html>héllo</html>".as_bytes());
        assert_eq!(files["img/logo.png"], vec![0u8, 1, 2, 255]);
        assert_eq!(files["img/deep/--x.bin"], b"--boundary-like\r\n--".to_vec());
        assert!(files["empty.txt"].is_empty());
    }

    #[test]
    fn metadata_is_read_back() {
        let meta = ContainerMeta {
            subject: Some("Rätsel: part 1".into()),
            source: Some("http://example.org/a?b=c".into()),
            comments: Some("kept".into()),
            icon: Some("moz-icon://x".into()),
            date: crate::container::parse_stamp("20150101120000"),
        };
        let container =
            Container::new(vec![Part::root(b"<p/>".to_vec())]).with_meta(meta.clone());
        let decoded = Container::from_bytes(&container.to_bytes()).unwrap();
        assert_eq!(decoded.meta, meta);
    }

    #[test]
    fn non_multipart_is_single_index_html() {
        let message = b"Content-Type: text/html\r\nContent-Transfer-Encoding: quoted-printable\r\n\r\n<p>caf=C3=A9</p>";
        let files = decode(message).unwrap();
        assert_eq!(files, vec![("index.html".to_string(), "<p>café</p>".as_bytes().to_vec())]);
    }

    #[test]
    fn foreign_multipart_with_preamble_and_lf_endings() {
        let message = b"MIME-Version: 1.0\nContent-Type: multipart/related; boundary=\"b1\"\n\nThis is a preamble.\n--b1\nContent-Type: text/html\n\n<p>root</p>\n--b1\nContent-Location: notes/a.txt\nContent-Transfer-Encoding: 8bit\n\nline one\nline two\n--b1--\nepilogue\n";
        let files = decode(message).unwrap();
        assert_eq!(
            files,
            vec![
                ("index.html".to_string(), b"<p>root</p>".to_vec()),
                ("notes/a.txt".to_string(), b"line one\nline two".to_vec()),
            ]
        );
    }

    #[test]
    fn multipart_without_boundary_fails() {
        let err = decode(b"Content-Type: multipart/related\r\n\r\n").unwrap_err();
        assert!(matches!(err, MhtError::MissingBoundary));
    }

    #[test]
    fn unsafe_locations_are_rejected() {
        let dir = Path::new("/tmp/out");
        for bad in ["../x", "a/../../x", "/etc/passwd", "\\x", "http://h/x", ""] {
            assert!(
                matches!(safe_join(dir, bad), Err(MhtError::UnsafeLocation(_))),
                "{bad:?} accepted"
            );
        }
        assert_eq!(safe_join(dir, "a/./b.png").unwrap(), dir.join("a").join("b.png"));
    }

    #[test]
    fn write_parts_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let parts = vec![Part::root(b"one".to_vec()), Part::located("a/b.txt", b"two".to_vec())];
        write_parts(dir.path(), &parts, false).unwrap();
        assert_eq!(fs::read(dir.path().join("a/b.txt")).unwrap(), b"two");

        let err = write_parts(dir.path(), &parts, false).unwrap_err();
        assert!(matches!(err, MhtError::Exists(_)));

        let again = vec![Part::root(b"three".to_vec())];
        write_parts(dir.path(), &again, true).unwrap();
        assert_eq!(fs::read(dir.path().join("index.html")).unwrap(), b"three");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn arbitrary_parts_round_trip(
            files in proptest::collection::btree_map("[a-z]{1,8}(/[a-z]{1,8})?\\.[a-z]{1,3}", proptest::collection::vec(any::<u8>(), 0..512), 0..6),
            root in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..256)),
        ) {
            let mut parts: Vec<Part> = files
                .iter()
                .map(|(path, data)| Part::located(path.clone(), data.clone()))
                .collect();
            if let Some(root) = &root {
                parts.push(Part::root(root.clone()));
            }
            let container = Container::new(parts);
            let decoded = Container::from_bytes(&container.to_bytes()).unwrap();
            prop_assert_eq!(decoded.into_files(), container.into_files());
        }
    }
}
