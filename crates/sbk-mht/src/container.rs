//! The in-memory container: top-level metadata plus an ordered part list.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::part::Part;

/// Header names used for archive metadata.
pub mod header_name {
    pub const SUBJECT: &str = "Subject";
    pub const DATE: &str = "Date";
    pub const SOURCE: &str = "Snapshot-Content-Location";
    pub const COMMENTS: &str = "Comments";
    pub const ICON: &str = "X-Scrapbook-Icon";
}

/// Format of the archive's `create`/`modify` stamps.
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Metadata carried in the container's top-level headers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerMeta {
    pub subject: Option<String>,
    pub source: Option<String>,
    pub comments: Option<String>,
    pub icon: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl ContainerMeta {
    /// Returns `true` if no metadata header would be written.
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.source.is_none()
            && self.comments.is_none()
            && self.icon.is_none()
            && self.date.is_none()
    }
}

/// Parse a `YYYYMMDDhhmmss` stamp. The archive stores no zone; it is read as UTC.
pub fn parse_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// A packed directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Container {
    pub meta: ContainerMeta,
    /// Root part first, then the rest by relative path.
    pub parts: Vec<Part>,
}

impl Container {
    /// Wrap parts, restoring the canonical order.
    pub fn new(mut parts: Vec<Part>) -> Self {
        parts.sort_by(|a, b| match (&a.location, &b.location) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(y),
        });
        Self {
            meta: ContainerMeta::default(),
            parts,
        }
    }

    pub fn with_meta(mut self, meta: ContainerMeta) -> Self {
        self.meta = meta;
        self
    }

    /// The root document, if any.
    pub fn root(&self) -> Option<&Part> {
        self.parts.iter().find(|p| p.is_root())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// `(relative path, bytes)` pairs in container order.
    pub fn into_files(self) -> Vec<(String, Vec<u8>)> {
        self.parts
            .into_iter()
            .map(|p| (p.relative_path().to_string(), p.data))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn stamps_parse_as_utc() {
        let date = parse_stamp("20150304050607").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2015, 3, 4));
        assert_eq!((date.hour(), date.minute(), date.second()), (5, 6, 7));
        assert!(parse_stamp("2015").is_none());
        assert!(parse_stamp("").is_none());
    }

    #[test]
    fn new_puts_root_first_then_sorts() {
        let container = Container::new(vec![
            Part::located("z.css", vec![]),
            Part::located("a/b.png", vec![]),
            Part::root(vec![]),
        ]);
        let paths: Vec<_> = container.parts.iter().map(|p| p.relative_path()).collect();
        assert_eq!(paths, vec!["index.html", "a/b.png", "z.css"]);
        assert!(container.root().is_some());
    }
}
