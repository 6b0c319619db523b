/// File name of the root document.
pub const ROOT_DOCUMENT: &str = "index.html";

/// Content type of the root document.
pub const ROOT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// One file inside a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    /// Relative path with forward slashes; `None` for the root document.
    pub location: Option<String>,
    /// MIME type, when one could be guessed or was declared.
    pub content_type: Option<String>,
    /// Raw bytes, never transcoded.
    pub data: Vec<u8>,
}

impl Part {
    /// The root HTML document.
    pub fn root(data: Vec<u8>) -> Self {
        Self {
            location: None,
            content_type: Some(ROOT_CONTENT_TYPE.to_string()),
            data,
        }
    }

    /// A located part with its type guessed from the extension.
    pub fn located(location: impl Into<String>, data: Vec<u8>) -> Self {
        let location = location.into();
        let content_type = mime_guess::from_path(&location)
            .first_raw()
            .map(str::to_string);
        Self {
            location: Some(location),
            content_type,
            data,
        }
    }

    /// Returns `true` for the root document.
    pub fn is_root(&self) -> bool {
        self.location.is_none()
    }

    /// Path the part is written to on unpack.
    pub fn relative_path(&self) -> &str {
        self.location.as_deref().unwrap_or(ROOT_DOCUMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_parts_guess_their_type() {
        assert_eq!(
            Part::located("img/logo.png", vec![]).content_type.as_deref(),
            Some("image/png")
        );
        assert_eq!(
            Part::located("style.css", vec![]).content_type.as_deref(),
            Some("text/css")
        );
        assert!(Part::located("blob.zzzunknown", vec![])
            .content_type
            .is_none());
    }

    #[test]
    fn root_part_unpacks_to_index_html() {
        let root = Part::root(b"<html/>".to_vec());
        assert!(root.is_root());
        assert_eq!(root.relative_path(), "index.html");
        assert_eq!(root.content_type.as_deref(), Some(ROOT_CONTENT_TYPE));
    }
}
