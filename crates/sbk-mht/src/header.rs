//! MIME header blocks: splitting, unfolding, `Content-Type` parameters and
//! RFC 2047 encoded words.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{MhtError, MhtResult};

/// Raw bytes per encoded word; keeps every encoded line under 76 columns.
const WORD_CHUNK: usize = 45;

/// An ordered header list with case-insensitive lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header; the value is encoded if it is not plain ASCII.
    pub fn push(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), encode_word(value)));
    }

    /// First value for `name`, with encoded words decoded.
    pub fn get(&self, name: &str) -> Option<String> {
        self.get_raw(name).map(decode_words)
    }

    /// First value for `name`, as written.
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as `Name: value` lines, each ending in CRLF.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for (name, value) in &self.entries {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
    }

    /// Parse an unfolded or folded header block.
    pub fn parse(block: &[u8]) -> MhtResult<Self> {
        let text = String::from_utf8_lossy(block);
        let mut entries: Vec<(String, String)> = Vec::new();
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            if line.starts_with(|c: char| c == ' ' || c == '\t') {
                match entries.last_mut() {
                    Some((_, value)) => value.push_str(line),
                    None => return Err(MhtError::MalformedHeader(line.to_string())),
                }
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| MhtError::MalformedHeader(line.to_string()))?;
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(MhtError::MalformedHeader(line.to_string()));
            }
            entries.push((name.to_string(), value.trim().to_string()));
        }
        Ok(Self { entries })
    }
}

/// Split an entity into its header block and body.
///
/// The blank line between them is consumed. Without one, the whole input is
/// treated as headers.
pub fn split_entity(bytes: &[u8]) -> (&[u8], &[u8]) {
    // A body that starts right away has no header block at all.
    if bytes.starts_with(b"\r\n") {
        return (&[], &bytes[2..]);
    }
    if bytes.starts_with(b"\n") {
        return (&[], &bytes[1..]);
    }
    for i in 0..bytes.len() {
        if bytes[i..].starts_with(b"\r\n\r\n") {
            return (&bytes[..i], &bytes[i + 4..]);
        }
        if bytes[i..].starts_with(b"\n\n") {
            return (&bytes[..i], &bytes[i + 2..]);
        }
        if bytes[i..].starts_with(b"\n\r\n") {
            return (&bytes[..i], &bytes[i + 3..]);
        }
    }
    (bytes, &[])
}

/// A parsed `Content-Type` value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType {
    /// Lower-cased `type/subtype`.
    pub mime: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    pub fn parse(value: &str) -> Self {
        let mut fields = split_params(value).into_iter();
        let mime = fields
            .next()
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let params = fields
            .filter_map(|field| {
                let (name, value) = field.split_once('=')?;
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Some((name.trim().to_ascii_lowercase(), value.replace("\\\"", "\"")))
            })
            .collect();
        Self { mime, params }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_multipart(&self) -> bool {
        self.mime.starts_with("multipart/")
    }
}

/// Split on `;` outside double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                fields.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&value[start..]);
    fields.into_iter().filter(|f| !f.trim().is_empty()).collect()
}

/// Encode a header value as UTF-8 `B` words when it is not printable ASCII.
///
/// Values that merely look like encoded words are encoded too, so they
/// decode back to themselves.
pub fn encode_word(value: &str) -> String {
    let plain = value.bytes().all(|b| (0x20..0x7f).contains(&b)) && !value.contains("=?");
    if plain {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = rest.len().min(WORD_CHUNK);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        // A single char never exceeds four bytes, so `end` is never zero here.
        let (chunk, tail) = rest.split_at(end);
        words.push(format!("=?utf-8?B?{}?=", STANDARD.encode(chunk)));
        rest = tail;
    }
    words.join("\r\n ")
}

/// Decode every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped. Words that do
/// not decode are left as written.
pub fn decode_words(value: &str) -> String {
    let mut out = String::new();
    let mut rest = value;
    let mut pending_space = String::new();
    let mut after_word = false;

    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            out.push_str(&pending_space);
            out.push_str(rest);
            return out;
        };
        let (before, candidate) = rest.split_at(start);
        match parse_word(candidate) {
            Some((decoded, used)) => {
                if !(after_word && before.trim().is_empty()) {
                    out.push_str(&pending_space);
                    out.push_str(before);
                }
                pending_space.clear();
                out.push_str(&decoded);
                after_word = true;
                rest = &candidate[used..];
                // Hold back whitespace until we know what follows it.
                let trimmed = rest.trim_start();
                pending_space.push_str(&rest[..rest.len() - trimmed.len()]);
                rest = trimmed;
            }
            None => {
                out.push_str(&pending_space);
                pending_space.clear();
                out.push_str(before);
                out.push_str("=?");
                after_word = false;
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(&pending_space);
    out
}

/// Decode one `=?charset?enc?text?=` word at the start of `s`.
fn parse_word(s: &str) -> Option<(String, usize)> {
    let body = s.strip_prefix("=?")?;
    let (charset, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let end = body.find("?=")?;
    let text = &body[..end];
    let used = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;

    let bytes = match encoding {
        "B" | "b" => STANDARD.decode(text).ok()?,
        "Q" | "q" => decode_q(text)?,
        _ => return None,
    };
    let charset = charset.split('*').next().unwrap_or(charset);
    let decoded = if charset.eq_ignore_ascii_case("iso-8859-1")
        || charset.eq_ignore_ascii_case("latin1")
    {
        bytes.iter().map(|&b| b as char).collect()
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };
    Some((decoded, used))
}

fn decode_q(text: &str) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' => {
                let hex = bytes.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_unfolds_headers() {
        let block = b"Subject: hello\r\n world\r\nContent-Type: text/plain\r\n";
        let headers = Headers::parse(block).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("subject").as_deref(), Some("hello world"));
        assert_eq!(headers.get_raw("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn rejects_lines_without_colon() {
        let err = Headers::parse(b"no colon here\r\n").unwrap_err();
        assert!(matches!(err, MhtError::MalformedHeader(_)));
    }

    #[test]
    fn splits_entity_on_blank_line() {
        let (head, body) = split_entity(b"A: 1\r\nB: 2\r\n\r\nbody\r\n");
        assert_eq!(head, b"A: 1\r\nB: 2");
        assert_eq!(body, b"body\r\n");

        let (head, body) = split_entity(b"A: 1\n\nbody");
        assert_eq!(head, b"A: 1");
        assert_eq!(body, b"body");

        let (head, body) = split_entity(b"\r\nonly body");
        assert!(head.is_empty());
        assert_eq!(body, b"only body");
    }

    #[test]
    fn content_type_parameters() {
        let ct = ContentType::parse(
            r#"Multipart/Related; type="text/html"; boundary="----=_Part_a;b""#,
        );
        assert_eq!(ct.mime, "multipart/related");
        assert!(ct.is_multipart());
        assert_eq!(ct.param("TYPE"), Some("text/html"));
        assert_eq!(ct.param("boundary"), Some("----=_Part_a;b"));
        assert_eq!(ct.param("charset"), None);
    }

    #[test]
    fn ascii_values_are_left_alone() {
        assert_eq!(encode_word("Plain title"), "Plain title");
    }

    #[test]
    fn non_ascii_values_round_trip() {
        let title = "Über die Brücke: ein sehr langer Titel mit Umlauten, äöü, 日本語のテキスト";
        let encoded = encode_word(title);
        assert!(encoded.is_ascii());
        assert!(encoded.lines().all(|l| l.trim_end().len() <= 76));
        assert_eq!(decode_words(&encoded), title);
    }

    #[test]
    fn lookalike_words_are_protected() {
        let value = "=?not a word?=";
        assert_eq!(decode_words(&encode_word(value)), value);
    }

    #[test]
    fn decodes_q_words_and_keeps_surrounding_text() {
        assert_eq!(
            decode_words("Re: =?iso-8859-1?Q?caf=E9_au_lait?= now"),
            "Re: café au lait now"
        );
        assert_eq!(decode_words("=?utf-8?B?YQ==?= =?utf-8?B?Yg==?="), "ab");
        assert_eq!(decode_words("broken =?x"), "broken =?x");
    }
}
