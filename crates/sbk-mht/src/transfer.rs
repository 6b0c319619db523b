//! Content-Transfer-Encoding bodies.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{MhtError, MhtResult};

/// Characters per base64 body line.
pub const LINE_WIDTH: usize = 76;

/// Accepts input with or without trailing padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base64 body wrapped at [`LINE_WIDTH`], every line ending in CRLF.
pub fn encode_base64_lines(data: &[u8], out: &mut Vec<u8>) {
    let encoded = STANDARD.encode(data);
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
}

/// Decode a body according to its transfer encoding.
pub fn decode_body(encoding: Option<&str>, body: &[u8], location: &str) -> MhtResult<Vec<u8>> {
    let encoding = encoding.map(|e| e.trim().to_ascii_lowercase());
    match encoding.as_deref() {
        None | Some("7bit") | Some("8bit") | Some("binary") => Ok(body.to_vec()),
        Some("base64") => {
            let compact: Vec<u8> = body
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            LENIENT
                .decode(compact)
                .map_err(|e| MhtError::InvalidBase64 {
                    location: location.to_string(),
                    reason: e.to_string(),
                })
        }
        Some("quoted-printable") => Ok(decode_quoted_printable(body)),
        Some(other) => Err(MhtError::UnsupportedEncoding(other.to_string())),
    }
}

/// Lenient quoted-printable decoding: malformed escapes are kept as written.
pub fn decode_quoted_printable(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut lines = body.split(|&b| b == b'\n').peekable();
    while let Some(line) = lines.next() {
        let had_newline = lines.peek().is_some();
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        // Transport may add trailing whitespace; it is never content.
        let end = line
            .iter()
            .rposition(|b| *b != b' ' && *b != b'\t')
            .map_or(0, |p| p + 1);
        let line = &line[..end];

        let (line, soft_break) = match line.strip_suffix(b"=") {
            Some(rest) => (rest, true),
            None => (line, false),
        };

        let mut i = 0;
        while i < line.len() {
            if line[i] == b'=' {
                if let Some(byte) = line.get(i + 1..i + 3).and_then(hex_byte) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
            out.push(line[i]);
            i += 1;
        }
        if had_newline && !soft_break {
            out.extend_from_slice(b"\r\n");
        }
    }
    out
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    let text = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(text, 16).ok()
}
