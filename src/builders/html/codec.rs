//! `FileContents` payload codec.
//!
//! Embedded files are stored as Base64 text of a gzip stream. The gzip
//! header carries a zero modification time so identical content always
//! encodes to identical text.

use crate::common::{Error, Result};
use crate::element::Element;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use std::io::{Read, Write};

/// Gzip `data` and encode the stream as standard Base64.
pub fn compress_and_encode(data: &[u8]) -> Result<String> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::with_capacity(data.len() / 2 + 32), Compression::default());
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;
    tracing::debug!(
        size = data.len(),
        compressed = compressed.len(),
        "compressed file contents"
    );
    Ok(BASE64_ENGINE.encode(compressed))
}

/// Decode a Base64 payload and decompress the gzip stream inside it.
///
/// Surrounding whitespace of the payload is ignored.
pub fn decode_and_decompress(payload: &str) -> Result<Vec<u8>> {
    let compressed = BASE64_ENGINE.decode(payload.trim())?;
    let mut data = Vec::with_capacity(compressed.len() * 3);
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut data)
        .map_err(|e| Error::Codec(format!("gzip stream: {}", e)))?;
    Ok(data)
}

/// Decode a payload holding UTF-8 text, normalizing its line endings.
pub fn decode_text(payload: &str) -> Result<String> {
    let text = String::from_utf8(decode_and_decompress(payload)?)
        .map_err(|e| Error::Codec(format!("file contents are not UTF-8: {}", e)))?;
    Ok(normalize_line_endings(&text))
}

/// Convert CRLF and CR to LF and collapse runs of blank lines to one.
pub fn normalize_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let c = match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                '\n'
            },
            c => c,
        };
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(c);
    }
    out
}

/// The raw payload of the first `FileContents` element below `root`.
pub fn file_contents_payload(root: &Element) -> Option<String> {
    let payload = root.find_first("FileContents")?.text();
    let payload = payload.trim();
    (!payload.is_empty()).then(|| payload.to_string())
}
