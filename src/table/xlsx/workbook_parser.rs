//! Parser for `xl/workbook.xml` and its relationship part.
//!
//! Both files are small and flat, so they are scanned with memchr rather
//! than run through a full XML reader.

use crate::common::xml::unescape_xml;
use std::collections::HashMap;

// Typical workbooks have a handful of sheets
const INITIAL_SHEETS_CAPACITY: usize = 16;

/// A sheet entry declared in the workbook part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// Sheet name as shown on its tab
    pub name: String,
    /// Relationship id pointing at the worksheet part
    pub relationship_id: Option<String>,
    /// Declared sheet id
    pub sheet_id: u32,
}

/// Parse workbook.xml content into sheet entries in workbook order.
pub fn parse_workbook_xml(content: &str) -> Vec<SheetEntry> {
    let mut sheets = Vec::with_capacity(INITIAL_SHEETS_CAPACITY);
    let bytes = content.as_bytes();
    let mut pos = 0;

    while let Some(found) = find_tag(&bytes[pos..], b"sheet") {
        let start = pos + found;
        let Some(end) = memchr::memchr(b'>', &bytes[start..]) else {
            break;
        };
        let tag = &content[start..start + end];
        if let Some(name) = attribute_value(tag, "name") {
            let fallback_id = sheets.len() as u32 + 1;
            sheets.push(SheetEntry {
                name: unescape_xml(name),
                relationship_id: attribute_value(tag, "r:id").map(str::to_string),
                sheet_id: attribute_value(tag, "sheetId")
                    .and_then(|id| atoi_simd::parse(id.as_bytes()).ok())
                    .unwrap_or(fallback_id),
            });
        }
        pos = start + end;
    }

    sheets
}

/// Parse a relationships part into `Id -> Target` pairs.
pub fn parse_relationships(content: &str) -> HashMap<String, String> {
    let mut targets = HashMap::new();
    let bytes = content.as_bytes();
    let mut pos = 0;

    while let Some(found) = find_tag(&bytes[pos..], b"Relationship") {
        let start = pos + found;
        let Some(end) = memchr::memchr(b'>', &bytes[start..]) else {
            break;
        };
        let tag = &content[start..start + end];
        if let (Some(id), Some(target)) = (attribute_value(tag, "Id"), attribute_value(tag, "Target"))
        {
            targets.insert(id.to_string(), unescape_xml(target));
        }
        pos = start + end;
    }

    targets
}

/// Resolve a relationship target relative to the `xl/` directory.
pub fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

/// Find the next `<name` start tag whose name is exactly `name`.
fn find_tag(bytes: &[u8], name: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while let Some(found) = memchr::memchr(b'<', &bytes[pos..]) {
        let start = pos + found;
        let rest = &bytes[start + 1..];
        if rest.starts_with(name)
            && rest
                .get(name.len())
                .is_some_and(|&b| b.is_ascii_whitespace() || b == b'/' || b == b'>')
        {
            return Some(start);
        }
        pos = start + 1;
    }
    None
}

/// Extract a double- or single-quoted attribute value from a start tag.
fn attribute_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let bytes = tag.as_bytes();
    let mut pos = 0;
    while let Some(found) = memchr::memmem::find(&bytes[pos..], name.as_bytes()) {
        let start = pos + found;
        let after = start + name.len();
        let preceded_by_space = start > 0 && bytes[start - 1].is_ascii_whitespace();
        if preceded_by_space && bytes.get(after) == Some(&b'=') {
            let quote = *bytes.get(after + 1)?;
            if quote == b'"' || quote == b'\'' {
                let value_start = after + 2;
                let len = memchr::memchr(quote, &bytes[value_start..])?;
                return Some(&tag[value_start..value_start + len]);
            }
        }
        pos = after;
    }
    None
}
