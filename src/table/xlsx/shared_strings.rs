//! Shared strings table (`xl/sharedStrings.xml`).
//!
//! Each `<si>` item is either a plain `<t>` or a sequence of rich-text runs
//! (`<r><t>..</t></r>`); runs are concatenated. Phonetic hints (`<rPh>`) are
//! not part of the cell text and are skipped.

use super::append_text;
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

const ORIGIN: &str = "xl/sharedStrings.xml";

/// Shared strings table indexed by position.
#[derive(Debug, Default, Clone)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    /// Parse shared strings from `xl/sharedStrings.xml` content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        let mut strings = Vec::new();
        let mut current: Option<String> = None;
        let mut in_text = false;
        let mut phonetic_depth = 0usize;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::xml(ORIGIN, format!("{} at byte {}", e, reader.error_position()))
            })?;
            match event {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"si" => current = Some(String::new()),
                    b"rPh" => phonetic_depth += 1,
                    b"t" if phonetic_depth == 0 => in_text = true,
                    _ => {},
                },
                Event::Empty(ref e) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                },
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"si" => {
                        if let Some(text) = current.take() {
                            strings.push(text);
                        }
                    },
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {},
                },
                ref text @ (Event::Text(_) | Event::GeneralRef(_) | Event::CData(_)) if in_text => {
                    if let Some(current) = current.as_mut() {
                        append_text(current, text, ORIGIN)?;
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        Ok(Self { strings })
    }

    /// Get a string by its index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    /// Get the number of strings in the table.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_rich_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
  <si><t>VAV-L21-INT4</t></si>
  <si><r><rPr><b/></rPr><t>Zone </t></r><r><t xml:space="preserve">1 &amp; 2</t></r></si>
  <si><t>name</t><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
  <si/>
</sst>"#;
        let strings = SharedStrings::parse(xml).unwrap();
        assert_eq!(strings.len(), 4);
        assert_eq!(strings.get(0), Some("VAV-L21-INT4"));
        assert_eq!(strings.get(1), Some("Zone 1 & 2"));
        assert_eq!(strings.get(2), Some("name"));
        assert_eq!(strings.get(3), Some(""));
        assert_eq!(strings.get(4), None);
    }
}
