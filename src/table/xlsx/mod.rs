//! Reading and writing `.xlsx` workbook packages.
//!
//! Reading resolves each sheet declared in `xl/workbook.xml` to its worksheet
//! part through `xl/_rels/workbook.xml.rels`, then parses cell data with the
//! shared strings table. Writing produces a minimal package with inline
//! strings, enough for the factory's own round trips and scaffolded input
//! workbooks.

mod shared_strings;
mod workbook_parser;
mod worksheet_parser;
mod writer;

pub use shared_strings::SharedStrings;
pub use writer::XlsxWriter;

use super::workbook::{Sheet, Workbook};
use crate::common::xml::{resolve_entity, unescape_xml};
use crate::common::{Error, Result};
use quick_xml::events::Event;
use std::io::{Read, Seek};
use workbook_parser::{parse_relationships, parse_workbook_xml, resolve_target};
use worksheet_parser::parse_worksheet_xml;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Read a complete workbook from an `.xlsx` package.
pub fn read_workbook<R: Read + Seek>(reader: R) -> Result<Workbook> {
    let mut archive = zip::ZipArchive::new(reader)?;

    let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?
        .ok_or_else(|| Error::Workbook(format!("missing {}", WORKBOOK_PART)))?;
    let relationships = read_part(&mut archive, WORKBOOK_RELS_PART)?
        .map(|content| parse_relationships(&content))
        .unwrap_or_default();
    let shared = match read_part(&mut archive, SHARED_STRINGS_PART)? {
        Some(content) => SharedStrings::parse(&content)?,
        None => SharedStrings::default(),
    };

    let entries = parse_workbook_xml(&workbook_xml);
    let mut sheets = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let part = entry
            .relationship_id
            .as_ref()
            .and_then(|id| relationships.get(id))
            .map(|target| resolve_target(target))
            .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", index + 1));
        let content = read_part(&mut archive, &part)?.ok_or_else(|| {
            Error::Workbook(format!("missing worksheet {} for sheet '{}'", part, entry.name))
        })?;

        let mut sheet = Sheet::new(entry.name);
        for row in parse_worksheet_xml(&content, &shared, &part)? {
            sheet.push_row(row);
        }
        tracing::trace!(sheet = sheet.name(), rows = sheet.rows().len(), "parsed worksheet");
        sheets.push(sheet);
    }

    Ok(Workbook::from_sheets(sheets))
}

/// Read a package part as text, `None` when the part does not exist.
fn read_part<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, path: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    if content.starts_with('\u{feff}') {
        content.drain(..'\u{feff}'.len_utf8());
    }
    Ok(Some(content))
}

/// Append the character data carried by a text-like event.
fn append_text(out: &mut String, event: &Event<'_>, origin: &str) -> Result<()> {
    match event {
        Event::Text(text) => {
            let raw = std::str::from_utf8(text)
                .map_err(|e| Error::xml(origin, format!("invalid UTF-8 in text: {}", e)))?;
            out.push_str(&unescape_xml(raw));
        },
        Event::GeneralRef(reference) => {
            let name = String::from_utf8_lossy(reference);
            let ch = resolve_entity(&name)
                .ok_or_else(|| Error::xml(origin, format!("unknown entity &{};", name)))?;
            out.push(ch);
        },
        Event::CData(data) => out.push_str(&String::from_utf8_lossy(data)),
        _ => {},
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use std::io::{Cursor, Write};
    use zip::write::{SimpleFileOptions, ZipWriter};

    /// A package shaped like spreadsheet applications write it: shared
    /// strings, absolute relationship targets, sheet order differing from
    /// part numbering.
    fn external_package() -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let parts: [(&str, &str); 5] = [
            (
                "xl/workbook.xml",
                r#"<workbook xmlns:r="r"><sheets><sheet name="meta" sheetId="2" r:id="rId2"/><sheet name="ICG" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<Relationships><Relationship Id="rId1" Target="/xl/worksheets/sheet1.xml"/><Relationship Id="rId2" Target="worksheets/sheet2.xml"/></Relationships>"#,
            ),
            (
                "xl/sharedStrings.xml",
                r#"<sst><si><t>ICG_NAME</t></si><si><t>GW-01</t></si></sst>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row><row r="2"><c r="A2" t="s"><v>1</v></c></row></sheetData></worksheet>"#,
            ),
            (
                "xl/worksheets/sheet2.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData></worksheet>"#,
            ),
        ];
        for (path, content) in parts {
            zip.start_file(path, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_read_external_package() {
        let workbook = read_workbook(Cursor::new(external_package())).unwrap();
        let names: Vec<_> = workbook.sheet_names().collect();
        assert_eq!(names, ["meta", "ICG"]);

        let icg = workbook.sheet("ICG").unwrap();
        assert_eq!(icg.rows().len(), 2);
        assert_eq!(icg.rows()[1].cells[0].value, CellValue::from("GW-01"));
        assert_eq!(
            workbook.sheet("meta").unwrap().rows()[0].cells[0].value,
            CellValue::Int(1)
        );
    }

    #[test]
    fn test_missing_workbook_part() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("readme.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"hello").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = read_workbook(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::Workbook(_)));
    }
}
