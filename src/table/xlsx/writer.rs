//! Minimal `.xlsx` package writer.
//!
//! Strings are written inline (`t="inlineStr"`) so no shared strings part
//! is needed. Entry timestamps are fixed, making output reproducible.

use crate::common::xml::{escape_text, escape_xml};
use crate::common::{Error, Result};
use crate::table::cell::{CellValue, column_to_letters};
use crate::table::workbook::Sheet;
use std::io::{Cursor, Seek, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKSHEET_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// Builder for `.xlsx` packages.
///
/// ```
/// use ebo_factory::table::{Sheet, xlsx::XlsxWriter};
///
/// let mut writer = XlsxWriter::new();
/// writer.add_sheet(&Sheet::from_rows("Items", [["NAME"], ["VAV-1"]])).unwrap();
/// let bytes = writer.finish().unwrap();
/// assert!(bytes.starts_with(b"PK"));
/// ```
pub struct XlsxWriter<W: Write + Seek> {
    zip_writer: ZipWriter<W>,
    sheet_names: Vec<String>,
}

impl XlsxWriter<Cursor<Vec<u8>>> {
    /// Create a new writer that writes to memory.
    pub fn new() -> Self {
        Self::with_writer(Cursor::new(Vec::new()))
    }

    /// Finish the package and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.finish_into()?.into_inner())
    }
}

impl Default for XlsxWriter<Cursor<Vec<u8>>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Seek> XlsxWriter<W> {
    /// Create a writer over any seekable sink.
    pub fn with_writer(writer: W) -> Self {
        Self {
            zip_writer: ZipWriter::new(writer),
            sheet_names: Vec::new(),
        }
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
    }

    fn add_part(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.zip_writer.start_file(path, Self::options())?;
        self.zip_writer.write_all(content)?;
        Ok(())
    }

    /// Add a worksheet. Sheet names must be unique within the package.
    pub fn add_sheet(&mut self, sheet: &Sheet) -> Result<()> {
        if self.sheet_names.iter().any(|name| name == sheet.name()) {
            return Err(Error::Workbook(format!("duplicate sheet name '{}'", sheet.name())));
        }
        self.sheet_names.push(sheet.name().to_string());
        let path = format!("xl/worksheets/sheet{}.xml", self.sheet_names.len());
        self.add_part(&path, worksheet_xml(sheet).as_bytes())
    }

    /// Write the workbook-level parts and close the archive.
    pub fn finish_into(mut self) -> Result<W> {
        let count = self.sheet_names.len();

        let mut content_types = String::from(CONTENT_TYPES);
        for index in 1..=count {
            content_types.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                index
            ));
        }
        content_types.push_str("</Types>");

        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, name) in self.sheet_names.iter().enumerate() {
            let index = i + 1;
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(name),
                index,
                index
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}" Target="worksheets/sheet{}.xml"/>"#,
                index, WORKSHEET_TYPE, index
            ));
        }
        workbook.push_str("</sheets></workbook>");
        rels.push_str("</Relationships>");

        self.add_part("[Content_Types].xml", content_types.as_bytes())?;
        self.add_part("_rels/.rels", ROOT_RELS.as_bytes())?;
        self.add_part("xl/workbook.xml", workbook.as_bytes())?;
        self.add_part("xl/_rels/workbook.xml.rels", rels.as_bytes())?;

        Ok(self.zip_writer.finish()?)
    }
}

fn worksheet_xml(sheet: &Sheet) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let mut number_buf = itoa::Buffer::new();
    for row in sheet.rows() {
        xml.push_str(r#"<row r=""#);
        xml.push_str(number_buf.format(row.number));
        xml.push_str(r#"">"#);
        for cell in &row.cells {
            let reference = format!("{}{}", column_to_letters(cell.column), row.number);
            match &cell.value {
                CellValue::Empty => continue,
                CellValue::String(s) => xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    reference,
                    escape_text(s)
                )),
                CellValue::Int(i) => xml.push_str(&format!(
                    r#"<c r="{}"><v>{}</v></c>"#,
                    reference,
                    itoa::Buffer::new().format(*i)
                )),
                CellValue::Float(f) => xml.push_str(&format!(
                    r#"<c r="{}"><v>{}</v></c>"#,
                    reference,
                    ryu::Buffer::new().format(*f)
                )),
                CellValue::Bool(b) => xml.push_str(&format!(
                    r#"<c r="{}" t="b"><v>{}</v></c>"#,
                    reference,
                    u8::from(*b)
                )),
                CellValue::Error(e) => xml.push_str(&format!(
                    r#"<c r="{}" t="e"><v>{}</v></c>"#,
                    reference,
                    escape_text(e)
                )),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}
