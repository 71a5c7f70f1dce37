//! Parser for worksheet parts (`xl/worksheets/sheetN.xml`).
//!
//! Only `sheetData` is read. Cells without an explicit `r` reference are
//! placed in the column after the previous cell, rows without one after
//! the previous row.

use super::append_text;
use super::shared_strings::SharedStrings;
use crate::common::{Error, Result};
use crate::table::cell::{Cell, CellValue, reference_to_coords};
use crate::table::workbook::Row;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    Shared,
    Inline,
    Formula,
    Bool,
    Error,
    Date,
}

impl CellKind {
    fn from_attribute(value: Option<&[u8]>) -> Self {
        match value {
            Some(b"s") => CellKind::Shared,
            Some(b"inlineStr") => CellKind::Inline,
            Some(b"str") => CellKind::Formula,
            Some(b"b") => CellKind::Bool,
            Some(b"e") => CellKind::Error,
            Some(b"d") => CellKind::Date,
            _ => CellKind::Number,
        }
    }
}

struct PendingCell {
    column: u32,
    kind: CellKind,
    text: String,
    has_value: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    Nothing,
    Value,
    InlineText,
}

/// Parse worksheet XML into populated rows in document order.
pub fn parse_worksheet_xml(
    content: &str,
    shared: &SharedStrings,
    origin: &str,
) -> Result<Vec<Row>> {
    let mut reader = Reader::from_str(content);
    let mut rows = Vec::new();
    let mut row: Option<Row> = None;
    let mut cell: Option<PendingCell> = None;
    let mut last_row = 0u32;
    let mut last_column = 0u32;
    let mut capture = Capture::Nothing;
    let mut in_inline = false;
    let mut phonetic_depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::xml(origin, format!("{} at byte {}", e, reader.error_position())))?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"row" => {
                    last_row = row_number(e, last_row)?;
                    last_column = 0;
                    row = Some(Row {
                        number: last_row,
                        cells: Vec::new(),
                    });
                },
                b"c" => {
                    let (column, kind) = cell_position(e, last_column)?;
                    last_column = column;
                    cell = Some(PendingCell {
                        column,
                        kind,
                        text: String::new(),
                        has_value: false,
                    });
                },
                b"v" => capture = Capture::Value,
                b"is" => in_inline = true,
                b"rPh" => phonetic_depth += 1,
                b"t" if in_inline && phonetic_depth == 0 => capture = Capture::InlineText,
                _ => {},
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"row" => {
                    last_row = row_number(e, last_row)?;
                    last_column = 0;
                },
                b"c" => last_column = cell_position(e, last_column)?.0,
                b"v" | b"t" => {
                    if let Some(cell) = cell.as_mut() {
                        cell.has_value = true;
                    }
                },
                _ => {},
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" | b"t" => {
                    if capture != Capture::Nothing
                        && let Some(cell) = cell.as_mut()
                    {
                        cell.has_value = true;
                    }
                    capture = Capture::Nothing;
                },
                b"is" => in_inline = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"c" => {
                    if let Some(pending) = cell.take() {
                        let value = cell_value(&pending, shared, origin)?;
                        if value != CellValue::Empty
                            && let Some(row) = row.as_mut()
                        {
                            row.cells.push(Cell::new(pending.column, value));
                        }
                    }
                },
                b"row" => {
                    if let Some(finished) = row.take()
                        && !finished.cells.is_empty()
                    {
                        rows.push(finished);
                    }
                },
                b"sheetData" => break,
                _ => {},
            },
            ref text @ (Event::Text(_) | Event::GeneralRef(_) | Event::CData(_))
                if capture != Capture::Nothing =>
            {
                if let Some(cell) = cell.as_mut() {
                    append_text(&mut cell.text, text, origin)?;
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(rows)
}

fn row_number(e: &BytesStart<'_>, last_row: u32) -> Result<u32> {
    match e.try_get_attribute("r")? {
        Some(attr) => atoi_simd::parse::<u32>(&attr.value)
            .map_err(|_| Error::Workbook(format!("Invalid row number: {}", String::from_utf8_lossy(&attr.value)))),
        None => last_row
            .checked_add(1)
            .ok_or_else(|| Error::Workbook("Row number out of range".to_string())),
    }
}

fn cell_position(e: &BytesStart<'_>, last_column: u32) -> Result<(u32, CellKind)> {
    let column = match e.try_get_attribute("r")? {
        Some(attr) => {
            let reference = std::str::from_utf8(&attr.value)
                .map_err(|_| Error::Workbook("Invalid UTF-8 in cell reference".to_string()))?;
            reference_to_coords(reference)?.0
        },
        None => last_column
            .checked_add(1)
            .ok_or_else(|| Error::Workbook("Column number out of range".to_string()))?,
    };
    let kind = e.try_get_attribute("t")?;
    Ok((column, CellKind::from_attribute(kind.as_ref().map(|a| a.value.as_ref()))))
}

fn cell_value(cell: &PendingCell, shared: &SharedStrings, origin: &str) -> Result<CellValue> {
    if !cell.has_value {
        return Ok(CellValue::Empty);
    }
    let text = cell.text.as_str();
    Ok(match cell.kind {
        CellKind::Shared => {
            let index: usize = atoi_simd::parse(text.trim().as_bytes()).map_err(|_| {
                Error::Workbook(format!("{}: invalid shared string index '{}'", origin, text))
            })?;
            let value = shared.get(index).ok_or_else(|| {
                Error::Workbook(format!("{}: shared string {} out of range", origin, index))
            })?;
            CellValue::String(value.to_string())
        },
        CellKind::Inline | CellKind::Formula | CellKind::Date => CellValue::String(text.to_string()),
        CellKind::Bool => CellValue::Bool(matches!(text.trim(), "1" | "true" | "TRUE")),
        CellKind::Error => CellValue::Error(text.to_string()),
        CellKind::Number => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                CellValue::Empty
            } else if let Ok(int_val) = atoi_simd::parse::<i64>(trimmed.as_bytes()) {
                CellValue::Int(int_val)
            } else if let Ok(float_val) = fast_float2::parse::<f64, _>(trimmed) {
                CellValue::Float(float_val)
            } else {
                CellValue::String(text.to_string())
            }
        },
    })
}
