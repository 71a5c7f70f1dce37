//! In-memory workbook model.

use super::cell::{Cell, CellValue};
use super::xlsx;
use crate::common::{Error, Result};
use std::io::Cursor;
use std::path::Path;

/// One populated row of a sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// Row number (1-based)
    pub number: u32,
    /// Cells in column order
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a row from cell values placed in consecutive columns from `A`.
    pub fn from_values<I, V>(number: u32, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Cell::new(i as u32 + 1, value))
            .collect();
        Self { number, cells }
    }

    /// Get the cell in a column.
    pub fn cell(&self, column: u32) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.column == column)
    }
}

/// A named sheet with its rows in row order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    rows: Vec<Row>,
}

impl Sheet {
    /// Create an empty sheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Build a sheet from rows of values, numbering rows from 1.
    pub fn from_rows<R, I, V>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let mut sheet = Self::new(name);
        for (i, values) in rows.into_iter().enumerate() {
            sheet.push_row(Row::from_values(i as u32 + 1, values));
        }
        sheet
    }

    /// Sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows in row order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get a row by its 1-based number.
    pub fn row(&self, number: u32) -> Option<&Row> {
        self.rows.iter().find(|row| row.number == number)
    }

    /// Add a row, keeping rows sorted and cells in column order.
    pub fn push_row(&mut self, mut row: Row) {
        row.cells.sort_by_key(|cell| cell.column);
        let at = self.rows.partition_point(|existing| existing.number <= row.number);
        self.rows.insert(at, row);
    }
}

/// A workbook: sheets in workbook order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Build an in-memory workbook.
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Read an `.xlsx` workbook from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::file_io(path, e))?;
        let workbook = Self::from_bytes(&bytes).map_err(|e| match e {
            Error::ZipError(msg) => Error::Workbook(format!("{}: {}", path.display(), msg)),
            Error::Workbook(msg) => Error::Workbook(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        tracing::debug!(
            path = %path.display(),
            sheets = workbook.sheets.len(),
            "read workbook"
        );
        Ok(workbook)
    }

    /// Read an `.xlsx` workbook from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        xlsx::read_workbook(Cursor::new(bytes))
    }

    /// Serialize as an `.xlsx` package.
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = xlsx::XlsxWriter::new();
        for sheet in &self.sheets {
            writer.add_sheet(sheet)?;
        }
        writer.finish()
    }

    /// Write as an `.xlsx` file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_xlsx_bytes()?;
        std::fs::write(path, bytes).map_err(|e| Error::file_io(path, e))
    }

    /// Sheets in workbook order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(Sheet::name)
    }

    /// Find a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_keeps_order() {
        let mut sheet = Sheet::new("s");
        sheet.push_row(Row {
            number: 3,
            cells: vec![Cell::new(2, "b"), Cell::new(1, "a")],
        });
        sheet.push_row(Row::from_values(1, ["x"]));
        let numbers: Vec<_> = sheet.rows().iter().map(|r| r.number).collect();
        assert_eq!(numbers, [1, 3]);
        let columns: Vec<_> = sheet.row(3).unwrap().cells.iter().map(|c| c.column).collect();
        assert_eq!(columns, [1, 2]);
    }

    #[test]
    fn test_xlsx_round_trip() {
        let workbook = Workbook::from_sheets(vec![
            Sheet::from_rows("Items", [
                vec![CellValue::from("NAME"), CellValue::from("SETPOINT")],
                vec![CellValue::from("VAV-1 & <2>"), CellValue::Float(21.5)],
                vec![CellValue::from("VAV-3"), CellValue::Int(7)],
            ]),
            Sheet::from_rows("meta", [vec![CellValue::Bool(true)]]),
        ]);

        let bytes = workbook.to_xlsx_bytes().unwrap();
        let reread = Workbook::from_bytes(&bytes).unwrap();
        assert_eq!(reread, workbook);
    }

    #[test]
    fn test_open_missing_file_names_path() {
        let err = Workbook::open("/nonexistent/items.xlsx").unwrap_err();
        assert!(err.to_string().contains("items.xlsx"));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(Workbook::from_bytes(b"not a zip").is_err());
    }
}
