//! Cell values and A1-style coordinates.

use crate::common::{Error, Result};
use std::fmt;

/// Value of a single worksheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell
    #[default]
    Empty,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// String value
    String(String),
    /// Error literal such as `#N/A`
    Error(String),
}

impl CellValue {
    /// Whether the cell carries no usable value.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) | CellValue::Error(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Render the value as substitution text, `None` when empty.
    ///
    /// Integers and integral floats are written without a decimal point,
    /// other floats in shortest round-trip form, booleans as `TRUE`/`FALSE`.
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(match self {
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Int(i) => itoa::Buffer::new().format(*i).to_string(),
            CellValue::Float(f) => render_float(*f),
            CellValue::String(s) | CellValue::Error(s) => s.clone(),
            CellValue::Empty => return None,
        })
    }
}

fn render_float(value: f64) -> String {
    // i64 holds every integral f64 below 2^63 exactly
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        return itoa::Buffer::new().format(value as i64).to_string();
    }
    ryu::Buffer::new().format(value).to_string()
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render().as_deref().unwrap_or(""))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// A non-empty position in a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Column number (1-based)
    pub column: u32,
    /// Cell value
    pub value: CellValue,
}

impl Cell {
    /// Create a new cell.
    pub fn new(column: u32, value: impl Into<CellValue>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    /// Column letters of this cell, e.g. `"AB"`.
    pub fn column_letters(&self) -> String {
        column_to_letters(self.column)
    }
}

/// Convert column number to column letters (1 -> "A", 26 -> "Z", 27 -> "AA").
pub fn column_to_letters(col: u32) -> String {
    let mut letters = Vec::with_capacity(3);
    let mut col = col;
    while col > 0 {
        col -= 1;
        letters.push((col % 26) as u8 + b'A');
        col /= 26;
    }
    letters.reverse();
    // Only ASCII uppercase bytes were pushed
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert an A1 reference to `(column, row)`, both 1-based.
pub fn reference_to_coords(reference: &str) -> Result<(u32, u32)> {
    let bytes = reference.as_bytes();
    let col_end = bytes
        .iter()
        .position(u8::is_ascii_digit)
        .ok_or_else(|| Error::Workbook(format!("Invalid cell reference: {}", reference)))?;
    if col_end == 0 {
        return Err(Error::Workbook(format!("Invalid cell reference: {}", reference)));
    }

    let mut col_num = 0u32;
    for &byte in &bytes[..col_end] {
        if !byte.is_ascii_alphabetic() {
            return Err(Error::Workbook(format!(
                "Invalid column in reference: {}",
                reference
            )));
        }
        col_num = col_num
            .checked_mul(26)
            .and_then(|n| n.checked_add(u32::from(byte.to_ascii_uppercase() - b'A' + 1)))
            .ok_or_else(|| Error::Workbook(format!("Column out of range in reference: {}", reference)))?;
    }

    let row_num = atoi_simd::parse::<u32>(&bytes[col_end..])
        .map_err(|_| Error::Workbook(format!("Invalid row number in reference: {}", reference)))?;
    Ok((col_num, row_num))
}
