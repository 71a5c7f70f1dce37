//! Placeholder maps and substitution records read from a workbook.
//!
//! Row 1 of every selected sheet is the header: each non-empty header cell
//! declares a placeholder literal under the key `<sheet><column>`. Every
//! following row with at least one value becomes a [`SubstitutionRecord`].

use super::cell::column_to_letters;
use super::workbook::{Sheet, Workbook};
use crate::common::{Error, Result};
use indexmap::IndexMap;
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

/// Name of the sheet skipped by [`SheetSelector::All`].
pub const RESERVED_SHEET: &str = "meta";

/// Sheet-scoped placeholder key, `<sheetName><columnLetters>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderKey(String);

impl PlaceholderKey {
    /// Key for a sheet column.
    pub fn new(sheet: &str, column: u32) -> Self {
        let mut key = String::with_capacity(sheet.len() + 3);
        key.push_str(sheet);
        key.push_str(&column_to_letters(column));
        Self(key)
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlaceholderKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for PlaceholderKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Borrow<str> for PlaceholderKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceholderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered mapping from placeholder key to its literal placeholder string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: IndexMap<PlaceholderKey, String>,
}

impl PlaceholderMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a literal, keeping the key's original position.
    pub fn insert(&mut self, key: impl Into<PlaceholderKey>, literal: impl Into<String>) {
        self.entries.insert(key.into(), literal.into());
    }

    /// Literal for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether the key is declared.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &PlaceholderKey> {
        self.entries.keys()
    }

    /// Every key whose literal equals `literal` exactly.
    pub fn keys_for_literal<'a>(&'a self, literal: &str) -> impl Iterator<Item = &'a PlaceholderKey> {
        self.entries
            .iter()
            .filter(move |(_, value)| value.as_str() == literal)
            .map(|(key, _)| key)
    }

    /// Append all entries of another map.
    pub fn merge(&mut self, other: &PlaceholderMap) {
        for (key, literal) in &other.entries {
            self.entries.insert(key.clone(), literal.clone());
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<PlaceholderKey>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, literal) in iter {
            map.insert(key, literal);
        }
        map
    }
}

/// Replacement values for one data row.
///
/// A key mapped to `None` was present with an empty value; a key that is
/// not in the record at all is missing. Neither causes a substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionRecord {
    sheet: String,
    row: u32,
    values: IndexMap<PlaceholderKey, Option<String>>,
}

impl SubstitutionRecord {
    /// Create an empty record for a sheet row.
    pub fn new(sheet: impl Into<String>, row: u32) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            values: IndexMap::new(),
        }
    }

    /// Builder form of [`SubstitutionRecord::insert`] with a present value.
    pub fn with_value(mut self, key: impl Into<PlaceholderKey>, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Set the value for a key.
    pub fn insert(&mut self, key: impl Into<PlaceholderKey>, value: Option<String>) {
        self.values.insert(key.into(), value);
    }

    /// Sheet the record was read from.
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// 1-based row number the record was read from.
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Raw lookup: `None` for a missing key, `Some(None)` for an empty value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.values.get(key).map(Option::as_deref)
    }

    /// Replacement value, if one was supplied.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).flatten()
    }

    /// Whether the key is present at all, with or without a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Entries in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderKey, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k, v.as_deref()))
    }

    /// Whether at least one key carries a value.
    pub fn has_values(&self) -> bool {
        self.values.values().any(Option::is_some)
    }
}

/// Which sheets of a workbook feed the factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelector {
    /// Every sheet except [`RESERVED_SHEET`]
    #[default]
    All,
    /// One sheet by name
    Named(String),
    /// Several sheets by name, in the given order
    List(Vec<String>),
}

impl SheetSelector {
    /// Selector from a possibly empty list of names.
    pub fn from_names(names: Vec<String>) -> Self {
        match names.len() {
            0 => SheetSelector::All,
            1 => names
                .into_iter()
                .next()
                .map(SheetSelector::Named)
                .unwrap_or_default(),
            _ => SheetSelector::List(names),
        }
    }

    fn select<'a>(&self, workbook: &'a Workbook) -> Result<Vec<&'a Sheet>> {
        let find = |name: &str| {
            workbook
                .sheet(name)
                .ok_or_else(|| Error::SheetNotFound(name.to_string()))
        };
        match self {
            SheetSelector::All => Ok(workbook
                .sheets()
                .iter()
                .filter(|sheet| sheet.name() != RESERVED_SHEET)
                .collect()),
            SheetSelector::Named(name) => Ok(vec![find(name.as_str())?]),
            SheetSelector::List(names) => names.iter().map(|name| find(name.as_str())).collect(),
        }
    }
}

/// Placeholders and records of one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetInputs {
    /// Sheet name, also the group name for batch runs
    pub name: String,
    /// Header literals of this sheet
    pub placeholders: PlaceholderMap,
    /// Data rows in row order
    pub records: Vec<SubstitutionRecord>,
}

impl SheetInputs {
    /// Read header and data rows of a sheet.
    pub fn from_sheet(sheet: &Sheet) -> Self {
        let name = sheet.name();
        let mut placeholders = PlaceholderMap::new();
        if let Some(header) = sheet.row(1) {
            for cell in &header.cells {
                if let Some(literal) = cell.value.render() {
                    placeholders.insert(PlaceholderKey::new(name, cell.column), literal);
                }
            }
        }

        let mut records = Vec::new();
        for row in sheet.rows().iter().filter(|row| row.number > 1) {
            let mut record = SubstitutionRecord::new(name, row.number);
            for cell in &row.cells {
                let key = PlaceholderKey::new(name, cell.column);
                if !placeholders.contains_key(key.as_str()) {
                    tracing::debug!(sheet = name, row = row.number, key = %key, "value without header ignored");
                    continue;
                }
                record.insert(key, cell.value.render());
            }
            if record.has_values() {
                records.push(record);
            } else {
                tracing::debug!(sheet = name, row = row.number, "row without values skipped");
            }
        }

        Self {
            name: name.to_string(),
            placeholders,
            records,
        }
    }
}

/// Everything the factory needs from a workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryInputs {
    sheets: Vec<SheetInputs>,
    placeholders: PlaceholderMap,
}

impl FactoryInputs {
    /// Collect inputs from the selected sheets of a workbook.
    pub fn from_workbook(workbook: &Workbook, selector: &SheetSelector) -> Result<Self> {
        let mut sheets = Vec::new();
        let mut placeholders = PlaceholderMap::new();
        for sheet in selector.select(workbook)? {
            let inputs = SheetInputs::from_sheet(sheet);
            tracing::debug!(
                sheet = inputs.name.as_str(),
                placeholders = inputs.placeholders.len(),
                records = inputs.records.len(),
                "read sheet inputs"
            );
            placeholders.merge(&inputs.placeholders);
            sheets.push(inputs);
        }
        Ok(Self {
            sheets,
            placeholders,
        })
    }

    /// Open an `.xlsx` workbook and collect inputs.
    pub fn open<P: AsRef<Path>>(path: P, selector: &SheetSelector) -> Result<Self> {
        Self::from_workbook(&Workbook::open(path)?, selector)
    }

    /// Per-sheet views in read order.
    pub fn sheets(&self) -> &[SheetInputs] {
        &self.sheets
    }

    /// Per-sheet view by name.
    pub fn sheet(&self, name: &str) -> Option<&SheetInputs> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Aggregate placeholder map over every selected sheet.
    pub fn placeholders(&self) -> &PlaceholderMap {
        &self.placeholders
    }

    /// All records, sheet by sheet, in row order.
    pub fn records(&self) -> impl Iterator<Item = &SubstitutionRecord> {
        self.sheets.iter().flat_map(|sheet| sheet.records.iter())
    }

    /// Owned copy of all records.
    pub fn to_records(&self) -> Vec<SubstitutionRecord> {
        self.records().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use crate::table::workbook::Row;

    fn workbook() -> Workbook {
        let mut icg = Sheet::from_rows("ICG", [
            vec![CellValue::from("ICG-NAME"), CellValue::from("ICG-IP"), CellValue::Empty],
            vec![CellValue::from("GW-01"), CellValue::from("10.0.0.1"), CellValue::from("orphan")],
            vec![CellValue::from("GW-02"), CellValue::from(""), CellValue::Empty],
            vec![CellValue::Empty, CellValue::from("")],
        ]);
        icg.push_row(Row::from_values(6, ["GW-06"]));
        let meta = Sheet::from_rows("meta", [["Variables"], ["x"]]);
        let vav = Sheet::from_rows("VAV", [
            vec![CellValue::from("VAV-NAME"), CellValue::from("SETPOINT")],
            vec![CellValue::from("VAV-1"), CellValue::Float(21.5)],
        ]);
        Workbook::from_sheets(vec![icg, meta, vav])
    }

    #[test]
    fn test_header_defines_placeholders() {
        let inputs = FactoryInputs::from_workbook(&workbook(), &SheetSelector::All).unwrap();
        let icg = inputs.sheet("ICG").unwrap();
        let keys: Vec<_> = icg.placeholders.keys().map(PlaceholderKey::as_str).collect();
        assert_eq!(keys, ["ICGA", "ICGB"]);
        assert_eq!(icg.placeholders.get("ICGA"), Some("ICG-NAME"));
        assert_eq!(inputs.placeholders().len(), 4);
        assert_eq!(inputs.placeholders().get("VAVB"), Some("SETPOINT"));
    }

    #[test]
    fn test_records_distinguish_missing_and_empty() {
        let inputs = FactoryInputs::from_workbook(&workbook(), &SheetSelector::All).unwrap();
        let icg = inputs.sheet("ICG").unwrap();
        let rows: Vec<_> = icg.records.iter().map(SubstitutionRecord::row).collect();
        assert_eq!(rows, [2, 3, 6]);

        let first = &icg.records[0];
        assert_eq!(first.value("ICGB"), Some("10.0.0.1"));
        assert!(!first.contains_key("ICGC"));

        let second = &icg.records[1];
        assert_eq!(second.get("ICGB"), Some(None));
        assert_eq!(second.get("ICGC"), None);

        let sixth = &icg.records[2];
        assert_eq!(sixth.value("ICGA"), Some("GW-06"));
        assert!(!sixth.contains_key("ICGB"));
    }

    #[test]
    fn test_reserved_sheet_excluded_by_default() {
        let inputs = FactoryInputs::from_workbook(&workbook(), &SheetSelector::All).unwrap();
        let names: Vec<_> = inputs.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["ICG", "VAV"]);
        assert!(inputs.records().all(|record| record.sheet() != "meta"));

        let meta = FactoryInputs::from_workbook(&workbook(), &SheetSelector::Named("meta".into()))
            .unwrap();
        assert_eq!(meta.sheets().len(), 1);
        assert_eq!(meta.to_records().len(), 1);
    }

    #[test]
    fn test_list_selector_keeps_given_order() {
        let selector = SheetSelector::List(vec!["VAV".into(), "ICG".into()]);
        let inputs = FactoryInputs::from_workbook(&workbook(), &selector).unwrap();
        let sheets: Vec<_> = inputs.records().map(SubstitutionRecord::sheet).collect();
        assert_eq!(sheets, ["VAV", "ICG", "ICG", "ICG"]);
        assert_eq!(inputs.records().next().unwrap().value("VAVB"), Some("21.5"));
    }

    #[test]
    fn test_unknown_sheet_is_error() {
        let err = FactoryInputs::from_workbook(&workbook(), &SheetSelector::Named("AHU".into()))
            .unwrap_err();
        assert!(matches!(err, Error::SheetNotFound(name) if name == "AHU"));
    }

    #[test]
    fn test_selector_from_names() {
        assert_eq!(SheetSelector::from_names(vec![]), SheetSelector::All);
        assert_eq!(
            SheetSelector::from_names(vec!["ICG".into()]),
            SheetSelector::Named("ICG".into())
        );
    }
}
