//! Tabular input: workbooks, cell values and the placeholder/record views
//! the factory consumes.
//!
//! ```no_run
//! use ebo_factory::table::{FactoryInputs, SheetSelector};
//!
//! # fn main() -> ebo_factory::Result<()> {
//! let inputs = FactoryInputs::open("items.xlsx", &SheetSelector::All)?;
//! for (key, literal) in inputs.placeholders().iter() {
//!     println!("{} -> {}", key, literal);
//! }
//! println!("{} records", inputs.records().count());
//! # Ok(())
//! # }
//! ```

mod cell;
mod inputs;
mod workbook;
pub mod xlsx;

pub use cell::{Cell, CellValue, column_to_letters, reference_to_coords};
pub use inputs::{
    FactoryInputs, PlaceholderKey, PlaceholderMap, RESERVED_SHEET, SheetInputs, SheetSelector,
    SubstitutionRecord,
};
pub use workbook::{Row, Sheet, Workbook};
