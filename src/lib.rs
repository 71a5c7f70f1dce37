//! EBO Factory - template and spreadsheet driven generation of EcoStruxure
//! Building Operation import documents
//!
//! An engineer exports one configured application (an equipment folder with
//! its points, alarms and programs) as an XML template, marks the parts that
//! vary with placeholder literals such as `{{Name}}`, and lists one row per
//! piece of equipment in a workbook whose header row holds those literals.
//! The factory copies the template once per row with the row's values
//! substituted and writes import-ready documents.
//!
//! # Features
//!
//! - **Templates**: `Types` definitions are copied verbatim into every output,
//!   `ExportedObjects` are copied per record
//! - **Workbook inputs**: `.xlsx` reading with sheet-scoped placeholder keys;
//!   the `meta` sheet is reserved for documentation
//! - **Substitution**: one leftmost-longest pass over the serialized element,
//!   re-parsed and validated
//! - **Grouping and batching**: folders per distinct value of a placeholder,
//!   bounded document sizes
//! - **Builders**: HTML file objects with compressed embedded content
//! - **Scaffolding**: blank input workbooks from templates
//!
//! # Example
//!
//! ```no_run
//! use ebo_factory::factory::{ApplicationFactory, FactoryOptions, TracingProgress};
//! use ebo_factory::table::{FactoryInputs, SheetSelector};
//! use ebo_factory::template::Template;
//!
//! # fn main() -> ebo_factory::Result<()> {
//! let template = Template::open("VAV-L21-INT4 application special.xml")?;
//! let inputs = FactoryInputs::open("basic apps example.xlsx", &SheetSelector::All)?;
//! let records = inputs.to_records();
//!
//! let factory = ApplicationFactory::new(
//!     &template,
//!     inputs.placeholders(),
//!     &records,
//!     FactoryOptions::new(),
//! )?;
//! factory.run("generated_ebo_apps.xml", None, &mut TracingProgress)?;
//! # Ok(())
//! # }
//! ```

/// Error type and shared XML escaping
pub mod common;

/// Owned XML element tree with its parser and serializer
pub mod element;

/// Parsed application templates
pub mod template;

/// Workbook reading and writing, placeholder maps and records
pub mod table;

/// Placeholder substitution into template elements
pub mod substitute;

/// Grouping of copies into folders
pub mod group;

/// Splitting instances into bounded batches
pub mod batch;

/// ObjectSet document assembly
pub mod document;

/// The generation pipeline and multi-template runs
pub mod factory;

/// Builders for specialized object kinds
pub mod builders;

/// Blank input workbooks for templates
pub mod scaffold;

pub use common::{Error, Result};
pub use element::Element;
pub use factory::{ApplicationFactory, FactoryManager, FactoryOptions};
pub use template::Template;
