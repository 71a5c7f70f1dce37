//! The document factory pipeline.
//!
//! [`ApplicationFactory`] turns one template, one placeholder map and a list
//! of records into output documents:
//!
//! 1. every `ExportedObjects` element of the template is copied once per
//!    record with the record's values substituted ([`Substituter`]),
//! 2. copies are optionally grouped into folders ([`crate::group`]),
//! 3. instances are split into batches ([`crate::batch`]),
//! 4. each batch is assembled with the full `Types` section
//!    ([`crate::document`]) and written.
//!
//! [`FactoryManager`] drives one factory per sheet for multi-template runs.
//!
//! # Example
//!
//! ```no_run
//! use ebo_factory::factory::{ApplicationFactory, FactoryOptions, TracingProgress};
//! use ebo_factory::table::{FactoryInputs, SheetSelector};
//! use ebo_factory::template::Template;
//!
//! # fn main() -> ebo_factory::Result<()> {
//! let template = Template::open("vav_template.xml")?;
//! let inputs = FactoryInputs::open("vav_list.xlsx", &SheetSelector::All)?;
//! let records = inputs.to_records();
//! let options = FactoryOptions::new().with_max_items_per_document(300);
//!
//! let factory = ApplicationFactory::new(&template, inputs.placeholders(), &records, options)?;
//! let written = factory.run("vav_apps.xml", None, &mut TracingProgress)?;
//! println!("wrote {} documents", written.len());
//! # Ok(())
//! # }
//! ```

mod manager;
mod progress;
#[cfg(test)]
mod tests;

pub use manager::{FactoryManager, JobConfig};
pub use progress::{NoProgress, ProgressEvent, ProgressSink, TracingProgress};

use crate::batch::split_batches;
use crate::common::Result;
use crate::document::{DocumentOptions, ObjectSetBuilder, assemble};
use crate::element::Element;
use crate::group;
use crate::substitute::Substituter;
use crate::table::{PlaceholderMap, SubstitutionRecord};
use crate::template::Template;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Settings for one factory run.
///
/// ```rust
/// use ebo_factory::factory::FactoryOptions;
///
/// let options = FactoryOptions::new().with_max_items_per_document(0);
/// assert!(options.max_items_per_document.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryOptions {
    /// Envelope of every generated document
    pub document: DocumentOptions,
    /// Upper bound of instance elements per document, `None` for one document
    pub max_items_per_document: Option<NonZeroUsize>,
}

impl FactoryOptions {
    /// Create options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document envelope.
    #[inline]
    pub fn with_document(mut self, document: DocumentOptions) -> Self {
        self.document = document;
        self
    }

    /// Set the per-document item limit. Zero removes the limit.
    #[inline]
    pub fn with_max_items_per_document(mut self, max: usize) -> Self {
        self.max_items_per_document = NonZeroUsize::new(max);
        self
    }
}

/// Generates documents from one template and one set of records.
///
/// The template, placeholder map and records are borrowed and never
/// modified.
#[derive(Debug)]
pub struct ApplicationFactory<'a> {
    template: &'a Template,
    placeholders: &'a PlaceholderMap,
    records: &'a [SubstitutionRecord],
    options: FactoryOptions,
    substituter: Substituter,
}

impl<'a> ApplicationFactory<'a> {
    /// Prepare a factory, compiling the placeholder literals once.
    pub fn new(
        template: &'a Template,
        placeholders: &'a PlaceholderMap,
        records: &'a [SubstitutionRecord],
        options: FactoryOptions,
    ) -> Result<Self> {
        Ok(Self {
            template,
            placeholders,
            records,
            options,
            substituter: Substituter::new(placeholders)?,
        })
    }

    /// Run settings.
    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    /// One copy of every template instance element per record, flat.
    ///
    /// Aborts on the first record whose substitution is malformed.
    pub fn make_copies(&self, progress: &mut dyn ProgressSink) -> Result<Vec<Element>> {
        let elements = self.template.exported_objects();
        let total = self.records.len();
        progress.on_event(ProgressEvent::CopiesStarted { total });

        let mut copies = Vec::with_capacity(total * elements.len());
        for (i, record) in self.records.iter().enumerate() {
            copies.extend(self.substituter.apply_all(elements, record)?);
            progress.on_event(record_processed(i + 1, total, record));
        }
        tracing::debug!(copies = copies.len(), records = total, "created copies");
        Ok(copies)
    }

    /// Copies grouped into one folder per distinct value of the placeholder
    /// whose literal is `literal`.
    pub fn make_copies_in_folders(
        &self,
        literal: &str,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<Element>> {
        let total = self.records.len();
        progress.on_event(ProgressEvent::CopiesStarted { total });

        let mut index = 0;
        group::make_copies_in_folders(
            &self.substituter,
            self.template.exported_objects(),
            self.records,
            self.placeholders,
            literal,
            |record| {
                index += 1;
                progress.on_event(record_processed(index, total, record));
            },
        )
    }

    /// Split instances into batches and assemble one document per batch,
    /// each with the template's full `Types` section.
    pub fn documents(
        &self,
        instances: &[Element],
        progress: &mut dyn ProgressSink,
    ) -> Vec<ObjectSetBuilder> {
        let batches = split_batches(instances, self.options.max_items_per_document);
        let total = batches.len();
        batches
            .into_iter()
            .enumerate()
            .map(|(i, batch)| {
                let document = assemble(&self.options.document, self.template.types(), batch);
                progress.on_event(ProgressEvent::DocumentAssembled {
                    index: i + 1,
                    total,
                    instances: batch.len(),
                });
                document
            })
            .collect()
    }

    /// Output paths for `count` documents based on `path`.
    ///
    /// Unbounded runs write `path` itself; bounded runs number the files
    /// `<stem>_<n>.<ext>` starting at 1.
    pub fn output_paths(&self, path: &Path, count: usize) -> Vec<PathBuf> {
        match self.options.max_items_per_document {
            None => vec![path.to_path_buf()],
            Some(_) => (1..=count).map(|n| numbered_path(path, n)).collect(),
        }
    }

    /// Assemble and write documents for `instances`, returning the written
    /// paths in order.
    pub fn write_documents(
        &self,
        instances: &[Element],
        path: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<PathBuf>> {
        let documents = self.documents(instances, progress);
        if documents.is_empty() {
            tracing::warn!(path = %path.display(), "no instances generated, nothing written");
            return Ok(Vec::new());
        }
        let paths = self.output_paths(path, documents.len());
        for (document, path) in documents.iter().zip(&paths) {
            document.write_xml(path)?;
            progress.on_event(ProgressEvent::DocumentWritten { path: path.clone() });
        }
        Ok(paths)
    }

    /// Full pipeline: copy (grouped when `group_by` names a placeholder
    /// literal), split, assemble and write.
    pub fn run(
        &self,
        path: impl AsRef<Path>,
        group_by: Option<&str>,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<PathBuf>> {
        let instances = match group_by {
            Some(literal) => self.make_copies_in_folders(literal, progress)?,
            None => self.make_copies(progress)?,
        };
        self.write_documents(&instances, path.as_ref(), progress)
    }
}

fn record_processed(index: usize, total: usize, record: &SubstitutionRecord) -> ProgressEvent {
    ProgressEvent::RecordProcessed {
        index,
        total,
        sheet: record.sheet().to_string(),
        row: record.row(),
    }
}

/// `dir/stem.ext` -> `dir/stem_<n>.ext`
fn numbered_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path.file_stem().unwrap_or(path.as_os_str()));
    name.push(format!("_{}", n));
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }
    path.with_file_name(name)
}
