//! Multi-template batch runs.

use super::{ApplicationFactory, FactoryOptions, ProgressEvent, ProgressSink};
use crate::batch::split_batches;
use crate::common::{Error, Result};
use crate::document::{DocumentOptions, ObjectSetBuilder};
use crate::table::{FactoryInputs, SheetInputs, SheetSelector};
use crate::template::Template;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A batch job as described in YAML.
///
/// ```rust
/// use ebo_factory::factory::JobConfig;
///
/// let job = JobConfig::from_yaml_str(
///     "workbook: items.xlsx\n\
///      output_prefix: out/apps\n\
///      max_items_per_document: 300\n\
///      templates:\n  ICG: templates/icg.xml\n",
/// )
/// .unwrap();
/// assert_eq!(job.max_items_per_document, Some(300));
/// assert!(job.sheets.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Input workbook
    pub workbook: PathBuf,
    /// Output path prefix, files become `<prefix>_<group>_<n>.xml`
    pub output_prefix: PathBuf,
    /// Records per output document, absent or zero for one document per group
    #[serde(default)]
    pub max_items_per_document: Option<usize>,
    /// Sheets to read, empty for every sheet but `meta`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sheets: Vec<String>,
    /// Group (sheet name) to template file
    pub templates: IndexMap<String, PathBuf>,
    /// Document envelope
    #[serde(default)]
    pub document: DocumentOptions,
}

impl JobConfig {
    /// Parse a job description.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let job: JobConfig = serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("invalid job description: {}", e)))?;
        if job.templates.is_empty() {
            return Err(Error::Config("job maps no templates".to_string()));
        }
        Ok(job)
    }

    /// Load a job description from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize back to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Config(format!("failed to serialize job description: {}", e)))
    }

    /// Factory settings of this job.
    pub fn factory_options(&self) -> FactoryOptions {
        FactoryOptions::new()
            .with_document(self.document.clone())
            .with_max_items_per_document(self.max_items_per_document.unwrap_or(0))
    }
}

/// Produces documents for several record groups, each with its own template.
///
/// A group is a workbook sheet. Records of a group are split into batches of
/// `max_items_per_document` records and every batch becomes one document
/// written to `<prefix>_<group>_<n>.xml`, numbered from 1.
#[derive(Debug)]
pub struct FactoryManager {
    inputs: FactoryInputs,
    templates: IndexMap<String, Template>,
    output_prefix: PathBuf,
    options: FactoryOptions,
}

impl FactoryManager {
    /// Manager over `inputs` with one template per group name.
    pub fn new(
        inputs: FactoryInputs,
        templates: IndexMap<String, Template>,
        output_prefix: impl Into<PathBuf>,
        options: FactoryOptions,
    ) -> Self {
        Self {
            inputs,
            templates,
            output_prefix: output_prefix.into(),
            options,
        }
    }

    /// Open the workbook and templates of a job. Relative paths are
    /// resolved against `base_dir`.
    pub fn from_job(job: &JobConfig, base_dir: &Path) -> Result<Self> {
        let selector = SheetSelector::from_names(job.sheets.clone());
        let inputs = FactoryInputs::open(base_dir.join(&job.workbook), &selector)?;
        let templates = job
            .templates
            .iter()
            .map(|(group, path)| Ok((group.clone(), Template::open(base_dir.join(path))?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Self::new(
            inputs,
            templates,
            base_dir.join(&job.output_prefix),
            job.factory_options(),
        ))
    }

    /// Load a job file and open everything it names, relative to the job
    /// file's directory.
    pub fn open_job<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let job = JobConfig::load(path)?;
        Self::from_job(&job, path.parent().unwrap_or(Path::new("")))
    }

    /// Workbook inputs the manager reads records from.
    pub fn inputs(&self) -> &FactoryInputs {
        &self.inputs
    }

    /// Options applied to every group.
    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    /// Output path of batch `n` of `group`.
    pub fn output_path(&self, group: &str, n: usize) -> PathBuf {
        let mut path = OsString::from(self.output_prefix.as_os_str());
        path.push(format!("_{}_{}.xml", group, n));
        PathBuf::from(path)
    }

    /// Generate and write every document, returning the written paths.
    ///
    /// Every group with records must have a template; this is checked
    /// before anything is written. All documents are assembled before the
    /// first one is written, so a malformed record leaves no output behind.
    /// Groups without records produce no file.
    pub fn make_documents(&self, progress: &mut dyn ProgressSink) -> Result<Vec<PathBuf>> {
        for sheet in self.inputs.sheets() {
            if !sheet.records.is_empty() && !self.templates.contains_key(&sheet.name) {
                return Err(Error::MissingTemplate(sheet.name.clone()));
            }
        }
        for group in self.templates.keys() {
            if self.inputs.sheet(group).is_none() {
                tracing::debug!(group = group.as_str(), "template mapped to a group with no sheet");
            }
        }

        let mut pending = Vec::new();
        for sheet in self.inputs.sheets() {
            match self.templates.get(&sheet.name) {
                Some(template) if !sheet.records.is_empty() => {
                    pending.extend(self.group_documents(sheet, template, progress)?);
                },
                _ => tracing::warn!(group = sheet.name.as_str(), "group has no records, no file written"),
            }
        }

        // Nothing is written until every group substituted cleanly.
        let mut written = Vec::with_capacity(pending.len());
        for (path, document) in pending {
            document.write_xml(&path)?;
            progress.on_event(ProgressEvent::DocumentWritten { path: path.clone() });
            written.push(path);
        }
        Ok(written)
    }

    fn group_documents(
        &self,
        sheet: &SheetInputs,
        template: &Template,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<(PathBuf, ObjectSetBuilder)>> {
        tracing::info!(
            group = sheet.name.as_str(),
            records = sheet.records.len(),
            "starting production"
        );
        let batch_options = FactoryOptions::new().with_document(self.options.document.clone());
        let mut documents = Vec::new();
        let batches = split_batches(&sheet.records, self.options.max_items_per_document);
        for (i, batch) in batches.into_iter().enumerate() {
            let factory =
                ApplicationFactory::new(template, &sheet.placeholders, batch, batch_options.clone())?;
            let instances = factory.make_copies(progress)?;
            let path = self.output_path(&sheet.name, i + 1);
            match factory.documents(&instances, progress).pop() {
                Some(document) => documents.push((path, document)),
                None => tracing::warn!(path = %path.display(), "no instances generated, nothing written"),
            }
        }
        Ok(documents)
    }
}
