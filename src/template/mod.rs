//! Application templates.
//!
//! A template is an exported ObjectSet document. Only two top-level sections
//! matter to the factory: `Types` (object type definitions copied verbatim
//! into every output) and `ExportedObjects` (the instance objects that are
//! copied once per data row).
//!
//! ```xml
//! <ObjectSet ExportMode="Special" Note="TypesFirst" Version="3.2.1.630">
//!   <MetaInformation>...</MetaInformation>
//!   <Types>
//!     <ObjectType Name="..."/>
//!   </Types>
//!   <ExportedObjects>
//!     <OI NAME="VAV-L21-INT4" TYPE="system.base.Folder">...</OI>
//!   </ExportedObjects>
//! </ObjectSet>
//! ```

use crate::common::{Error, Result};
use crate::element::Element;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// The recognised template sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Object type definitions, never substituted
    Types,
    /// Instance objects, copied per data row
    ExportedObjects,
}

impl Section {
    /// All sections in document order.
    pub const ALL: [Section; 2] = [Section::Types, Section::ExportedObjects];

    /// The tag name of the section element.
    pub fn tag_name(self) -> &'static str {
        match self {
            Section::Types => "Types",
            Section::ExportedObjects => "ExportedObjects",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// An immutable parsed template document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    types: Vec<Element>,
    exported_objects: Vec<Element>,
}

impl Template {
    /// Parse a template from XML text.
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with_origin(xml, "template")
    }

    /// Parse a template, naming `origin` in any error.
    pub fn parse_with_origin(xml: &str, origin: &str) -> Result<Self> {
        let root = Element::parse_with_origin(xml, origin)?;
        Ok(Self::from_root(&root))
    }

    /// Read a template from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut xml = String::new();
        reader.read_to_string(&mut xml)?;
        Self::parse(&xml)
    }

    /// Read and parse a template file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
        let template = Self::parse_with_origin(&xml, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            types = template.types.len(),
            exported_objects = template.exported_objects.len(),
            "parsed template"
        );
        Ok(template)
    }

    /// Build a template from an already parsed document root.
    ///
    /// For each section only the first matching element (document order) is
    /// inspected. A missing section yields an empty list.
    pub fn from_root(root: &Element) -> Self {
        let section_children = |section: Section| -> Vec<Element> {
            root.find_first(section.tag_name())
                .map(|found| found.child_elements().cloned().collect())
                .unwrap_or_default()
        };
        Self {
            types: section_children(Section::Types),
            exported_objects: section_children(Section::ExportedObjects),
        }
    }

    /// Build a template directly from element lists.
    pub fn from_sections(types: Vec<Element>, exported_objects: Vec<Element>) -> Self {
        Self {
            types,
            exported_objects,
        }
    }

    /// Elements of one section.
    pub fn section(&self, section: Section) -> &[Element] {
        match section {
            Section::Types => &self.types,
            Section::ExportedObjects => &self.exported_objects,
        }
    }

    /// Definitional elements (`Types`).
    pub fn types(&self) -> &[Element] {
        &self.types
    }

    /// Instance template elements (`ExportedObjects`).
    pub fn exported_objects(&self) -> &[Element] {
        &self.exported_objects
    }
}
