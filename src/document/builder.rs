//! ObjectSet envelope builder.

use super::objects::{Folder, Hyperlink};
use super::options::DocumentOptions;
use crate::common::{Error, Result};
use crate::element::Element;
use std::path::Path;

/// Builds one ObjectSet import document.
///
/// Object types go to `Types`, instances to `ExportedObjects`. The envelope
/// (root attributes and `MetaInformation`) is derived from the options when
/// the document is built, so changing options never leaves stale metadata.
///
/// ```
/// use ebo_factory::document::{DocumentOptions, ObjectSetBuilder};
///
/// let mut builder = ObjectSetBuilder::new(DocumentOptions::default());
/// let folder = builder.create_folder("Level 21");
/// builder.add_to_exported_objects([folder]);
/// let xml = builder.to_pretty_xml();
/// assert!(xml.contains(r#"<OI NAME="Level 21" TYPE="system.base.Folder"/>"#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectSetBuilder {
    options: DocumentOptions,
    object_types: Vec<Element>,
    exported_objects: Vec<Element>,
}

impl ObjectSetBuilder {
    /// Create an empty document with the given envelope settings.
    pub fn new(options: DocumentOptions) -> Self {
        Self {
            options,
            object_types: Vec::new(),
            exported_objects: Vec::new(),
        }
    }

    /// Envelope settings.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Replace the envelope settings.
    pub fn set_options(&mut self, options: DocumentOptions) {
        self.options = options;
    }

    /// Add one object type definition.
    pub fn add_object_type(&mut self, object_type: Element) {
        self.object_types.push(object_type);
    }

    /// Add object type definitions in order.
    pub fn add_object_types<I: IntoIterator<Item = Element>>(&mut self, object_types: I) {
        self.object_types.extend(object_types);
    }

    /// Append instances to `ExportedObjects`.
    pub fn add_to_exported_objects<I: IntoIterator<Item = Element>>(&mut self, elements: I) {
        self.exported_objects.extend(elements);
    }

    /// Replace the content of `ExportedObjects`.
    pub fn set_exported_objects<I: IntoIterator<Item = Element>>(&mut self, elements: I) {
        self.reset_exported_objects();
        self.add_to_exported_objects(elements);
    }

    /// Empty `ExportedObjects`.
    pub fn reset_exported_objects(&mut self) {
        self.exported_objects.clear();
    }

    /// Object types added so far.
    pub fn object_types(&self) -> &[Element] {
        &self.object_types
    }

    /// Instances added so far.
    pub fn exported_objects(&self) -> &[Element] {
        &self.exported_objects
    }

    /// Create a folder object (not added to the document).
    pub fn create_folder(&self, name: &str) -> Element {
        Folder::new(name).build()
    }

    /// Create a hyperlink object (not added to the document).
    pub fn create_hyperlink(&self, name: &str, url: &str) -> Element {
        Hyperlink::new(name).url(url).build()
    }

    /// Build the `ObjectSet` root element.
    pub fn build(&self) -> Element {
        let options = &self.options;
        let mut root = Element::new("ObjectSet")
            .with_attribute("ExportMode", options.export_mode.as_str())
            .with_attribute("Note", options.note.as_str());
        if let Some(filter) = &options.semantics_filter {
            root.set_attribute("SemanticsFilter", filter.as_str());
        }
        root.set_attribute("Version", options.version.as_str());

        let entry = |tag: &str, value: &str| Element::new(tag).with_attribute("Value", value);
        let mut meta =
            Element::new("MetaInformation").with_child(entry("ExportMode", &options.export_mode));
        if options.semantics_filter.is_some() {
            meta.push(entry("SemanticsFilter", "None"));
        }
        meta.push(entry("RuntimeVersion", &options.version));
        meta.push(entry("SourceVersion", &options.version));
        meta.push(entry("ServerFullPath", &options.server_full_path));
        root.push(meta);

        if !self.object_types.is_empty() {
            let mut types = Element::new("Types");
            types.extend(self.object_types.iter().cloned());
            root.push(types);
        }
        let mut exported = Element::new("ExportedObjects");
        exported.extend(self.exported_objects.iter().cloned());
        root.push(exported);
        root
    }

    /// Serialize the document with declaration and indentation.
    pub fn to_pretty_xml(&self) -> String {
        self.build().to_document_string(&self.options.indent)
    }

    /// Write the pretty-printed document to `path`.
    pub fn write_xml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_pretty_xml()).map_err(|e| Error::file_io(path, e))?;
        tracing::info!(path = %path.display(), "XML written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_layout() {
        let options = DocumentOptions::new().with_version("3.2.1.630").with_server_full_path("/ebo");
        let mut builder = ObjectSetBuilder::new(options);
        builder.add_object_type(Element::new("ObjectType").with_attribute("Name", "udt.a"));
        builder.add_to_exported_objects([Element::new("OI").with_attribute("NAME", "x")]);

        let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<ObjectSet ExportMode="Special" Note="TypesFirst" Version="3.2.1.630">
  <MetaInformation>
    <ExportMode Value="Special"/>
    <RuntimeVersion Value="3.2.1.630"/>
    <SourceVersion Value="3.2.1.630"/>
    <ServerFullPath Value="/ebo"/>
  </MetaInformation>
  <Types>
    <ObjectType Name="udt.a"/>
  </Types>
  <ExportedObjects>
    <OI NAME="x"/>
  </ExportedObjects>
</ObjectSet>
"#;
        assert_eq!(builder.to_pretty_xml(), expected);
    }

    #[test]
    fn test_semantics_filter_attributes() {
        let options = DocumentOptions::new().with_semantics_filter(Some("Standard".into()));
        let root = ObjectSetBuilder::new(options).build();
        let names: Vec<_> = root.attributes().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["ExportMode", "Note", "SemanticsFilter", "Version"]);
        let meta = root.child("MetaInformation").unwrap();
        assert_eq!(
            meta.child("SemanticsFilter").and_then(|e| e.attribute("Value")),
            Some("None")
        );
    }

    #[test]
    fn test_set_and_reset_exported_objects() {
        let mut builder = ObjectSetBuilder::default();
        builder.add_to_exported_objects([Element::new("A"), Element::new("B")]);
        builder.set_exported_objects([Element::new("C")]);
        assert_eq!(builder.exported_objects().len(), 1);
        assert_eq!(builder.exported_objects()[0].name(), "C");

        builder.reset_exported_objects();
        let root = builder.build();
        assert!(root.child("ExportedObjects").unwrap().children().is_empty());
        assert!(root.child("Types").is_none());
    }

    #[test]
    fn test_write_xml_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xml");
        let err = ObjectSetBuilder::default().write_xml(&path).unwrap_err();
        assert!(matches!(err, Error::FileIo { .. }));
    }

    #[test]
    fn test_write_xml_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        let mut builder = ObjectSetBuilder::default();
        let link = builder.create_hyperlink("Docs", "https://x/?a&b");
        builder.add_to_exported_objects([link]);
        builder.write_xml(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let root = Element::parse(&written).unwrap();
        assert_eq!(root, builder.build());
    }
}
