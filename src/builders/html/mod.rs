//! HTML file objects.
//!
//! An HTML file is imported as two parts: an `ObjectType` based on
//! `client.HTML` whose `File` parameter embeds the compressed page, and an
//! `OI` instance of that type. The type name is derived from the page
//! content (see [`uid::html_file_uid`]).
//!
//! ```xml
//! <ObjectType Name="udt.apsutrxlanbe5eerqx5ddeybmm.…" Base="client.HTML" Version="1" …>
//!   <PropertyTab Name="BASIC">
//!     <PropertyGroup Name="Config">
//!       <Parameter Name="File" …>
//!         <Type Configurable="No" Value="system.pt.file.HTMLFile"/>
//!         <Unit Configurable="No" Value="0x10001"/>
//!         <InitValue Null="0">
//!           <FileContents Size="4240"><![CDATA[H4sI…]]></FileContents>
//!         </InitValue>
//!       </Parameter>
//!     </PropertyGroup>
//!   </PropertyTab>
//! </ObjectType>
//! ```

pub mod codec;
pub mod uid;

use crate::common::{Error, Result};
use crate::document::{DocumentOptions, ObjectSetBuilder};
use crate::element::{Element, Node};
use std::path::Path;

/// Base type of HTML file object types.
pub const HTML_BASE_TYPE: &str = "client.HTML";
/// Parameter type of the embedded file.
pub const HTML_FILE_PARAMETER_TYPE: &str = "system.pt.file.HTMLFile";

/// Identity of one HTML file object.
///
/// Optional texts are written only when set. They typically hold
/// placeholder literals such as `{{Description}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlFile {
    name: String,
    description: Option<String>,
    note1: Option<String>,
    note2: Option<String>,
    type_uid: Option<String>,
}

impl HtmlFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn note1(mut self, note: impl Into<String>) -> Self {
        self.note1 = Some(note.into());
        self
    }

    pub fn note2(mut self, note: impl Into<String>) -> Self {
        self.note2 = Some(note.into());
        self
    }

    /// Use a fixed type identifier instead of the content-derived one.
    pub fn type_uid(mut self, uid: impl Into<String>) -> Self {
        self.type_uid = Some(uid.into());
        self
    }

    /// Object name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Creates HTML file objects and their object types.
///
/// # Examples
///
/// ```rust
/// use ebo_factory::builders::html::{HtmlFile, HtmlFileBuilder};
///
/// let builder = HtmlFileBuilder::new("6.0.4.90");
/// let file = HtmlFile::new("CCTV-B01-001").description("{{Description}}");
/// let (object, object_type) = builder
///     .html_file_with_type(&file, "<html><body>camera</body></html>")
///     .unwrap();
/// assert_eq!(object.attribute("TYPE"), object_type.attribute("Name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFileBuilder {
    version: String,
    prefix: String,
}

impl Default for HtmlFileBuilder {
    fn default() -> Self {
        Self::new("6.0.4.90")
    }
}

impl HtmlFileBuilder {
    /// Builder for a platform version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            prefix: "udt".to_string(),
        }
    }

    /// Builder matching a document envelope.
    pub fn from_options(options: &DocumentOptions) -> Self {
        Self::new(options.version.as_str())
    }

    /// Set the type identifier prefix (default `udt`).
    #[inline]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Identifier of the type that embeds `content`.
    pub fn type_uid(&self, content: &str) -> String {
        uid::html_file_uid(content, &self.prefix, &self.version)
    }

    /// The `OI` instance of an HTML file type.
    pub fn html_file_object(&self, file: &HtmlFile, type_uid: &str) -> Element {
        let mut object = Element::new("OI")
            .with_attribute("NAME", file.name.as_str())
            .with_attribute("TYPE", type_uid);
        let optional = [
            ("DESCR", &file.description),
            ("NOTE1", &file.note1),
            ("NOTE2", &file.note2),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                object.set_attribute(name, value.as_str());
            }
        }
        object
    }

    /// The `ObjectType` embedding `content` as its `File` parameter.
    pub fn html_object_type(&self, type_uid: &str, content: &str) -> Result<Element> {
        let payload = codec::compress_and_encode(content.as_bytes())?;
        let size = itoa::Buffer::new().format(payload.len()).to_string();

        let file_contents = Element::new("FileContents")
            .with_attribute("Size", size)
            .with_child(Node::CData(payload));
        let parameter = [
            ("Name", "File"),
            ("DisplayName", "File"),
            ("Description", ""),
            ("Visibility", "Normal"),
            ("Optional", "0"),
            ("ReadOnly", "0"),
            ("Static", "1"),
            ("RTWriteable", "0"),
            ("Unique", "No"),
            ("Copy", "0"),
            ("Nullable", "0"),
        ]
        .into_iter()
        .fold(Element::new("Parameter"), |e, (k, v)| e.with_attribute(k, v))
        .with_child(
            Element::new("Type")
                .with_attribute("Configurable", "No")
                .with_attribute("Value", HTML_FILE_PARAMETER_TYPE),
        )
        .with_child(
            Element::new("Unit")
                .with_attribute("Configurable", "No")
                .with_attribute("Value", "0x10001"),
        )
        .with_child(
            Element::new("InitValue")
                .with_attribute("Null", "0")
                .with_child(file_contents),
        );

        let object_type = [
            ("Name", type_uid),
            ("DisplayName", ""),
            ("Description", ""),
            ("Base", HTML_BASE_TYPE),
            ("Icon", ""),
            ("Abstract", "0"),
            ("Implements", ""),
            ("DefaultProperty", ""),
            ("Version", "1"),
        ]
        .into_iter()
        .fold(Element::new("ObjectType"), |e, (k, v)| e.with_attribute(k, v))
        .with_child(
            Element::new("PropertyTab").with_attribute("Name", "BASIC").with_child(
                Element::new("PropertyGroup")
                    .with_attribute("Name", "Config")
                    .with_child(parameter),
            ),
        );
        Ok(object_type)
    }

    /// The object and its type, as `(object, object_type)`.
    pub fn html_file_with_type(&self, file: &HtmlFile, content: &str) -> Result<(Element, Element)> {
        let type_uid = match &file.type_uid {
            Some(uid) => uid.clone(),
            None => self.type_uid(content),
        };
        let object_type = self.html_object_type(&type_uid, content)?;
        Ok((self.html_file_object(file, &type_uid), object_type))
    }

    /// Like [`html_file_with_type`](Self::html_file_with_type) with the page
    /// read from a UTF-8 file.
    pub fn html_file_from_path<P: AsRef<Path>>(
        &self,
        file: &HtmlFile,
        path: P,
    ) -> Result<(Element, Element)> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "read HTML file");
        self.html_file_with_type(file, &content)
    }

    /// Create both parts and add them to a document.
    pub fn add_html_file(
        &self,
        document: &mut ObjectSetBuilder,
        file: &HtmlFile,
        content: &str,
    ) -> Result<()> {
        let (object, object_type) = self.html_file_with_type(file, content)?;
        document.add_object_type(object_type);
        document.add_to_exported_objects([object]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<!DOCTYPE html>\n<html>\n<body>\n  <h1>{{Description}}</h1>\n</body>\n</html>";

    #[test]
    fn test_html_file_object() {
        let builder = HtmlFileBuilder::default();
        let file = HtmlFile::new("Test-HTML-Object")
            .description("{{Description}}")
            .note1("{{Note1}}");
        let object = builder.html_file_object(&file, "test.uid.example");

        let names: Vec<_> = object.attributes().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["NAME", "TYPE", "DESCR", "NOTE1"]);
        assert_eq!(object.attribute("TYPE"), Some("test.uid.example"));
        assert!(object.children().is_empty());
    }

    #[test]
    fn test_html_object_type_embeds_content() {
        let builder = HtmlFileBuilder::new("5.0.3.117");
        let object_type = builder.html_object_type("udt.a.b", PAGE).unwrap();
        assert_eq!(object_type.attribute("Base"), Some(HTML_BASE_TYPE));
        assert_eq!(object_type.attribute("Version"), Some("1"));

        let parameter = object_type.find_first("Parameter").unwrap();
        assert_eq!(parameter.attribute("Name"), Some("File"));
        assert_eq!(
            parameter.child("Type").and_then(|t| t.attribute("Value")),
            Some(HTML_FILE_PARAMETER_TYPE)
        );

        let contents = object_type.find_first("FileContents").unwrap();
        let payload = codec::file_contents_payload(&object_type).unwrap();
        assert_eq!(contents.attribute("Size"), Some(payload.len().to_string().as_str()));
        assert_eq!(codec::decode_text(&payload).unwrap(), PAGE);
    }

    #[test]
    fn test_with_type_uses_content_uid() {
        let builder = HtmlFileBuilder::new("5.0.3.117");
        let (object, object_type) = builder
            .html_file_with_type(&HtmlFile::new("Page"), PAGE)
            .unwrap();
        let uid = object.attribute("TYPE").unwrap();
        assert!(uid.starts_with("udt.nulr4l2rmpbelizyq3aoiagyee."));
        assert_eq!(object_type.attribute("Name"), Some(uid));

        let fixed = HtmlFile::new("Page").type_uid("udt.fixed.uid");
        let (object, _) = builder.html_file_with_type(&fixed, PAGE).unwrap();
        assert_eq!(object.attribute("TYPE"), Some("udt.fixed.uid"));
    }

    #[test]
    fn test_pretty_output_keeps_cdata() {
        let builder = HtmlFileBuilder::default();
        let mut document = ObjectSetBuilder::new(DocumentOptions::new().with_version("6.0.4.90"));
        builder
            .add_html_file(&mut document, &HtmlFile::new("Page"), PAGE)
            .unwrap();

        let xml = document.to_pretty_xml();
        assert!(xml.contains("\"><![CDATA[H4sI"));
        let root = Element::parse(&xml).unwrap();
        let payload = codec::file_contents_payload(&root).unwrap();
        assert_eq!(codec::decode_text(&payload).unwrap(), PAGE);
        assert_eq!(document.object_types().len(), 1);
        assert_eq!(document.exported_objects().len(), 1);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, PAGE).unwrap();

        let builder = HtmlFileBuilder::default();
        let (from_path, _) = builder.html_file_from_path(&HtmlFile::new("P"), &path).unwrap();
        let (from_str, _) = builder.html_file_with_type(&HtmlFile::new("P"), PAGE).unwrap();
        assert_eq!(from_path, from_str);

        let err = builder
            .html_file_from_path(&HtmlFile::new("P"), dir.path().join("missing.html"))
            .unwrap_err();
        assert!(matches!(err, Error::FileIo { .. }));
    }
}
