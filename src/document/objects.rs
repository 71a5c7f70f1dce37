//! Constructors for generic object instances (`OI` elements).

use crate::element::Element;

/// Object type of folders.
pub const FOLDER_TYPE: &str = "system.base.Folder";
/// Object type of hyperlinks.
pub const HYPERLINK_TYPE: &str = "client.Hyperlink";

/// Common optional parts of an object instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ObjectHeader {
    name: String,
    description: Option<String>,
    note1: Option<String>,
    note2: Option<String>,
}

impl ObjectHeader {
    fn element(&self, object_type: &str) -> Element {
        let mut element = Element::new("OI")
            .with_attribute("NAME", self.name.as_str())
            .with_attribute("TYPE", object_type);
        if let Some(description) = &self.description {
            element.set_attribute("DESCR", description.as_str());
        }
        for (name, note) in [("NOTE1", &self.note1), ("NOTE2", &self.note2)] {
            if let Some(value) = note.as_deref().filter(|v| !v.is_empty()) {
                element.push(property("PI", name, value));
            }
        }
        element
    }
}

fn property(tag: &str, name: &str, value: &str) -> Element {
    Element::new(tag)
        .with_attribute("Name", name)
        .with_attribute("Value", value)
}

/// A folder object.
///
/// ```
/// use ebo_factory::document::Folder;
///
/// let folder = Folder::new("Level 21").description("Interior zones").build();
/// assert_eq!(folder.attribute("TYPE"), Some("system.base.Folder"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folder {
    header: ObjectHeader,
}

impl Folder {
    /// Start a folder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            header: ObjectHeader {
                name: name.into(),
                ..ObjectHeader::default()
            },
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.header.description = Some(description.into());
        self
    }

    /// Set the first note. Empty notes are not written.
    pub fn note1(mut self, note: impl Into<String>) -> Self {
        self.header.note1 = Some(note.into());
        self
    }

    /// Set the second note. Empty notes are not written.
    pub fn note2(mut self, note: impl Into<String>) -> Self {
        self.header.note2 = Some(note.into());
        self
    }

    /// Build the `OI` element.
    pub fn build(&self) -> Element {
        self.header.element(FOLDER_TYPE)
    }
}

/// A hyperlink object. The `URL` property is always written, empty when no
/// URL was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hyperlink {
    header: ObjectHeader,
    url: Option<String>,
}

impl Hyperlink {
    /// Start a hyperlink with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            header: ObjectHeader {
                name: name.into(),
                ..ObjectHeader::default()
            },
            url: None,
        }
    }

    /// Set the target URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.header.description = Some(description.into());
        self
    }

    /// Set the first note.
    pub fn note1(mut self, note: impl Into<String>) -> Self {
        self.header.note1 = Some(note.into());
        self
    }

    /// Set the second note.
    pub fn note2(mut self, note: impl Into<String>) -> Self {
        self.header.note2 = Some(note.into());
        self
    }

    /// Build the `OI` element.
    pub fn build(&self) -> Element {
        self.header
            .element(HYPERLINK_TYPE)
            .with_child(property("PI", "URL", self.url.as_deref().unwrap_or("")))
    }
}
