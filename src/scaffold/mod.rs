//! Blank input workbooks for templates.
//!
//! Scaffolding reads templates and writes the workbook a user fills in:
//! one sheet per template whose header row lists the template's
//! `{{tag}}` literals, plus a [`RESERVED_SHEET`] sheet listing the points,
//! alarms and setpoints each template defines. The reserved sheet is
//! ignored when the workbook is read back for a factory run.

use crate::common::{Error, Result};
use crate::document::FOLDER_TYPE;
use crate::element::Element;
use crate::table::{RESERVED_SHEET, Sheet, Workbook};
use indexmap::IndexSet;
use memchr::memmem;
use std::path::Path;

/// Folders listed in the inventory when none are given.
pub const DEFAULT_FOLDERS: [&str; 3] = ["Variables", "Alarms", "Setpoints"];

/// Header of the inventory sheet.
pub const INVENTORY_HEADER: [&str; 5] = ["TEMPLATE", "NAME", "DESCR", "TYPE", "FOLDER"];

/// Unique `{{tag}}` bodies of `text` in order of first appearance.
///
/// A tag does not span lines and empty tags are ignored.
///
/// ```
/// use ebo_factory::scaffold::extract_mustache_tags;
///
/// let tags = extract_mustache_tags(r#"<OI NAME="{{Name}}" DESCR="{{Descr}} of {{Name}}"/>"#);
/// assert_eq!(tags, ["Name", "Descr"]);
/// ```
pub fn extract_mustache_tags(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut tags = IndexSet::new();
    let mut pos = 0;
    while let Some(offset) = memmem::find(&bytes[pos..], b"{{") {
        let open = pos + offset;
        let body_start = open + 2;
        let Some(len) = memmem::find(&bytes[body_start..], b"}}") else {
            break;
        };
        let body = &text[body_start..body_start + len];
        if memchr::memchr(b'\n', body.as_bytes()).is_some() {
            pos = open + 1;
            continue;
        }
        if !body.is_empty() {
            tags.insert(body);
        }
        pos = body_start + len + 2;
    }
    tags.into_iter().collect()
}

/// One object defined in a template folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InventoryItem {
    /// `NAME` attribute
    pub name: String,
    /// `DESCR` attribute
    pub description: String,
    /// `TYPE` attribute
    pub object_type: String,
    /// Name of the folder the object was found in
    pub folder: String,
}

/// Objects directly inside every folder object named in `folders`,
/// folder by folder in document order, without duplicates.
///
/// Missing attributes are recorded as empty text.
pub fn folder_inventory(root: &Element, folders: &[&str]) -> Vec<InventoryItem> {
    let mut items = IndexSet::new();
    for &folder in folders {
        let mut matches = Vec::new();
        root.descendants_where(
            &|e: &Element| {
                e.name() == "OI"
                    && e.attribute("TYPE") == Some(FOLDER_TYPE)
                    && e.attribute("NAME") == Some(folder)
            },
            &mut matches,
        );
        for child in matches.iter().flat_map(|parent| parent.child_elements()) {
            let attribute = |name: &str| child.attribute(name).unwrap_or_default().to_string();
            items.insert(InventoryItem {
                name: attribute("NAME"),
                description: attribute("DESCR"),
                object_type: attribute("TYPE"),
                folder: folder.to_string(),
            });
        }
    }
    items.into_iter().collect()
}

/// A template to scaffold, by sheet name and document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldTemplate {
    /// Sheet name, usually the template file stem
    pub name: String,
    /// Template document text
    pub xml: String,
}

impl ScaffoldTemplate {
    /// Template text to scaffold under sheet `name`.
    pub fn new(name: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xml: xml.into(),
        }
    }

    /// Read a template file, named after its file stem.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Config(format!("no file name in '{}'", path.display())))?;
        Ok(Self::new(name, xml))
    }
}

/// Build the input workbook for `templates`.
///
/// Sheet names must be unique and must not be the reserved sheet name.
pub fn scaffold_workbook(templates: &[ScaffoldTemplate]) -> Result<Workbook> {
    let mut names = IndexSet::new();
    let mut sheets = Vec::with_capacity(templates.len() + 1);
    let mut inventory = vec![INVENTORY_HEADER.map(String::from).to_vec()];

    for template in templates {
        if template.name == RESERVED_SHEET || !names.insert(template.name.as_str()) {
            return Err(Error::Config(format!(
                "template sheet name '{}' is reserved or used twice",
                template.name
            )));
        }
        let header: Vec<String> = extract_mustache_tags(&template.xml)
            .into_iter()
            .map(|tag| format!("{{{{{}}}}}", tag))
            .collect();
        tracing::debug!(template = template.name.as_str(), tags = header.len(), "scaffolding sheet");
        sheets.push(Sheet::from_rows(template.name.as_str(), [header]));

        let root = Element::parse_with_origin(&template.xml, &template.name)?;
        for item in folder_inventory(&root, &DEFAULT_FOLDERS) {
            inventory.push(vec![
                template.name.clone(),
                item.name,
                item.description,
                item.object_type,
                item.folder,
            ]);
        }
    }

    sheets.push(Sheet::from_rows(RESERVED_SHEET, inventory));
    Ok(Workbook::from_sheets(sheets))
}

/// Scaffold template files and save the workbook to `output`.
pub fn scaffold_files<P, Q>(templates: &[P], output: Q) -> Result<Workbook>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let templates = templates
        .iter()
        .map(ScaffoldTemplate::open)
        .collect::<Result<Vec<_>>>()?;
    let workbook = scaffold_workbook(&templates)?;
    workbook.save(output.as_ref())?;
    tracing::info!(path = %output.as_ref().display(), sheets = templates.len(), "scaffold written");
    Ok(workbook)
}
