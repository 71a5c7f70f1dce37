//! Grouping generated copies into folders.
//!
//! The grouping placeholder is named by its literal (the header text), which
//! must resolve to exactly one placeholder key. Records are then partitioned
//! by their value for that key, in order of first appearance, and every
//! partition becomes one folder holding a copy of each template element per
//! record.

use crate::common::{Error, Result};
use crate::document::Folder;
use crate::element::Element;
use crate::substitute::Substituter;
use crate::table::{PlaceholderKey, PlaceholderMap, SubstitutionRecord};
use indexmap::IndexMap;

/// Records sharing one value of the grouping key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'a> {
    /// The shared value, used as the folder name
    pub value: &'a str,
    /// Matching records in input order
    pub records: Vec<&'a SubstitutionRecord>,
}

/// Find the single key whose literal is `literal`.
///
/// Fails with [`Error::GroupKey`] when no key or more than one key declares
/// that literal.
pub fn resolve_group_key<'a>(
    placeholders: &'a PlaceholderMap,
    literal: &str,
) -> Result<&'a PlaceholderKey> {
    let mut matches = placeholders.keys_for_literal(literal);
    match (matches.next(), matches.next()) {
        (Some(key), None) => Ok(key),
        (None, _) => Err(Error::GroupKey {
            literal: literal.to_string(),
            matches: 0,
        }),
        (Some(_), Some(_)) => Err(Error::GroupKey {
            literal: literal.to_string(),
            matches: placeholders.keys_for_literal(literal).count(),
        }),
    }
}

/// Partition records by their value for `key`, in first-encounter order.
///
/// Records without a value for the key belong to no group and are left out.
pub fn group_records<'a>(records: &'a [SubstitutionRecord], key: &PlaceholderKey) -> Vec<Group<'a>> {
    let mut groups: IndexMap<&'a str, Vec<&'a SubstitutionRecord>> = IndexMap::new();
    for record in records {
        match record.value(key.as_str()) {
            Some(value) => groups.entry(value).or_default().push(record),
            None => tracing::warn!(
                sheet = record.sheet(),
                row = record.row(),
                key = %key,
                "record has no value for the grouping key, left out of every folder"
            ),
        }
    }
    groups
        .into_iter()
        .map(|(value, records)| Group { value, records })
        .collect()
}

/// Generate copies grouped into one folder per distinct value of the
/// placeholder whose literal is `literal`.
///
/// `on_record` is called once per record after its copies are made.
pub fn make_copies_in_folders<F>(
    substituter: &Substituter,
    elements: &[Element],
    records: &[SubstitutionRecord],
    placeholders: &PlaceholderMap,
    literal: &str,
    mut on_record: F,
) -> Result<Vec<Element>>
where
    F: FnMut(&SubstitutionRecord),
{
    let key = resolve_group_key(placeholders, literal)?;
    let groups = group_records(records, key);
    tracing::debug!(key = %key, folders = groups.len(), "grouping copies");

    let mut folders = Vec::with_capacity(groups.len());
    for group in groups {
        let mut folder = Folder::new(group.value).build();
        for record in group.records {
            folder.extend(substituter.apply_all(elements, record)?);
            on_record(record);
        }
        folders.push(folder);
    }
    Ok(folders)
}
