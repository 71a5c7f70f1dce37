//! Placeholder substitution.
//!
//! A template element is serialized, every placeholder literal in the text
//! is replaced by the record's value for its key, stray ampersands are
//! escaped and the result is parsed back into a fresh element. Because the
//! whole serialized subtree is searched, placeholders may sit in any
//! attribute or text node of any descendant.
//!
//! All literals are matched in one left-to-right pass with leftmost-longest
//! semantics: at any position the longest literal wins, so `Zone 10` is
//! never split into `Zone 1` + `0`, and inserted values are never searched
//! again.

use crate::common::xml::{escape_stray_ampersands, escape_text, escape_xml};
use crate::common::{Error, Result};
use crate::element::Element;
use crate::table::{PlaceholderKey, PlaceholderMap, SubstitutionRecord};
use aho_corasick::{AhoCorasick, MatchKind};

/// Origin label for errors raised while re-parsing substituted text.
const ORIGIN: &str = "substitution";

/// Replaces placeholder literals in template elements.
///
/// Built once per placeholder map and reused for every (element, record)
/// pair.
///
/// ```
/// use ebo_factory::element::Element;
/// use ebo_factory::substitute::Substituter;
/// use ebo_factory::table::{PlaceholderMap, SubstitutionRecord};
///
/// let map: PlaceholderMap = [("ItemsA", "VAV-NAME")].into_iter().collect();
/// let substituter = Substituter::new(&map).unwrap();
///
/// let template = Element::parse(r#"<OI NAME="VAV-NAME" TYPE="system.base.Folder"/>"#).unwrap();
/// let record = SubstitutionRecord::new("Items", 2).with_value("ItemsA", "VAV-L21-INT4");
/// let copy = substituter.apply(&template, &record).unwrap();
/// assert_eq!(copy.attribute("NAME"), Some("VAV-L21-INT4"));
/// ```
#[derive(Debug, Clone)]
pub struct Substituter {
    automaton: Option<AhoCorasick>,
    /// Per pattern: index into `slots`
    pattern_slots: Vec<usize>,
    /// Per distinct literal: the keys that declared it, in map order
    slots: Vec<Vec<PlaceholderKey>>,
}

impl Substituter {
    /// Compile the literals of a placeholder map.
    ///
    /// Each literal is matched verbatim and in its XML-escaped forms, since
    /// that is how it appears inside serialized attributes and text. Empty
    /// literals are ignored.
    pub fn new(placeholders: &PlaceholderMap) -> Result<Self> {
        let mut literals: Vec<&str> = Vec::new();
        let mut slots: Vec<Vec<PlaceholderKey>> = Vec::new();
        for (key, literal) in placeholders.iter() {
            if literal.is_empty() {
                continue;
            }
            match literals.iter().position(|existing| *existing == literal) {
                Some(slot) => slots[slot].push(key.clone()),
                None => {
                    literals.push(literal);
                    slots.push(vec![key.clone()]);
                },
            }
        }

        let mut patterns: Vec<String> = Vec::with_capacity(literals.len());
        let mut pattern_slots = Vec::with_capacity(literals.len());
        for (slot, literal) in literals.iter().enumerate() {
            for form in [literal.to_string(), escape_xml(literal), escape_text(literal)] {
                if !patterns.contains(&form) {
                    patterns.push(form);
                    pattern_slots.push(slot);
                }
            }
        }

        let automaton = if patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&patterns)
                    .map_err(|e| Error::Other(format!("cannot compile placeholders: {}", e)))?,
            )
        };

        tracing::debug!(
            literals = slots.len(),
            patterns = patterns.len(),
            "compiled placeholder literals"
        );
        Ok(Self {
            automaton,
            pattern_slots,
            slots,
        })
    }

    /// Replace literals in serialized text, returning the new text.
    pub fn replace_text(&self, text: &str, record: &SubstitutionRecord) -> String {
        let Some(automaton) = &self.automaton else {
            return text.to_string();
        };
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for found in automaton.find_iter(text) {
            output.push_str(&text[last..found.start()]);
            let slot = &self.slots[self.pattern_slots[found.pattern().as_usize()]];
            match slot.iter().find_map(|key| record.value(key.as_str())) {
                Some(value) => output.push_str(value),
                None => output.push_str(&text[found.start()..found.end()]),
            }
            last = found.end();
        }
        output.push_str(&text[last..]);
        output
    }

    /// Produce an independent copy of `element` with the record applied.
    ///
    /// Fails with [`Error::Substitution`] when the substituted text is no
    /// longer well-formed, naming the record's sheet and row.
    pub fn apply(&self, element: &Element, record: &SubstitutionRecord) -> Result<Element> {
        let serialized = element.to_xml_string();
        let replaced = self.replace_text(&serialized, record);
        let escaped = escape_stray_ampersands(&replaced);
        Element::parse_with_origin(&escaped, ORIGIN).map_err(|err| {
            let message = match err {
                Error::Xml { message, .. } => message,
                other => other.to_string(),
            };
            Error::Substitution {
                sheet: record.sheet().to_string(),
                row: record.row(),
                element: describe(element),
                message,
            }
        })
    }

    /// Apply one record to every element, in order.
    pub fn apply_all(&self, elements: &[Element], record: &SubstitutionRecord) -> Result<Vec<Element>> {
        elements
            .iter()
            .map(|element| self.apply(element, record))
            .collect()
    }

    /// Number of distinct literals compiled.
    pub fn literal_count(&self) -> usize {
        self.slots.len()
    }
}

fn describe(element: &Element) -> String {
    match element.attribute("NAME").or_else(|| element.attribute("Name")) {
        Some(name) => format!("{} {}", element.name(), name),
        None => element.name().to_string(),
    }
}
