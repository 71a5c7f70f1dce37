//! Owned XML element tree.
//!
//! This is the single structural representation used everywhere in the
//! crate: templates are parsed into it, builders construct it, the
//! substitution engine re-parses into it and the document assembler
//! serializes it.

/// A child node of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data, unescaped
    Text(String),
    /// CDATA section content, raw
    CData(String),
    /// Comment content, raw
    Comment(String),
}

impl Node {
    /// Get the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Check whether this node is text made of whitespace only.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An XML element with ordered attributes and ordered children.
///
/// Attribute order is kept exactly as parsed or inserted so serialized
/// output is stable from run to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    pub(crate) children: Vec<Node>,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attribute`].
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder form of [`Element::push`].
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.push(child);
        self
    }

    /// Get the tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the attributes in document order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Get attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set attribute value, replacing in place if it already exists
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove attribute, returning its value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Get all child nodes
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Append a child node
    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Append several elements at once
    pub fn extend<I: IntoIterator<Item = Element>>(&mut self, elements: I) {
        self.children.extend(elements.into_iter().map(Node::Element));
    }

    /// Remove every child node
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Iterate over element children only
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Find the first direct child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|child| child.name == name)
    }

    /// Find the first element named `name` in document order, including self.
    pub fn find_first(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements()
            .find_map(|child| child.find_first(name))
    }

    /// Collect every descendant element (self included) matching a predicate,
    /// in document order.
    pub fn descendants_where<'a, F>(&'a self, predicate: &F, out: &mut Vec<&'a Element>)
    where
        F: Fn(&Element) -> bool,
    {
        if predicate(self) {
            out.push(self);
        }
        for child in self.child_elements() {
            child.descendants_where(predicate, out);
        }
    }

    /// Replace the children with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Concatenated text and CDATA of this element and its descendants
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                Node::Element(element) => element.collect_text(out),
                Node::Comment(_) => {},
            }
        }
    }

    /// Check whether the element has any element children
    pub(crate) fn has_element_children(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Node::Element(_)))
    }
}
