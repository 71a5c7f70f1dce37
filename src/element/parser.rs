//! Parsing XML text into [`Element`] trees.

use super::node::{Element, Node};
use crate::common::xml::{resolve_entity, unescape_xml};
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

impl Element {
    /// Parse a complete XML document or fragment with a single root element.
    ///
    /// `origin` names the source (file path, "substitution", ...) in error
    /// messages. Declarations, processing instructions and doctypes are
    /// skipped. Whitespace-only text between child elements is dropped so
    /// pretty-printed input re-serializes cleanly.
    pub fn parse_with_origin(xml: &str, origin: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::xml(origin, format!("{} at byte {}", e, reader.error_position())))?;
            match event {
                Event::Start(ref e) => {
                    let element = start_element(e, origin)?;
                    if root.is_some() && stack.is_empty() {
                        return Err(Error::xml(origin, "content after the root element"));
                    }
                    stack.push(element);
                },
                Event::Empty(ref e) => {
                    let element = start_element(e, origin)?;
                    close(&mut stack, &mut root, element, origin)?;
                },
                Event::End(ref e) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::xml(origin, "unexpected closing tag"))?;
                    if element.name().as_bytes() != e.name().as_ref() {
                        return Err(Error::xml(
                            origin,
                            format!(
                                "closing tag </{}> does not match <{}>",
                                String::from_utf8_lossy(e.name().as_ref()),
                                element.name()
                            ),
                        ));
                    }
                    close(&mut stack, &mut root, finish(element), origin)?;
                },
                Event::Text(ref t) => {
                    let raw = std::str::from_utf8(t)
                        .map_err(|e| Error::xml(origin, format!("invalid UTF-8 in text: {}", e)))?;
                    push_text(&mut stack, &unescape_xml(raw), origin)?;
                },
                Event::GeneralRef(ref r) => {
                    let name = String::from_utf8_lossy(r);
                    let ch = resolve_entity(&name)
                        .ok_or_else(|| Error::xml(origin, format!("unknown entity &{};", name)))?;
                    push_text(&mut stack, ch.encode_utf8(&mut [0u8; 4]), origin)?;
                },
                Event::CData(ref c) => {
                    let content = String::from_utf8_lossy(c).into_owned();
                    match stack.last_mut() {
                        Some(current) => current.children.push(Node::CData(content)),
                        None => return Err(Error::xml(origin, "CDATA outside the root element")),
                    }
                },
                Event::Comment(ref c) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .children
                            .push(Node::Comment(String::from_utf8_lossy(c).into_owned()));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::xml(origin, format!("unclosed element <{}>", open.name())));
        }
        root.ok_or_else(|| Error::xml(origin, "no root element found"))
    }

    /// Parse with a generic origin label.
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with_origin(xml, "document")
    }
}

fn start_element(e: &BytesStart<'_>, origin: &str) -> Result<Element> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|_| Error::xml(origin, "invalid UTF-8 in tag name"))?
        .to_string();
    let mut element = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::xml(origin, err))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|_| Error::xml(origin, "invalid UTF-8 in attribute name"))?;
        let value = attr
            .unescape_value()
            .map_err(|err| Error::xml(origin, err))?;
        element.set_attribute(key, value.into_owned());
    }
    Ok(element)
}

fn push_text(stack: &mut [Element], text: &str, origin: &str) -> Result<()> {
    let Some(current) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(Error::xml(origin, "text outside the root element"));
    };
    match current.children.last_mut() {
        Some(Node::Text(existing)) => existing.push_str(text),
        _ => current.children.push(Node::Text(text.to_string())),
    }
    Ok(())
}

/// Drop formatting whitespace from elements that have element children.
fn finish(mut element: Element) -> Element {
    if element.has_element_children() {
        element.children.retain(|child| !child.is_blank_text());
    }
    element
}

fn close(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    origin: &str,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::xml(origin, "multiple root elements")),
    }
    Ok(())
}
