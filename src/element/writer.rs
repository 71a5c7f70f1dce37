//! Serializing [`Element`] trees back to XML text.

use super::node::{Element, Node};
use crate::common::xml::{escape_text, escape_xml};

/// XML declaration written at the top of every output document.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

impl Element {
    /// Serialize element to a compact XML string (no added whitespace).
    pub fn to_xml_string(&self) -> String {
        let mut xml = String::with_capacity(self.estimated_xml_len());
        self.write_compact(&mut xml);
        xml
    }

    /// Serialize element with one child element per line, indented by
    /// `indent` per nesting level.
    ///
    /// Elements whose children are only text or CDATA are written on a
    /// single line so their content is not altered.
    pub fn to_pretty_string(&self, indent: &str) -> String {
        let mut xml = String::with_capacity(self.estimated_xml_len() * 2);
        self.write_pretty(&mut xml, indent, 0);
        xml
    }

    /// Serialize as a full document: declaration plus the pretty-printed tree.
    pub fn to_document_string(&self, indent: &str) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push('\n');
        self.write_pretty(&mut xml, indent, 0);
        xml
    }

    fn estimated_xml_len(&self) -> usize {
        let mut len = 2 * self.name().len() + 5;
        for (key, value) in self.attributes() {
            len += key.len() + value.len() + 4;
        }
        for child in self.children() {
            len += match child {
                Node::Element(element) => element.estimated_xml_len(),
                Node::Text(t) => t.len(),
                Node::CData(t) => t.len() + 12,
                Node::Comment(t) => t.len() + 7,
            };
        }
        len
    }

    fn write_open_tag(&self, output: &mut String) {
        output.push('<');
        output.push_str(self.name());
        for (key, value) in self.attributes() {
            output.push(' ');
            output.push_str(key);
            output.push_str("=\"");
            output.push_str(&escape_xml(value));
            output.push('"');
        }
    }

    fn write_close_tag(&self, output: &mut String) {
        output.push_str("</");
        output.push_str(self.name());
        output.push('>');
    }

    fn write_compact(&self, output: &mut String) {
        self.write_open_tag(output);
        if self.children().is_empty() {
            output.push_str("/>");
            return;
        }
        output.push('>');
        for child in self.children() {
            match child {
                Node::Element(element) => element.write_compact(output),
                leaf => write_leaf(leaf, output),
            }
        }
        self.write_close_tag(output);
    }

    fn write_pretty(&self, output: &mut String, indent: &str, depth: usize) {
        push_indent(output, indent, depth);
        self.write_open_tag(output);

        if self.children().is_empty() {
            output.push_str("/>\n");
            return;
        }
        output.push('>');

        if !self.has_element_children() {
            for child in self.children() {
                write_leaf(child, output);
            }
            self.write_close_tag(output);
            output.push('\n');
            return;
        }

        output.push('\n');
        for child in self.children() {
            match child {
                Node::Element(element) => element.write_pretty(output, indent, depth + 1),
                Node::Text(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        push_indent(output, indent, depth + 1);
                        output.push_str(&escape_text(trimmed));
                        output.push('\n');
                    }
                },
                leaf => {
                    push_indent(output, indent, depth + 1);
                    write_leaf(leaf, output);
                    output.push('\n');
                },
            }
        }
        push_indent(output, indent, depth);
        self.write_close_tag(output);
        output.push('\n');
    }
}

fn write_leaf(node: &Node, output: &mut String) {
    match node {
        Node::Text(text) => output.push_str(&escape_text(text)),
        Node::CData(data) => {
            output.push_str("<![CDATA[");
            output.push_str(data);
            output.push_str("]]>");
        },
        Node::Comment(comment) => {
            output.push_str("<!--");
            output.push_str(comment);
            output.push_str("-->");
        },
        Node::Element(element) => element.write_compact(output),
    }
}

#[inline]
fn push_indent(output: &mut String, indent: &str, depth: usize) {
    for _ in 0..depth {
        output.push_str(indent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("OI")
            .with_attribute("NAME", "A & \"B\"")
            .with_attribute("TYPE", "system.base.Folder")
            .with_child(Element::new("PI").with_attribute("Name", "NOTE1"))
            .with_child(Element::new("Descr").with_child(Node::Text("x < y".into())))
    }

    #[test]
    fn test_compact_output() {
        assert_eq!(
            sample().to_xml_string(),
            r#"<OI NAME="A &amp; &quot;B&quot;" TYPE="system.base.Folder"><PI Name="NOTE1"/><Descr>x &lt; y</Descr></OI>"#
        );
    }

    #[test]
    fn test_pretty_output() {
        let expected = "<OI NAME=\"A &amp; &quot;B&quot;\" TYPE=\"system.base.Folder\">\n  <PI Name=\"NOTE1\"/>\n  <Descr>x &lt; y</Descr>\n</OI>\n";
        assert_eq!(sample().to_pretty_string("  "), expected);
    }

    #[test]
    fn test_compact_round_trip() {
        let original = sample();
        let reparsed = Element::parse(&original.to_xml_string()).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn test_pretty_round_trip_is_stable() {
        let pretty = sample().to_pretty_string("\t");
        let reparsed = Element::parse(&pretty).unwrap();
        assert_eq!(reparsed.to_pretty_string("\t"), pretty);
    }

    #[test]
    fn test_document_string_has_declaration() {
        let doc = Element::new("ObjectSet").to_document_string("  ");
        assert_eq!(doc, format!("{}\n<ObjectSet/>\n", XML_DECLARATION));
    }
}
