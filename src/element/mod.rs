//! Structured XML element abstraction.
//!
//! One owned tree type with one parser and one serializer. Templates,
//! generated copies, folders and the output envelope are all [`Element`]s,
//! so nothing is converted between tree representations.

mod node;
mod parser;
mod writer;

pub use node::{Element, Node};
pub use writer::XML_DECLARATION;
