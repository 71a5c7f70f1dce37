//! XML escaping helpers shared by the element serializer and the
//! substitution engine.

mod escape;

pub use escape::{
    escape_stray_ampersands, escape_text, escape_xml, resolve_entity, unescape_xml,
};
