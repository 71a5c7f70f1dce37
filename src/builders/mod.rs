//! Builders for specialized object kinds that templates cannot express as
//! plain placeholder text.

pub mod html;

pub use html::{HtmlFile, HtmlFileBuilder};
