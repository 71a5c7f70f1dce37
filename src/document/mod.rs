//! Output document assembly.
//!
//! Every generated document is an ObjectSet:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <ObjectSet ExportMode="Special" Note="TypesFirst" Version="4.0.1.86">
//!   <MetaInformation>
//!     <ExportMode Value="Special"/>
//!     <RuntimeVersion Value="4.0.1.86"/>
//!     <SourceVersion Value="4.0.1.86"/>
//!     <ServerFullPath Value="/EBOApplicationFactory_v0.1"/>
//!   </MetaInformation>
//!   <Types>...</Types>
//!   <ExportedObjects>...</ExportedObjects>
//! </ObjectSet>
//! ```

mod builder;
mod objects;
mod options;

pub use builder::ObjectSetBuilder;
pub use objects::{FOLDER_TYPE, Folder, HYPERLINK_TYPE, Hyperlink};
pub use options::DocumentOptions;

use crate::element::Element;

/// Assemble one document from the full definitional set and one batch of
/// instances. Definitions are copied verbatim.
pub fn assemble(
    options: &DocumentOptions,
    definitions: &[Element],
    instances: &[Element],
) -> ObjectSetBuilder {
    let mut builder = ObjectSetBuilder::new(options.clone());
    builder.add_object_types(definitions.iter().cloned());
    builder.add_to_exported_objects(instances.iter().cloned());
    builder
}
