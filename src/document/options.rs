/// Envelope settings for generated ObjectSet documents.
///
/// The values are fixed for the lifetime of one assembling session, so every
/// document of a run carries the same envelope.
///
/// # Examples
///
/// ```rust
/// use ebo_factory::document::DocumentOptions;
///
/// // Create with defaults
/// let options = DocumentOptions::default();
/// assert_eq!(options.version, "4.0.1.86");
///
/// // Or customize
/// let options = DocumentOptions::new()
///     .with_version("6.0.4.90")
///     .with_server_full_path("/Server 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Platform version written to `Version`, `RuntimeVersion` and `SourceVersion`
    pub version: String,
    /// Identity path of the exporting server
    pub server_full_path: String,
    /// Export mode, `Special` for template-driven imports
    pub export_mode: String,
    /// Value of the `Note` attribute on the root element
    pub note: String,
    /// Optional semantics filter, written only when set
    pub semantics_filter: Option<String>,
    /// Indentation unit used for pretty-printed output
    pub indent: String,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            version: "4.0.1.86".to_string(),
            server_full_path: "/EBOApplicationFactory_v0.1".to_string(),
            export_mode: "Special".to_string(),
            note: "TypesFirst".to_string(),
            semantics_filter: None,
            indent: "  ".to_string(),
        }
    }
}

impl DocumentOptions {
    /// Create options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the platform version.
    #[inline]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the server full path.
    #[inline]
    pub fn with_server_full_path(mut self, path: impl Into<String>) -> Self {
        self.server_full_path = path.into();
        self
    }

    /// Set the export mode.
    #[inline]
    pub fn with_export_mode(mut self, mode: impl Into<String>) -> Self {
        self.export_mode = mode.into();
        self
    }

    /// Set the root note.
    #[inline]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Set or clear the semantics filter.
    ///
    /// When set, the root element gets a `SemanticsFilter` attribute with
    /// this value and the meta information records `SemanticsFilter` as
    /// `None`, the way the platform exports such sets.
    #[inline]
    pub fn with_semantics_filter(mut self, filter: Option<String>) -> Self {
        self.semantics_filter = filter;
        self
    }

    /// Set the indentation unit for pretty output.
    #[inline]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }
}
