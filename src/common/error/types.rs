//! Unified error types for the factory.
//!
//! Every stage of the pipeline (template parsing, workbook reading,
//! substitution, grouping, assembly) reports through this one error type so
//! callers see which source and which step failed.
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for factory operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error without a known path
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO error on a specific file
    #[error("IO error on '{}': {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Markup could not be parsed as well-formed XML
    #[error("XML error in {origin}: {message}")]
    Xml { origin: String, message: String },

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Workbook is structurally invalid (missing parts, bad references)
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// An explicitly selected sheet does not exist
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// A substitution produced markup that no longer parses
    #[error("Substitution failed for <{element}> with sheet '{sheet}' row {row}: {message}")]
    Substitution {
        sheet: String,
        row: u32,
        element: String,
        message: String,
    },

    /// The grouping placeholder did not resolve to exactly one key
    #[error("Grouping placeholder '{literal}' matches {matches} placeholder keys, expected exactly one")]
    GroupKey { literal: String, matches: usize },

    /// No template is mapped to a sheet that has records
    #[error("No template mapped for group '{0}'")]
    MissingTemplate(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedded file content could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an XML error tagged with the source it came from.
    pub fn xml(origin: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Xml {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    /// Attach a path to an IO error.
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type for factory operations.
pub type Result<T> = std::result::Result<T, Error>;
