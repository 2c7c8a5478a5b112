//! Per-file conversion errors
//!
//! Every variant describes a failure scoped to one module unit. The walker
//! records these and moves on to the next unit; only errors outside a unit
//! (missing root, bad config) are fatal, and those travel as `anyhow::Error`.

use std::path::PathBuf;

/// Result type for single-unit conversion steps
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Reasons a single module unit could not be converted
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    /// Reading an input or writing the generated file failed
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// swc rejected the declaration or module source
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The declaration file has no `declare function`
    #[error("{} does not declare a function. Did you export the function?", path.display())]
    MissingDeclaration { path: PathBuf },

    #[error("declared function `{name}` in {} has no return type annotation", path.display())]
    MissingReturnType { path: PathBuf, name: String },

    /// The compiled module has no top-level `export function`
    #[error("{} does not include an 'export function' statement", path.display())]
    MissingExport { path: PathBuf },

    #[error("{} has {count} 'export function' statements, expected exactly one", path.display())]
    MultipleExports { path: PathBuf, count: usize },

    #[error(
        "{} exports `{exported}` but its declaration names `{declared}`",
        path.display()
    )]
    NameMismatch {
        path: PathBuf,
        declared: String,
        exported: String,
    },

    /// Schema directory names are emitted unquoted, so they must be identifiers
    #[error("schema directory `{schema}` for {} is not a valid SQL identifier", path.display())]
    InvalidSchema { path: PathBuf, schema: String },
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
