use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("malformed dataset {path}: {message}")]
    #[diagnostic(help("each dataset needs an index column plus the configured name and id columns"))]
    IngestionFormat { path: String, message: String },

    #[error("catalog store error: {0}")]
    Store(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid database url: {0}")]
    #[diagnostic(help("use sqlite::memory:, sqlite://<path> or a plain file path"))]
    InvalidDatabaseUrl(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl CatalogError {
    pub(crate) fn store(err: impl std::fmt::Display) -> Self {
        CatalogError::Store(err.to_string())
    }
}

pub const NAME_NOT_FOUND: &str = "Could not find protein with that name";
pub const ID_EXISTS: &str = "Protein id existed...";
pub const UPDATE_TARGET_MISSING: &str = "Protein doesn't exist, cannot update";
