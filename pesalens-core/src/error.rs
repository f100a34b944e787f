//! Error types for pesalens

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The raw table is empty or carries no recognizable statement column.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Data cleaning error: {0}")]
    DataCleaning(String),

    /// The category definition source is missing or malformed.
    #[error("Category definition error: {0}")]
    DefinitionLoad(String),

    #[error("Duplicate category name: {0}")]
    DuplicateCategory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
