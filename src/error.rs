use thiserror::Error;

use crate::export::ExportFormat;
use crate::models::Entity;

/// Every failure the library surfaces. None of them are fatal: the front-end
/// reports the message and keeps running.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{0}")]
    Validation(String),

    #[error("A {entity} with key '{key}' already exists.")]
    DuplicateKey { entity: Entity, key: String },

    #[error("You must select a {entity}!")]
    Selection { entity: Entity },

    #[error("The {entity} '{key}' is no longer in the database.")]
    RecordMissing { entity: Entity, key: String },

    #[error("No data selected to save.")]
    NoSelection,

    #[error("The file header does not match books, members or transactions.")]
    UnrecognizedFormat,

    #[error("The file is empty.")]
    EmptyFile,

    #[error("Failed to save {entity} data as {format}: {message}")]
    Encoding {
        entity: Entity,
        format: ExportFormat,
        message: String,
    },

    #[error("Saving as {0} is not implemented.")]
    NotImplemented(ExportFormat),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
