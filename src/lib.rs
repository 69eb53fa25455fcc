//! Library management: books, members and borrowing transactions kept in a
//! local SQLite file, edited through a Ratatui front-end.
//!
//! The binary only wires configuration and logging together; everything else
//! lives here so tests and other tools can drive the same pieces.
pub mod config;
pub mod controller;
pub mod db;
pub mod display;
pub mod error;
pub mod export;
pub mod form;
pub mod import;
pub mod library;
pub mod models;
pub mod settings;
pub mod ui;

pub use config::AppConfig;
pub use error::{LibraryError, Result};
pub use export::{ExportFormat, ExportReport};
pub use library::{ImportSummary, Library};
pub use models::{Entity, FieldValue, Record};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
