//! "Save As": write whole tables out through a format-specific encoder.
//!
//! Each selected entity is exported on its own into
//! `<destination>/<table>.<extension>`. One entity failing never stops the
//! others from being attempted; the [`ExportReport`] records every outcome.

mod document;
mod report;
mod spreadsheet;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::select_all;
use crate::error::{LibraryError, Result};
use crate::models::{Entity, Record};

/// Output formats offered in the Save As dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Reserved: a standalone database copy. Not implemented.
    NativeDb,
    Spreadsheet,
    Document,
    Report,
}

impl ExportFormat {
    /// Dialog order.
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::NativeDb,
        ExportFormat::Spreadsheet,
        ExportFormat::Document,
        ExportFormat::Report,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::NativeDb => "db",
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::Document => "docx",
            ExportFormat::Report => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::NativeDb => "SQLite",
            ExportFormat::Spreadsheet => "Excel",
            ExportFormat::Document => "Word",
            ExportFormat::Report => "PDF",
        };
        f.write_str(name)
    }
}

/// Snapshot of one table handed to an encoder.
#[derive(Debug, Clone)]
pub struct TableData {
    pub entity: Entity,
    pub records: Vec<Record>,
}

impl TableData {
    pub fn load(conn: &Connection, entity: Entity) -> Result<Self> {
        Ok(Self {
            entity,
            records: select_all(conn, entity)?,
        })
    }

    pub fn title(&self) -> &'static str {
        self.entity.schema().title
    }

    pub fn headings(&self) -> Vec<&'static str> {
        self.entity.schema().headings()
    }
}

/// Result of exporting one entity.
#[derive(Debug)]
pub struct EntityExport {
    pub entity: Entity,
    pub outcome: Result<PathBuf>,
}

#[derive(Debug)]
pub struct ExportReport {
    pub format: ExportFormat,
    pub entities: Vec<EntityExport>,
}

impl ExportReport {
    /// Logical AND of every per-entity outcome.
    pub fn succeeded(&self) -> bool {
        self.entities.iter().all(|export| export.outcome.is_ok())
    }

    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.entities
            .iter()
            .filter_map(|export| export.outcome.as_ref().ok())
            .map(PathBuf::as_path)
    }

    pub fn failures(&self) -> impl Iterator<Item = &LibraryError> {
        self.entities
            .iter()
            .filter_map(|export| export.outcome.as_ref().err())
    }
}

/// File an entity is exported to inside `destination`.
pub fn export_path(destination: &Path, entity: Entity, format: ExportFormat) -> PathBuf {
    destination.join(format!("{}.{}", entity.schema().table, format.extension()))
}

/// Export every entity in `entities` to `destination`. An empty selection is
/// rejected up front; after that, failures are collected per entity.
pub fn export(
    conn: &Connection,
    entities: &[Entity],
    format: ExportFormat,
    destination: &Path,
) -> Result<ExportReport> {
    if entities.is_empty() {
        return Err(LibraryError::NoSelection);
    }
    fs::create_dir_all(destination)?;

    let mut report = ExportReport {
        format,
        entities: Vec::new(),
    };
    for entity in Entity::ALL
        .into_iter()
        .filter(|entity| entities.contains(entity))
    {
        let outcome = export_entity(conn, entity, format, destination);
        match &outcome {
            Ok(path) => info!(%entity, %format, path = %path.display(), "Exported table"),
            Err(err) => warn!(%entity, %format, error = %err, "Export failed"),
        }
        report.entities.push(EntityExport { entity, outcome });
    }
    Ok(report)
}

fn export_entity(
    conn: &Connection,
    entity: Entity,
    format: ExportFormat,
    destination: &Path,
) -> Result<PathBuf> {
    let path = export_path(destination, entity, format);
    let table = TableData::load(conn, entity)?;
    match format {
        ExportFormat::NativeDb => return Err(LibraryError::NotImplemented(format)),
        ExportFormat::Spreadsheet => spreadsheet::write(&table, &path)?,
        ExportFormat::Document => document::write(&table, &path)?,
        ExportFormat::Report => report::write(&table, &path)?,
    }
    Ok(path)
}

/// Wrap an encoder-specific failure with the entity and format it hit.
fn encoding_error(entity: Entity, format: ExportFormat, err: impl fmt::Display) -> LibraryError {
    LibraryError::Encoding {
        entity,
        format,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_record, open_in_memory};
    use tempfile::TempDir;

    fn seeded() -> Connection {
        let conn = open_in_memory().unwrap();
        insert_record(
            &conn,
            &Record::from_raw(Entity::Book, &["1984", "Orwell", "Dystopian", "3", "3"]),
        )
        .unwrap();
        insert_record(
            &conn,
            &Record::from_raw(Entity::Member, &["M1", "Ann", "2024-01-01", "1984", "1"]),
        )
        .unwrap();
        insert_record(
            &conn,
            &Record::from_raw(Entity::Transaction, &["T1", "1984", "M1", "2024-01-02", "-"]),
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let conn = seeded();
        let dir = TempDir::new().unwrap();
        let err = export(&conn, &[], ExportFormat::Spreadsheet, dir.path()).unwrap_err();
        assert!(matches!(err, LibraryError::NoSelection));
    }

    #[test]
    fn test_every_format_writes_one_file_per_entity() {
        let conn = seeded();
        let dir = TempDir::new().unwrap();
        for format in [
            ExportFormat::Spreadsheet,
            ExportFormat::Document,
            ExportFormat::Report,
        ] {
            let report = export(&conn, &Entity::ALL, format, dir.path()).unwrap();
            assert!(report.succeeded(), "{format}");
            assert_eq!(report.written().count(), 3);
            for entity in Entity::ALL {
                let path = export_path(dir.path(), entity, format);
                assert!(fs::metadata(&path).unwrap().len() > 0, "{}", path.display());
            }
        }
    }

    #[test]
    fn test_native_db_is_explicitly_unimplemented() {
        let conn = seeded();
        let dir = TempDir::new().unwrap();
        let report = export(&conn, &[Entity::Book], ExportFormat::NativeDb, dir.path()).unwrap();
        assert!(!report.succeeded());
        assert!(matches!(
            report.failures().next(),
            Some(LibraryError::NotImplemented(ExportFormat::NativeDb))
        ));
        assert!(!export_path(dir.path(), Entity::Book, ExportFormat::NativeDb).exists());
    }

    #[test]
    fn test_failure_in_one_entity_does_not_stop_others() {
        let conn = seeded();
        let dir = TempDir::new().unwrap();
        // A directory squatting on the members file makes that encoder fail.
        fs::create_dir(export_path(dir.path(), Entity::Member, ExportFormat::Spreadsheet))
            .unwrap();

        let report = export(
            &conn,
            &[Entity::Member, Entity::Book],
            ExportFormat::Spreadsheet,
            dir.path(),
        )
        .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.entities.len(), 2);
        assert_eq!(report.entities[0].entity, Entity::Book);
        assert!(report.entities[0].outcome.is_ok());
        assert!(matches!(
            report.entities[1].outcome,
            Err(LibraryError::Encoding {
                entity: Entity::Member,
                ..
            })
        ));
        assert!(export_path(dir.path(), Entity::Book, ExportFormat::Spreadsheet).is_file());
    }
}
