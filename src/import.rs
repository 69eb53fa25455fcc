//! CSV import. The header row decides which table the file belongs to and the
//! data rows replace that table's contents wholesale.

use std::path::Path;

use csv::ReaderBuilder;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::insert_record;
use crate::error::{LibraryError, Result};
use crate::models::{Entity, Record};

/// A parsed file ready to be written: the entity its header matched and the
/// data rows converted to records.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub entity: Entity,
    pub records: Vec<Record>,
}

/// Read every row of a delimited file. Quoting follows the usual CSV rules;
/// rows may differ in length.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(path = %path.display(), rows = rows.len(), "Read delimited file");
    Ok(rows)
}

/// Match a header row against the three heading signatures. Only an exact,
/// ordered match counts.
pub fn detect_entity<S: AsRef<str>>(header: &[S]) -> Result<Entity> {
    Entity::ALL
        .into_iter()
        .find(|entity| {
            let headings = entity.schema().headings();
            headings.len() == header.len()
                && headings
                    .iter()
                    .zip(header)
                    .all(|(expected, actual)| *expected == actual.as_ref())
        })
        .ok_or(LibraryError::UnrecognizedFormat)
}

/// Split rows into a header and data rows and convert the data verbatim.
/// Cells are not validated beyond needing one value per column.
pub fn parse_rows(rows: Vec<Vec<String>>) -> Result<ImportBatch> {
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or(LibraryError::EmptyFile)?;
    let entity = detect_entity(&header)?;
    let width = entity.schema().columns.len();

    let records = rows
        .enumerate()
        .map(|(idx, row)| {
            if row.len() == width {
                Ok(Record::from_raw(entity, &row))
            } else {
                Err(LibraryError::Validation(format!(
                    "Line {} has {} values, expected {width}.",
                    idx + 2,
                    row.len()
                )))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ImportBatch { entity, records })
}

pub fn parse_file(path: &Path) -> Result<ImportBatch> {
    parse_rows(read_rows(path)?)
}

/// Insert the batch row by row. The first failure (typically a duplicate key
/// inside the file) stops the import; rows already written stay.
pub fn insert_batch(conn: &Connection, batch: &ImportBatch) -> Result<usize> {
    for record in &batch.records {
        insert_record(conn, record)?;
    }
    info!(entity = %batch.entity, rows = batch.records.len(), "Imported rows");
    Ok(batch.records.len())
}
