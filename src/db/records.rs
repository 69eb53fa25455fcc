use rusqlite::{params_from_iter, Connection, Error as SqlError, ErrorCode};
use tracing::debug;

use crate::error::{LibraryError, Result};
use crate::models::{Entity, FieldValue, Record};

/// Insert a full row. A clash on the primary key becomes
/// [`LibraryError::DuplicateKey`] so the UI can show an "already exists"
/// notice instead of a raw SQLite message.
pub fn insert_record(conn: &Connection, record: &Record) -> Result<()> {
    let schema = record.entity.schema();
    ensure_arity(record)?;

    let placeholders = (1..=schema.columns.len())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        schema.table,
        schema.column_names().join(", ")
    );

    debug!(table = schema.table, key = %record.key(), "Inserting record");
    conn.execute(&sql, params_from_iter(record.values.iter()))
        .map_err(|err| map_unique_constraint(err, record))?;
    Ok(())
}

/// Rewrite every non-key column of the row whose key matches the record's
/// key. Returns the number of rows touched; an absent key is not an error.
pub fn update_record(conn: &Connection, record: &Record) -> Result<usize> {
    let schema = record.entity.schema();
    ensure_arity(record)?;

    let assignments = schema
        .value_columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| format!("{} = ?{}", column.name, idx + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {assignments} WHERE {} = ?{}",
        schema.table,
        schema.key_column().name,
        schema.columns.len()
    );

    let params = record.values[1..].iter().chain(record.values.first());
    let updated = conn.execute(&sql, params_from_iter(params))?;
    debug!(table = schema.table, key = %record.key(), updated, "Updated record");
    Ok(updated)
}

/// Remove one row by key. Returns the number of rows removed.
pub fn delete_record(conn: &Connection, entity: Entity, key: &str) -> Result<usize> {
    let schema = entity.schema();
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        schema.table,
        schema.key_column().name
    );
    let deleted = conn.execute(&sql, [key])?;
    debug!(table = schema.table, key, deleted, "Deleted record");
    Ok(deleted)
}

/// Truncate the entity's table.
pub fn delete_all(conn: &Connection, entity: Entity) -> Result<usize> {
    let schema = entity.schema();
    let deleted = conn.execute(&format!("DELETE FROM {}", schema.table), [])?;
    debug!(table = schema.table, deleted, "Truncated table");
    Ok(deleted)
}

/// Every row of the table in schema column order, oldest insert first.
pub fn select_all(conn: &Connection, entity: Entity) -> Result<Vec<Record>> {
    let schema = entity.schema();
    let width = schema.columns.len();
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} ORDER BY rowid",
        schema.column_names().join(", "),
        schema.table
    ))?;

    let records = stmt
        .query_map([], |row| {
            let values = (0..width)
                .map(|idx| row.get::<_, FieldValue>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Record::new(entity, values))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(table = schema.table, count = records.len(), "Loaded records");
    Ok(records)
}

fn ensure_arity(record: &Record) -> Result<()> {
    let expected = record.entity.schema().columns.len();
    if record.values.len() == expected {
        Ok(())
    } else {
        Err(LibraryError::Validation(format!(
            "Expected {expected} values for a {}, got {}.",
            record.entity,
            record.values.len()
        )))
    }
}

/// The only constraint on these tables is the primary key, so any constraint
/// violation on insert means the key is taken.
fn map_unique_constraint(err: SqlError, record: &Record) -> LibraryError {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        LibraryError::DuplicateKey {
            entity: record.entity,
            key: record.key(),
        }
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn book(title: &str, quantity: &str) -> Record {
        Record::from_raw(Entity::Book, &[title, "Author", "Genre", quantity, "1"])
    }

    #[test]
    fn test_insert_and_select_preserves_order() {
        let conn = open_in_memory().unwrap();
        insert_record(&conn, &book("Zebra", "1")).unwrap();
        insert_record(&conn, &book("Apple", "2")).unwrap();

        let rows = select_all(&conn, Entity::Book).unwrap();
        let keys: Vec<_> = rows.iter().map(Record::key).collect();
        assert_eq!(keys, vec!["Zebra", "Apple"]);
        assert_eq!(rows[1].values[3], FieldValue::Integer(2));
    }

    #[test]
    fn test_duplicate_key_is_reported() {
        let conn = open_in_memory().unwrap();
        insert_record(&conn, &book("Dune", "1")).unwrap();
        let err = insert_record(&conn, &book("Dune", "9")).unwrap_err();
        assert!(matches!(
            err,
            LibraryError::DuplicateKey { entity: Entity::Book, ref key } if key == "Dune"
        ));

        let rows = select_all(&conn, Entity::Book).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[3], FieldValue::Integer(1));
    }

    #[test]
    fn test_update_rewrites_non_key_columns() {
        let conn = open_in_memory().unwrap();
        let member = Record::from_raw(Entity::Member, &["M1", "Ann", "2024-01-01", "Dune", "1"]);
        insert_record(&conn, &member).unwrap();

        let changed =
            Record::from_raw(Entity::Member, &["M1", "Ann Lee", "2024-02-02", "Dune, Emma", "2"]);
        assert_eq!(update_record(&conn, &changed).unwrap(), 1);
        assert_eq!(select_all(&conn, Entity::Member).unwrap(), vec![changed]);
    }

    #[test]
    fn test_missing_keys_are_no_ops() {
        let conn = open_in_memory().unwrap();
        assert_eq!(update_record(&conn, &book("Ghost", "1")).unwrap(), 0);
        assert_eq!(delete_record(&conn, Entity::Book, "Ghost").unwrap(), 0);
        assert_eq!(delete_all(&conn, Entity::Transaction).unwrap(), 0);
    }

    #[test]
    fn test_delete_all_only_touches_one_table() {
        let conn = open_in_memory().unwrap();
        insert_record(&conn, &book("Dune", "1")).unwrap();
        insert_record(
            &conn,
            &Record::from_raw(Entity::Transaction, &["T1", "Dune", "M1", "a", "b"]),
        )
        .unwrap();

        assert_eq!(delete_all(&conn, Entity::Book).unwrap(), 1);
        assert!(select_all(&conn, Entity::Book).unwrap().is_empty());
        assert_eq!(select_all(&conn, Entity::Transaction).unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_arity_is_rejected_before_sql() {
        let conn = open_in_memory().unwrap();
        let short = Record::new(Entity::Book, vec![FieldValue::Text("Dune".into())]);
        assert!(matches!(
            insert_record(&conn, &short),
            Err(LibraryError::Validation(_))
        ));
    }
}
