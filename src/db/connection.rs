use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

/// Open (or create) the database file and make sure the three tables exist.
/// Existing rows are never dropped here; only the reset operations do that.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    debug!(path = %path.display(), "Opening library database");
    let conn = Connection::open(path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Fresh database that lives only as long as the connection. Used by tests
/// and throwaway sessions.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Idempotent schema bootstrap. The schema is fixed and unversioned.
///
/// Member and transaction references (`books_borrowed`, `book_id`,
/// `member_id`) are plain text columns: no foreign keys are declared.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            title TEXT PRIMARY KEY,
            author TEXT,
            genre TEXT,
            quantity INTEGER,
            available INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS members (
            member_id TEXT PRIMARY KEY,
            name TEXT,
            membership_date TEXT,
            books_borrowed TEXT,
            quantity_borrowed INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            transaction_id TEXT PRIMARY KEY,
            book_id TEXT,
            member_id TEXT,
            borrow_date TEXT,
            return_date TEXT
        )",
        [],
    )?;

    Ok(())
}
