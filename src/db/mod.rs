//! Persistence module split across logical submodules.

mod connection;
mod records;

pub use connection::{ensure_schema, open_database, open_in_memory};
pub use records::{delete_all, delete_record, insert_record, select_all, update_record};
