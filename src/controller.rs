//! One controller drives all three record types. It owns the form buffer and
//! the display list for its entity and issues store calls against a borrowed
//! connection, so the caller decides how the connection is held.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::{delete_all, delete_record, insert_record, select_all, update_record};
use crate::display::{DisplayList, RowId};
use crate::error::{LibraryError, Result};
use crate::form::EntityForm;
use crate::models::Entity;

#[derive(Debug, Clone)]
pub struct EntityController {
    entity: Entity,
    form: EntityForm,
    display: DisplayList,
}

impl EntityController {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            form: EntityForm::new(entity),
            display: DisplayList::new(),
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn form(&self) -> &EntityForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EntityForm {
        &mut self.form
    }

    pub fn display(&self) -> &DisplayList {
        &self.display
    }

    /// Replace the display with the table's current contents.
    pub fn reload(&mut self, conn: &Connection) -> Result<usize> {
        let records = select_all(conn, self.entity)?;
        self.display.load(records.iter().map(|record| record.cells()));
        Ok(self.display.len())
    }

    /// Copy a displayed row into the form so it can be edited.
    pub fn select(&mut self, row: RowId) -> bool {
        match self.display.get(row) {
            Some(found) => {
                self.form.fill_from(found);
                true
            }
            None => false,
        }
    }

    /// Validate the form, insert it, and append the new row to the display.
    /// On any error nothing changes, including the form contents.
    pub fn add(&mut self, conn: &Connection) -> Result<RowId> {
        let record = self.form.parse_record()?;
        insert_record(conn, &record)?;
        let id = self.display.append(record.cells());
        self.form.clear();
        info!(entity = %self.entity, key = %record.key(), "Added record");
        Ok(id)
    }

    /// Rewrite the non-key columns of the selected row from the form. The
    /// selected row's displayed key is the target, so the key never changes.
    pub fn update(&mut self, conn: &Connection, selection: Option<RowId>) -> Result<()> {
        let key = self.selected_key(selection)?;
        let record = self.form.parse_record_for_key(&key)?;
        let updated = update_record(conn, &record)?;
        if updated == 0 {
            // The display is stale; show what the store really holds.
            self.reload(conn)?;
            return Err(LibraryError::RecordMissing {
                entity: self.entity,
                key,
            });
        }
        if let Some(row) = selection {
            self.display.update(row, record.cells());
        }
        self.form.clear();
        info!(entity = %self.entity, key = %key, updated, "Updated record");
        Ok(())
    }

    /// Remove the selected row from the store and the display.
    pub fn delete(&mut self, conn: &Connection, selection: Option<RowId>) -> Result<()> {
        let key = self.selected_key(selection)?;
        let deleted = delete_record(conn, self.entity, &key)?;
        if let Some(row) = selection {
            self.display.remove(row);
        }
        self.form.clear();
        info!(entity = %self.entity, key = %key, deleted, "Deleted record");
        Ok(())
    }

    pub fn clear_form(&mut self) {
        self.form.clear();
    }

    /// Truncate the table and empty the display. `confirmed` states whether
    /// the caller asked the user first; the truncation happens either way.
    pub fn reset(&mut self, conn: &Connection, confirmed: bool) -> Result<usize> {
        let removed = delete_all(conn, self.entity)?;
        self.display.clear();
        if confirmed {
            info!(entity = %self.entity, removed, "Reset table after confirmation");
        } else {
            debug!(entity = %self.entity, removed, "Reset table without prompt");
        }
        Ok(removed)
    }

    fn selected_key(&self, selection: Option<RowId>) -> Result<String> {
        selection
            .and_then(|row| self.display.get(row))
            .map(|row| row.key().to_string())
            .ok_or(LibraryError::Selection {
                entity: self.entity,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{FieldValue, Record};

    fn fill(controller: &mut EntityController, fields: &[&str]) {
        for (idx, value) in fields.iter().enumerate() {
            controller.form_mut().set(idx, *value);
        }
    }

    #[test]
    fn test_add_book_stores_and_displays_one_row() {
        let conn = open_in_memory().unwrap();
        let mut books = EntityController::new(Entity::Book);
        fill(&mut books, &["1984", "Orwell", "Dystopian", "3", "3"]);

        books.add(&conn).unwrap();

        let stored = select_all(&conn, Entity::Book).unwrap();
        assert_eq!(
            stored,
            vec![Record::new(
                Entity::Book,
                vec![
                    FieldValue::Text("1984".into()),
                    FieldValue::Text("Orwell".into()),
                    FieldValue::Text("Dystopian".into()),
                    FieldValue::Integer(3),
                    FieldValue::Integer(3),
                ]
            )]
        );
        assert_eq!(books.display().len(), 1);
        assert!(books.form().is_blank());
    }

    #[test]
    fn test_add_with_empty_field_changes_nothing() {
        for entity in Entity::ALL {
            let conn = open_in_memory().unwrap();
            let mut controller = EntityController::new(entity);
            fill(&mut controller, &["K1", "a", "", "b", "1"]);

            let err = controller.add(&conn).unwrap_err();
            assert!(matches!(err, LibraryError::Validation(_)), "{entity}");
            assert!(select_all(&conn, entity).unwrap().is_empty());
            assert!(controller.display().is_empty());
            assert_eq!(controller.form().value(0), "K1");
        }
    }

    #[test]
    fn test_duplicate_add_keeps_first_record() {
        for entity in Entity::ALL {
            let conn = open_in_memory().unwrap();
            let mut controller = EntityController::new(entity);
            fill(&mut controller, &["K1", "first", "x", "1", "1"]);
            controller.add(&conn).unwrap();
            fill(&mut controller, &["K1", "second", "x", "2", "2"]);

            let err = controller.add(&conn).unwrap_err();
            assert!(matches!(err, LibraryError::DuplicateKey { .. }), "{entity}");
            let stored = select_all(&conn, entity).unwrap();
            assert_eq!(stored.len(), 1);
            assert_eq!(stored[0].values[1], FieldValue::Text("first".into()));
            assert_eq!(controller.display().len(), 1);
        }
    }

    #[test]
    fn test_update_and_delete_require_selection() {
        let conn = open_in_memory().unwrap();
        let mut members = EntityController::new(Entity::Member);
        fill(&mut members, &["M1", "Ann", "2024-01-01", "Dune", "1"]);
        members.add(&conn).unwrap();
        fill(&mut members, &["M1", "Bob", "2024-01-01", "Dune", "1"]);

        let err = members.update(&conn, None).unwrap_err();
        assert!(matches!(err, LibraryError::Selection { entity: Entity::Member }));
        let err = members.delete(&conn, None).unwrap_err();
        assert!(matches!(err, LibraryError::Selection { .. }));

        let stored = select_all(&conn, Entity::Member).unwrap();
        assert_eq!(stored[0].values[1], FieldValue::Text("Ann".into()));
        assert_eq!(members.display().len(), 1);
    }

    #[test]
    fn test_update_selected_row_keeps_key() {
        let conn = open_in_memory().unwrap();
        let mut transactions = EntityController::new(Entity::Transaction);
        fill(&mut transactions, &["T1", "1984", "M1", "2024-01-01", "2024-01-15"]);
        let row = transactions.add(&conn).unwrap();

        assert!(transactions.select(row));
        transactions.form_mut().set(0, "T2");
        transactions.form_mut().set(4, "2024-02-01");
        transactions.update(&conn, Some(row)).unwrap();

        let stored = select_all(&conn, Entity::Transaction).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key(), "T1");
        assert_eq!(stored[0].values[4], FieldValue::Text("2024-02-01".into()));
        assert_eq!(transactions.display().get(row).unwrap().cells[0], "T1");
        assert_eq!(transactions.display().get(row).unwrap().cells[4], "2024-02-01");
    }

    #[test]
    fn test_delete_selected_row() {
        let conn = open_in_memory().unwrap();
        let mut books = EntityController::new(Entity::Book);
        fill(&mut books, &["Dune", "Herbert", "SF", "2", "2"]);
        let dune = books.add(&conn).unwrap();
        fill(&mut books, &["Emma", "Austen", "Classic", "1", "1"]);
        books.add(&conn).unwrap();

        books.delete(&conn, Some(dune)).unwrap();
        let keys: Vec<_> = select_all(&conn, Entity::Book)
            .unwrap()
            .iter()
            .map(Record::key)
            .collect();
        assert_eq!(keys, vec!["Emma"]);
        assert_eq!(books.display().len(), 1);
    }

    #[test]
    fn test_reset_truncates_table_and_display() {
        let conn = open_in_memory().unwrap();
        let mut books = EntityController::new(Entity::Book);
        for idx in 0..5 {
            let title = format!("Book {idx}");
            fill(&mut books, &[title.as_str(), "A", "G", "1", "1"]);
            books.add(&conn).unwrap();
        }

        assert_eq!(books.reset(&conn, true).unwrap(), 5);
        assert!(select_all(&conn, Entity::Book).unwrap().is_empty());
        assert!(books.display().is_empty());
    }

    #[test]
    fn test_clear_form_leaves_store_alone() {
        let conn = open_in_memory().unwrap();
        let mut books = EntityController::new(Entity::Book);
        fill(&mut books, &["Dune", "Herbert", "SF", "2", "2"]);
        books.add(&conn).unwrap();
        fill(&mut books, &["Emma", "Austen", "Classic", "1", "1"]);

        books.clear_form();
        assert!(books.form().is_blank());
        assert_eq!(books.reload(&conn).unwrap(), 1);
    }

    #[test]
    fn test_update_keeps_padded_key_verbatim() {
        let conn = open_in_memory().unwrap();
        insert_record(
            &conn,
            &Record::from_raw(Entity::Book, &["Dune ", "Herbert", "SF", "1", "1"]),
        )
        .unwrap();
        let mut books = EntityController::new(Entity::Book);
        books.reload(&conn).unwrap();
        let row = books.display().nth(0).unwrap().id;
        books.select(row);
        books.form_mut().set(1, "Frank Herbert");

        books.update(&conn, Some(row)).unwrap();

        let stored = select_all(&conn, Entity::Book).unwrap();
        assert_eq!(stored[0].values[0], FieldValue::Text("Dune ".into()));
        assert_eq!(stored[0].values[1], FieldValue::Text("Frank Herbert".into()));
        assert_eq!(books.display().get(row).unwrap().cells, stored[0].cells());

        books.delete(&conn, Some(row)).unwrap();
        assert!(select_all(&conn, Entity::Book).unwrap().is_empty());
    }

    #[test]
    fn test_update_of_vanished_row_reloads_display() {
        let conn = open_in_memory().unwrap();
        let mut books = EntityController::new(Entity::Book);
        fill(&mut books, &["Dune", "Herbert", "SF", "1", "1"]);
        books.add(&conn).unwrap();
        let row = books.display().nth(0).unwrap().id;
        delete_all(&conn, Entity::Book).unwrap();

        books.select(row);
        let err = books.update(&conn, Some(row)).unwrap_err();
        assert!(matches!(err, LibraryError::RecordMissing { .. }));
        assert!(books.display().is_empty());
        assert!(select_all(&conn, Entity::Book).unwrap().is_empty());
    }
}
