//! The application's single owner of the database connection, the three entity
//! controllers and the presentation preferences.

use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use crate::controller::EntityController;
use crate::db::{open_database, open_in_memory};
use crate::display::RowId;
use crate::error::Result;
use crate::export::{self, ExportFormat, ExportReport};
use crate::import::{self, ImportBatch};
use crate::models::Entity;
use crate::settings::UiPreferences;

pub struct Library {
    conn: Connection,
    controllers: [EntityController; 3],
    preferences: UiPreferences,
}

/// What a finished import replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub entity: Entity,
    pub replaced: usize,
    pub inserted: usize,
}

impl Library {
    /// Open the database file and load every table into its display list.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(open_database(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let mut library = Self {
            conn,
            controllers: Entity::ALL.map(EntityController::new),
            preferences: UiPreferences::default(),
        };
        library.reload_all()?;
        Ok(library)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn controller(&self, entity: Entity) -> &EntityController {
        &self.controllers[entity.index()]
    }

    pub fn controller_mut(&mut self, entity: Entity) -> &mut EntityController {
        &mut self.controllers[entity.index()]
    }

    pub fn preferences(&self) -> &UiPreferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut UiPreferences {
        &mut self.preferences
    }

    pub fn reload_all(&mut self) -> Result<()> {
        for controller in &mut self.controllers {
            controller.reload(&self.conn)?;
        }
        Ok(())
    }

    pub fn add(&mut self, entity: Entity) -> Result<RowId> {
        let (conn, controller) = self.split(entity);
        controller.add(conn)
    }

    pub fn update(&mut self, entity: Entity, selection: Option<RowId>) -> Result<()> {
        let (conn, controller) = self.split(entity);
        controller.update(conn, selection)
    }

    pub fn delete(&mut self, entity: Entity, selection: Option<RowId>) -> Result<()> {
        let (conn, controller) = self.split(entity);
        controller.delete(conn, selection)
    }

    pub fn reset(&mut self, entity: Entity, confirmed: bool) -> Result<usize> {
        let (conn, controller) = self.split(entity);
        controller.reset(conn, confirmed)
    }

    /// Truncate all three tables and restore default preferences.
    pub fn reset_all(&mut self, confirmed: bool) -> Result<()> {
        for controller in &mut self.controllers {
            controller.reset(&self.conn, false)?;
        }
        self.preferences.reset();
        info!(confirmed, "Reset all tables and settings");
        Ok(())
    }

    pub fn export(
        &self,
        entities: &[Entity],
        format: ExportFormat,
        destination: &Path,
    ) -> Result<ExportReport> {
        export::export(&self.conn, entities, format, destination)
    }

    /// Replace one table with the contents of a CSV file. The file is parsed
    /// in full first, so a malformed file leaves the table untouched. Once
    /// rows start going in, a failing insert stops the import and the display
    /// shows whatever made it into the store.
    pub fn import(&mut self, path: &Path) -> Result<ImportSummary> {
        let batch = import::parse_file(path)?;
        self.apply_import(&batch)
    }

    pub fn apply_import(&mut self, batch: &ImportBatch) -> Result<ImportSummary> {
        let (conn, controller) = self.split(batch.entity);
        let replaced = controller.reset(conn, false)?;
        let inserted = import::insert_batch(conn, batch);
        controller.reload(conn)?;
        Ok(ImportSummary {
            entity: batch.entity,
            replaced,
            inserted: inserted?,
        })
    }

    fn split(&mut self, entity: Entity) -> (&Connection, &mut EntityController) {
        (&self.conn, &mut self.controllers[entity.index()])
    }
}
