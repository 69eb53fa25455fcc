//! Ratatui front-end: one tab per table plus a settings page, with modal
//! dialogs for confirmations, Save As and CSV import.

mod app;
mod forms;
mod helpers;
mod terminal;
mod theme;

pub use app::App;
pub use terminal::run_app;
