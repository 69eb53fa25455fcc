use std::fs;
use std::mem;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::Frame;

use crate::config::AppConfig;
use crate::display::RowId;
use crate::error::LibraryError;
use crate::library::Library;
use crate::models::Entity;

use super::forms::{
    entity_form_lines, ConfirmDelete, PathPrompt, ResetTarget, SaveAsDialog, SettingsField,
    SettingsForm,
};
use super::helpers::{centered_rect, surface_error};
use super::theme::{Region, Theme};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const TABS_HEIGHT: u16 = 3;

/// The four top-level tabs: one per table plus the settings page.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Tab {
    Records(Entity),
    Settings,
}

impl Tab {
    const ALL: [Tab; 4] = [
        Tab::Records(Entity::Book),
        Tab::Records(Entity::Member),
        Tab::Records(Entity::Transaction),
        Tab::Settings,
    ];

    fn index(self) -> usize {
        match self {
            Tab::Records(entity) => entity.index(),
            Tab::Settings => Entity::ALL.len(),
        }
    }

    fn title(self) -> &'static str {
        match self {
            Tab::Records(entity) => entity.schema().title,
            Tab::Settings => "Settings",
        }
    }

    fn offset(self, delta: isize) -> Tab {
        let len = Tab::ALL.len() as isize;
        Tab::ALL[(self.index() as isize + delta).rem_euclid(len) as usize]
    }
}

/// Fine-grained modes scoped to the current tab.
enum Mode {
    Normal,
    EditingForm,
    EditingSettings,
    ConfirmDelete(ConfirmDelete),
    ConfirmReset(ResetTarget),
    SaveAs(SaveAsDialog),
    Import(PathPrompt),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    config: AppConfig,
    tab: Tab,
    selected: [Option<usize>; 3],
    settings_form: SettingsForm,
    theme: Theme,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(library: Library, config: AppConfig) -> Self {
        let settings_form = SettingsForm::from_preferences(library.preferences());
        Self {
            library,
            config,
            tab: Tab::Records(Entity::Book),
            selected: [None; 3],
            settings_form,
            theme: Theme::new(),
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::EditingForm => self.handle_edit_form(code)?,
            Mode::EditingSettings => self.handle_edit_settings(code)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::ConfirmReset(target) => self.handle_confirm_reset(code, target)?,
            Mode::SaveAs(dialog) => self.handle_save_as(code, dialog)?,
            Mode::Import(prompt) => self.handle_import(code, prompt)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Right => {
                self.tab = self.tab.offset(1);
                self.clear_status();
                return Ok(Mode::Normal);
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.tab = self.tab.offset(-1);
                self.clear_status();
                return Ok(Mode::Normal);
            }
            KeyCode::Char('S') => {
                self.clear_status();
                return Ok(Mode::SaveAs(SaveAsDialog::default()));
            }
            KeyCode::Char('I') => {
                self.clear_status();
                return Ok(Mode::Import(PathPrompt::default()));
            }
            KeyCode::Char('X') => {
                self.clear_status();
                return Ok(Mode::ConfirmReset(ResetTarget::All));
            }
            KeyCode::Char('o') => {
                if let Err(err) = self.open_export_dir() {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        match self.tab {
            Tab::Records(entity) => self.handle_records_key(code, entity),
            Tab::Settings => self.handle_settings_key(code),
        }
    }

    fn handle_records_key(&mut self, code: KeyCode, entity: Entity) -> Result<Mode> {
        match code {
            KeyCode::Up => self.move_selection(entity, -1),
            KeyCode::Down => self.move_selection(entity, 1),
            KeyCode::PageUp => self.move_selection(entity, -10),
            KeyCode::PageDown => self.move_selection(entity, 10),
            KeyCode::Esc => self.selected[entity.index()] = None,
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                self.clear_status();
                return Ok(Mode::EditingForm);
            }
            KeyCode::Char('a') | KeyCode::Char('A') => self.add_record(entity),
            KeyCode::Char('u') | KeyCode::Char('U') => self.update_record(entity),
            KeyCode::Char('d') | KeyCode::Char('D') => {
                let target = self.selected_row(entity).and_then(|row| {
                    let display = self.library.controller(entity).display();
                    display.get(row).map(|shown| (row, shown.key().to_string()))
                });
                match target {
                    Some((row, key)) => {
                        self.clear_status();
                        return Ok(Mode::ConfirmDelete(ConfirmDelete { entity, row, key }));
                    }
                    None => self.set_status(
                        LibraryError::Selection { entity }.to_string(),
                        StatusKind::Error,
                    ),
                }
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.library.controller_mut(entity).clear_form();
                self.set_status("Fields cleared.", StatusKind::Info);
            }
            KeyCode::Char('R') => {
                self.clear_status();
                return Ok(Mode::ConfirmReset(ResetTarget::Entity(entity)));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_settings_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.clear_status();
                return Ok(Mode::EditingSettings);
            }
            KeyCode::Enter => {
                self.apply_settings();
            }
            KeyCode::Char('+') | KeyCode::Up => self.settings_form.increase_size(),
            KeyCode::Char('-') | KeyCode::Down => self.settings_form.decrease_size(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.clear_status();
                return Ok(Mode::ConfirmReset(ResetTarget::Settings));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_edit_form(&mut self, code: KeyCode) -> Result<Mode> {
        let Tab::Records(entity) = self.tab else {
            return Ok(Mode::Normal);
        };
        let form = self.library.controller_mut(entity).form_mut();
        match code {
            KeyCode::Esc | KeyCode::Enter => return Ok(Mode::Normal),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        Ok(Mode::EditingForm)
    }

    fn handle_edit_settings(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Enter => {
                if self.apply_settings() {
                    return Ok(Mode::Normal);
                }
            }
            KeyCode::Tab | KeyCode::BackTab => self.settings_form.toggle_field(),
            KeyCode::Backspace => self.settings_form.backspace(),
            KeyCode::Char(ch) => {
                self.settings_form.push_char(ch);
            }
            _ => {}
        }
        Ok(Mode::EditingSettings)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.library.delete(confirm.entity, Some(confirm.row)) {
                    Ok(()) => {
                        self.selected[confirm.entity.index()] = None;
                        self.set_status(
                            format!("Deleted {} '{}'.", confirm.entity, confirm.key),
                            StatusKind::Info,
                        );
                    }
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_confirm_reset(&mut self, code: KeyCode, target: ResetTarget) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Reset cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_reset(target) {
                    Ok(message) => self.set_status(message, StatusKind::Info),
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmReset(target)),
        }
    }

    fn handle_save_as(&mut self, code: KeyCode, mut dialog: SaveAsDialog) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Save cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Up | KeyCode::BackTab => dialog.previous(),
            KeyCode::Down | KeyCode::Tab => dialog.next(),
            KeyCode::Char(' ') => dialog.toggle(),
            KeyCode::Enter => {
                if !self.save_as(&dialog) {
                    return Ok(Mode::Normal);
                }
            }
            _ => {}
        }
        Ok(Mode::SaveAs(dialog))
    }

    fn handle_import(&mut self, code: KeyCode, mut prompt: PathPrompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Import cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => {
                prompt.input.pop();
                prompt.error = None;
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                prompt.input.push(ch);
                prompt.error = None;
            }
            KeyCode::Enter => {
                let input = prompt.input.trim();
                if input.is_empty() {
                    prompt.error = Some("Enter the path of a CSV file.".to_string());
                    return Ok(Mode::Import(prompt));
                }
                let path = PathBuf::from(input);
                let result = self.library.import(&path);
                // A failed import may still have emptied the table.
                self.selected = [None; 3];
                match result {
                    Ok(summary) => {
                        self.tab = Tab::Records(summary.entity);
                        self.set_status(
                            format!(
                                "Imported {} rows into {} from {}.",
                                summary.inserted,
                                summary.entity.schema().title,
                                path.display()
                            ),
                            StatusKind::Info,
                        );
                        return Ok(Mode::Normal);
                    }
                    Err(err) => {
                        let message = err.to_string();
                        prompt.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            _ => {}
        }
        Ok(Mode::Import(prompt))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(
            Block::default().style(self.theme.style(Region::Window)),
            area,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TABS_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        match self.tab {
            Tab::Records(entity) => self.draw_records(frame, chunks[1], entity),
            Tab::Settings => self.draw_settings(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::ConfirmDelete(confirm) => self.draw_confirm(
                frame,
                area,
                "Confirm Delete",
                format!("Delete {} '{}'?", confirm.entity, confirm.key),
            ),
            Mode::ConfirmReset(target) => {
                self.draw_confirm(frame, area, "Confirm Reset", target.warning())
            }
            Mode::SaveAs(dialog) => self.draw_save_as(frame, area, dialog),
            Mode::Import(prompt) => self.draw_import(frame, area, prompt),
            Mode::Normal | Mode::EditingForm | Mode::EditingSettings => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles = Tab::ALL.iter().map(|tab| Line::from(tab.title()));
        let tabs = Tabs::new(titles)
            .select(self.tab.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Library Management System"),
            )
            .style(self.theme.style(Region::Tabs))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_records(&self, frame: &mut Frame, area: Rect, entity: Entity) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        let schema = entity.schema();
        let controller = self.library.controller(entity);

        let header = Row::new(schema.headings().into_iter().map(Cell::from))
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = controller
            .display()
            .iter()
            .map(|row| Row::new(row.cells.iter().cloned().map(Cell::from)));
        let width_count = schema.columns.len() as u32;
        let widths = vec![Constraint::Ratio(1, width_count); schema.columns.len()];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{} ({})", schema.title, controller.display().len())),
            )
            .style(self.theme.style(Region::Table))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = TableState::default().with_selected(self.selected[entity.index()]);
        frame.render_stateful_widget(table, columns[0], &mut state);

        let editing = matches!(self.mode, Mode::EditingForm);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(if editing { "Details (editing)" } else { "Details" })
            .style(self.theme.style(Region::Form));
        let inner = block.inner(columns[1]);
        frame.render_widget(block, columns[1]);

        let form = controller.form();
        let paragraph = Paragraph::new(entity_form_lines(form, editing));
        frame.render_widget(paragraph, inner);

        if editing {
            let active = form.active();
            let heading = schema.columns[active].heading;
            let prefix = heading.chars().count() as u16 + 2;
            let cursor_x = inner.x + prefix + form.value(active).chars().count() as u16;
            let cursor_y = inner.y + active as u16;
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn draw_settings(&self, frame: &mut Frame, area: Rect) {
        let editing = matches!(self.mode, Mode::EditingSettings);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Settings")
            .style(self.theme.style(Region::Settings));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let preferences = self.library.preferences();
        let mut lines = self.settings_form.lines(editing);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Current: background {}, font {}",
                preferences.background(),
                preferences.font()
            ),
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if editing {
            let (prefix, row) = match self.settings_form.active {
                SettingsField::Background => ("Background Color: ", 0),
                SettingsField::FontFamily => ("Font Style: ", 1),
            };
            let cursor_x =
                inner.x + prefix.len() as u16 + self.settings_form.value_len() as u16;
            frame.set_cursor_position((cursor_x, inner.y + row));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let mut block = Block::default()
            .borders(Borders::TOP)
            .style(self.theme.style(Region::Footer));
        if let Some(font) = self.theme.font() {
            block = block.title(format!("Font: {font}"));
        }
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&'static str, &'static str)] = match (&self.mode, self.tab) {
            (Mode::EditingForm, _) => &[
                ("[Tab]", " Next field   "),
                ("[Backspace]", " Delete   "),
                ("[Enter/Esc]", " Done"),
            ],
            (Mode::EditingSettings, _) => &[
                ("[Tab]", " Switch field   "),
                ("[Enter]", " Apply   "),
                ("[Esc]", " Done"),
            ],
            (Mode::ConfirmDelete(_), _) | (Mode::ConfirmReset(_), _) => {
                &[("[Y]", " Confirm   "), ("[N/Esc]", " Cancel")]
            }
            (Mode::SaveAs(_), _) => &[
                ("[↑↓]", " Navigate   "),
                ("[Space]", " Select   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            (Mode::Import(_), _) => &[("[Enter]", " Import   "), ("[Esc]", " Cancel")],
            (Mode::Normal, Tab::Settings) => &[
                ("[e]", " Edit   "),
                ("[+/-]", " Font size   "),
                ("[Enter]", " Apply   "),
                ("[r]", " Reset   "),
                ("[Tab]", " Switch tab   "),
                ("[q]", " Quit"),
            ],
            (Mode::Normal, Tab::Records(_)) => &[
                ("[↑↓]", " Select   "),
                ("[e]", " Edit   "),
                ("[a]", " Add   "),
                ("[u]", " Update   "),
                ("[d]", " Delete   "),
                ("[c]", " Clear   "),
                ("[R]", " Reset   "),
                ("[S]", " Save As   "),
                ("[I]", " Import   "),
                ("[X]", " Reset all   "),
                ("[o]", " Open exports   "),
                ("[q]", " Quit"),
            ],
        };

        Line::from(
            keys.iter()
                .flat_map(|(key, label)| {
                    [Span::styled(*key, key_style), Span::raw(*label)]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, question: String) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(question),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_save_as(&self, frame: &mut Frame, area: Rect, dialog: &SaveAsDialog) {
        let popup_area = centered_rect(50, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Save As").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = dialog.lines();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Files are written to {}", self.config.export_dir.display()),
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn draw_import(&self, frame: &mut Frame, area: Rect, prompt: &PathPrompt) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Import CSV").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![Line::from(format!("Path: {}", prompt.input)), Line::from("")];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "The header row decides which table is replaced.",
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let cursor_x = inner.x + "Path: ".len() as u16 + prompt.input.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// Row id behind the highlighted table row, if it still exists.
    fn selected_row(&self, entity: Entity) -> Option<RowId> {
        let idx = self.selected[entity.index()]?;
        self.library
            .controller(entity)
            .display()
            .nth(idx)
            .map(|row| row.id)
    }

    fn move_selection(&mut self, entity: Entity, offset: isize) {
        let len = self.library.controller(entity).display().len();
        let slot = &mut self.selected[entity.index()];
        if len == 0 {
            *slot = None;
            return;
        }
        let next = match *slot {
            Some(current) => (current as isize + offset).clamp(0, len as isize - 1) as usize,
            None if offset < 0 => len - 1,
            None => 0,
        };
        *slot = Some(next);
        if let Some(row) = self.selected_row(entity) {
            self.library.controller_mut(entity).select(row);
        }
    }

    fn add_record(&mut self, entity: Entity) {
        match self.library.add(entity) {
            Ok(row) => {
                let key = self
                    .library
                    .controller(entity)
                    .display()
                    .get(row)
                    .map(|row| row.key().to_string())
                    .unwrap_or_default();
                self.set_status(format!("Added {entity} '{key}'."), StatusKind::Info);
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn update_record(&mut self, entity: Entity) {
        let selection = self.selected_row(entity);
        match self.library.update(entity, selection) {
            Ok(()) => self.set_status(format!("Updated {entity}."), StatusKind::Info),
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn perform_reset(&mut self, target: ResetTarget) -> Result<String> {
        match target {
            ResetTarget::Entity(entity) => {
                let removed = self.library.reset(entity, true)?;
                self.selected[entity.index()] = None;
                Ok(format!(
                    "Reset Successfully! Removed {removed} {}.",
                    entity.schema().title.to_lowercase()
                ))
            }
            ResetTarget::Settings => {
                self.library.preferences_mut().reset();
                self.refresh_settings();
                Ok("Settings reset to defaults.".to_string())
            }
            ResetTarget::All => {
                self.library
                    .reset_all(true)
                    .context("failed to reset the library")?;
                self.selected = [None; 3];
                self.refresh_settings();
                Ok("Reset Successfully!".to_string())
            }
        }
    }

    /// Copy the settings form into the preferences and re-theme the window.
    /// Returns false when the inputs were rejected.
    fn apply_settings(&mut self) -> bool {
        match self.settings_form.apply_to(self.library.preferences_mut()) {
            Ok(()) => {
                let summary = self.theme.apply(self.library.preferences());
                let preferences = self.library.preferences();
                let message = format!(
                    "Settings applied: background {} on {} panels, font {}.",
                    preferences.background(),
                    summary.colored,
                    preferences.font()
                );
                self.set_status(message, StatusKind::Info);
                true
            }
            Err(err) => {
                self.set_status(err.to_string(), StatusKind::Error);
                false
            }
        }
    }

    fn refresh_settings(&mut self) {
        self.settings_form = SettingsForm::from_preferences(self.library.preferences());
        self.theme.apply(self.library.preferences());
    }

    /// Run the export. Returns true when the dialog should stay open.
    fn save_as(&mut self, dialog: &SaveAsDialog) -> bool {
        let entities = dialog.selected_entities();
        let result = self
            .library
            .export(&entities, dialog.format, &self.config.export_dir);
        match result {
            Ok(report) if report.succeeded() => {
                let message = format!(
                    "Data saved successfully to {}.",
                    self.config.export_dir.display()
                );
                self.set_status(message, StatusKind::Info);
                false
            }
            Ok(report) => {
                let failures = report
                    .failures()
                    .map(|err| err.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                self.set_status(
                    format!("Failed to save some data. {failures}"),
                    StatusKind::Error,
                );
                false
            }
            Err(err @ LibraryError::NoSelection) => {
                self.set_status(err.to_string(), StatusKind::Error);
                true
            }
            Err(err) => {
                self.set_status(err.to_string(), StatusKind::Error);
                false
            }
        }
    }

    fn open_export_dir(&mut self) -> Result<()> {
        let dir = &self.config.export_dir;
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        open_link(dir).with_context(|| format!("failed to open {}", dir.display()))?;
        self.set_status(
            format!("Opened {}.", self.config.export_dir.display()),
            StatusKind::Info,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{export_path, ExportFormat};
    use crate::settings::Rgb;
    use tempfile::TempDir;

    fn app() -> (App, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::in_dir(dir.path());
        (App::new(Library::in_memory().unwrap(), config), dir)
    }

    fn press(app: &mut App, code: KeyCode) {
        assert!(!app.handle_key(code).unwrap());
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn status(app: &App) -> &str {
        app.status.as_ref().map(|s| s.text.as_str()).unwrap_or_default()
    }

    fn add_book(app: &mut App, fields: [&str; 5]) {
        press(app, KeyCode::Char('e'));
        for (idx, field) in fields.iter().enumerate() {
            if idx > 0 {
                press(app, KeyCode::Tab);
            }
            type_text(app, field);
        }
        press(app, KeyCode::Enter);
        press(app, KeyCode::Char('a'));
    }

    #[test]
    fn test_add_book_through_keys() {
        let (mut app, _dir) = app();
        add_book(&mut app, ["1984", "Orwell", "Fiction", "3", "3"]);

        let display = app.library().controller(Entity::Book).display();
        assert_eq!(display.len(), 1);
        assert_eq!(
            display.nth(0).unwrap().cells,
            vec!["1984", "Orwell", "Fiction", "3", "3"]
        );
        assert_eq!(status(&app), "Added book '1984'.");
        assert!(app.library().controller(Entity::Book).form().is_blank());
    }

    #[test]
    fn test_empty_form_reports_required_fields() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(status(&app), "All fields are required, please try again!");
        assert!(app.library().controller(Entity::Book).display().is_empty());
    }

    #[test]
    fn test_delete_needs_selection_then_confirmation() {
        let (mut app, _dir) = app();
        add_book(&mut app, ["Dune", "Herbert", "SF", "2", "1"]);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(status(&app), "You must select a book!");

        press(&mut app, KeyCode::Down);
        assert_eq!(app.library().controller(Entity::Book).form().value(0), "Dune");
        press(&mut app, KeyCode::Char('d'));
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.library().controller(Entity::Book).display().is_empty());
        assert_eq!(app.selected[0], None);
    }

    #[test]
    fn test_save_as_without_entities_keeps_dialog_open() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('S'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(status(&app), "No data selected to save.");
        assert!(matches!(app.mode, Mode::SaveAs(_)));
    }

    #[test]
    fn test_save_books_as_spreadsheet() {
        let (mut app, _dir) = app();
        add_book(&mut app, ["Emma", "Austen", "Classic", "1", "1"]);

        press(&mut app, KeyCode::Char('S'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char(' '));
        for _ in 0..3 {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert!(status(&app).starts_with("Data saved successfully"));
        let path = export_path(&app.config.export_dir, Entity::Book, ExportFormat::Spreadsheet);
        assert!(path.is_file());
    }

    #[test]
    fn test_apply_settings_from_settings_tab() {
        let (mut app, _dir) = app();
        for _ in 0..3 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.tab, Tab::Settings);

        press(&mut app, KeyCode::Char('e'));
        for _ in 0..7 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "#000000");
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(
            app.library().preferences().background(),
            Rgb { r: 0, g: 0, b: 0 }
        );
        assert_eq!(
            app.theme.style(Region::Table),
            Style::default().bg(Color::Rgb(0, 0, 0)).fg(Color::White)
        );
    }

    #[test]
    fn test_bad_color_keeps_settings_editing() {
        let (mut app, _dir) = app();
        app.tab = Tab::Settings;
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "zz");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::EditingSettings));
        assert!(status(&app).contains("is not a #RRGGBB color"));
        assert_eq!(app.library().preferences().background(), Rgb::WHITE);
    }

    #[test]
    fn test_reset_all_after_confirmation() {
        let (mut app, _dir) = app();
        add_book(&mut app, ["Emma", "Austen", "Classic", "1", "1"]);
        press(&mut app, KeyCode::Char('X'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.library().controller(Entity::Book).display().len(), 1);

        press(&mut app, KeyCode::Char('X'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.library().controller(Entity::Book).display().is_empty());
        assert_eq!(status(&app), "Reset Successfully!");
    }

    #[test]
    fn test_quit() {
        let (mut app, _dir) = app();
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}
