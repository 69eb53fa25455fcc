use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::display::RowId;
use crate::error::Result;
use crate::export::ExportFormat;
use crate::form::EntityForm;
use crate::models::Entity;
use crate::settings::{Rgb, UiPreferences, MAX_FONT_SIZE, MIN_FONT_SIZE};

/// Render one line per form field, highlighting the focused one while the
/// form is being edited.
pub(crate) fn entity_form_lines(form: &EntityForm, editing: bool) -> Vec<Line<'static>> {
    form.entity()
        .schema()
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let active = editing && form.active() == idx;
            build_line(column.heading, form.value(idx), active)
        })
        .collect()
}

/// Render a `Label: value` line, greying out empty values.
pub(crate) fn build_line(field_name: &str, value: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Editable copy of the presentation preferences shown on the settings tab.
#[derive(Clone)]
pub(crate) struct SettingsForm {
    pub(crate) background: String,
    pub(crate) font_family: String,
    pub(crate) font_size: u8,
    pub(crate) active: SettingsField,
}

/// Text fields of the settings form. The font size is adjusted with +/-.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SettingsField {
    #[default]
    Background,
    FontFamily,
}

impl SettingsForm {
    pub(crate) fn from_preferences(preferences: &UiPreferences) -> Self {
        Self {
            background: preferences.background().to_string(),
            font_family: preferences.font_family().to_string(),
            font_size: preferences.font_size(),
            active: SettingsField::Background,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            SettingsField::Background => SettingsField::FontFamily,
            SettingsField::FontFamily => SettingsField::Background,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            SettingsField::Background => self.background.push(ch),
            SettingsField::FontFamily => self.font_family.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SettingsField::Background => {
                self.background.pop();
            }
            SettingsField::FontFamily => {
                self.font_family.pop();
            }
        }
    }

    pub(crate) fn increase_size(&mut self) {
        self.font_size = (self.font_size + 1).min(MAX_FONT_SIZE);
    }

    pub(crate) fn decrease_size(&mut self) {
        self.font_size = self.font_size.saturating_sub(1).max(MIN_FONT_SIZE);
    }

    /// Validate and copy the inputs into `preferences`. Nothing changes if the
    /// color does not parse.
    pub(crate) fn apply_to(&self, preferences: &mut UiPreferences) -> Result<()> {
        let color = Rgb::parse(&self.background)?;
        preferences.set_background(color);
        preferences.set_font_family(&self.font_family);
        preferences.set_font_size(self.font_size);
        Ok(())
    }

    pub(crate) fn lines(&self, editing: bool) -> Vec<Line<'static>> {
        vec![
            build_line(
                "Background Color",
                &self.background,
                editing && self.active == SettingsField::Background,
            ),
            build_line(
                "Font Style",
                &self.font_family,
                editing && self.active == SettingsField::FontFamily,
            ),
            build_line("Font Size", &self.font_size.to_string(), false),
        ]
    }

    /// Character length of the focused text field.
    pub(crate) fn value_len(&self) -> usize {
        match self.active {
            SettingsField::Background => self.background.chars().count(),
            SettingsField::FontFamily => self.font_family.chars().count(),
        }
    }
}

/// State of the Save As dialog: one radio group of formats followed by one
/// checkbox per entity, navigated with a single cursor.
#[derive(Clone)]
pub(crate) struct SaveAsDialog {
    pub(crate) format: ExportFormat,
    pub(crate) entities: [bool; 3],
    pub(crate) cursor: usize,
}

impl Default for SaveAsDialog {
    fn default() -> Self {
        Self {
            format: ExportFormat::NativeDb,
            entities: [false; 3],
            cursor: 0,
        }
    }
}

impl SaveAsDialog {
    const ITEM_COUNT: usize = ExportFormat::ALL.len() + Entity::ALL.len();

    pub(crate) fn next(&mut self) {
        self.cursor = (self.cursor + 1) % Self::ITEM_COUNT;
    }

    pub(crate) fn previous(&mut self) {
        self.cursor = (self.cursor + Self::ITEM_COUNT - 1) % Self::ITEM_COUNT;
    }

    /// Pick the format under the cursor, or flip the entity checkbox.
    pub(crate) fn toggle(&mut self) {
        match ExportFormat::ALL.get(self.cursor) {
            Some(format) => self.format = *format,
            None => {
                let idx = self.cursor - ExportFormat::ALL.len();
                self.entities[idx] = !self.entities[idx];
            }
        }
    }

    pub(crate) fn selected_entities(&self) -> Vec<Entity> {
        Entity::ALL
            .into_iter()
            .filter(|entity| self.entities[entity.index()])
            .collect()
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        let cursor_style = Style::default().fg(Color::Yellow);
        let mut lines = vec![Line::from("Save Format")];
        for (idx, format) in ExportFormat::ALL.iter().enumerate() {
            let mark = if *format == self.format { "(*)" } else { "( )" };
            let text = format!("  {mark} {format}");
            lines.push(if self.cursor == idx {
                Line::from(Span::styled(text, cursor_style))
            } else {
                Line::from(text)
            });
        }
        lines.push(Line::from(""));
        lines.push(Line::from("Select Data to Save"));
        for entity in Entity::ALL {
            let idx = ExportFormat::ALL.len() + entity.index();
            let mark = if self.entities[entity.index()] { "[x]" } else { "[ ]" };
            let text = format!("  {mark} {}", entity.schema().title);
            lines.push(if self.cursor == idx {
                Line::from(Span::styled(text, cursor_style))
            } else {
                Line::from(text)
            });
        }
        lines
    }
}

/// Free-text path input for the import prompt.
#[derive(Default, Clone)]
pub(crate) struct PathPrompt {
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

/// Pending delete awaiting a yes/no answer.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) entity: Entity,
    pub(crate) row: RowId,
    pub(crate) key: String,
}

/// What a confirmed reset wipes.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum ResetTarget {
    Entity(Entity),
    Settings,
    All,
}

impl ResetTarget {
    pub(crate) fn warning(&self) -> String {
        match self {
            ResetTarget::Entity(entity) => format!(
                "This action will delete all {entity}'s data. Do you want to proceed?"
            ),
            ResetTarget::Settings => {
                "This action will reset all settings to default. Do you want to proceed?"
                    .to_string()
            }
            ResetTarget::All => "This action will reset everything to default and cannot be \
                                 undone. Do you want to proceed?"
                .to_string(),
        }
    }
}
