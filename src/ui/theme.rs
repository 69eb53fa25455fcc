use ratatui::style::{Color, Style};

use crate::settings::{render, FontSpec, RenderSummary, Rgb, UiPreferences, VisualNode};

/// Screen regions that can be themed.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Region {
    Window,
    Tabs,
    Table,
    Form,
    Settings,
    Footer,
}

/// One themed region of the terminal UI. Every panel takes the background
/// color. Terminals cannot switch fonts, so only the footer accepts one: it
/// echoes the active font back to the user.
pub(crate) struct Panel {
    region: Region,
    accepts_font: bool,
    background: Option<Rgb>,
    font: Option<FontSpec>,
    children: Vec<Panel>,
}

impl Panel {
    fn new(region: Region, accepts_font: bool, children: Vec<Panel>) -> Self {
        Self {
            region,
            accepts_font,
            background: None,
            font: None,
            children,
        }
    }

    fn find(&self, region: Region) -> Option<&Panel> {
        if self.region == region {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(region))
    }
}

impl VisualNode for Panel {
    fn try_set_color(&mut self, color: Rgb) -> bool {
        self.background = Some(color);
        true
    }

    fn try_set_font(&mut self, font: &FontSpec) -> bool {
        if self.accepts_font {
            self.font = Some(font.clone());
        }
        self.accepts_font
    }

    fn children_mut(&mut self) -> Vec<&mut dyn VisualNode> {
        self.children
            .iter_mut()
            .map(|child| child as &mut dyn VisualNode)
            .collect()
    }
}

/// The window tree. Until the user applies settings for the first time the
/// terminal's own colors are used.
pub(crate) struct Theme {
    root: Panel,
}

impl Theme {
    pub(crate) fn new() -> Self {
        let root = Panel::new(
            Region::Window,
            false,
            vec![
                Panel::new(Region::Tabs, false, Vec::new()),
                Panel::new(Region::Table, false, Vec::new()),
                Panel::new(Region::Form, false, Vec::new()),
                Panel::new(Region::Settings, false, Vec::new()),
                Panel::new(Region::Footer, true, Vec::new()),
            ],
        );
        Self { root }
    }

    pub(crate) fn apply(&mut self, preferences: &UiPreferences) -> RenderSummary {
        render(&mut self.root, preferences)
    }

    /// Background plus a readable foreground for `region`.
    pub(crate) fn style(&self, region: Region) -> Style {
        match self.root.find(region).and_then(|panel| panel.background) {
            Some(color) => {
                let fg = if color.is_light() {
                    Color::Black
                } else {
                    Color::White
                };
                Style::default().bg(to_color(color)).fg(fg)
            }
            None => Style::default(),
        }
    }

    /// Font recorded by the last render, if any node accepted one.
    pub(crate) fn font(&self) -> Option<&FontSpec> {
        self.root
            .find(Region::Footer)
            .and_then(|panel| panel.font.as_ref())
    }
}

fn to_color(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
