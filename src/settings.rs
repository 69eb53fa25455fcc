//! Presentation preferences. They live only in memory: every start begins from
//! the hardcoded defaults below.

use std::fmt;

use crate::error::{LibraryError, Result};

pub const DEFAULT_FONT_FAMILY: &str = "default";
pub const DEFAULT_FONT_SIZE: u8 = 10;
pub const MIN_FONT_SIZE: u8 = 8;
pub const MAX_FONT_SIZE: u8 = 20;

/// 24-bit color as picked in the settings tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    };

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn parse(input: &str) -> Result<Self> {
        let hex = input.trim().trim_start_matches('#');
        let invalid =
            || LibraryError::Validation(format!("'{}' is not a #RRGGBB color.", input.trim()));
        if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Whether dark text reads better on top of this color.
    pub fn is_light(&self) -> bool {
        let luma = 299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b);
        luma >= 128 * 1000
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub family: String,
    pub size: u8,
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}pt", self.family, self.size)
    }
}

/// Background color, font family and font size applied across the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiPreferences {
    background: Rgb,
    font_family: String,
    font_size: u8,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            background: Rgb::WHITE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl UiPreferences {
    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            size: self.font_size,
        }
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }

    /// Blank input falls back to the platform default family.
    pub fn set_font_family(&mut self, family: &str) {
        let family = family.trim();
        self.font_family = if family.is_empty() {
            DEFAULT_FONT_FAMILY.to_string()
        } else {
            family.to_string()
        };
    }

    /// Sizes outside 8..=20 are clamped.
    pub fn set_font_size(&mut self, size: u8) {
        self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    }

    /// Restore the three defaults. Callers re-render afterwards.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A visual component that may accept a background color, a font, or
/// neither. Unsupported properties return `false` and are skipped.
pub trait VisualNode {
    fn try_set_color(&mut self, _color: Rgb) -> bool {
        false
    }

    fn try_set_font(&mut self, _font: &FontSpec) -> bool {
        false
    }

    fn children_mut(&mut self) -> Vec<&mut dyn VisualNode> {
        Vec::new()
    }
}

/// How many nodes accepted each property during a render pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub colored: usize,
    pub fonted: usize,
}

/// Apply `visit` to every node of the tree, depth-first, parent before
/// children.
pub fn walk(node: &mut dyn VisualNode, visit: &mut dyn FnMut(&mut dyn VisualNode)) {
    visit(&mut *node);
    for child in node.children_mut() {
        walk(child, visit);
    }
}

/// Push the preferences onto every node that supports them.
pub fn render(tree: &mut dyn VisualNode, preferences: &UiPreferences) -> RenderSummary {
    let color = preferences.background();
    let font = preferences.font();
    let mut summary = RenderSummary::default();
    walk(tree, &mut |node: &mut dyn VisualNode| {
        if node.try_set_color(color) {
            summary.colored += 1;
        }
        if node.try_set_font(&font) {
            summary.fonted += 1;
        }
    });
    summary
}
