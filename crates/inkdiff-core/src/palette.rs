//! Color roles and their terminal styles

use anstyle::{AnsiColor, Reset, Style};
use serde::{Deserialize, Serialize};

/// Cancels all active styling
pub const RESET: &str = "\x1b[0m";

/// The fixed palette colors can be picked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl From<PaletteColor> for AnsiColor {
    fn from(color: PaletteColor) -> Self {
        match color {
            PaletteColor::Red => AnsiColor::Red,
            PaletteColor::Green => AnsiColor::Green,
            PaletteColor::Yellow => AnsiColor::Yellow,
            PaletteColor::Blue => AnsiColor::Blue,
            PaletteColor::Magenta => AnsiColor::Magenta,
            PaletteColor::Cyan => AnsiColor::Cyan,
        }
    }
}

/// Semantic color treatment for a run of tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Removed content that has no counterpart on the added side
    DeletedChanged,
    /// Removed content that also appears on the added side
    DeletedUnchanged,
    /// Added content that has no counterpart on the removed side
    InsertedChanged,
    /// Added content that also appears on the removed side
    InsertedUnchanged,
}

/// Text style plus the style used for spaces right before a line break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleStyle {
    pub text: Style,
    pub trailing_space: Style,
}

impl RoleStyle {
    /// Escape sequence that switches to the text style
    pub fn text_escape(&self) -> String {
        escape(self.text)
    }

    /// Escape sequence that switches to the trailing-space style
    pub fn trailing_space_escape(&self) -> String {
        escape(self.trailing_space)
    }
}

/// Each escape starts from a clean slate, so going from a bold role to a
/// plain one never keeps the bold attribute.
fn escape(style: Style) -> String {
    format!("{}{}", Reset.render(), style.render())
}

/// Resolves roles to styles. Deletions and insertions each get one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub deleted: PaletteColor,
    pub inserted: PaletteColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            deleted: PaletteColor::Red,
            inserted: PaletteColor::Blue,
        }
    }
}

impl Palette {
    pub fn new(deleted: PaletteColor, inserted: PaletteColor) -> Self {
        Self { deleted, inserted }
    }

    pub fn style(&self, role: Role) -> RoleStyle {
        match role {
            Role::DeletedChanged => changed(self.deleted),
            Role::DeletedUnchanged => unchanged(self.deleted),
            Role::InsertedChanged => changed(self.inserted),
            Role::InsertedUnchanged => unchanged(self.inserted),
        }
    }
}

fn changed(color: PaletteColor) -> RoleStyle {
    RoleStyle {
        text: AnsiColor::from(color).on_default().bold(),
        trailing_space: background(color),
    }
}

fn unchanged(color: PaletteColor) -> RoleStyle {
    RoleStyle {
        text: AnsiColor::from(color).on_default(),
        trailing_space: background(color),
    }
}

fn background(color: PaletteColor) -> Style {
    Style::new().bg_color(Some(AnsiColor::from(color).into()))
}
