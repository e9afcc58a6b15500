//! The 16-color terminal palette.

use crossterm::style;

/// Palette colors accepted by the renderer and by lexer tokens.
/// `DefaultColor` keeps whatever the terminal currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    DefaultColor,
    Black,
    DarkRed,
    DarkGreen,
    Brown,
    DarkBlue,
    Purple,
    Cyan,
    LightGray,
    DarkGray,
    Red,
    Green,
    Yellow,
    Blue,
    Fuchsia,
    Turquoise,
    White,
}

impl From<Color> for style::Color {
    fn from(c: Color) -> Self {
        match c {
            Color::DefaultColor => style::Color::Reset,
            Color::Black => style::Color::Black,
            Color::DarkRed => style::Color::DarkRed,
            Color::DarkGreen => style::Color::DarkGreen,
            Color::Brown => style::Color::DarkYellow,
            Color::DarkBlue => style::Color::DarkBlue,
            Color::Purple => style::Color::DarkMagenta,
            Color::Cyan => style::Color::DarkCyan,
            Color::LightGray => style::Color::Grey,
            Color::DarkGray => style::Color::DarkGrey,
            Color::Red => style::Color::Red,
            Color::Green => style::Color::Green,
            Color::Yellow => style::Color::Yellow,
            Color::Blue => style::Color::Blue,
            Color::Fuchsia => style::Color::Magenta,
            Color::Turquoise => style::Color::Cyan,
            Color::White => style::Color::White,
        }
    }
}
