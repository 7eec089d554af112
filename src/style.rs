//! ANSI escape-sequence styling attached to outgoing lines.
//!
//! A [`Style`] renders to `ESC[<fg>;<bg>;<attr>...m` and is emitted verbatim
//! between the token and the line text. The client never interprets the
//! sequence; it exists for downstream viewers that honour console colours.

use std::fmt;

/// Foreground colour codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ForegroundColor {
    #[default]
    Black = 30,
    Red = 31,
    Green = 32,
    Yellow = 33,
    Blue = 34,
    Magenta = 35,
    Cyan = 36,
    White = 37,
}

/// Background colour codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BackgroundColor {
    Black = 40,
    Red = 41,
    Green = 42,
    Yellow = 43,
    Blue = 44,
    Magenta = 45,
    Cyan = 46,
    #[default]
    White = 47,
}

/// Text attribute codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Attribute {
    #[default]
    Normal = 0,
    Bold = 1,
    Dim = 2,
    Underline = 4,
}

impl ForegroundColor {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl BackgroundColor {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Attribute {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Colour and attribute prefix for a line.
///
/// The default style is black on white with the single `Normal` attribute.
/// Supplying attributes through [`Style::with_attributes`] replaces the
/// default list entirely.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Style {
    pub foreground: ForegroundColor,
    pub background: BackgroundColor,
    pub attributes: Vec<Attribute>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            foreground: ForegroundColor::default(),
            background: BackgroundColor::default(),
            attributes: vec![Attribute::Normal],
        }
    }
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_foreground(mut self, foreground: ForegroundColor) -> Self {
        self.foreground = foreground;
        self
    }

    pub fn with_background(mut self, background: BackgroundColor) -> Self {
        self.background = background;
        self
    }

    /// Replace the attribute list.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes = attributes.into_iter().collect();
        self
    }

    /// Render the escape sequence.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\x1b[{};{}",
            self.foreground.code(),
            self.background.code()
        )?;
        for attribute in &self.attributes {
            write!(f, ";{}", attribute.code())?;
        }
        f.write_str("m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_style_renders_black_on_white_normal() {
        assert_eq!(Style::default().render(), "\x1b[30;47;0m");
    }

    #[rstest]
    fn colours_keep_default_attributes() {
        let style = Style::new()
            .with_foreground(ForegroundColor::White)
            .with_background(BackgroundColor::Red);
        assert_eq!(style.render(), "\x1b[37;41;0m");
    }

    #[rstest]
    fn explicit_attributes_replace_normal() {
        let style = Style::new().with_attributes([Attribute::Bold, Attribute::Underline]);
        assert_eq!(style.render(), "\x1b[30;47;1;4m");
    }

    #[rstest]
    fn empty_attribute_list_omits_attribute_segment() {
        let style = Style::new().with_attributes([]);
        assert_eq!(style.render(), "\x1b[30;47m");
    }

    #[rstest]
    #[case(BackgroundColor::Yellow, 43)]
    #[case(BackgroundColor::Blue, 44)]
    #[case(BackgroundColor::Magenta, 45)]
    fn background_codes_are_distinct(#[case] colour: BackgroundColor, #[case] code: u8) {
        assert_eq!(colour.code(), code);
    }
}
