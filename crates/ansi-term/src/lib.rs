//! Minimal ANSI colouring for terminal output.
//!
//! Colouring is decided once per output stream with [`ColorChoice`] and passed
//! down to the formatting helpers, so that output redirected to a file or a
//! pipe stays free of escape sequences.

use core::fmt;
use std::{env, io::IsTerminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    DarkGray,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Default,
}

impl Color {
    fn fg(self) -> u8 {
        match self {
            Self::DarkGray => 90,
            Self::Red => 31,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Magenta => 35,
            Self::Cyan => 36,
            Self::Default => 39,
        }
    }
}

/// Whether escape sequences are written to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    Always,
    #[default]
    Never,
}

impl ColorChoice {
    /// Colours `stream` if it is a terminal and `NO_COLOR` is unset or empty.
    pub fn detect<S>(stream: &S) -> Self
    where
        S: IsTerminal,
    {
        let no_color = env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if stream.is_terminal() && !no_color {
            Self::Always
        } else {
            Self::Never
        }
    }

    /// Wraps `value` so that it is printed in bold `color` when colouring is
    /// enabled.
    pub fn paint<T>(self, color: Color, value: T) -> WithFg<T> {
        match self {
            Self::Always => WithFg::new(color, value),
            Self::Never => WithFg::plain(value),
        }
    }
}

/// A value printed with a foreground colour.
pub struct WithFg<T> {
    color: Option<Color>,
    value: T,
}

impl<T> fmt::Display for WithFg<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = &self.value;
        match self.color {
            Some(color) => {
                let fg = color.fg();
                write!(f, "\x1B[{fg};1m{value}\x1B[0m")
            }
            None => write!(f, "{value}"),
        }
    }
}

impl<T> WithFg<T> {
    pub fn new(color: Color, value: T) -> Self {
        Self {
            color: Some(color),
            value,
        }
    }

    /// Wraps `value` without colouring it.
    pub fn plain(value: T) -> Self {
        Self { color: None, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint() {
        let painted = ColorChoice::Always.paint(Color::Red, "oops").to_string();
        assert_eq!(painted, "\x1B[31;1moops\x1B[0m");
        let gray = WithFg::new(Color::DarkGray, 3).to_string();
        assert_eq!(gray, "\x1B[90;1m3\x1B[0m");
        assert_eq!(ColorChoice::Never.paint(Color::Red, "oops").to_string(), "oops");
    }
}
