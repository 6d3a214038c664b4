//! Error plumbing for binaries: a catch-all error type recording where it was
//! raised, and a report printing the whole source chain.

use core::{error::Error, fmt};

use ansi_term::{Color, ColorChoice};
use snafu::{GenerateImplicitData, Snafu};

/// The source location an error was created at.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location(&'static core::panic::Location<'static>);

impl Default for Location {
    #[track_caller]
    fn default() -> Self {
        Self(core::panic::Location::caller())
    }
}

impl GenerateImplicitData for Location {
    #[track_caller]
    fn generate() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Location {
    #[must_use]
    pub fn file(&self) -> &'static str {
        self.0.file()
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.0.line()
    }
}

/// An error carrying a message, the location it was raised at and an
/// optional source.
///
/// Created with [`snafu::whatever!`] or the `whatever_context` adapters.
#[derive(Debug, Snafu)]
#[snafu(whatever, display("{message}"))]
pub struct GenericError {
    message: String,
    #[snafu(implicit)]
    location: Location,
    #[snafu(source(from(Box<dyn Error>, Some)))]
    source: Option<Box<dyn Error>>,
}

impl GenericError {
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

fn location_of(error: &(dyn Error + 'static)) -> Option<Location> {
    error.downcast_ref::<GenericError>().map(GenericError::location)
}

/// Prints an error, its location and its sources, one per line.
pub struct Report<E> {
    error: E,
    color: ColorChoice,
}

impl<E> fmt::Debug for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<E> fmt::Display for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = self.color;
        writeln!(f, "Error: {}", color.paint(Color::Red, &self.error))?;
        if let Some(loc) = location_of(&self.error) {
            writeln!(f, "  at {}", color.paint(Color::DarkGray, loc))?;
        }
        let mut source = self.error.source();
        if source.is_some() {
            writeln!(f)?;
            writeln!(f, "Caused by:")?;
        }
        let mut index = 0;
        while let Some(s) = source {
            writeln!(f, "{index:4}: {}", color.paint(Color::Red, s))?;
            if let Some(loc) = location_of(s) {
                writeln!(f, "      at {}", color.paint(Color::DarkGray, loc))?;
            }
            source = s.source();
            index += 1;
        }
        Ok(())
    }
}

impl<E> Report<E> {
    /// Creates a report printed without colours.
    pub fn new(error: E) -> Self {
        Self {
            error,
            color: ColorChoice::Never,
        }
    }

    #[must_use]
    pub fn with_color(self, color: ColorChoice) -> Self {
        Self { color, ..self }
    }

    pub fn error(&self) -> &E {
        &self.error
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use snafu::{ResultExt as _, whatever};

    use super::*;

    fn fails_with_source() -> Result<(), GenericError> {
        Err(io::Error::from(io::ErrorKind::NotFound)).whatever_context("could not open device")
    }

    fn fails_nested() -> Result<(), GenericError> {
        fails_with_source().whatever_context("failed to sweep, path=/dev/null")
    }

    #[test]
    fn test_generic_error_message_and_location() {
        fn fails() -> Result<(), GenericError> {
            whatever!("bad value {}", 3)
        }
        let err = fails().unwrap_err();
        assert_eq!(err.message(), "bad value 3");
        assert_eq!(err.to_string(), "bad value 3");
        assert_eq!(err.location().file(), file!());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_report_lists_sources() {
        let report = Report::new(fails_nested().unwrap_err()).to_string();
        let lines = report.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Error: failed to sweep, path=/dev/null");
        assert!(lines[1].starts_with("  at "));
        assert!(lines[1].contains(file!()));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Caused by:");
        assert_eq!(lines[4], "   0: could not open device");
        assert!(lines[5].starts_with("      at "));
        assert!(lines[6].starts_with("   1: "));
        assert!(!report.contains('\x1B'));
    }

    #[test]
    fn test_report_with_color() {
        let report = Report::new(fails_with_source().unwrap_err())
            .with_color(ColorChoice::Always)
            .to_string();
        assert!(report.starts_with("Error: \x1B[31;1mcould not open device\x1B[0m\n"));
    }
}
