//! Fatal script errors.
//!
//! Every fatal condition raised while reading, substituting or executing a
//! script is a [`ScriptError`].  Errors carry the statement location once
//! they have unwound through the dispatcher, and render in the multi-line
//! style users of build-description languages expect:
//!
//! ```text
//! CMake Error at CMakeLists.txt:12 (message):
//!   something went wrong
//! ```

use std::fmt;

use thiserror::Error;

/// Broad classification of a [`ScriptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated `${`, runaway substitution, malformed conditions.
    Syntax,
    /// A single-value keyword was given more than one value.
    Scope,
    /// Terminator without opener, unclosed block, policy stack underflow.
    Structural,
    /// Unknown command or runaway recursion.
    Dispatch,
    /// Raised by a command about its own inputs (`message(FATAL_ERROR)`,
    /// failed `REQUIRED` searches, unknown targets).
    Domain,
    /// Bad `RANGE` bounds or steps.
    Numeric,
    /// A located file could not be read.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::Scope => "scope",
            ErrorKind::Structural => "structural",
            ErrorKind::Dispatch => "dispatch",
            ErrorKind::Domain => "domain",
            ErrorKind::Numeric => "numeric",
            ErrorKind::Io => "io",
        };
        f.write_str(s)
    }
}

/// Where a statement came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub command: String,
}

/// A fatal error that aborts the whole evaluation.
#[derive(Debug, Clone, Error)]
#[error("{}", self.render())]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
}

pub type Result<T> = std::result::Result<T, ScriptError>;

impl ScriptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ScriptError { kind, message: message.into(), location: None }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn scope(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Scope, message)
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, message)
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Dispatch, message)
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Domain, message)
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Numeric, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    /// Attach a location unless one is already present.  The innermost
    /// statement wins, so errors raised inside procedure bodies or included
    /// files point at the statement that actually failed.
    pub fn at(mut self, file: &str, line: usize, command: &str) -> Self {
        if self.location.is_none() {
            self.location = Some(Location {
                file: file.to_owned(),
                line,
                command: command.to_owned(),
            });
        }
        self
    }

    /// The line the error was raised on, if known.
    pub fn line(&self) -> Option<usize> {
        self.location.as_ref().map(|l| l.line)
    }

    fn render(&self) -> String {
        let mut out = match &self.location {
            Some(loc) => format!("CMake Error at {}:{} ({}):", loc.file, loc.line, loc.command),
            None => "CMake Error:".to_owned(),
        };
        for line in self.message.lines() {
            out.push('\n');
            if !line.is_empty() {
                out.push_str("  ");
                out.push_str(line);
            }
        }
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_without_location() {
        let e = ScriptError::domain("boom");
        assert_eq!(e.to_string(), "CMake Error:\n  boom");
    }

    #[test]
    fn render_with_location_and_blank_lines() {
        let e = ScriptError::domain("first\n\nsecond").at("CMakeLists.txt", 3, "message");
        assert_eq!(
            e.to_string(),
            "CMake Error at CMakeLists.txt:3 (message):\n  first\n\n  second"
        );
    }

    #[test]
    fn innermost_location_wins() {
        let e = ScriptError::syntax("x").at("inner.cmake", 2, "set").at("outer.cmake", 9, "include");
        let loc = e.location.unwrap();
        assert_eq!(loc.file, "inner.cmake");
        assert_eq!(loc.line, 2);
    }
}
