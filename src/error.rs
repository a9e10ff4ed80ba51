//! The single error-reporting surface every other module reports through.
//!
//! Two severities exist. `Fatal` errors (duplicate definitions, malformed
//! operator symbols, out-of-range precedences) abort the process after
//! printing file/line context. Non-fatal errors (unknown characters,
//! malformed numbers, unresolved callees) are reported and returned to the
//! caller, which resyncs by skipping one token and continuing - the same
//! "print, maybe abort, otherwise keep going" shape as
//! `compiler::syntax::Syntax`, and as `original_source/include/lexer.h`'s
//! `err_print(bool is_fatal, const std::string & msg)`.

use std::fmt;

use crate::source::SourceLoc;

/// The error taxonomy. A *kind*, not a type hierarchy: code that wants to
/// match on error class switches on this enum rather than downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexUnknownChar,
    LexBadNumber,
    ParseUnexpectedToken,
    ParseUndefinedCallee,
    ParseBadOperatorSymbol,
    ParseBadOperatorPriority,
    ParseDuplicateOperator,
    ParseDuplicateFunction,
    IoOpenFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::LexUnknownChar => "unknown character",
            ErrorKind::LexBadNumber => "malformed number literal",
            ErrorKind::ParseUnexpectedToken => "unexpected token",
            ErrorKind::ParseUndefinedCallee => "call to an undefined function",
            ErrorKind::ParseBadOperatorSymbol => "invalid operator symbol",
            ErrorKind::ParseBadOperatorPriority => "invalid operator precedence",
            ErrorKind::ParseDuplicateOperator => "duplicate operator definition",
            ErrorKind::ParseDuplicateFunction => "duplicate function definition",
            ErrorKind::IoOpenFailed => "could not open input",
        };
        write!(f, "{}", name)
    }
}

/// One reported diagnostic: its taxonomy kind, a human-readable message, and
/// where it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub loc: SourceLoc,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.loc, self.message, self.kind)
    }
}

/// Raised by a fatal report. The top-level driver (`main.rs`, or any caller
/// embedding the compiler) translates this into an abort or a non-zero exit
/// code; it is never caught and silently ignored within the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fatal(pub Diagnostic);

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fatal error: {}", self.0)
    }
}

impl std::error::Error for Fatal {}

/// The `report(fatal, message, location)` entry point.
///
/// A `Report` is handed by reference to the lexer and parser so that
/// neither owns process-wide state. Non-fatal reports are accumulated for
/// inspection by the driver or tests; fatal reports short-circuit the
/// current parse via `Result::Err(Fatal)`.
#[derive(Debug, Default)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Report {
        Report { diagnostics: Vec::new() }
    }

    /// Records a non-fatal diagnostic. The caller is expected to recover
    /// (e.g. skip one token) and continue.
    pub fn non_fatal(&mut self, kind: ErrorKind, message: impl Into<String>, loc: SourceLoc) {
        self.diagnostics.push(Diagnostic { kind, message: message.into(), loc });
    }

    /// Records a fatal diagnostic and returns it as an `Err`, for the caller
    /// to propagate with `?` up to the top-level driver.
    pub fn fatal(&mut self, kind: ErrorKind, message: impl Into<String>, loc: SourceLoc) -> Fatal {
        let diagnostic = Diagnostic { kind, message: message.into(), loc };
        self.diagnostics.push(diagnostic.clone());
        Fatal(diagnostic)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
