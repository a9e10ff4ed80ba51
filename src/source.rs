//! The raw text a compilation unit is lexed and parsed from.
//!
//! A [`Source`] is cheaply shared (via `Rc`) across every [`Token`](crate::token::Token)
//! and every [`SourceLoc`] produced while processing it, the same way
//! `common::span::Span` shares an `Rc<Source>` across every span it annotates.

use std::fmt;
use std::rc::Rc;

/// The name under which a source's contents were read.
///
/// Not necessarily a real filesystem path: `<stdin>` is used when source is
/// read from standard input (the zero-positional-argument CLI case).
pub type SourceName = Rc<str>;

/// Owns the file name and full contents of one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: SourceName,
    pub contents: Rc<str>,
}

impl Source {
    /// Wraps an in-memory string as a source, under a caller-chosen name.
    pub fn new(name: impl Into<SourceName>, contents: impl Into<Rc<str>>) -> Rc<Source> {
        Rc::new(Source { name: name.into(), contents: contents.into() })
    }

    /// Convenience for tests and one-off snippets: names the source `<test>`.
    pub fn source(contents: impl Into<Rc<str>>) -> Rc<Source> {
        Source::new("<test>", contents)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A 1-based line, 0-based column, and source name carried on every token
/// and AST node.
///
/// Monotonic per input stream and propagated by copy: it holds a cheap
/// `Rc<Source>` rather than the whole source, so copying a `SourceLoc` is a
/// refcount bump plus two integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoc {
    pub source: Rc<Source>,
    pub line: i64,
    pub column: i64,
}

impl SourceLoc {
    pub fn new(source: Rc<Source>, line: i64, column: i64) -> SourceLoc {
        debug_assert!(line >= 1, "SourceLoc::line is 1-based");
        debug_assert!(column >= 0, "SourceLoc::column is 0-based");
        SourceLoc { source, line, column }
    }

    /// A placeholder location for synthetic nodes that were never lexed from
    /// text (none exist in the core today, but code-gen collaborators that
    /// synthesize nodes may need this).
    pub fn synthetic(source: Rc<Source>) -> SourceLoc {
        SourceLoc { source, line: 1, column: 0 }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source.name, self.line, self.column)
    }
}
