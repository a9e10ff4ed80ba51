//! # Kaleidoscope
//!
//! This crate is the front-end of a compiler for a small expression-oriented
//! language whose only value type is a 64-bit floating-point number: a
//! lexer, a Pratt-style recursive-descent parser, and the AST data model
//! they build together. It produces an in-memory syntax forest and stops
//! there. Code generation, optimization, object-file emission, and target
//! selection are external collaborators (see [`codegen`]), not part of this
//! crate.
//!
//! ## Pipeline
//!
//! ```text
//! characters -> Lexer -> Tokens -> Parser (mutating its own operator tables) -> Vec<Item> -> CodeGenerator
//! ```
//!
//! [`source::Source`] owns one compilation unit's file name and contents,
//! cheaply shared via `Rc` across every [`token::Token`] and
//! [`source::SourceLoc`] produced while processing it. [`lexer::Lexer`]
//! turns that source into a stream of [`token::Token`]s, pulled one at a
//! time by [`parser::Parser`]; the two are coupled more tightly than a
//! typical lexer/parser pair because `def binary`/`def unary` declarations
//! let source text introduce brand-new operator tokens mid-stream: the
//! lexer installs the symbol the moment it sees one declared, and the
//! parser later gives it a precedence once it has parsed the declared
//! priority.
//!
//! [`parser::parse_source`] is the simplest entry point: it runs a
//! [`parser::Parser`] to completion and hands back both the resulting
//! [`ast::Item`] forest (or the first fatal error) and every diagnostic
//! accumulated along the way, fatal or not.
//!
//! Nothing downstream of parsing is implemented here. A code-gen
//! collaborator drives the returned AST itself, through the
//! [`codegen::CodeGenerator`] visitor contract.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod source;
pub mod token;

pub use ast::{BinOpKind, Expr, Function, Item, Prototype, PrototypeRef};
pub use codegen::{CodeGenerator, PrototypeTable};
pub use config::Config;
pub use error::{Diagnostic, ErrorKind, Fatal, Report};
pub use parser::{parse_source, Parser};
pub use source::{Source, SourceLoc};
pub use token::{Token, TokenKind};
