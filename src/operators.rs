//! Operator precedence and the mangled-name contract between this crate and
//! a code-gen collaborator.
//!
//! Grounded on `compiler/parse.rs`'s `Prec` enum (generalized from a fixed
//! set of levels into an open, mutable table) and `construct/rule.rs`'s
//! validated-construction pattern (`Rule::new` rejects malformed input
//! before a `Rule` ever exists; `validate_operator_symbol` plays the same
//! role here).

use std::collections::{HashMap, HashSet};

use crate::ast::BinOpKind;
use crate::token::is_reserved_char;

/// Built-in binary operator precedences. Lower binds looser;
/// `Assign` is deliberately lower than every arithmetic operator so that
/// `a = b < c` parses as `a = (b < c)`.
pub const PREC_ASSIGN: i32 = 2;
pub const PREC_LESS_THAN: i32 = 10;
pub const PREC_ADD: i32 = 20;
pub const PREC_SUB: i32 = 20;
pub const PREC_MUL: i32 = 40;

/// Looks up the fixed precedence of one of the five built-in operators.
/// Returns `None` for any other lexeme, including user-defined ones (those
/// live in [`OperatorTable`] instead).
pub fn builtin_precedence(symbol: &str) -> Option<i32> {
    Some(match symbol {
        "=" => PREC_ASSIGN,
        "<" => PREC_LESS_THAN,
        "+" => PREC_ADD,
        "-" => PREC_SUB,
        "*" => PREC_MUL,
        _ => return None,
    })
}

/// Maps a built-in operator's lexeme to its `BinOpKind`. Returns `None` for
/// anything else, including user-defined symbols (those are always
/// `BinOpKind::UserDefined` regardless of spelling).
pub fn builtin_binop_kind(symbol: &str) -> Option<BinOpKind> {
    Some(match symbol {
        "=" => BinOpKind::Assign,
        "<" => BinOpKind::LessThan,
        "+" => BinOpKind::Add,
        "-" => BinOpKind::Sub,
        "*" => BinOpKind::Mul,
        _ => return None,
    })
}

/// The arity of an operator being defined or mangled by
/// `mangle(arity, symbol, priority)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorArity {
    Unary,
    Binary,
}

/// Builds the external linkage name a code-gen collaborator emits for a
/// user-defined operator's implementation. Pure and deterministic: the same
/// `(arity, symbol, priority)` always mangles to the same string, which is
/// what lets `def binary` sites in different files agree on a symbol
/// without sharing a table.
///
/// A unary operator's priority is always folded to `0` in the mangled name,
/// regardless of what was passed, since unary priority is fixed at 0.
pub fn mangle(arity: OperatorArity, symbol: &str, priority: i32) -> String {
    match arity {
        OperatorArity::Binary => format!("_binary_{}_with_prio_{}", symbol, priority),
        OperatorArity::Unary => format!("_unary_{}_with_prio_0", symbol),
    }
}

/// Rejects operator symbols the lexer's reserved-character table or the
/// mangling scheme can't support. Checked when a `def binary`/`def unary`
/// prototype is parsed, before the operator is installed anywhere.
///
/// Rejects:
/// - empty symbols, and symbols longer than two characters;
/// - a one-character symbol that collides with a reserved character
///   (`( ) : + - * < =`), since the lexer could never distinguish the two;
/// - any symbol containing an alphanumeric character, since `mangle` embeds
///   the symbol verbatim into an identifier-like linkage name.
pub fn validate_operator_symbol(symbol: &str) -> Result<(), String> {
    let len = symbol.chars().count();
    if len == 0 || len > 2 {
        return Err(format!(
            "operator symbol must be one or two characters, got {:?} ({} characters)",
            symbol, len
        ));
    }
    if len == 1 {
        let only = symbol.chars().next().expect("len == 1");
        if is_reserved_char(only) {
            return Err(format!("operator symbol '{}' collides with a reserved character", only));
        }
    }
    if symbol.chars().any(|c| c.is_alphanumeric()) {
        return Err(format!("operator symbol {:?} must not contain alphanumeric characters", symbol));
    }
    Ok(())
}

/// The user-operator table the parser owns. Binary and unary operators share
/// one symbol namespace here, the same as `original_source/src/parser.cpp`'s
/// single `user_defined_operator_prio_tab` shares across its `TOKEN_BINARY`
/// and `TOKEN_UNARY` branches: a symbol registered as `binary` can't later be
/// redefined as `unary`, or vice versa, let alone redefined at the same
/// arity. `binary_priority` additionally tracks the precedence a binary
/// symbol was given, since unary operators have none to remember.
#[derive(Debug, Default)]
pub struct OperatorTable {
    declared: HashSet<String>,
    binary_priority: HashMap<String, i32>,
}

impl OperatorTable {
    pub fn new() -> OperatorTable {
        OperatorTable { declared: HashSet::new(), binary_priority: HashMap::new() }
    }

    /// `priority(symbol) -> int | -1`: -1 means "not a registered binary
    /// operator", distinguishing it from a legitimate priority of 0 (which
    /// this table never assigns to a binary symbol, since 0 is reserved for
    /// unary operators).
    pub fn priority(&self, symbol: &str) -> i32 {
        self.binary_priority.get(symbol).copied().unwrap_or(-1)
    }

    /// Registers `symbol` as a binary operator with the given priority.
    /// Fails if `symbol` was already declared, as either arity.
    pub fn register_binary(&mut self, symbol: impl Into<String>, priority: i32) -> Result<(), ()> {
        let symbol = symbol.into();
        if !self.declared.insert(symbol.clone()) {
            return Err(());
        }
        self.binary_priority.insert(symbol, priority);
        Ok(())
    }

    /// Registers `symbol` as a unary operator. Fails if `symbol` was already
    /// declared, as either arity.
    pub fn register_unary(&mut self, symbol: impl Into<String>) -> Result<(), ()> {
        if !self.declared.insert(symbol.into()) {
            return Err(());
        }
        Ok(())
    }
}
