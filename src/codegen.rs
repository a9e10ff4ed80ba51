//! The code-generator contract this crate hands off to: a visitor trait plus
//! the two small introspection tables a code-gen collaborator needs (the
//! prototype table and the user-operator precedence table) to resolve calls
//! and reconstruct mangled operator names on its own.
//!
//! Nothing in this crate implements [`CodeGenerator`]; it has no backend.
//! The trait exists so a downstream crate (an LLVM-IR emitter, a bytecode
//! compiler, a tree-walking interpreter) can drive this crate's AST without
//! this crate knowing which one it's talking to, the same role
//! `compiler::lower::Lower` plays between adjacent compiler stages.

use std::collections::HashMap;

use crate::ast::{BinOpKind, Expr, Function, Item, PrototypeRef};
use crate::source::SourceLoc;

/// The prototype-table introspection interface: `find`/`insert` over the
/// same `PrototypeRef`s the parser populated while
/// resolving calls. A code-gen collaborator consults this to emit extern
/// declarations and look up argument counts; it never needs to reparse.
#[derive(Debug, Default)]
pub struct PrototypeTable {
    by_name: HashMap<String, PrototypeRef>,
}

impl PrototypeTable {
    pub fn new() -> PrototypeTable {
        PrototypeTable { by_name: HashMap::new() }
    }

    pub fn find(&self, name: &str) -> Option<PrototypeRef> {
        self.by_name.get(name).cloned()
    }

    /// Rejects a second prototype under the same name, mirroring the
    /// parser's own duplicate-function/duplicate-operator checks
    /// (`ParseDuplicateFunction`/`ParseDuplicateOperator`).
    pub fn insert(&mut self, prototype: PrototypeRef) -> Result<(), ()> {
        if self.by_name.contains_key(&prototype.name) {
            return Err(());
        }
        self.by_name.insert(prototype.name.clone(), prototype);
        Ok(())
    }
}

impl<'a> FromIterator<&'a Item> for PrototypeTable {
    /// Builds a standalone introspection table from an already-parsed item
    /// vector, for collaborators that only receive `Vec<Item>` (e.g. after
    /// deserializing it) rather than a live `Parser`.
    fn from_iter<I: IntoIterator<Item = &'a Item>>(iter: I) -> PrototypeTable {
        let mut table = PrototypeTable::new();
        for item in iter {
            let proto = match item {
                Item::Extern(proto) => Some(proto),
                Item::Function(function) => Some(&function.proto),
                Item::TopLevelExpr(_) => None,
            };
            if let Some(proto) = proto {
                let _ = table.insert(PrototypeRef::clone(proto));
            }
        }
        table
    }
}

/// One method per `Expr`/`Item` variant. The core guarantees
/// expression-tree traversal is post-order except for control-flow nodes
/// (`If`/`For`/`Var`), where the visitor itself decides how and whether to
/// evaluate each branch: a `visit_if` that short-circuits its `else` branch
/// is exactly as valid as one that always walks both.
///
/// `Value` is an opaque per-expression handle (an LLVM `Value*` wrapper, a
/// bytecode register index, an interpreter result); the core never
/// inspects it.
pub trait CodeGenerator {
    type Value;

    fn visit_number(&mut self, loc: &SourceLoc, value: f64) -> Self::Value;
    fn visit_variable(&mut self, loc: &SourceLoc, name: &str) -> Self::Value;
    fn visit_binary_op(
        &mut self,
        loc: &SourceLoc,
        op: BinOpKind,
        symbol: &str,
        priority: i32,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Self::Value;
    fn visit_unary_op(&mut self, loc: &SourceLoc, mangled: &str, operand: Self::Value) -> Self::Value;
    fn visit_call(&mut self, loc: &SourceLoc, callee: &PrototypeRef, args: Vec<Self::Value>) -> Self::Value;
    fn visit_if(&mut self, loc: &SourceLoc, cond: &Expr, then_branch: &Expr, else_branch: &Expr) -> Self::Value;
    fn visit_for(
        &mut self,
        loc: &SourceLoc,
        induction_name: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
    ) -> Self::Value;
    fn visit_var(&mut self, loc: &SourceLoc, bindings: &[(String, Expr)], body: &Expr) -> Self::Value;

    fn visit_function(&mut self, function: &Function) -> bool;
    fn visit_extern(&mut self, proto: &PrototypeRef) -> bool;
    fn visit_top_level_expr(&mut self, expr: &Expr) -> bool;

    /// Drives one parsed item through the visitor, returning whether it
    /// succeeded.
    fn visit_item(&mut self, item: &Item) -> bool {
        match item {
            Item::Extern(proto) => self.visit_extern(proto),
            Item::Function(function) => self.visit_function(function),
            Item::TopLevelExpr(expr) => self.visit_top_level_expr(expr),
        }
    }
}
