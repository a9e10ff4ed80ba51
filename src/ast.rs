//! The AST data model: a closed sum of expression variants plus the two
//! top-level item kinds, `Prototype` and `Function`.
//!
//! Every node carries a globally-unique (per compilation unit) `id` and a
//! [`SourceLoc`]. Expression subtrees are exclusively owned (`Box`), while
//! [`PrototypeRef`] is shared (`Rc`) so that every `Call` referencing a
//! prototype, and the global item vector itself, can hold a reference
//! without copying the prototype's name or parameter list.

use std::fmt;
use std::rc::Rc;

use crate::source::SourceLoc;

/// Assigns monotonically increasing node ids, starting at 0.
///
/// One allocator per [`crate::parser::Parser`] instance: the id counter is
/// not process-wide, though it mirrors the shape of passerine's
/// `SharedSymbol`-style ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> IdAllocator {
        IdAllocator { next: 0 }
    }

    pub fn alloc(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// The kind of a `BinaryOp` node.
///
/// `UserDefined` carries its precedence on the `BinaryOp` node itself rather
/// than here, since a user operator's priority is chosen by its `def binary`
/// declaration, not fixed at compile time of this crate. `Unknown` is never
/// constructed by this parser; it exists so code-gen collaborators have a
/// default to fall back on rather than needing an `Option<BinOpKind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    LessThan,
    Assign,
    UserDefined,
    Unknown,
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::LessThan => "<",
            BinOpKind::Assign => "=",
            BinOpKind::UserDefined => "<user-defined>",
            BinOpKind::Unknown => "<unknown>",
        };
        write!(f, "{}", s)
    }
}

/// A function or user-operator signature, without a body.
///
/// `priority` is `0` exactly when `is_operator` is `false`. Shared via
/// [`PrototypeRef`] rather than copied: a `Call` node and the global item
/// vector both hold an `Rc` to the same `Prototype`, so lifetime is the
/// longest holder.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub id: u64,
    pub loc: SourceLoc,
    pub name: String,
    pub params: Vec<String>,
    pub is_operator: bool,
    /// `0` for a plain function, `1` for a `unary` operator, `2` for a
    /// `binary` operator.
    pub operator_arity: u8,
    pub priority: i32,
}

/// A shared, read-only handle to a [`Prototype`].
pub type PrototypeRef = Rc<Prototype>;

impl Prototype {
    pub fn new_function(id: u64, loc: SourceLoc, name: String, params: Vec<String>) -> Prototype {
        Prototype { id, loc, name, params, is_operator: false, operator_arity: 0, priority: 0 }
    }

    pub fn new_operator(
        id: u64,
        loc: SourceLoc,
        name: String,
        params: Vec<String>,
        operator_arity: u8,
        priority: i32,
    ) -> Prototype {
        debug_assert!(operator_arity == 1 || operator_arity == 2);
        Prototype { id, loc, name, params, is_operator: true, operator_arity, priority }
    }
}

/// An expression node. `Assign` has no variant of its own: a `x = e`
/// expression is represented exactly as a `BinaryOp` with
/// `op: BinOpKind::Assign`, `lhs` a `Variable`, and `rhs` the assigned
/// value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number { id: u64, loc: SourceLoc, value: f64 },
    Variable { id: u64, loc: SourceLoc, name: String },
    /// `symbol`/`priority` are populated only when `op == UserDefined`, so
    /// code-gen can reconstruct the mangled callee name without consulting
    /// the parser's (by-then-discarded) operator table.
    BinaryOp {
        id: u64,
        loc: SourceLoc,
        op: BinOpKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        symbol: String,
        priority: i32,
    },
    UnaryOp { id: u64, loc: SourceLoc, opcode: String, operand: Box<Expr>, mangled: String },
    Call { id: u64, loc: SourceLoc, callee: PrototypeRef, args: Vec<Expr> },
    If { id: u64, loc: SourceLoc, cond: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr> },
    For {
        id: u64,
        loc: SourceLoc,
        induction_name: String,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    Var { id: u64, loc: SourceLoc, bindings: Vec<(String, Expr)>, body: Box<Expr> },
}

impl Expr {
    pub fn id(&self) -> u64 {
        match self {
            Expr::Number { id, .. }
            | Expr::Variable { id, .. }
            | Expr::BinaryOp { id, .. }
            | Expr::UnaryOp { id, .. }
            | Expr::Call { id, .. }
            | Expr::If { id, .. }
            | Expr::For { id, .. }
            | Expr::Var { id, .. } => *id,
        }
    }

    pub fn loc(&self) -> &SourceLoc {
        match self {
            Expr::Number { loc, .. }
            | Expr::Variable { loc, .. }
            | Expr::BinaryOp { loc, .. }
            | Expr::UnaryOp { loc, .. }
            | Expr::Call { loc, .. }
            | Expr::If { loc, .. }
            | Expr::For { loc, .. }
            | Expr::Var { loc, .. } => loc,
        }
    }

    /// True for `BinaryOp { op: Assign, .. }` nodes, the representation used
    /// for assignment (see the `Expr` doc comment).
    pub fn is_assign(&self) -> bool {
        matches!(self, Expr::BinaryOp { op: BinOpKind::Assign, .. })
    }
}

/// A function definition: a prototype plus its body.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: u64,
    pub loc: SourceLoc,
    pub proto: PrototypeRef,
    pub body: Expr,
}

/// One entry in the global AST forest the parser builds. `extern`
/// declarations, `def` definitions, and bare top-level expressions are the
/// only three top-level shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Extern(PrototypeRef),
    Function(Function),
    TopLevelExpr(Expr),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.alloc();
        let b = ids.alloc();
        let c = ids.alloc();
        assert_eq!((a, b, c), (0, 1, 2));
    }

    #[test]
    fn prototype_arity_invariant_for_plain_function() {
        let proto = Prototype::new_function(
            0,
            SourceLoc::synthetic(crate::source::Source::source("")),
            "foo".to_string(),
            vec!["x".to_string()],
        );
        assert!(!proto.is_operator);
        assert_eq!(proto.operator_arity, 0);
        assert_eq!(proto.priority, 0);
    }
}
