//! The recursive-descent, Pratt-expression parser that builds the global
//! AST forest.
//!
//! Grounded on `compiler/parse.rs` for the overall plumbing shape (a parser
//! struct pulling from a lexer, a mutable table consulted and extended
//! during parsing) and on `examples/original_source/src/parser.cpp` for the
//! exact order of operations within each production, most importantly
//! `parse_prototype`'s "read symbol, validate, read priority, parse params,
//! *then* check for duplicates, *then* check arity" sequencing, which this
//! module reproduces exactly since the relative order of a fatal duplicate
//! check and a non-fatal arity check is otherwise unspecified by prose
//! alone.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{BinOpKind, Expr, Function, IdAllocator, Item, Prototype, PrototypeRef};
use crate::error::{ErrorKind, Fatal, Report};
use crate::lexer::Lexer;
use crate::operators::{self, mangle, validate_operator_symbol, OperatorArity, OperatorTable};
use crate::source::{Source, SourceLoc};
use crate::token::{Token, TokenKind};

/// The minimum precedence every top-level `parse_expr` call starts the
/// Pratt climb at. No built-in or user operator may register at or below
/// this (user priorities are validated into `[2, 100]`; built-ins start at
/// 2), so it never accidentally swallows an operator.
const MIN_PRECEDENCE: i32 = 0;

/// A production that can fail two different ways: a non-fatal failure
/// (`Ok(None)`) that the nearest top-level handler recovers from by
/// skipping one token, or a fatal failure (`Err`) that aborts the whole
/// parse.
type PResult<T> = Result<Option<T>, Fatal>;

/// Builds the ordered global AST vector from one token stream. Owns the
/// prototype table and the user-operator table, both per-instance, never
/// process-wide.
pub struct Parser {
    lexer: Lexer,
    report: Report,
    prototypes: HashMap<String, PrototypeRef>,
    operators: OperatorTable,
    ids: IdAllocator,
}

impl Parser {
    pub fn new(source: Rc<Source>) -> Parser {
        let mut report = Report::new();
        let lexer = Lexer::new(source, &mut report);
        Parser {
            lexer,
            report,
            prototypes: HashMap::new(),
            operators: OperatorTable::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Parses the entire token stream into the global item vector
    /// (`program := top_level* EOF`), recovering from non-fatal production
    /// failures by skipping one token and resuming at the top level.
    pub fn parse_program(&mut self) -> Result<Vec<Item>, Fatal> {
        let mut items = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            match self.parse_top_level()? {
                Some(item) => items.push(item),
                None => {
                    self.advance();
                }
            }
        }
        Ok(items)
    }

    /// Consumes `self`, returning the accumulated diagnostics. Call after
    /// `parse_program` whether or not it returned `Err`.
    pub fn into_report(self) -> Report {
        self.report
    }

    fn peek(&self) -> &Token {
        self.lexer.peek()
    }

    fn advance(&mut self) -> Token {
        self.lexer.advance(&mut self.report)
    }

    fn expect_builtin_symbol(&self, symbol: &str) -> bool {
        self.peek().kind == TokenKind::BuiltinOp && self.peek().lexeme == symbol
    }

    fn unexpected(&mut self, what: &str) {
        let loc = self.peek().loc.clone();
        let message = format!("expected {}, found {}", what, self.peek());
        self.report.non_fatal(ErrorKind::ParseUnexpectedToken, message, loc);
    }

    // ---- top_level := definition | extern_decl | expression ----

    fn parse_top_level(&mut self) -> PResult<Item> {
        match self.peek().kind {
            TokenKind::Def => Ok(self.parse_definition()?.map(Item::Function)),
            TokenKind::Extern => Ok(self.parse_extern()?.map(Item::Extern)),
            _ => Ok(self.parse_expr()?.map(Item::TopLevelExpr)),
        }
    }

    fn parse_definition(&mut self) -> PResult<Function> {
        debug_assert!(self.peek().kind == TokenKind::Def);
        let loc = self.peek().loc.clone();
        self.advance();
        let proto = match self.parse_prototype()? {
            Some(p) => p,
            None => return Ok(None),
        };
        let body = match self.parse_expr()? {
            Some(b) => b,
            None => return Ok(None),
        };
        let id = self.ids.alloc();
        Ok(Some(Function { id, loc, proto, body }))
    }

    fn parse_extern(&mut self) -> PResult<PrototypeRef> {
        debug_assert!(self.peek().kind == TokenKind::Extern);
        self.advance();
        self.parse_prototype()
    }

    // ---- prototype ----

    fn parse_prototype(&mut self) -> PResult<PrototypeRef> {
        match self.peek().kind {
            TokenKind::Identifier => self.parse_function_prototype(),
            TokenKind::Binary => self.parse_operator_prototype(OperatorArity::Binary),
            TokenKind::Unary => self.parse_operator_prototype(OperatorArity::Unary),
            _ => {
                self.unexpected("a function name, 'binary', or 'unary'");
                Ok(None)
            }
        }
    }

    fn parse_function_prototype(&mut self) -> PResult<PrototypeRef> {
        let loc = self.peek().loc.clone();
        let name = self.peek().lexeme.clone();
        self.advance();
        let params = match self.parse_param_list()? {
            Some(p) => p,
            None => return Ok(None),
        };
        if self.prototypes.contains_key(&name) {
            return Err(self.report.fatal(ErrorKind::ParseDuplicateFunction, format!("function '{}' redefined", name), loc));
        }
        let id = self.ids.alloc();
        let proto = Rc::new(Prototype::new_function(id, loc, name.clone(), params));
        self.prototypes.insert(name, Rc::clone(&proto));
        Ok(Some(proto))
    }

    fn parse_operator_prototype(&mut self, arity: OperatorArity) -> PResult<PrototypeRef> {
        let loc = self.peek().loc.clone();
        self.advance(); // eat 'binary'/'unary'

        let expected_kind =
            if arity == OperatorArity::Binary { TokenKind::UserBinaryOp } else { TokenKind::UserUnaryOp };
        if self.peek().kind != expected_kind {
            self.unexpected("an operator symbol");
            return Ok(None);
        }
        let symbol = self.peek().lexeme.clone();
        self.advance();

        if let Err(message) = validate_operator_symbol(&symbol) {
            return Err(self.report.fatal(ErrorKind::ParseBadOperatorSymbol, message, loc));
        }

        let priority = match arity {
            OperatorArity::Binary => match self.parse_operator_priority()? {
                Some(p) => p,
                None => return Ok(None),
            },
            OperatorArity::Unary => 0,
        };

        let params = match self.parse_param_list()? {
            Some(p) => p,
            None => return Ok(None),
        };

        let registered = match arity {
            OperatorArity::Binary => self.operators.register_binary(symbol.clone(), priority),
            OperatorArity::Unary => self.operators.register_unary(symbol.clone()),
        };
        if registered.is_err() {
            return Err(self.report.fatal(
                ErrorKind::ParseDuplicateOperator,
                format!("operator '{}' redefined", symbol),
                loc,
            ));
        }

        let expected_params = if arity == OperatorArity::Binary { 2 } else { 1 };
        if params.len() != expected_params {
            self.report.non_fatal(
                ErrorKind::ParseUnexpectedToken,
                format!("operator '{}' expected {} parameter(s) but got {}", symbol, expected_params, params.len()),
                loc,
            );
            return Ok(None);
        }

        let mangled = mangle(arity, &symbol, priority);
        let operator_arity_code = if arity == OperatorArity::Binary { 2 } else { 1 };
        let id = self.ids.alloc();
        let proto = Rc::new(Prototype::new_operator(id, loc, mangled.clone(), params, operator_arity_code, priority));
        self.prototypes.insert(mangled, Rc::clone(&proto));
        Ok(Some(proto))
    }

    fn parse_operator_priority(&mut self) -> PResult<i32> {
        if self.peek().kind != TokenKind::Number {
            self.unexpected("an operator precedence");
            return Ok(None);
        }
        let lexeme = self.peek().lexeme.clone();
        let loc = self.peek().loc.clone();
        self.advance();
        let value: f64 = lexeme
            .parse()
            .map_err(|_| self.report.fatal(ErrorKind::ParseBadOperatorPriority, format!("invalid operator precedence '{}'", lexeme), loc.clone()))?;
        let priority = value as i32;
        if !(2..=100).contains(&priority) {
            return Err(self.report.fatal(
                ErrorKind::ParseBadOperatorPriority,
                format!("operator precedence {} is out of range [2, 100]", priority),
                loc,
            ));
        }
        Ok(Some(priority))
    }

    fn parse_param_list(&mut self) -> PResult<Vec<String>> {
        if self.peek().kind != TokenKind::LeftParen {
            self.unexpected("'('");
            return Ok(None);
        }
        self.advance();
        let mut params = Vec::new();
        while self.peek().kind == TokenKind::Identifier {
            params.push(self.peek().lexeme.clone());
            self.advance();
        }
        if self.peek().kind != TokenKind::RightParen {
            self.unexpected("an identifier or ')'");
            return Ok(None);
        }
        self.advance();
        Ok(Some(params))
    }

    // ---- expression := unary ( binop unary )* (Pratt-parsed) ----

    fn parse_expr(&mut self) -> PResult<Expr> {
        let lhs = match self.parse_unary()? {
            Some(e) => e,
            None => return Ok(None),
        };
        self.parse_binop_rhs(MIN_PRECEDENCE, lhs)
    }

    /// The current token's `(BinOpKind, precedence, symbol)` if it is an
    /// infix operator, else `None`. A `UserBinaryOp` whose symbol was
    /// installed by the lexer but never successfully registered with a
    /// precedence (e.g. its declaring prototype failed non-fatally before
    /// registration) is treated as "not an operator here", which stops the
    /// climb rather than panicking.
    fn current_binop(&self) -> Option<(BinOpKind, i32, String)> {
        match self.peek().kind {
            TokenKind::BuiltinOp => {
                let symbol = self.peek().lexeme.clone();
                let kind = operators::builtin_binop_kind(&symbol)?;
                let prec = operators::builtin_precedence(&symbol)?;
                Some((kind, prec, symbol))
            }
            TokenKind::UserBinaryOp => {
                let symbol = self.peek().lexeme.clone();
                let prec = self.operators.priority(&symbol);
                if prec < 0 {
                    None
                } else {
                    Some((BinOpKind::UserDefined, prec, symbol))
                }
            }
            _ => None,
        }
    }

    /// The Pratt/precedence-climbing core. `lhs` is the left operand already
    /// parsed; `min_prec` is the precedence of whatever operator is waiting
    /// above this call on the stack (0 at the top level).
    fn parse_binop_rhs(&mut self, min_prec: i32, mut lhs: Expr) -> PResult<Expr> {
        loop {
            let (op, op_prec, symbol) = match self.current_binop() {
                Some(t) if t.1 > min_prec => t,
                _ => return Ok(Some(lhs)),
            };
            let op_loc = self.peek().loc.clone();
            self.advance();

            let mut rhs = match self.parse_unary()? {
                Some(e) => e,
                None => return Ok(None),
            };

            loop {
                match self.current_binop() {
                    Some((_, next_prec, _)) if next_prec > op_prec => {
                        rhs = match self.parse_binop_rhs(op_prec, rhs)? {
                            Some(e) => e,
                            None => return Ok(None),
                        };
                    }
                    _ => break,
                }
            }

            lhs = self.build_binary_op(op, lhs, rhs, symbol, op_prec, op_loc)?;
        }
    }

    /// Assembles a `BinaryOp` node. `Assign` is left-associative exactly
    /// like every other built-in; chaining right-to-left requires explicit
    /// parentheses. The one special case is that its left-hand side must be
    /// a `Variable`, checked here rather than deferred to code-gen.
    fn build_binary_op(&mut self, op: BinOpKind, lhs: Expr, rhs: Expr, symbol: String, priority: i32, loc: SourceLoc) -> Result<Expr, Fatal> {
        if op == BinOpKind::Assign && !matches!(lhs, Expr::Variable { .. }) {
            return Err(self.report.fatal(
                ErrorKind::ParseUnexpectedToken,
                "the left-hand side of '=' must be a variable".to_string(),
                loc,
            ));
        }
        let (symbol, priority) = if op == BinOpKind::UserDefined { (symbol, priority) } else { (String::new(), 0) };
        let id = self.ids.alloc();
        Ok(Expr::BinaryOp { id, loc, op, lhs: Box::new(lhs), rhs: Box::new(rhs), symbol, priority })
    }

    // ---- unary := primary | UserUnaryOp unary ----

    fn parse_unary(&mut self) -> PResult<Expr> {
        if self.peek().kind != TokenKind::UserUnaryOp {
            return self.parse_primary();
        }
        let loc = self.peek().loc.clone();
        let opcode = self.peek().lexeme.clone();
        self.advance();
        let operand = match self.parse_unary()? {
            Some(e) => e,
            None => return Ok(None),
        };
        let mangled = mangle(OperatorArity::Unary, &opcode, 0);
        let id = self.ids.alloc();
        Ok(Some(Expr::UnaryOp { id, loc, opcode, operand: Box::new(operand), mangled }))
    }

    // ---- primary := Number | identifier_ref | paren | if_expr | for_expr | var_expr ----

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.peek().kind {
            TokenKind::Number => self.parse_number(),
            TokenKind::Identifier => self.parse_identifier_ref(),
            TokenKind::LeftParen => self.parse_paren(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Var => self.parse_var(),
            _ => {
                self.unexpected("a number, identifier, '(', 'if', 'for', or 'var'");
                Ok(None)
            }
        }
    }

    fn parse_number(&mut self) -> PResult<Expr> {
        let loc = self.peek().loc.clone();
        let lexeme = self.peek().lexeme.clone();
        self.advance();
        let value = match lexeme.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                self.report.non_fatal(ErrorKind::LexBadNumber, format!("malformed number literal '{}'", lexeme), loc.clone());
                0.0
            }
        };
        let id = self.ids.alloc();
        Ok(Some(Expr::Number { id, loc, value }))
    }

    /// `identifier_ref := Identifier [ '(' expression* ')' ]`. A bare
    /// identifier is a `Variable`; one followed directly by `(` is a call,
    /// resolved against the prototype table. Arguments are
    /// whitespace-separated with no comma.
    fn parse_identifier_ref(&mut self) -> PResult<Expr> {
        let loc = self.peek().loc.clone();
        let name = self.peek().lexeme.clone();
        self.advance();

        if self.peek().kind != TokenKind::LeftParen {
            let id = self.ids.alloc();
            return Ok(Some(Expr::Variable { id, loc, name }));
        }
        self.advance(); // eat '('

        let mut args = Vec::new();
        while self.peek().kind != TokenKind::RightParen {
            if self.peek().kind == TokenKind::Eof {
                self.report.non_fatal(
                    ErrorKind::ParseUnexpectedToken,
                    format!("unterminated call to '{}': expected ')'", name),
                    loc,
                );
                return Ok(None);
            }
            match self.parse_expr()? {
                Some(arg) => args.push(arg),
                None => return Ok(None),
            }
        }
        self.advance(); // eat ')'

        let callee = match self.prototypes.get(&name) {
            Some(p) => Rc::clone(p),
            None => {
                self.report.non_fatal(ErrorKind::ParseUndefinedCallee, format!("call to undefined function '{}'", name), loc);
                return Ok(None);
            }
        };
        let id = self.ids.alloc();
        Ok(Some(Expr::Call { id, loc, callee, args }))
    }

    fn parse_paren(&mut self) -> PResult<Expr> {
        self.advance(); // eat '('
        let inner = match self.parse_expr()? {
            Some(e) => e,
            None => return Ok(None),
        };
        if self.peek().kind != TokenKind::RightParen {
            self.unexpected("')'");
            return Ok(None);
        }
        self.advance();
        Ok(Some(inner))
    }

    fn parse_if(&mut self) -> PResult<Expr> {
        let loc = self.peek().loc.clone();
        self.advance(); // eat 'if'
        let cond = match self.parse_expr()? {
            Some(e) => e,
            None => return Ok(None),
        };
        if self.peek().kind != TokenKind::Then {
            self.unexpected("'then'");
            return Ok(None);
        }
        self.advance();
        let then_branch = match self.parse_expr()? {
            Some(e) => e,
            None => return Ok(None),
        };
        if self.peek().kind != TokenKind::Else {
            self.unexpected("'else'");
            return Ok(None);
        }
        self.advance();
        let else_branch = match self.parse_expr()? {
            Some(e) => e,
            None => return Ok(None),
        };
        let id = self.ids.alloc();
        Ok(Some(Expr::If { id, loc, cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch: Box::new(else_branch) }))
    }

    /// `for_expr := 'for' Identifier '=' expression ':' expression [ ':'
    /// expression ] 'in' expression`. Whether `end` is checked before each
    /// iteration or after is not this parser's decision; it falls out of
    /// whatever code-gen does with the `For` node the parser hands it.
    /// `step` stays optional rather than being defaulted to `1.0` at parse
    /// time, since the default applies at code-gen.
    fn parse_for(&mut self) -> PResult<Expr> {
        let loc = self.peek().loc.clone();
        self.advance(); // eat 'for'

        if self.peek().kind != TokenKind::Identifier {
            self.unexpected("an induction variable name");
            return Ok(None);
        }
        let induction_name = self.peek().lexeme.clone();
        self.advance();

        if !self.expect_builtin_symbol("=") {
            self.unexpected("'='");
            return Ok(None);
        }
        self.advance();
        let start = match self.parse_expr()? {
            Some(e) => e,
            None => return Ok(None),
        };

        if self.peek().kind != TokenKind::Colon {
            self.unexpected("':'");
            return Ok(None);
        }
        self.advance();
        let end = match self.parse_expr()? {
            Some(e) => e,
            None => return Ok(None),
        };

        let step = if self.peek().kind == TokenKind::Colon {
            self.advance();
            match self.parse_expr()? {
                Some(e) => Some(Box::new(e)),
                None => return Ok(None),
            }
        } else {
            None
        };

        if self.peek().kind != TokenKind::In {
            self.unexpected("'in'");
            return Ok(None);
        }
        self.advance();
        let body = match self.parse_expr()? {
            Some(e) => e,
            None => return Ok(None),
        };

        let id = self.ids.alloc();
        Ok(Some(Expr::For { id, loc, induction_name, start: Box::new(start), end: Box::new(end), step, body: Box::new(body) }))
    }

    /// `var_expr := 'var' binding (',' binding)* 'in' expression`.
    ///
    /// Comma has no `TokenKind` of its own (the token set is closed) and no
    /// slot in the reserved-character table, so a literal `,` in source
    /// lexes as an unknown character, not a separator. Bindings are parsed
    /// the same separator-free way call arguments already are: as long as
    /// the token after one binding's initializer is another identifier, it
    /// starts the next binding.
    fn parse_var(&mut self) -> PResult<Expr> {
        let loc = self.peek().loc.clone();
        self.advance(); // eat 'var'

        let mut bindings = Vec::new();
        loop {
            if self.peek().kind != TokenKind::Identifier {
                self.unexpected("a variable name");
                return Ok(None);
            }
            let name = self.peek().lexeme.clone();
            self.advance();

            if !self.expect_builtin_symbol("=") {
                self.unexpected("'=' in 'var' binding");
                return Ok(None);
            }
            self.advance();

            let init = match self.parse_expr()? {
                Some(e) => e,
                None => return Ok(None),
            };
            bindings.push((name, init));

            if self.peek().kind != TokenKind::Identifier {
                break;
            }
        }

        if self.peek().kind != TokenKind::In {
            self.unexpected("'in'");
            return Ok(None);
        }
        self.advance();
        let body = match self.parse_expr()? {
            Some(e) => e,
            None => return Ok(None),
        };

        let id = self.ids.alloc();
        Ok(Some(Expr::Var { id, loc, bindings, body: Box::new(body) }))
    }
}

/// Parses one compilation unit end to end, returning both the outcome and
/// whatever diagnostics were accumulated along the way regardless of
/// whether parsing reached a fatal error.
pub fn parse_source(source: Rc<Source>) -> (Result<Vec<Item>, Fatal>, Report) {
    let mut parser = Parser::new(source);
    let result = parser.parse_program();
    (result, parser.into_report())
}
