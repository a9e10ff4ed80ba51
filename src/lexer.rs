//! The streaming lexer, including the lexer/parser feedback loop that
//! installs user-defined operators as they're declared.
//!
//! Grounded on `compiler/lex_old.rs`, the complete, working lexer in the
//! retrieved snapshot (`compiler/lex.rs`, the file actually wired up by
//! `compiler/mod.rs`, is an abandoned early draft that does not lex a full
//! token stream). `lex_old.rs`'s shape survives here: a `Lexer` owning its
//! source and a cursor, a `take_while`-style run-consumer for identifiers
//! and numbers, and errors constructed at the exact point of failure rather
//! than after the fact.
//!
//! The one piece `lex_old.rs` has no analogue for is longest-match lookup
//! of user operator symbols with one-character backtracking. Rather than a
//! literal ring buffer in front of the stream, this lexer has random access
//! to its source string, so backtracking is direct: build the maximal
//! candidate once, then shrink it by re-slicing rather than by pushing
//! characters back onto anything.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ErrorKind, Report};
use crate::source::{Source, SourceLoc};
use crate::token::{is_reserved_char, keyword_kind, reserved_char_kind, Token, TokenKind};

/// A char is a boundary for operator-candidate accumulation if it's
/// whitespace, a digit, a letter, or `(`, for both greedy operator
/// installation and longest-match lookup.
fn is_operator_boundary(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_digit() || c.is_alphabetic() || c == '('
}

/// Produces [`Token`]s one at a time from a [`Source`], installing
/// user-defined operator symbols into its own table as `def binary`/`def
/// unary` declarations go by.
///
/// The lexer decides *that* a lexeme is an operator symbol and *which*
/// kind (`UserBinaryOp` vs `UserUnaryOp`); it never learns a priority,
/// since priority is parsed later, by [`crate::parser::Parser`], into a
/// completely separate table ([`crate::operators::OperatorTable`]).
pub struct Lexer {
    source: Rc<Source>,
    chars: Vec<char>,
    pos: usize,
    line: i64,
    column: i64,
    /// Symbol spellings installed so far, mapped to the kind they should
    /// lex as from here on.
    user_ops: HashMap<String, TokenKind>,
    /// The kind of the token previously returned from `advance`/seeded at
    /// construction: triggers the greedy operator-install path when it is
    /// `Binary` or `Unary`.
    prev_kind: TokenKind,
    current: Token,
}

impl Lexer {
    pub fn new(source: Rc<Source>, report: &mut Report) -> Lexer {
        let chars: Vec<char> = source.contents.chars().collect();
        let mut lexer = Lexer {
            source,
            chars,
            pos: 0,
            line: 1,
            column: 0,
            user_ops: HashMap::new(),
            prev_kind: TokenKind::Undefined,
            current: Token::new(TokenKind::Eof, "", SourceLoc::new(Rc::new(unreachable_source()), 1, 0)),
        };
        let first = lexer.compute_token(report);
        lexer.current = first;
        lexer
    }

    /// Builds a [`Lexer`] over `user_source` with `prefill` lexed as if it
    /// appeared immediately before it, as one combined unit.
    ///
    /// A hook to swap or prefill the input stream: a design affordance for
    /// a collaborator (e.g. a code-gen layer that wants its standard-library
    /// operators pre-declared) to inject leading source text, not a language
    /// feature in its own right. Errors in `prefill` are reported against
    /// the same combined source as everything else.
    pub fn with_prefill(name: impl Into<Rc<str>>, prefill: &str, user_source: &str, report: &mut Report) -> Lexer {
        let mut combined = String::with_capacity(prefill.len() + 1 + user_source.len());
        combined.push_str(prefill);
        combined.push('\n');
        combined.push_str(user_source);
        Lexer::new(Source::new(name, combined), report)
    }

    /// Returns the current token without consuming it.
    pub fn peek(&self) -> &Token {
        &self.current
    }

    /// Consumes and returns the current token, computing the next one to
    /// become the new `peek()`. Once `Eof` is reached, every subsequent
    /// `advance` keeps returning `Eof`.
    pub fn advance(&mut self, report: &mut Report) -> Token {
        let returned = self.current.clone();
        self.prev_kind = returned.kind.clone();
        self.current = self.compute_token(report);
        returned
    }

    fn loc(&self) -> SourceLoc {
        SourceLoc::new(Rc::clone(&self.source), self.line, self.column)
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Consumes one character known not to be a line terminator (identifier,
    /// number, and operator-candidate bodies never cross a newline, since
    /// whitespace is itself a boundary for all three).
    fn bump(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        self.column += 1;
        c
    }

    /// Consumes one character for the purposes of whitespace/comment
    /// skipping, where line terminators are expected and must reset
    /// `column`/bump `line`. `\r\n` is treated as a single terminator.
    fn bump_ws(&mut self) {
        let c = self.chars[self.pos];
        self.pos += 1;
        match c {
            '\r' => {
                if self.peek_char() == Some('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                self.column = 0;
            }
            '\n' => {
                self.line += 1;
                self.column = 0;
            }
            _ => self.column += 1,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => self.bump_ws(),
                Some('#') => {
                    while !matches!(self.peek_char(), None | Some('\n') | Some('\r')) {
                        self.bump_ws();
                    }
                }
                _ => break,
            }
        }
    }

    /// Computes the next token, retrying internally past any non-fatal
    /// "unknown character" errors so that `advance`/construction never
    /// hands back a bogus token for garbage input.
    fn compute_token(&mut self, report: &mut Report) -> Token {
        loop {
            self.skip_whitespace_and_comments();

            let loc = self.loc();
            let c = match self.peek_char() {
                None => return Token::new(TokenKind::Eof, "", loc),
                Some(c) => c,
            };

            if matches!(self.prev_kind, TokenKind::Binary | TokenKind::Unary) {
                return self.lex_operator_install(loc);
            }

            if c.is_alphabetic() || c == '_' {
                return self.lex_identifier_or_keyword(loc);
            }
            if c.is_ascii_digit() {
                return self.lex_number(loc, report);
            }

            if let Some(token) = self.lex_user_operator(loc) {
                return token;
            }

            let kind = reserved_char_kind(c);
            if !matches!(kind, TokenKind::Undefined) {
                self.bump();
                return Token::new(kind, c.to_string(), loc);
            }

            report.non_fatal(ErrorKind::LexUnknownChar, format!("unexpected character '{}'", c), loc);
            self.bump();
            // fall through to the top of the loop and try again
        }
    }

    fn max_operator_candidate_len(&self) -> usize {
        let mut len = 0;
        while let Some(c) = self.peek_char_at(len) {
            if is_operator_boundary(c) {
                break;
            }
            len += 1;
        }
        len
    }

    /// Greedy read triggered right after a `binary`/`unary` keyword: the
    /// next lexeme, up to the first whitespace/digit/letter/`(`, is
    /// installed verbatim as an operator symbol of the matching arity,
    /// without validating it. Validation is the parser's job, once it knows
    /// the declared priority.
    fn lex_operator_install(&mut self, loc: SourceLoc) -> Token {
        let kind = if self.prev_kind == TokenKind::Binary { TokenKind::UserBinaryOp } else { TokenKind::UserUnaryOp };
        let mut len = self.max_operator_candidate_len();
        if len == 0 {
            // The very next char is itself a boundary character (e.g. a
            // bare identifier was written where an operator symbol was
            // expected). Consume exactly one char so the lexer always
            // makes progress; the parser's validation will reject this
            // lexeme for containing an alphanumeric.
            len = 1;
        }
        let lexeme: String = (0..len).map(|_| self.bump()).collect();
        self.user_ops.insert(lexeme.clone(), kind.clone());
        Token::new(kind, lexeme, loc)
    }

    /// Longest-match lookup against already-installed user operator
    /// symbols. Returns `None` (consuming nothing) if no registered symbol
    /// is a prefix of the input at the current position, so the caller can
    /// fall through to reserved-character or unknown-character handling.
    fn lex_user_operator(&mut self, loc: SourceLoc) -> Option<Token> {
        let max_len = self.max_operator_candidate_len();
        if max_len == 0 {
            return None;
        }
        let candidate: String = (0..max_len).map(|i| self.chars[self.pos + i]).collect();
        for try_len in (1..=max_len).rev() {
            let prefix = &candidate[..prefix_byte_len(&candidate, try_len)];
            if let Some(kind) = self.user_ops.get(prefix).cloned() {
                for _ in 0..try_len {
                    self.bump();
                }
                return Some(Token::new(kind, prefix.to_string(), loc));
            }
        }
        None
    }

    fn lex_identifier_or_keyword(&mut self, loc: SourceLoc) -> Token {
        let mut word = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                word.push(self.bump());
            } else {
                break;
            }
        }
        let kind = keyword_kind(&word).unwrap_or(TokenKind::Identifier);
        Token::new(kind, word, loc)
    }

    /// Consumes a contiguous run of digits and `.` characters. A second `.`
    /// is a non-fatal error but does not stop consumption, matching
    /// `original_source`'s `get_number` (which keeps accumulating
    /// characters after logging the malformed-literal error rather than
    /// truncating the token there).
    fn lex_number(&mut self, loc: SourceLoc, report: &mut Report) -> Token {
        let mut lexeme = String::new();
        let mut seen_dot = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                lexeme.push(self.bump());
            } else if c == '.' {
                if seen_dot {
                    report.non_fatal(
                        ErrorKind::LexBadNumber,
                        format!("number literal '{}.' has more than one '.'", lexeme),
                        self.loc(),
                    );
                } else {
                    seen_dot = true;
                }
                lexeme.push(self.bump());
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, lexeme, loc)
    }
}

/// Returns the byte length of the first `chars` characters of `s`. Used to
/// slice `s` (which may contain multi-byte characters) by character count
/// rather than byte count.
fn prefix_byte_len(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

/// Never actually read: only used to give the placeholder `current` token
/// built during `Lexer::new` a valid `Rc<Source>` to point at before the
/// real first token replaces it.
fn unreachable_source() -> Source {
    Source { name: Rc::from(""), contents: Rc::from("") }
}
