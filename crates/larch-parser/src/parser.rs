//! Recursive-descent parser over the token stream.
//!
//! The grammar is small enough for single-token lookahead everywhere:
//! after `(` the next token decides between the special forms (`def`,
//! `set`, `if`, `let`, `fn`) and plain application.

use larch_common::span::Span;
use larch_common::token::{Token, TokenKind};
use larch_lexer::Lexer;

use crate::ast::{
    Assignment, BoolLiteral, Expr, FnExpr, Form, FuncDef, IfExpr, IntLiteral, LetExpr, SetExpr,
    StrLiteral, Symbol,
};
use crate::error::ParseError;

/// Parse source text into a program: one or more top-level expressions.
pub fn parse(source: &str) -> Result<Vec<Expr>, ParseError> {
    Parser::new(Lexer::tokenize(source)).program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_id: u32,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            next_id: 1,
        }
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The current token. The lexer guarantees a trailing `Eof`, so this
    /// never runs off the end.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.peek().span)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.peek_kind() == &kind {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    /// An identifier in name position. Keywords are not valid names.
    fn expect_name(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek_kind() {
            TokenKind::Ident(_) => {
                let token = self.bump();
                match token.kind {
                    TokenKind::Ident(name) => Ok(name),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.error(format!("expected {}", what))),
        }
    }

    // ── Grammar productions ────────────────────────────────────────────

    fn program(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.expr()?];
        while !self.at_eof() {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            TokenKind::LParen => self.form_like(),
            TokenKind::Ident(_) => {
                let token = self.bump();
                let name = match token.kind {
                    TokenKind::Ident(name) => name,
                    _ => unreachable!(),
                };
                Ok(Expr::Symbol(Symbol {
                    id: self.fresh_id(),
                    span: token.span,
                    name,
                }))
            }
            TokenKind::Int(value) => {
                let value = *value;
                let token = self.bump();
                Ok(Expr::IntLiteral(IntLiteral {
                    id: self.fresh_id(),
                    span: token.span,
                    value,
                }))
            }
            TokenKind::Str(_) => {
                let token = self.bump();
                let content = match token.kind {
                    TokenKind::Str(content) => content,
                    _ => unreachable!(),
                };
                Ok(Expr::StrLiteral(StrLiteral {
                    id: self.fresh_id(),
                    span: token.span,
                    content,
                }))
            }
            TokenKind::True | TokenKind::False => {
                let value = self.peek_kind() == &TokenKind::True;
                let token = self.bump();
                Ok(Expr::BoolLiteral(BoolLiteral {
                    id: self.fresh_id(),
                    span: token.span,
                    value,
                }))
            }
            TokenKind::Error => Err(self.error("unrecognised token")),
            TokenKind::Eof => Err(self.error("expected expression, found end of input")),
            other => Err(self.error(format!("expected expression, found {:?}", other))),
        }
    }

    /// A parenthesised form: keyword dispatch on the token after `(`.
    fn form_like(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LParen, "`(`")?;
        match self.peek_kind() {
            TokenKind::Def => self.def_form(open.span),
            TokenKind::Set => self.set_form(open.span),
            TokenKind::If => self.if_form(open.span),
            TokenKind::Let => self.let_form(open.span),
            TokenKind::Fn => self.fn_form(open.span),
            _ => self.application(open.span),
        }
    }

    /// `(f x y ...)` -- at least the callee is required.
    fn application(&mut self, open: Span) -> Result<Expr, ParseError> {
        let mut children = vec![self.expr()?];
        while self.peek_kind() != &TokenKind::RParen {
            children.push(self.expr()?);
        }
        let close = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Expr::Form(Form {
            id: self.fresh_id(),
            span: open.merge(close.span),
            children,
        }))
    }

    /// `(def name (T1 ... Tn)? [args] body...)`
    fn def_form(&mut self, open: Span) -> Result<Expr, ParseError> {
        self.bump(); // def
        let name = self.expect_name("function name")?;

        let signature = if self.peek_kind() == &TokenKind::LParen {
            self.bump();
            let mut sig = vec![self.expect_name("type name")?];
            while self.peek_kind() != &TokenKind::RParen {
                sig.push(self.expect_name("type name")?);
            }
            self.bump(); // `)`
            Some(sig)
        } else {
            None
        };

        self.expect(TokenKind::LBracket, "`[`")?;
        let mut args = Vec::new();
        while self.peek_kind() != &TokenKind::RBracket {
            args.push(self.expect_name("argument name")?);
        }
        self.bump(); // `]`

        let mut body = vec![self.expr()?];
        while self.peek_kind() != &TokenKind::RParen {
            body.push(self.expr()?);
        }
        let close = self.expect(TokenKind::RParen, "`)`")?;
        let span = open.merge(close.span);

        // The signature lists the argument types plus the return type.
        if let Some(sig) = &signature {
            if sig.len() != args.len() + 1 {
                return Err(ParseError::new(
                    format!(
                        "function signature of `{}` does not match its arguments: \
                         {} type(s) for {} argument(s)",
                        name,
                        sig.len(),
                        args.len()
                    ),
                    span,
                ));
            }
        }

        Ok(Expr::FuncDef(FuncDef {
            id: self.fresh_id(),
            span,
            name,
            signature,
            args,
            body,
        }))
    }

    /// `(set name value)`
    fn set_form(&mut self, open: Span) -> Result<Expr, ParseError> {
        self.bump(); // set
        let name = self.expect_name("name")?;
        let value = self.expr()?;
        let close = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Expr::Set(SetExpr {
            id: self.fresh_id(),
            span: open.merge(close.span),
            name,
            value: Box::new(value),
        }))
    }

    /// `(if [cond] cons alt)`
    fn if_form(&mut self, open: Span) -> Result<Expr, ParseError> {
        self.bump(); // if
        self.expect(TokenKind::LBracket, "`[`")?;
        let condition = self.expr()?;
        self.expect(TokenKind::RBracket, "`]`")?;
        let consequence = self.expr()?;
        let alternative = self.expr()?;
        let close = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Expr::If(IfExpr {
            id: self.fresh_id(),
            span: open.merge(close.span),
            condition: Box::new(condition),
            consequence: Box::new(consequence),
            alternative: Box::new(alternative),
        }))
    }

    /// `(let [x e1 y e2 ...] body)`
    fn let_form(&mut self, open: Span) -> Result<Expr, ParseError> {
        self.bump(); // let
        self.expect(TokenKind::LBracket, "`[`")?;
        let mut assignments = Vec::new();
        while self.peek_kind() != &TokenKind::RBracket {
            let var = self.expect_name("binding name")?;
            let value = self.expr()?;
            assignments.push(Assignment { var, value });
        }
        self.bump(); // `]`
        let body = self.expr()?;
        let close = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Expr::Let(LetExpr {
            id: self.fresh_id(),
            span: open.merge(close.span),
            assignments,
            body: Box::new(body),
        }))
    }

    /// `(fn [x] body)`
    fn fn_form(&mut self, open: Span) -> Result<Expr, ParseError> {
        self.bump(); // fn
        self.expect(TokenKind::LBracket, "`[`")?;
        let arg = self.expect_name("argument name")?;
        self.expect(TokenKind::RBracket, "`]`")?;
        let body = self.expr()?;
        let close = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Expr::Fn(FnExpr {
            id: self.fresh_id(),
            span: open.merge(close.span),
            arg,
            body: Box::new(body),
        }))
    }
}
