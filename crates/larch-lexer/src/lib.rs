//! Larch lexer -- tokenizer for the Larch S-expression surface.

mod cursor;

use cursor::Cursor;
use larch_common::token::{is_delimiter, keyword_from_str, Token, TokenKind};

/// The Larch lexer. Converts source text into a stream of tokens.
///
/// Wraps a [`Cursor`] for byte-level iteration and implements
/// `Iterator<Item = Token>` so callers can consume tokens lazily or
/// collect them into a `Vec`. The stream always ends with a single
/// `Eof` token.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Whether the final `Eof` token has been emitted.
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
        }
    }

    /// Convenience: tokenize the entire source into a `Vec<Token>`.
    ///
    /// The returned vector includes the final `Eof` token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn produce_token(&mut self) -> Token {
        self.cursor.eat_while(|c| c.is_whitespace());

        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '[' => self.single_char_token(TokenKind::LBracket, start),
            ']' => self.single_char_token(TokenKind::RBracket, start),
            '{' => self.single_char_token(TokenKind::LBrace, start),
            '}' => self.single_char_token(TokenKind::RBrace, start),
            ':' => self.single_char_token(TokenKind::Colon, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            '"' => self.lex_string(start),
            '0'..='9' => self.lex_number(start),
            _ => self.lex_word(start),
        }
    }

    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    /// Lex a string literal. The surface has no escape sequences and
    /// forbids embedded `"`; an unterminated literal is an `Error` token.
    fn lex_string(&mut self, start: u32) -> Token {
        self.cursor.advance(); // opening quote
        let content_start = self.cursor.pos();
        self.cursor.eat_while(|c| c != '"' && c != '\n');

        if self.cursor.peek() != Some('"') {
            return Token::new(TokenKind::Error, start, self.cursor.pos());
        }

        let content = self.cursor.slice(content_start, self.cursor.pos()).to_string();
        self.cursor.advance(); // closing quote
        Token::new(TokenKind::Str(content), start, self.cursor.pos())
    }

    /// Lex a decimal integer literal.
    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let text = self.cursor.slice(start, self.cursor.pos());
        match text.parse::<i64>() {
            Ok(value) => Token::new(TokenKind::Int(value), start, self.cursor.pos()),
            Err(_) => Token::new(TokenKind::Error, start, self.cursor.pos()),
        }
    }

    /// Lex an identifier or keyword: any run of non-delimiter characters.
    ///
    /// Operators (`+`, `-`, `<`, `=`, ...) take this path too; they are
    /// ordinary identifiers in an S-expression surface.
    fn lex_word(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| !is_delimiter(c));

        if self.cursor.pos() == start {
            // zero-width word: consume one char so the stream advances
            self.cursor.advance();
            return Token::new(TokenKind::Error, start, self.cursor.pos());
        }

        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()));
        Token::new(kind, start, self.cursor.pos())
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }

        let token = self.produce_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("   \n\t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn operators_lex_as_identifiers() {
        assert_eq!(
            kinds("(+ 1 2)"),
            vec![
                TokenKind::LParen,
                TokenKind::Ident("+".into()),
                TokenKind::Int(1),
                TokenKind::Int(2),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_brackets() {
        assert_eq!(
            kinds("(def foo [x] x)"),
            vec![
                TokenKind::LParen,
                TokenKind::Def,
                TokenKind::Ident("foo".into()),
                TokenKind::LBracket,
                TokenKind::Ident("x".into()),
                TokenKind::RBracket,
                TokenKind::Ident("x".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn identifiers_may_not_start_with_a_digit() {
        // `1abc` splits: the number lexer stops at `a`, the rest is a word.
        assert_eq!(
            kinds("1abc"),
            vec![
                TokenKind::Int(1),
                TokenKind::Ident("abc".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unicode_identifiers() {
        assert_eq!(
            kinds("\u{03BB}x"),
            vec![TokenKind::Ident("\u{03BB}x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn string_literal() {
        let tokens = Lexer::tokenize(r#"(print "hi there")"#);
        assert_eq!(tokens[2].kind, TokenKind::Str("hi there".into()));
        assert_eq!(tokens[2].span.start, 7);
        assert_eq!(tokens[2].span.end, 17);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_eq!(kinds("\"oops"), vec![TokenKind::Error, TokenKind::Eof]);
        assert_eq!(
            kinds("\"oops\n\""),
            vec![TokenKind::Error, TokenKind::Error, TokenKind::Eof]
        );
    }

    #[test]
    fn spans_index_the_source() {
        let source = "(let [x 10] x)";
        for token in Lexer::tokenize(source) {
            if let TokenKind::Int(n) = token.kind {
                let text = &source[token.span.start as usize..token.span.end as usize];
                assert_eq!(text.parse::<i64>().unwrap(), n);
            }
        }
    }

    #[test]
    fn token_serializes_for_tooling() {
        let token = Token::new(TokenKind::Int(7), 0, 1);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"kind":{"Int":7},"span":{"start":0,"end":1}}"#);
    }

    #[test]
    fn braces_are_reserved_delimiters() {
        assert_eq!(
            kinds("{a: 1}"),
            vec![
                TokenKind::LBrace,
                TokenKind::Ident("a".into()),
                TokenKind::Colon,
                TokenKind::Int(1),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }
}
