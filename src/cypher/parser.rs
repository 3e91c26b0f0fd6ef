//! Token-stream cursor and the top-level query grammar:
//!
//! ```text
//! Query := [OPTIONAL] MATCH PathList [WHERE Expr] RETURN ReturnClause [';']
//! ```

use super::ast::{MatchClause, Query};
use super::errors::ParseError;
use super::lexer::{Span, Token, TokenKind};
use super::path_pattern::parse_path;
use super::return_clause::parse_return_clause;
use super::where_clause::parse_where_clause;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub fn peek(&self) -> &Token {
        // The lexer guarantees a trailing Eof token.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub fn peek_ahead(&self, n: usize) -> TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[idx].kind
    }

    pub fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Consume the next token if it matches.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(kind.describe()))
        }
    }

    /// Error positioned at the current token.
    pub fn error(&self, expected: impl Into<String>) -> ParseError {
        let token = self.peek();
        let found = if token.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", token.text)
        };
        ParseError::new(token.span, expected, found)
    }

    pub fn current_span(&self) -> Span {
        self.peek().span
    }
}

pub fn parse_query(tokens: &[Token]) -> Result<Query, ParseError> {
    let mut p = Parser::new(tokens);
    let start = p.current_span();

    let optional = p.eat(TokenKind::Optional).is_some();
    let match_start = p.current_span();
    p.expect(TokenKind::Match)?;

    let mut paths = vec![parse_path(&mut p)?];
    while p.eat(TokenKind::Comma).is_some() {
        paths.push(parse_path(&mut p)?);
    }
    let match_span = match_start.merge(paths.last().map(|path| path.span).unwrap_or(match_start));

    let where_clause = if p.check(TokenKind::Where) {
        Some(parse_where_clause(&mut p)?)
    } else {
        None
    };

    let return_clause = parse_return_clause(&mut p)?;

    p.eat(TokenKind::Semicolon);
    if !p.check(TokenKind::Eof) {
        return Err(p.error("end of query"));
    }

    let span = start.merge(return_clause.span);
    Ok(Query {
        match_clause: MatchClause {
            paths,
            optional,
            span: match_span,
        },
        where_clause,
        return_clause,
        span,
    })
}
