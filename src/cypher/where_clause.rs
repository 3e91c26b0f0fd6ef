//! WHERE clause and expression parsing.
//!
//! Precedence, loosest first: OR, AND, NOT, comparison, primary.

use super::ast::{CompareOp, Expr, Identifier, LogicalOp, WhereClause};
use super::errors::ParseError;
use super::lexer::TokenKind;
use super::parser::Parser;
use super::path_pattern::parse_literal;

pub fn parse_where_clause(p: &mut Parser) -> Result<WhereClause, ParseError> {
    let start = p.current_span();
    p.expect(TokenKind::Where)?;
    let conditions = parse_expr(p)?;
    let span = start.merge(conditions.span());
    Ok(WhereClause { conditions, span })
}

pub fn parse_expr(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_or(p)
}

fn parse_or(p: &mut Parser) -> Result<Expr, ParseError> {
    let first = parse_and(p)?;
    if !p.check(TokenKind::Or) {
        return Ok(first);
    }
    let mut operands = vec![first];
    while p.eat(TokenKind::Or).is_some() {
        operands.push(parse_and(p)?);
    }
    let span = operands
        .first()
        .map(Expr::span)
        .unwrap_or_default()
        .merge(operands.last().map(Expr::span).unwrap_or_default());
    Ok(Expr::Logical {
        op: LogicalOp::Or,
        operands,
        span,
    })
}

fn parse_and(p: &mut Parser) -> Result<Expr, ParseError> {
    let first = parse_not(p)?;
    if !p.check(TokenKind::And) {
        return Ok(first);
    }
    let mut operands = vec![first];
    while p.eat(TokenKind::And).is_some() {
        operands.push(parse_not(p)?);
    }
    let span = operands
        .first()
        .map(Expr::span)
        .unwrap_or_default()
        .merge(operands.last().map(Expr::span).unwrap_or_default());
    Ok(Expr::Logical {
        op: LogicalOp::And,
        operands,
        span,
    })
}

fn parse_not(p: &mut Parser) -> Result<Expr, ParseError> {
    if let Some(not_token) = p.eat(TokenKind::Not) {
        let operand = parse_not(p)?;
        let span = not_token.span.merge(operand.span());
        return Ok(Expr::Logical {
            op: LogicalOp::Not,
            operands: vec![operand],
            span,
        });
    }
    parse_comparison(p)
}

fn parse_comparison(p: &mut Parser) -> Result<Expr, ParseError> {
    let left = parse_primary(p)?;

    // Postfix `IS [NOT] NULL`
    if p.eat(TokenKind::Is).is_some() {
        let negated = p.eat(TokenKind::Not).is_some();
        let null_token = p.expect(TokenKind::Null)?;
        let span = left.span().merge(null_token.span);
        return Ok(Expr::IsNull {
            operand: Box::new(left),
            negated,
            span,
        });
    }

    let op = match p.peek_kind() {
        TokenKind::Eq => CompareOp::Eq,
        TokenKind::Neq => CompareOp::Neq,
        TokenKind::Lt => CompareOp::Lt,
        TokenKind::Lte => CompareOp::Lte,
        TokenKind::Gt => CompareOp::Gt,
        TokenKind::Gte => CompareOp::Gte,
        TokenKind::In => CompareOp::In,
        _ => return Ok(left),
    };
    p.advance();

    let right = if op == CompareOp::In && p.check(TokenKind::LBracket) {
        parse_list(p)?
    } else {
        parse_primary(p)?
    };

    let span = left.span().merge(right.span());
    Ok(Expr::Comparison {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    })
}

fn parse_list(p: &mut Parser) -> Result<Expr, ParseError> {
    let open = p.expect(TokenKind::LBracket)?;
    let mut items = Vec::new();
    if !p.check(TokenKind::RBracket) {
        loop {
            items.push(parse_primary(p)?);
            if p.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
    }
    let close = p.expect(TokenKind::RBracket)?;
    Ok(Expr::List {
        items,
        span: open.span.merge(close.span),
    })
}

fn parse_primary(p: &mut Parser) -> Result<Expr, ParseError> {
    match p.peek_kind() {
        TokenKind::StringLit
        | TokenKind::Integer
        | TokenKind::Float
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Null => {
            let span = p.current_span();
            let value = parse_literal(p)?;
            Ok(Expr::Literal { value, span })
        }

        TokenKind::LParen => {
            p.advance();
            let inner = parse_expr(p)?;
            p.expect(TokenKind::RParen)?;
            Ok(inner)
        }

        TokenKind::Identifier => {
            let ident = p.advance();
            let ident = Identifier::new(ident.text, ident.span);

            if p.check(TokenKind::Dot) {
                p.advance();
                let prop = p.expect(TokenKind::Identifier)?;
                let span = ident.span.merge(prop.span);
                return Ok(Expr::Property {
                    variable: ident,
                    name: Identifier::new(prop.text, prop.span),
                    span,
                });
            }

            if p.check(TokenKind::LParen) {
                p.advance();
                let mut args = Vec::new();
                if !p.check(TokenKind::RParen) {
                    loop {
                        // `count(*)` and friends
                        if let Some(star) = p.eat(TokenKind::Star) {
                            args.push(Expr::Identifier(Identifier::new("*", star.span)));
                        } else {
                            args.push(parse_expr(p)?);
                        }
                        if p.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                let close = p.expect(TokenKind::RParen)?;
                let span = ident.span.merge(close.span);
                return Ok(Expr::Function {
                    name: ident,
                    args,
                    span,
                });
            }

            Ok(Expr::Identifier(ident))
        }

        _ => Err(p.error("expression")),
    }
}
