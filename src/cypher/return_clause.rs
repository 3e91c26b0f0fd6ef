//! RETURN clause parsing, including ORDER BY / SKIP / LIMIT.

use super::ast::{ReturnClause, ReturnItem, SortOrder};
use super::errors::ParseError;
use super::lexer::TokenKind;
use super::parser::Parser;
use super::where_clause::parse_expr;

pub fn parse_return_clause(p: &mut Parser) -> Result<ReturnClause, ParseError> {
    let start = p.current_span();
    p.expect(TokenKind::Return)?;

    let distinct = p.eat(TokenKind::Distinct).is_some();

    let mut items = vec![parse_return_item(p)?];
    while p.eat(TokenKind::Comma).is_some() {
        items.push(parse_return_item(p)?);
    }

    let order_by = if p.check(TokenKind::Order) {
        p.advance();
        p.expect(TokenKind::By)?;
        let mut keys = vec![parse_order_key(p)?];
        while p.eat(TokenKind::Comma).is_some() {
            keys.push(parse_order_key(p)?);
        }
        keys
    } else {
        Vec::new()
    };

    let skip = if p.eat(TokenKind::Skip).is_some() {
        Some(parse_count(p)?)
    } else {
        None
    };

    let limit = if p.eat(TokenKind::Limit).is_some() {
        Some(parse_count(p)?)
    } else {
        None
    };

    let span = start.merge(p.current_span());
    Ok(ReturnClause {
        items,
        distinct,
        order_by,
        skip,
        limit,
        span,
    })
}

fn parse_return_item(p: &mut Parser) -> Result<ReturnItem, ParseError> {
    let expression = parse_expr(p)?;
    let alias = if p.eat(TokenKind::As).is_some() {
        let t = p.expect(TokenKind::Identifier)?;
        Some(super::ast::Identifier::new(t.text, t.span))
    } else {
        None
    };
    Ok(ReturnItem { expression, alias })
}

fn parse_order_key(p: &mut Parser) -> Result<(super::ast::Expr, SortOrder), ParseError> {
    let expr = parse_expr(p)?;
    let order = if p.eat(TokenKind::Desc).is_some() {
        SortOrder::Desc
    } else {
        p.eat(TokenKind::Asc);
        SortOrder::Asc
    };
    Ok((expr, order))
}

fn parse_count(p: &mut Parser) -> Result<u64, ParseError> {
    let t = p.expect(TokenKind::Integer)?;
    t.text
        .parse::<u64>()
        .map_err(|_| ParseError::new(t.span, "non-negative count", format!("'{}'", t.text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::ast::Expr;
    use crate::cypher::lexer::tokenize;

    fn ret(input: &str) -> ReturnClause {
        let tokens = tokenize(input).expect("lex failed");
        let mut p = Parser::new(&tokens);
        parse_return_clause(&mut p).expect("parse failed")
    }

    #[test]
    fn test_single_identifier() {
        let clause = ret("RETURN n");
        assert_eq!(clause.items.len(), 1);
        assert!(!clause.distinct);
        assert!(matches!(&clause.items[0].expression, Expr::Identifier(id) if id.name == "n"));
    }

    #[test]
    fn test_multiple_items_with_alias() {
        let clause = ret("RETURN n, m.name AS movieName");
        assert_eq!(clause.items.len(), 2);
        assert_eq!(clause.items[1].alias.as_ref().unwrap().name, "movieName");
    }

    #[test]
    fn test_distinct() {
        assert!(ret("RETURN DISTINCT n").distinct);
    }

    #[test]
    fn test_order_by_skip_limit() {
        let clause = ret("RETURN n ORDER BY n.age DESC, n.name SKIP 5 LIMIT 10");
        assert_eq!(clause.order_by.len(), 2);
        assert_eq!(clause.order_by[0].1, SortOrder::Desc);
        assert_eq!(clause.order_by[1].1, SortOrder::Asc);
        assert_eq!(clause.skip, Some(5));
        assert_eq!(clause.limit, Some(10));
    }

    #[test]
    fn test_aggregation_item() {
        let clause = ret("RETURN count(n) AS total");
        assert!(matches!(
            &clause.items[0].expression,
            Expr::Function { name, .. } if name.name == "count"
        ));
        assert_eq!(clause.items[0].alias.as_ref().unwrap().name, "total");
    }

    #[test]
    fn test_missing_item_fails() {
        let tokens = tokenize("RETURN").unwrap();
        let mut p = Parser::new(&tokens);
        assert!(parse_return_clause(&mut p).is_err());
    }
}
