//! Cypher front end: lexer, recursive-descent parser, and the typed AST
//! shared with the Gremlin lowering.

pub mod ast;
pub mod errors;
pub mod lexer;
mod parser;
mod path_pattern;
mod return_clause;
mod where_clause;

pub use errors::{CypherError, LexError, LexErrorKind, ParseError};
pub use lexer::{Span, Token, TokenKind};

use ast::Query;

/// Parse a Cypher read query into the typed AST.
pub fn parse_query(input: &str) -> Result<Query, CypherError> {
    let tokens = lexer::tokenize(input)?;
    let query = parser::parse_query(&tokens)?;
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::ast::{CompareOp, Expr, Literal, SortOrder};
    use super::*;

    #[test]
    fn test_parse_simple_query() {
        let query = parse_query("MATCH (n:User) RETURN n").expect("parse failed");
        assert_eq!(query.match_clause.paths.len(), 1);
        assert!(!query.match_clause.optional);
        assert!(query.where_clause.is_none());
        assert_eq!(query.return_clause.items.len(), 1);
    }

    #[test]
    fn test_parse_full_query() {
        let query = parse_query(
            "MATCH (n:User)-[r:KNOWS]->(m:User) \
             WHERE n.age > 30 AND m.name = 'Alice' \
             RETURN n.name AS name, m \
             ORDER BY n.age DESC \
             SKIP 5 LIMIT 10;",
        )
        .expect("parse failed");

        let path = &query.match_clause.paths[0];
        assert_eq!(path.nodes().len(), 2);
        assert_eq!(path.relationships().len(), 1);

        let where_clause = query.where_clause.expect("expected WHERE");
        assert_eq!(where_clause.conditions.condition_count(), 2);

        let ret = &query.return_clause;
        assert_eq!(ret.items.len(), 2);
        assert_eq!(ret.items[0].alias.as_ref().unwrap().name, "name");
        assert_eq!(ret.order_by[0].1, SortOrder::Desc);
        assert_eq!(ret.skip, Some(5));
        assert_eq!(ret.limit, Some(10));
    }

    #[test]
    fn test_parse_optional_match() {
        let query = parse_query("OPTIONAL MATCH (n) RETURN n").expect("parse failed");
        assert!(query.match_clause.optional);
    }

    #[test]
    fn test_parse_multiple_paths() {
        let query = parse_query("MATCH (n:User), (m:Movie) RETURN n, m").expect("parse failed");
        assert_eq!(query.match_clause.paths.len(), 2);
    }

    #[test]
    fn test_parse_variable_length() {
        let query = parse_query("MATCH (a)-[r*1..3]->(b) RETURN a, b").expect("parse failed");
        assert!(query.match_clause.paths[0].has_variable_length());
    }

    #[test]
    fn test_parse_property_map() {
        let query = parse_query("MATCH (n:User {name: 'John'}) RETURN n").expect("parse failed");
        let node = &query.match_clause.paths[0].nodes()[0];
        assert_eq!(node.properties[0].1, Literal::String("John".into()));
    }

    #[test]
    fn test_parse_where_in_list() {
        let query =
            parse_query("MATCH (p:Person) WHERE p.name IN ['Alice', 'Bob'] RETURN p").unwrap();
        match &query.where_clause.unwrap().conditions {
            Expr::Comparison { op, .. } => assert_eq!(*op, CompareOp::In),
            other => panic!("expected IN comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_queries_error_cleanly() {
        for input in [
            "",
            "MATCH",
            "MATCH (",
            "MATCH )",
            "MATCH (n",
            "MATCH (n)-[",
            "MATCH (n)-[]",
            "MATCH (n)-[]->",
            "RETURN",
            "WHERE n.a = 1",
            "MATCH (n) RETURN n WHERE n.a = 1",
            "MATCH (n) RETURN n EXTRA",
        ] {
            assert!(parse_query(input).is_err(), "expected error for {:?}", input);
        }
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse_query("MATCH (n) RETURN n n").unwrap_err();
        match err {
            CypherError::Parse(e) => assert_eq!(e.expected, "end of query"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_query_spans_cover_source() {
        let input = "MATCH (n:User) WHERE n.age > 30 RETURN n";
        let query = parse_query(input).unwrap();
        assert_eq!(query.span.start, 0);
        assert!(query.span.end <= input.len());
        let where_span = query.where_clause.unwrap().span;
        assert_eq!(&input[where_span.start..where_span.start + 5], "WHERE");
    }
}
