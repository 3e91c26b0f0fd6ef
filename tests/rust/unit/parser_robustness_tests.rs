//! Parsing edge cases and error handling.
//!
//! Malformed queries must come back as structured errors, never panics,
//! and error spans must point into the original source.

use kustograph::cypher::{parse_query, CypherError};
use kustograph::gremlin;

#[test]
fn test_malformed_cypher_never_panics() {
    let malformed = vec![
        "",
        "MATCH",
        "MATCH (",
        "MATCH )",
        "MATCH (n",
        "MATCH n)",
        "MATCH (n-",
        "MATCH (n)-[",
        "MATCH (n)-[]",
        "MATCH (n)-[]-",
        "MATCH (n)-[]->",
        "RETURN",
        "WHERE",
        "MATCH (n) RETURN n WHERE n.a = 1",
        "MATCH (n) NONSENSE",
        "MATCH (n) RETURN n ORDER",
        "MATCH (n) RETURN n ORDER BY",
        "MATCH (n) RETURN n LIMIT",
        "MATCH (n) RETURN n LIMIT x",
        "MATCH (n:) RETURN n",
        "MATCH (n:User {name: }) RETURN n",
        "MATCH (n)-[*a..b]->(m) RETURN n",
        "MATCH (n) WHERE RETURN n",
        "MATCH (n) WHERE n. RETURN n",
        "MATCH (n) RETURN n,",
    ];

    for query in malformed {
        assert!(
            parse_query(query).is_err(),
            "expected error for {:?}",
            query
        );
    }
}

#[test]
fn test_malformed_gremlin_never_panics() {
    let malformed = vec![
        "",
        "g",
        "g.",
        "g.V",
        "g.V(",
        "g.V().",
        "g.V().hasLabel",
        "g.V().hasLabel(",
        "g.V().hasLabel('User'",
        "g.V().unknownStep()",
        "h.V()",
        "g.V() garbage",
    ];

    for chain in malformed {
        assert!(
            gremlin::parse_and_lower(chain).is_err(),
            "expected error for {:?}",
            chain
        );
    }
}

#[test]
fn test_error_spans_point_into_source() {
    let input = "MATCH (n:User RETURN n";
    let err = parse_query(input).expect_err("expected parse failure");
    let CypherError::Parse(parse_err) = err else {
        panic!("expected a parse error");
    };
    assert!(parse_err.span.start < input.len());
    assert!(parse_err.span.start <= parse_err.span.end);
}

#[test]
fn test_lexer_error_kinds() {
    for (input, fragment) in [
        ("MATCH (n {x: 'abc}) RETURN n", "unterminated"),
        ("MATCH (n {x: 12abc}) RETURN n", "number"),
        (r"MATCH (n {x: 'a\qb'}) RETURN n", "escape"),
    ] {
        let err = parse_query(input).expect_err("expected lex failure");
        assert!(
            err.to_string().to_lowercase().contains(fragment),
            "error for {:?} was: {}",
            input,
            err
        );
    }
}

#[test]
fn test_deeply_nested_expressions_parse() {
    let query = "MATCH (n:User) WHERE ((((n.age > 1)))) AND (n.age < 99 OR (NOT n.age = 50)) RETURN n";
    assert!(parse_query(query).is_ok());
}

#[test]
fn test_keywords_as_any_case() {
    for query in [
        "match (n) return n",
        "MATCH (n) RETURN n",
        "Match (n) Return n",
        "mAtCh (n) rEtUrN n",
    ] {
        assert!(parse_query(query).is_ok(), "failed for {:?}", query);
    }
}
