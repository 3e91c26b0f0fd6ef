//! Node and relationship pattern parsing:
//!
//! ```text
//! Path    := NodePat (RelPat NodePat)*
//! NodePat := '(' [Ident] (':' Label)* [PropMap] ')'
//! RelPat  := '-' ['[' Detail ']'] ('->' | '-')
//!          | '<-' ['[' Detail ']'] '-'
//! Detail  := [Ident] [':' Type] [Length]
//! Length  := '*' (n | m '..' n | m '..' | '..' n | ε)
//! PropMap := '{' Ident ':' Literal (',' Ident ':' Literal)* '}'
//! ```

use super::ast::{
    Direction, Identifier, Literal, NodePattern, PathExpression, PathLength, RelationshipPattern,
};
use super::errors::ParseError;
use super::lexer::TokenKind;
use super::parser::Parser;

pub fn parse_path(p: &mut Parser) -> Result<PathExpression, ParseError> {
    let start = p.current_span();
    let mut nodes = vec![parse_node_pattern(p)?];
    let mut relationships = Vec::new();

    while matches!(p.peek_kind(), TokenKind::Dash | TokenKind::LeftArrow) {
        relationships.push(parse_relationship_pattern(p)?);
        nodes.push(parse_node_pattern(p)?);
    }

    let span = start.merge(nodes.last().map(|n| n.span).unwrap_or(start));
    PathExpression::new(nodes, relationships, span)
        .map_err(|e| ParseError::new(span, "alternating node/relationship pattern", e.to_string()))
}

pub fn parse_node_pattern(p: &mut Parser) -> Result<NodePattern, ParseError> {
    let open = p.expect(TokenKind::LParen)?;

    let variable = p
        .eat(TokenKind::Identifier)
        .map(|t| Identifier::new(t.text, t.span));

    let mut labels = Vec::new();
    while p.eat(TokenKind::Colon).is_some() {
        let label = p.expect(TokenKind::Identifier)?;
        labels.push(Identifier::new(label.text, label.span));
    }

    let properties = if p.check(TokenKind::LBrace) {
        parse_property_map(p)?
    } else {
        Vec::new()
    };

    let close = p.expect(TokenKind::RParen)?;
    Ok(NodePattern {
        variable,
        labels,
        properties,
        span: open.span.merge(close.span),
    })
}

fn parse_relationship_pattern(p: &mut Parser) -> Result<RelationshipPattern, ParseError> {
    let start = p.current_span();

    // `<-[..]-` is Incoming; `-[..]->` is Outgoing; `-[..]-` is Either.
    let incoming = match p.peek_kind() {
        TokenKind::LeftArrow => {
            p.advance();
            true
        }
        TokenKind::Dash => {
            p.advance();
            false
        }
        _ => return Err(p.error("'-' or '<-'")),
    };

    let (variable, rel_type, length) = if p.eat(TokenKind::LBracket).is_some() {
        let variable = p
            .eat(TokenKind::Identifier)
            .map(|t| Identifier::new(t.text, t.span));

        let rel_type = if p.eat(TokenKind::Colon).is_some() {
            let t = p.expect(TokenKind::Identifier)?;
            Some(Identifier::new(t.text, t.span))
        } else {
            None
        };

        let length = if p.check(TokenKind::Star) {
            Some(parse_path_length(p)?)
        } else {
            None
        };

        p.expect(TokenKind::RBracket)?;
        (variable, rel_type, length)
    } else {
        (None, None, None)
    };

    let direction = if incoming {
        p.expect(TokenKind::Dash)?;
        Direction::Incoming
    } else {
        match p.peek_kind() {
            TokenKind::Arrow => {
                p.advance();
                Direction::Outgoing
            }
            TokenKind::Dash => {
                p.advance();
                Direction::Either
            }
            _ => return Err(p.error("'->' or '-'")),
        }
    };

    let span = start.merge(p.current_span());
    Ok(RelationshipPattern {
        variable,
        rel_type,
        direction,
        length,
        span,
    })
}

/// Parse the `*m..n` length micro-syntax. The leading `*` is required.
fn parse_path_length(p: &mut Parser) -> Result<PathLength, ParseError> {
    p.expect(TokenKind::Star)?;

    // bare `*`
    if !matches!(p.peek_kind(), TokenKind::Integer | TokenKind::DotDot) {
        return Ok(PathLength {
            min: None,
            max: None,
        });
    }

    let min = if p.check(TokenKind::Integer) {
        let t = p.advance();
        Some(parse_bound(&t.text, t.span)?)
    } else {
        None
    };

    if p.eat(TokenKind::DotDot).is_some() {
        let max = if p.check(TokenKind::Integer) {
            let t = p.advance();
            Some(parse_bound(&t.text, t.span)?)
        } else {
            None
        };
        Ok(PathLength { min, max })
    } else {
        // `*3` is an exact length
        Ok(PathLength { min, max: min })
    }
}

fn parse_bound(text: &str, span: super::lexer::Span) -> Result<u32, ParseError> {
    text.parse::<u32>()
        .map_err(|_| ParseError::new(span, "path length bound", format!("'{}'", text)))
}

fn parse_property_map(p: &mut Parser) -> Result<Vec<(String, Literal)>, ParseError> {
    p.expect(TokenKind::LBrace)?;
    let mut properties = Vec::new();

    loop {
        let key = p.expect(TokenKind::Identifier)?;
        p.expect(TokenKind::Colon)?;
        let value = parse_literal(p)?;
        properties.push((key.text, value));

        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }

    p.expect(TokenKind::RBrace)?;
    Ok(properties)
}

pub fn parse_literal(p: &mut Parser) -> Result<Literal, ParseError> {
    let token = p.peek().clone();
    let literal = match token.kind {
        TokenKind::StringLit => Literal::String(token.text.clone()),
        TokenKind::Integer => Literal::Integer(
            token
                .text
                .parse()
                .map_err(|_| ParseError::new(token.span, "integer literal", token.text.clone()))?,
        ),
        TokenKind::Float => Literal::Float(
            token
                .text
                .parse()
                .map_err(|_| ParseError::new(token.span, "float literal", token.text.clone()))?,
        ),
        TokenKind::True => Literal::Boolean(true),
        TokenKind::False => Literal::Boolean(false),
        TokenKind::Null => Literal::Null,
        _ => return Err(p.error("literal value")),
    };
    p.advance();
    Ok(literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::lexer::tokenize;

    fn path(input: &str) -> PathExpression {
        let tokens = tokenize(input).expect("lex failed");
        let mut p = Parser::new(&tokens);
        parse_path(&mut p).expect("parse failed")
    }

    #[test]
    fn test_single_node() {
        let path = path("(n:User)");
        assert_eq!(path.nodes().len(), 1);
        assert_eq!(path.relationships().len(), 0);
        let node = &path.nodes()[0];
        assert_eq!(node.variable.as_ref().unwrap().name, "n");
        assert_eq!(node.labels[0].name, "User");
    }

    #[test]
    fn test_anonymous_node() {
        let path = path("()");
        assert!(path.nodes()[0].variable.is_none());
        assert!(path.nodes()[0].labels.is_empty());
    }

    #[test]
    fn test_node_with_properties() {
        let path = path("(n:User {name: 'John', age: 30})");
        let node = &path.nodes()[0];
        assert_eq!(node.properties.len(), 2);
        assert_eq!(node.properties[0].0, "name");
        assert_eq!(node.properties[0].1, Literal::String("John".into()));
        assert_eq!(node.properties[1].1, Literal::Integer(30));
    }

    #[test]
    fn test_outgoing_relationship() {
        let path = path("(n)-[r:KNOWS]->(m)");
        assert_eq!(path.relationships().len(), 1);
        let rel = &path.relationships()[0];
        assert_eq!(rel.variable.as_ref().unwrap().name, "r");
        assert_eq!(rel.rel_type.as_ref().unwrap().name, "KNOWS");
        assert_eq!(rel.direction, Direction::Outgoing);
    }

    #[test]
    fn test_incoming_relationship() {
        let path = path("(n)<-[r:FOLLOWS]-(m)");
        assert_eq!(path.relationships()[0].direction, Direction::Incoming);
    }

    #[test]
    fn test_undirected_relationship() {
        let path = path("(n)-[r:KNOWS]-(m)");
        assert_eq!(path.relationships()[0].direction, Direction::Either);
    }

    #[test]
    fn test_bare_relationships() {
        assert_eq!(
            path("(a)-->(b)").relationships()[0].direction,
            Direction::Outgoing
        );
        assert_eq!(
            path("(a)--(b)").relationships()[0].direction,
            Direction::Either
        );
    }

    #[test]
    fn test_multi_hop_path() {
        let path = path("(a)-[:X]->(b)<-[:Y]-(c)");
        assert_eq!(path.nodes().len(), 3);
        assert_eq!(path.relationships().len(), 2);
        assert_eq!(path.hop_count(), 2);
    }

    #[test]
    fn test_variable_length_range() {
        let path = path("(a)-[r*1..3]->(b)");
        let rel = &path.relationships()[0];
        assert_eq!(
            rel.length,
            Some(PathLength {
                min: Some(1),
                max: Some(3)
            })
        );
        assert!(path.has_variable_length());
    }

    #[test]
    fn test_variable_length_forms() {
        assert_eq!(
            path("(a)-[*]->(b)").relationships()[0].length,
            Some(PathLength {
                min: None,
                max: None
            })
        );
        assert_eq!(
            path("(a)-[*3]->(b)").relationships()[0].length,
            Some(PathLength {
                min: Some(3),
                max: Some(3)
            })
        );
        assert_eq!(
            path("(a)-[*2..]->(b)").relationships()[0].length,
            Some(PathLength {
                min: Some(2),
                max: None
            })
        );
        assert_eq!(
            path("(a)-[*..4]->(b)").relationships()[0].length,
            Some(PathLength {
                min: None,
                max: Some(4)
            })
        );
    }

    #[test]
    fn test_multiple_labels() {
        let path = path("(n:Person:Actor)");
        let labels: Vec<&str> = path.nodes()[0]
            .labels
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(labels, vec!["Person", "Actor"]);
    }

    #[test]
    fn test_unclosed_node_fails() {
        let tokens = tokenize("(n:User").unwrap();
        let mut p = Parser::new(&tokens);
        let err = parse_path(&mut p).unwrap_err();
        assert!(err.expected.contains(")"));
    }

    #[test]
    fn test_dangling_relationship_fails() {
        let tokens = tokenize("(n)-[r]->").unwrap();
        let mut p = Parser::new(&tokens);
        assert!(parse_path(&mut p).is_err());
    }
}
