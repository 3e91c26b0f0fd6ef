//! Lowering from Gremlin traversals to the Cypher AST.
//!
//! A single left-to-right pass accumulates pattern topology, filters, and
//! projection into a context, then assembles a [`Query`]. Downstream
//! stages (resolver, planner, emitter) never see the dialect difference.

use std::collections::HashMap;

use crate::cypher::ast::{
    CompareOp, Direction, Expr, Identifier, Literal, LogicalOp, MatchClause, NodePattern,
    PathExpression, Query, RelationshipPattern, ReturnClause, ReturnItem, SortOrder, WhereClause,
};
use crate::cypher::lexer::Span;

use super::ast::{GremlinTraversal, GremlinValue, HasPredicate, OrderDirection, Step};
use super::errors::GremlinError;

/// Accumulated state while walking the step chain.
struct LoweringContext {
    node_counter: u32,
    current_var: String,
    labels: HashMap<String, String>,
    filters: Vec<Expr>,
    chain: Vec<(RelationshipPattern, String)>,
    projection: Option<Vec<String>>,
    count: bool,
    dedup: bool,
    limit: Option<u64>,
    order_by: Option<(String, SortOrder)>,
    pending_order: bool,
}

impl LoweringContext {
    fn new() -> Self {
        LoweringContext {
            node_counter: 1,
            current_var: "v0".to_string(),
            labels: HashMap::new(),
            filters: Vec::new(),
            chain: Vec::new(),
            projection: None,
            count: false,
            dedup: false,
            limit: None,
            order_by: None,
            pending_order: false,
        }
    }

    fn fresh_var(&mut self) -> String {
        let var = format!("v{}", self.node_counter);
        self.node_counter += 1;
        var
    }
}

pub fn lower_to_cypher(traversal: &GremlinTraversal) -> Result<Query, GremlinError> {
    let Some(first) = traversal.steps.first() else {
        return Err(GremlinError::UnsupportedStart(
            "traversal has no steps".to_string(),
        ));
    };

    let starting_ids = match first {
        Step::Vertex { ids } => ids.clone(),
        Step::Edge => {
            return Err(GremlinError::UnsupportedPattern(
                "edge starting point E() is not supported, start with V()".to_string(),
            ));
        }
        other => {
            return Err(GremlinError::UnsupportedStart(format!(
                "first step must be V(), got {:?}",
                other
            )));
        }
    };

    let mut ctx = LoweringContext::new();
    if !starting_ids.is_empty() {
        let filter = id_filter(&ctx.current_var, &starting_ids);
        ctx.filters.push(filter);
    }

    for step in &traversal.steps[1..] {
        lower_step(step, &mut ctx)?;
    }

    if ctx.pending_order {
        return Err(GremlinError::UnsupportedPattern(
            "order() must be followed by by()".to_string(),
        ));
    }

    Ok(assemble_query(ctx))
}

fn lower_step(step: &Step, ctx: &mut LoweringContext) -> Result<(), GremlinError> {
    match step {
        Step::Vertex { .. } | Step::Edge => Err(GremlinError::UnsupportedPattern(
            "multiple traversal roots are not supported".to_string(),
        )),

        Step::HasLabel { label } => {
            if ctx.labels.contains_key(&ctx.current_var) {
                return Err(GremlinError::UnsupportedMultiLabel {
                    variable: ctx.current_var.clone(),
                });
            }
            ctx.labels.insert(ctx.current_var.clone(), label.clone());
            Ok(())
        }

        Step::Has {
            property,
            predicate,
        } => {
            let filter = has_filter(&ctx.current_var, property, predicate);
            ctx.filters.push(filter);
            Ok(())
        }

        Step::HasId { ids } => {
            let filter = id_filter(&ctx.current_var, ids);
            ctx.filters.push(filter);
            Ok(())
        }

        Step::Out { edge_label } => {
            traverse(ctx, Direction::Outgoing, edge_label.clone());
            Ok(())
        }
        Step::In { edge_label } => {
            traverse(ctx, Direction::Incoming, edge_label.clone());
            Ok(())
        }
        Step::Both { edge_label } => {
            traverse(ctx, Direction::Either, edge_label.clone());
            Ok(())
        }
        Step::EdgeTraversal { direction } => {
            Err(GremlinError::UnsupportedTraversalDirection(direction.clone()))
        }

        Step::Values { properties } => {
            if ctx.projection.is_some() || ctx.count {
                return Err(GremlinError::UnsupportedPattern(
                    "multiple projection steps are not supported".to_string(),
                ));
            }
            ctx.projection = Some(properties.clone());
            Ok(())
        }
        Step::OtherProjection { kind } => {
            Err(GremlinError::UnsupportedProjectionType(kind.clone()))
        }

        Step::Limit { count } => {
            if ctx.limit.is_some() {
                return Err(GremlinError::UnsupportedPattern(
                    "multiple limit steps are not supported".to_string(),
                ));
            }
            ctx.limit = Some(*count);
            Ok(())
        }

        Step::Order => {
            if ctx.order_by.is_some() || ctx.pending_order {
                return Err(GremlinError::UnsupportedPattern(
                    "multiple order steps are not supported".to_string(),
                ));
            }
            ctx.pending_order = true;
            Ok(())
        }
        Step::By {
            property,
            direction,
        } => {
            if !ctx.pending_order {
                return Err(GremlinError::UnsupportedPattern(
                    "by() requires a preceding order()".to_string(),
                ));
            }
            ctx.pending_order = false;
            let order = match direction {
                OrderDirection::Asc => SortOrder::Asc,
                OrderDirection::Desc => SortOrder::Desc,
            };
            ctx.order_by = Some((property.clone(), order));
            Ok(())
        }

        Step::Count => {
            if ctx.projection.is_some() || ctx.count {
                return Err(GremlinError::UnsupportedPattern(
                    "multiple projection steps are not supported".to_string(),
                ));
            }
            ctx.count = true;
            Ok(())
        }
        Step::Dedup => {
            ctx.dedup = true;
            Ok(())
        }
    }
}

fn traverse(ctx: &mut LoweringContext, direction: Direction, edge_label: Option<String>) {
    let target = ctx.fresh_var();
    let rel = RelationshipPattern {
        variable: None,
        rel_type: edge_label.map(Identifier::synthetic),
        direction,
        length: None,
        span: Span::default(),
    };
    ctx.chain.push((rel, target.clone()));
    ctx.current_var = target;
}

fn value_to_literal(value: &GremlinValue) -> Literal {
    match value {
        GremlinValue::String(s) => Literal::String(s.clone()),
        GremlinValue::Integer(i) => Literal::Integer(*i),
        GremlinValue::Float(f) => Literal::Float(*f),
        GremlinValue::Boolean(b) => Literal::Boolean(*b),
    }
}

fn property_expr(variable: &str, property: &str) -> Expr {
    Expr::Property {
        variable: Identifier::synthetic(variable),
        name: Identifier::synthetic(property),
        span: Span::default(),
    }
}

fn literal_expr(value: Literal) -> Expr {
    Expr::Literal {
        value,
        span: Span::default(),
    }
}

fn has_filter(variable: &str, property: &str, predicate: &HasPredicate) -> Expr {
    let left = Box::new(property_expr(variable, property));
    let (op, right) = match predicate {
        HasPredicate::Eq(v) => (CompareOp::Eq, literal_expr(value_to_literal(v))),
        HasPredicate::Neq(v) => (CompareOp::Neq, literal_expr(value_to_literal(v))),
        HasPredicate::Gt(v) => (CompareOp::Gt, literal_expr(value_to_literal(v))),
        HasPredicate::Gte(v) => (CompareOp::Gte, literal_expr(value_to_literal(v))),
        HasPredicate::Lt(v) => (CompareOp::Lt, literal_expr(value_to_literal(v))),
        HasPredicate::Lte(v) => (CompareOp::Lte, literal_expr(value_to_literal(v))),
        HasPredicate::Within(values) => {
            let items = values
                .iter()
                .map(|v| literal_expr(value_to_literal(v)))
                .collect();
            (
                CompareOp::In,
                Expr::List {
                    items,
                    span: Span::default(),
                },
            )
        }
    };
    Expr::Comparison {
        op,
        left,
        right: Box::new(right),
        span: Span::default(),
    }
}

/// Starting-point ids become an `id(var)` prefilter; the resolver maps
/// `id(...)` onto the label's node-id column.
fn id_filter(variable: &str, ids: &[GremlinValue]) -> Expr {
    let id_call = Expr::Function {
        name: Identifier::synthetic("id"),
        args: vec![Expr::Identifier(Identifier::synthetic(variable))],
        span: Span::default(),
    };

    if ids.len() == 1 {
        return Expr::Comparison {
            op: CompareOp::Eq,
            left: Box::new(id_call),
            right: Box::new(literal_expr(value_to_literal(&ids[0]))),
            span: Span::default(),
        };
    }

    let items = ids
        .iter()
        .map(|v| literal_expr(value_to_literal(v)))
        .collect();
    Expr::Comparison {
        op: CompareOp::In,
        left: Box::new(id_call),
        right: Box::new(Expr::List {
            items,
            span: Span::default(),
        }),
        span: Span::default(),
    }
}

fn node_pattern(ctx: &LoweringContext, variable: &str) -> NodePattern {
    NodePattern {
        variable: Some(Identifier::synthetic(variable)),
        labels: ctx
            .labels
            .get(variable)
            .map(|label| vec![Identifier::synthetic(label)])
            .unwrap_or_default(),
        properties: Vec::new(),
        span: Span::default(),
    }
}

fn assemble_query(mut ctx: LoweringContext) -> Query {
    let mut nodes = vec![node_pattern(&ctx, "v0")];
    let mut relationships = Vec::new();
    for (rel, target) in &ctx.chain {
        relationships.push(rel.clone());
        nodes.push(node_pattern(&ctx, target));
    }

    // Arity holds by construction: the chain always appends a node per
    // relationship.
    let path = PathExpression::new(nodes, relationships, Span::default())
        .unwrap_or_else(|e| panic!("lowering produced invalid path: {}", e));

    let mut filters = std::mem::take(&mut ctx.filters);
    let where_clause = match filters.len() {
        0 => None,
        1 => filters.pop().map(|conditions| WhereClause {
            conditions,
            span: Span::default(),
        }),
        _ => Some(WhereClause {
            conditions: Expr::Logical {
                op: LogicalOp::And,
                operands: filters,
                span: Span::default(),
            },
            span: Span::default(),
        }),
    };

    let items = if ctx.count {
        vec![ReturnItem {
            expression: Expr::Function {
                name: Identifier::synthetic("count"),
                args: vec![Expr::Identifier(Identifier::synthetic(&ctx.current_var))],
                span: Span::default(),
            },
            alias: None,
        }]
    } else if let Some(properties) = &ctx.projection {
        properties
            .iter()
            .map(|p| ReturnItem {
                expression: property_expr(&ctx.current_var, p),
                alias: None,
            })
            .collect()
    } else {
        vec![ReturnItem {
            expression: Expr::Identifier(Identifier::synthetic(&ctx.current_var)),
            alias: None,
        }]
    };

    let order_by = ctx
        .order_by
        .map(|(property, order)| vec![(property_expr(&ctx.current_var, &property), order)])
        .unwrap_or_default();

    Query {
        match_clause: MatchClause {
            paths: vec![path],
            optional: false,
            span: Span::default(),
        },
        where_clause,
        return_clause: ReturnClause {
            items,
            distinct: ctx.dedup,
            order_by,
            skip: None,
            limit: ctx.limit,
            span: Span::default(),
        },
        span: Span::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gremlin::parser::parse_traversal;

    fn lower(input: &str) -> Query {
        let traversal = parse_traversal(input).expect("parse failed");
        lower_to_cypher(&traversal).expect("lowering failed")
    }

    fn lower_err(input: &str) -> GremlinError {
        let traversal = parse_traversal(input).expect("parse failed");
        lower_to_cypher(&traversal).expect_err("expected lowering failure")
    }

    #[test]
    fn test_lower_single_vertex() {
        let query = lower("g.V()");
        let path = &query.match_clause.paths[0];
        assert_eq!(path.nodes().len(), 1);
        assert_eq!(
            path.nodes()[0].variable.as_ref().unwrap().name,
            "v0"
        );
        assert!(query.where_clause.is_none());
    }

    #[test]
    fn test_lower_label_and_filter_and_traversal() {
        // g.V().hasLabel('User').has('age',30).out('OWNS').values('name')
        // ≡ MATCH (v0:User)-[:OWNS]->(v1) WHERE v0.age = 30 RETURN v1.name
        let query = lower("g.V().hasLabel('User').has('age',30).out('OWNS').values('name')");

        let path = &query.match_clause.paths[0];
        assert_eq!(path.nodes().len(), 2);
        assert_eq!(path.nodes()[0].labels[0].name, "User");
        assert!(path.nodes()[1].labels.is_empty());
        let rel = &path.relationships()[0];
        assert_eq!(rel.rel_type.as_ref().unwrap().name, "OWNS");
        assert_eq!(rel.direction, Direction::Outgoing);

        let conditions = query.where_clause.unwrap().conditions;
        match conditions {
            Expr::Comparison { op, left, right, .. } => {
                assert_eq!(op, CompareOp::Eq);
                assert!(matches!(
                    *left,
                    Expr::Property { ref variable, ref name, .. }
                        if variable.name == "v0" && name.name == "age"
                ));
                assert!(matches!(
                    *right,
                    Expr::Literal { value: Literal::Integer(30), .. }
                ));
            }
            other => panic!("expected comparison, got {:?}", other),
        }

        let item = &query.return_clause.items[0];
        assert!(matches!(
            &item.expression,
            Expr::Property { variable, name, .. }
                if variable.name == "v1" && name.name == "name"
        ));
    }

    #[test]
    fn test_lower_direction_mapping() {
        assert_eq!(
            lower("g.V().in('KNOWS')").match_clause.paths[0].relationships()[0].direction,
            Direction::Incoming
        );
        assert_eq!(
            lower("g.V().both('KNOWS')").match_clause.paths[0].relationships()[0].direction,
            Direction::Either
        );
    }

    #[test]
    fn test_lower_starting_ids_become_id_prefilter() {
        let query = lower("g.V(1, 2).hasLabel('User')");
        let conditions = query.where_clause.unwrap().conditions;
        match conditions {
            Expr::Comparison { op, left, .. } => {
                assert_eq!(op, CompareOp::In);
                assert!(matches!(
                    *left,
                    Expr::Function { ref name, .. } if name.name == "id"
                ));
            }
            other => panic!("expected id() prefilter, got {:?}", other),
        }
    }

    #[test]
    fn test_lower_multiple_filters_joined_with_and() {
        let query = lower("g.V().has('age', gt(18)).has('age', lt(65))");
        let conditions = query.where_clause.unwrap().conditions;
        match conditions {
            Expr::Logical { op, operands, .. } => {
                assert_eq!(op, LogicalOp::And);
                assert_eq!(operands.len(), 2);
            }
            other => panic!("expected AND, got {:?}", other),
        }
    }

    #[test]
    fn test_lower_order_and_limit() {
        let query = lower("g.V().hasLabel('User').order().by('age', desc).limit(10)");
        assert_eq!(query.return_clause.limit, Some(10));
        assert_eq!(query.return_clause.order_by.len(), 1);
        assert_eq!(query.return_clause.order_by[0].1, SortOrder::Desc);
    }

    #[test]
    fn test_lower_count() {
        let query = lower("g.V().hasLabel('User').count()");
        assert!(matches!(
            &query.return_clause.items[0].expression,
            Expr::Function { name, .. } if name.name == "count"
        ));
    }

    #[test]
    fn test_lower_dedup_sets_distinct() {
        assert!(lower("g.V().dedup()").return_clause.distinct);
    }

    #[test]
    fn test_lower_rejects_edge_start() {
        let err = lower_err("g.E()");
        assert!(matches!(err, GremlinError::UnsupportedPattern(_)));
    }

    #[test]
    fn test_lower_rejects_multi_label() {
        let err = lower_err("g.V().hasLabel('User').hasLabel('Person')");
        assert!(matches!(err, GremlinError::UnsupportedMultiLabel { .. }));
    }

    #[test]
    fn test_lower_rejects_value_map() {
        let err = lower_err("g.V().valueMap('name')");
        assert!(matches!(err, GremlinError::UnsupportedProjectionType(_)));
    }

    #[test]
    fn test_lower_rejects_edge_traversal() {
        let err = lower_err("g.V().outE('KNOWS')");
        assert!(matches!(
            err,
            GremlinError::UnsupportedTraversalDirection(_)
        ));
    }

    #[test]
    fn test_lower_rejects_double_projection() {
        let err = lower_err("g.V().values('a').values('b')");
        assert!(matches!(err, GremlinError::UnsupportedPattern(_)));
    }

    #[test]
    fn test_lower_rejects_dangling_order() {
        let err = lower_err("g.V().order()");
        assert!(matches!(err, GremlinError::UnsupportedPattern(_)));
    }
}
