//! Cross-stage properties from the conformance checklist: path arity,
//! resolver totality, optimizer fixpoint, cache consistency, and literal
//! encoding.

use std::sync::Arc;

use kustograph::ai_translator::{PatternCache, QueryComplexity};
use kustograph::cypher::parse_query;
use kustograph::kql_generator::KqlEmitter;
use kustograph::query_planner::optimizer::{optimize, DEFAULT_ITERATION_CAP};
use kustograph::query_planner::plan_builder::build_plan;
use kustograph::query_planner::plan_ctx::PlanCtx;
use kustograph::resolver::resolve;
use kustograph::schema_catalog::SchemaCatalog;

const SAMPLE_QUERIES: [&str; 10] = [
    "MATCH (n:User) RETURN n",
    "MATCH (n:User {name: 'John'}) RETURN n",
    "MATCH (n:User)-[r:KNOWS]->(m:User) RETURN n, m",
    "MATCH (n:User)<-[r:FOLLOWS]-(m:User) RETURN n, m",
    "MATCH (a:User)-[r:OWNS]->(d:Device)-[c:CONNECTED_TO]->(ip:IpAddress) RETURN a, ip",
    "MATCH (n:User) WHERE n.age > 30 AND n.name = 'Alice' RETURN n.name ORDER BY n.age DESC LIMIT 5",
    "MATCH (n:User), (m:Device) RETURN n, m",
    "MATCH (a)-[r*1..3]->(b) RETURN a, b",
    "MATCH (n:User) RETURN DISTINCT n.department SKIP 2 LIMIT 10",
    "MATCH (n:User) WHERE n.role IN ['admin', 'root'] OR n.age <= 21 RETURN count(n) AS total",
];

#[test]
fn test_path_arity_invariant() {
    for query in SAMPLE_QUERIES {
        let ast = parse_query(query).expect("parse failed");
        for path in &ast.match_clause.paths {
            assert_eq!(
                path.nodes().len(),
                path.relationships().len() + 1,
                "arity violated for {:?}",
                query
            );
        }
    }
}

#[test]
fn test_resolver_totality() {
    // Every variable referenced in WHERE or RETURN of a resolving query
    // is bound by MATCH.
    let catalog = SchemaCatalog::builtin_default();
    for query in SAMPLE_QUERIES {
        let ast = parse_query(query).expect("parse failed");
        let resolved = resolve(ast, &catalog).expect("resolve failed");

        for item in &resolved.ast.return_clause.items {
            for variable in expr_variables(&item.expression) {
                assert!(
                    resolved.binding(&variable).is_some(),
                    "unbound variable '{}' in {:?}",
                    variable,
                    query
                );
            }
        }
        if let Some(where_clause) = &resolved.ast.where_clause {
            for variable in expr_variables(&where_clause.conditions) {
                assert!(resolved.binding(&variable).is_some());
            }
        }
    }
}

fn expr_variables(expr: &kustograph::cypher::ast::Expr) -> Vec<String> {
    use kustograph::cypher::ast::Expr;
    match expr {
        Expr::Identifier(id) if id.name != "*" => vec![id.name.clone()],
        Expr::Identifier(_) | Expr::Literal { .. } => vec![],
        Expr::Property { variable, .. } => vec![variable.name.clone()],
        Expr::Comparison { left, right, .. } => {
            let mut vars = expr_variables(left);
            vars.extend(expr_variables(right));
            vars
        }
        Expr::Logical { operands, .. } => operands.iter().flat_map(expr_variables).collect(),
        Expr::Function { args, .. } => args.iter().flat_map(expr_variables).collect(),
        Expr::IsNull { operand, .. } => expr_variables(operand),
        Expr::List { items, .. } => items.iter().flat_map(expr_variables).collect(),
    }
}

#[test]
fn test_optimizer_fixpoint_for_all_samples() {
    let catalog = Arc::new(SchemaCatalog::builtin_default());
    for query in SAMPLE_QUERIES {
        let ast = parse_query(query).expect("parse failed");
        let resolved = resolve(ast, &catalog).expect("resolve failed");
        let plan = build_plan(&resolved, &catalog).expect("plan failed");
        let mut ctx = PlanCtx::new(catalog.clone(), &resolved);

        let once = optimize(plan, &mut ctx, DEFAULT_ITERATION_CAP).expect("optimize failed");
        let twice =
            optimize(once.clone(), &mut ctx, DEFAULT_ITERATION_CAP).expect("optimize failed");
        assert_eq!(once, twice, "fixpoint not reached for {:?}", query);
    }
}

#[test]
fn test_emission_is_deterministic() {
    let catalog = Arc::new(SchemaCatalog::builtin_default());
    for query in SAMPLE_QUERIES {
        let render = || {
            let ast = parse_query(query).expect("parse failed");
            let resolved = resolve(ast, &catalog).expect("resolve failed");
            let plan = build_plan(&resolved, &catalog).expect("plan failed");
            let mut ctx = PlanCtx::new(catalog.clone(), &resolved);
            let plan = optimize(plan, &mut ctx, DEFAULT_ITERATION_CAP).expect("optimize failed");
            KqlEmitter::new(&catalog).emit(&plan).expect("emit failed")
        };
        assert_eq!(render(), render(), "nondeterministic for {:?}", query);
    }
}

#[test]
fn test_string_literals_in_output_are_balanced() {
    let catalog = Arc::new(SchemaCatalog::builtin_default());
    for query in SAMPLE_QUERIES {
        let ast = parse_query(query).expect("parse failed");
        let resolved = resolve(ast, &catalog).expect("resolve failed");
        let plan = build_plan(&resolved, &catalog).expect("plan failed");
        let mut ctx = PlanCtx::new(catalog.clone(), &resolved);
        let plan = optimize(plan, &mut ctx, DEFAULT_ITERATION_CAP).expect("optimize failed");
        let kql = KqlEmitter::new(&catalog).emit(&plan).expect("emit failed");

        let unescaped = kql.replace("\\'", "");
        assert_eq!(
            unescaped.matches('\'').count() % 2,
            0,
            "unbalanced quotes in output for {:?}: {}",
            query,
            kql
        );
    }
}

#[test]
fn test_cache_consistency() {
    let cache = PatternCache::with_defaults();
    cache.put("MATCH (n) RETURN n", "graph.nodes | project n", QueryComplexity::Simple);

    let entry = cache.get("MATCH (n) RETURN n").expect("expected hit");
    assert_eq!(entry.kql_template, "graph.nodes | project n");

    // Hit counters increase monotonically.
    let before = entry.hit_count;
    let after = cache.get("MATCH (n) RETURN n").expect("expected hit").hit_count;
    assert!(after > before);

    // clear() zeroes entries and learned patterns.
    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.patterns().is_empty());
}
