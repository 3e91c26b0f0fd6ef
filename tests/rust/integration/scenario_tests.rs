//! End-to-end translation scenarios over the built-in schema.

use std::sync::Arc;

use kustograph::ai_translator::MockAiClient;
use kustograph::config::TranslatorConfig;
use kustograph::schema_catalog::SchemaCatalog;
use kustograph::translator::{Dialect, QueryContext, TranslationStrategy, TranslatorEngine};

fn engine() -> TranslatorEngine {
    TranslatorEngine::new(
        Arc::new(SchemaCatalog::builtin_default()),
        TranslatorConfig::default(),
    )
    .with_ai_client(Arc::new(MockAiClient::new()))
}

async fn translate(engine: &TranslatorEngine, query: &str) -> String {
    engine
        .translate(query, Dialect::Cypher, &QueryContext::default())
        .await
        .unwrap_or_else(|e| panic!("translation of {:?} failed: {}", query, e))
        .query
}

#[tokio::test]
async fn test_simple_node() {
    let engine = engine();
    let kql = translate(&engine, "MATCH (n:User) RETURN n").await;
    assert!(kql.contains("graph-match"), "kql: {}", kql);
    assert!(kql.contains("(n:User)"), "kql: {}", kql);
    assert!(kql.contains("project n"), "kql: {}", kql);
}

#[tokio::test]
async fn test_node_with_property_map() {
    let engine = engine();
    let kql = translate(&engine, "MATCH (n:User {name: 'John'}) RETURN n").await;
    assert!(kql.contains("name: 'John'"), "kql: {}", kql);
}

#[tokio::test]
async fn test_directed_relationship() {
    let engine = engine();
    let kql = translate(&engine, "MATCH (n:User)-[r:KNOWS]->(m:User) RETURN n, m").await;
    assert!(kql.contains("-[r:KNOWS]->"), "kql: {}", kql);
    assert!(kql.contains("project n, m"), "kql: {}", kql);
}

#[tokio::test]
async fn test_where_order_limit() {
    let engine = engine();
    let kql = translate(
        &engine,
        "MATCH (n:User) WHERE n.age > 30 RETURN n.name ORDER BY n.age DESC LIMIT 5",
    )
    .await;
    assert!(kql.contains("where"), "kql: {}", kql);
    assert!(kql.contains("n.age > 30"), "kql: {}", kql);
    assert!(kql.contains("project n.name"), "kql: {}", kql);
    assert!(kql.contains("sort by"), "kql: {}", kql);
    assert!(kql.contains("n.age desc"), "kql: {}", kql);
    assert!(kql.contains("limit 5"), "kql: {}", kql);
}

#[tokio::test]
async fn test_variable_length_path() {
    let engine = engine();
    let kql = translate(&engine, "MATCH (a)-[r*1..3]->(b) RETURN a, b").await;
    assert!(kql.contains("*1..3"), "kql: {}", kql);
}

#[tokio::test]
async fn test_shortest_path_programmatic() {
    let engine = engine();
    let result = engine
        .translate_shortest_path("n", "m", Some("KNOWS"), Some(5))
        .expect("shortest path translation failed");
    assert!(result.query.contains("graph-shortest-paths"));
    assert!(result.query.contains("(n)"));
    assert!(result.query.contains("-[KNOWS]->"));
    assert!(result.query.contains("(m)"));
    assert!(result.query.contains("path_length <= 5"));
}

#[tokio::test]
async fn test_gremlin_lowering_matches_cypher_shape() {
    let engine = engine();
    let gremlin = engine
        .translate(
            "g.V().hasLabel('User').has('age',30).out('OWNS').values('name')",
            Dialect::Gremlin,
            &QueryContext::default(),
        )
        .await
        .expect("gremlin translation failed");

    // Equivalent of MATCH (v0:User)-[:OWNS]->(v1) WHERE v0.age = 30
    // RETURN v1.name
    assert!(gremlin.query.contains("(v0:User)"), "kql: {}", gremlin.query);
    assert!(gremlin.query.contains("-[:OWNS]->"), "kql: {}", gremlin.query);
    assert!(gremlin.query.contains("(v1)"), "kql: {}", gremlin.query);
    assert!(gremlin.query.contains("v0.age == 30"), "kql: {}", gremlin.query);
    assert!(gremlin.query.contains("project v1.name"), "kql: {}", gremlin.query);
}

#[tokio::test]
async fn test_cache_hit_sequence() {
    let engine = engine();
    let ctx = QueryContext::default();
    let query = "MATCH (n:User) RETURN n";

    let first = engine.translate(query, Dialect::Cypher, &ctx).await.unwrap();
    assert_eq!(first.strategy, TranslationStrategy::PlanPath);

    let second = engine.translate(query, Dialect::Cypher, &ctx).await.unwrap();
    assert_eq!(second.strategy, TranslationStrategy::FastPath);

    let stats = engine.statistics();
    assert!((stats.cache.hit_rate - 0.5).abs() < 1e-9);
    assert_eq!(stats.routes["fast_path"].total, 2);
    assert!(stats.routes["fast_path"].successes >= 1);
}

#[tokio::test]
async fn test_round_trip_stability() {
    // Repeated translation of the same source yields byte-identical KQL.
    let engine = engine();
    let queries = [
        "MATCH (n:User) RETURN n",
        "MATCH (n:User)-[r:KNOWS]->(m:User) WHERE n.age > 30 RETURN n, m",
        "MATCH (a)-[r*1..3]->(b) RETURN a, b",
    ];
    for query in queries {
        let first = translate(&engine, query).await;
        let second = translate(&engine, query).await;
        assert_eq!(first, second, "unstable output for {:?}", query);
    }
}

#[tokio::test]
async fn test_emitted_kql_passes_validation() {
    let engine = engine();
    for query in [
        "MATCH (n:User) RETURN n",
        "MATCH (n:User {name: 'John'}) RETURN n",
        "MATCH (n:User)-[r:KNOWS]->(m:User) RETURN n, m",
        "MATCH (a)-[r*1..3]->(b) RETURN a, b",
        "MATCH (n:User) WHERE n.age > 30 RETURN n.name ORDER BY n.age DESC LIMIT 5",
    ] {
        let kql = translate(&engine, query).await;
        assert!(engine.validate(&kql), "validation failed for {:?}: {}", query, kql);
    }
}

#[tokio::test]
async fn test_structured_error_for_unknown_schema_references() {
    let engine = engine();
    let ctx = QueryContext::default();

    let label_err = engine
        .translate("MATCH (n:Ghost) RETURN n", Dialect::Cypher, &ctx)
        .await
        .expect_err("unknown label must fail");
    assert!(label_err.to_string().contains("Ghost"));

    let prop_err = engine
        .translate("MATCH (n:User) WHERE n.shoe_size = 9 RETURN n", Dialect::Cypher, &ctx)
        .await
        .expect_err("unknown property must fail");
    assert!(prop_err.to_string().contains("shoe_size"));
    assert!(prop_err.suggested_fix().is_some());
}
