//! Calibration benchmark: a fixed workload of 100+ queries across
//! complexity tiers, checked against the routing and caching targets
//! (FastPath share ≥ 70%, translation success ≥ 90%, second-pass cache
//! hit rate ≥ 60%).

use std::sync::Arc;

use kustograph::ai_translator::MockAiClient;
use kustograph::config::TranslatorConfig;
use kustograph::schema_catalog::SchemaCatalog;
use kustograph::translator::{Dialect, QueryContext, TranslatorEngine};

fn engine() -> TranslatorEngine {
    TranslatorEngine::new(
        Arc::new(SchemaCatalog::builtin_default()),
        TranslatorConfig::default(),
    )
    .with_ai_client(Arc::new(MockAiClient::new()))
}

/// The benchmark workload: simple scans, filtered queries, multi-hop
/// patterns, and a tail of complex shapes.
fn benchmark_queries() -> Vec<String> {
    let mut queries = Vec::new();

    // Simple tier: node scans and single filters.
    for age in [18, 21, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70] {
        queries.push(format!("MATCH (n:User) WHERE n.age > {} RETURN n", age));
        queries.push(format!(
            "MATCH (n:User) WHERE n.age <= {} RETURN n.name",
            age
        ));
    }
    for name in ["Alice", "Bob", "Carol", "Dave", "Erin", "Frank", "Grace", "Heidi"] {
        queries.push(format!("MATCH (n:User {{name: '{}'}}) RETURN n", name));
        queries.push(format!(
            "MATCH (n:User) WHERE n.name = '{}' RETURN n.email",
            name
        ));
    }
    for label in ["User", "Device", "IpAddress"] {
        queries.push(format!("MATCH (n:{}) RETURN n", label));
        queries.push(format!("MATCH (n:{}) RETURN DISTINCT n LIMIT 50", label));
    }

    // Medium tier: relationships, ordering, aggregation.
    for rel in ["KNOWS", "FOLLOWS"] {
        for age in [20, 30, 40, 50] {
            queries.push(format!(
                "MATCH (n:User)-[r:{}]->(m:User) WHERE n.age > {} RETURN n, m",
                rel, age
            ));
        }
        queries.push(format!(
            "MATCH (n:User)-[r:{}]->(m:User) RETURN n.name, m.name ORDER BY n.name LIMIT 20",
            rel
        ));
    }
    for limit in [5, 10, 25, 50] {
        queries.push(format!(
            "MATCH (u:User)-[o:OWNS]->(d:Device) RETURN u.name, d.name LIMIT {}",
            limit
        ));
        queries.push(format!(
            "MATCH (d:Device)-[c:CONNECTED_TO]->(ip:IpAddress) WHERE d.risk_score > 0.5 RETURN d, ip LIMIT {}",
            limit
        ));
    }
    queries.push("MATCH (n:User) RETURN count(n) AS total".to_string());
    queries.push("MATCH (n:User) WHERE n.age > 30 RETURN count(n) AS older".to_string());
    queries.push(
        "MATCH (n:User) WHERE n.role IN ['admin', 'root'] RETURN n.name ORDER BY n.name"
            .to_string(),
    );

    // Complex tier: multi-hop and variable-length shapes.
    for max in [2, 3, 4, 5] {
        queries.push(format!("MATCH (a)-[r*1..{}]->(b) RETURN a, b", max));
    }
    for age in [25, 45] {
        queries.push(format!(
            "MATCH (a:User)-[o:OWNS]->(d:Device)-[c:CONNECTED_TO]->(ip:IpAddress) \
             WHERE a.age > {} AND d.risk_score > 0.7 \
             RETURN a.name, d.name, ip.address ORDER BY a.name DESC LIMIT 10",
            age
        ));
    }

    queries
}

#[tokio::test]
async fn test_benchmark_calibration() {
    let engine = engine();
    let ctx = QueryContext::default();
    let queries = benchmark_queries();
    assert!(
        queries.len() >= 100,
        "benchmark set too small: {}",
        queries.len()
    );

    // First pass: cold cache.
    let mut successes = 0usize;
    for query in &queries {
        if engine.translate(query, Dialect::Cypher, &ctx).await.is_ok() {
            successes += 1;
        }
    }
    let success_rate = successes as f64 / queries.len() as f64;
    assert!(
        success_rate >= 0.9,
        "translation success rate {:.2} below 0.9",
        success_rate
    );

    let after_first = engine.statistics();

    // Second pass: the workload repeats; the cache should carry it.
    for query in &queries {
        let _ = engine.translate(query, Dialect::Cypher, &ctx).await;
    }
    let after_second = engine.statistics();

    let second_pass_hits = after_second.cache.cache_hits - after_first.cache.cache_hits;
    let second_pass_total = after_second.cache.total_queries - after_first.cache.total_queries;
    let second_pass_hit_rate = second_pass_hits as f64 / second_pass_total.max(1) as f64;
    assert!(
        second_pass_hit_rate >= 0.6,
        "second-pass hit rate {:.2} below 0.6",
        second_pass_hit_rate
    );

    // Routing: the deterministic fast path must dominate.
    let routes = &after_second.routes;
    let total: u64 = routes.values().map(|stats| stats.total).sum();
    let fast_share = routes["fast_path"].total as f64 / total.max(1) as f64;
    assert!(
        fast_share >= 0.7,
        "fast-path share {:.2} below 0.7",
        fast_share
    );
}

#[tokio::test]
async fn test_benchmark_repeat_is_stable() {
    // A handful of workload queries translated twice yield identical
    // KQL, cold or cached.
    let engine = engine();
    let ctx = QueryContext::default();
    for query in benchmark_queries().iter().take(10) {
        let first = engine
            .translate(query, Dialect::Cypher, &ctx)
            .await
            .expect("first translation failed");
        let second = engine
            .translate(query, Dialect::Cypher, &ctx)
            .await
            .expect("second translation failed");
        assert_eq!(first.query, second.query, "unstable for {:?}", query);
    }
}
