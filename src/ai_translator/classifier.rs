//! Complexity classification and route selection.
//!
//! The classifier scores a query on weighted lexical factors (weights
//! sum to 1.0), maps the score to a complexity tier, and picks one of
//! three routes. Per-route success counters feed back into routing: a
//! route whose observed success rate drops below the configured
//! threshold has its choice damped to the next alternative.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum QueryComplexity {
    Simple,
    Medium,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TranslationRoute {
    FastPath,
    AiPath,
    Fallback,
}

impl TranslationRoute {
    pub const ALL: [TranslationRoute; 3] = [
        TranslationRoute::FastPath,
        TranslationRoute::AiPath,
        TranslationRoute::Fallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationRoute::FastPath => "fast_path",
            TranslationRoute::AiPath => "ai_path",
            TranslationRoute::Fallback => "fallback",
        }
    }

    fn index(&self) -> usize {
        match self {
            TranslationRoute::FastPath => 0,
            TranslationRoute::AiPath => 1,
            TranslationRoute::Fallback => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComplexityScore {
    pub score: f64,
    pub factors: HashMap<&'static str, f64>,
    pub overall: QueryComplexity,
}

#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub route: TranslationRoute,
    pub confidence: f64,
    pub reasoning: String,
    pub alternatives: Vec<TranslationRoute>,
    pub complexity: ComplexityScore,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RouteStats {
    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
}

/// Factor weights; they sum to 1.0.
pub const WEIGHTS: [(&str, f64); 6] = [
    ("keyword_count", 0.20),
    ("token_length", 0.15),
    ("hop_count", 0.25),
    ("variable_length", 0.15),
    ("aggregation", 0.15),
    ("function_count", 0.10),
];

/// Minimum recorded attempts before damping can kick in.
const DAMPING_MIN_SAMPLES: u64 = 5;

/// Score below which a query is Simple, and above which it is Complex.
const SIMPLE_CEILING: f64 = 0.35;
const COMPLEX_FLOOR: f64 = 0.65;

const KEYWORDS: [&str; 14] = [
    "match", "optional", "where", "return", "distinct", "order", "by", "skip", "limit", "and",
    "or", "not", "in", "is",
];

const AGGREGATIONS: [&str; 5] = ["count(", "sum(", "avg(", "min(", "max("];

pub struct QueryClassifier {
    learning_enabled: bool,
    route_success_threshold: f64,
    successes: [AtomicU64; 3],
    failures: [AtomicU64; 3],
    classified: AtomicU64,
}

impl QueryClassifier {
    pub fn new(learning_enabled: bool, route_success_threshold: f64) -> Self {
        QueryClassifier {
            learning_enabled,
            route_success_threshold,
            successes: Default::default(),
            failures: Default::default(),
            classified: AtomicU64::new(0),
        }
    }

    pub fn complexity(&self, source: &str) -> ComplexityScore {
        let lowered = source.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        let keyword_count = tokens
            .iter()
            .filter(|token| KEYWORDS.contains(&token.trim_matches(|c: char| !c.is_alphanumeric())))
            .count();
        let hop_count = lowered.matches("->").count()
            + lowered.matches("<-").count()
            + lowered.matches(".out(").count()
            + lowered.matches(".in(").count()
            + lowered.matches(".both(").count();
        let has_variable_length = lowered.contains('*') && lowered.contains('[');
        let has_aggregation = AGGREGATIONS.iter().any(|agg| lowered.contains(agg));
        let function_count = lowered
            .char_indices()
            .filter(|&(i, c)| {
                c == '(' && i > 0 && lowered[..i].ends_with(|p: char| p.is_alphanumeric())
            })
            .count();

        let mut factors = HashMap::new();
        factors.insert("keyword_count", (keyword_count as f64 / 10.0).min(1.0));
        factors.insert("token_length", (tokens.len() as f64 / 50.0).min(1.0));
        factors.insert("hop_count", (hop_count as f64 / 5.0).min(1.0));
        factors.insert("variable_length", if has_variable_length { 1.0 } else { 0.0 });
        factors.insert("aggregation", if has_aggregation { 1.0 } else { 0.0 });
        factors.insert("function_count", (function_count as f64 / 5.0).min(1.0));

        let score: f64 = WEIGHTS
            .iter()
            .map(|(name, weight)| factors.get(name).copied().unwrap_or(0.0) * weight)
            .sum();
        let score = score.clamp(0.0, 1.0);

        let overall = if score < SIMPLE_CEILING {
            QueryComplexity::Simple
        } else if score < COMPLEX_FLOOR {
            QueryComplexity::Medium
        } else {
            QueryComplexity::Complex
        };

        ComplexityScore {
            score,
            factors,
            overall,
        }
    }

    pub fn classify(&self, source: &str, force_ai: bool) -> RouteDecision {
        if self.learning_enabled {
            self.classified.fetch_add(1, Ordering::Relaxed);
        }

        let complexity = self.complexity(source);

        if force_ai {
            return RouteDecision {
                route: TranslationRoute::AiPath,
                confidence: 0.9,
                reasoning: "Forced AI routing".to_string(),
                alternatives: alternatives(TranslationRoute::AiPath),
                complexity,
            };
        }

        let trimmed = source.trim_start().to_lowercase();
        let looks_like_query = trimmed.starts_with("match")
            || trimmed.starts_with("optional")
            || trimmed.starts_with("g.");

        let mut route = if !looks_like_query {
            TranslationRoute::Fallback
        } else if complexity.overall == QueryComplexity::Complex {
            TranslationRoute::AiPath
        } else {
            TranslationRoute::FastPath
        };

        // Damping: a route with a poor observed success rate yields to
        // the next alternative.
        if self.is_damped(route) {
            let next = match route {
                TranslationRoute::FastPath => TranslationRoute::AiPath,
                TranslationRoute::AiPath | TranslationRoute::Fallback => {
                    TranslationRoute::Fallback
                }
            };
            log::warn!(
                "route {} damped (success rate below {:.2}); using {}",
                route.as_str(),
                self.route_success_threshold,
                next.as_str()
            );
            route = next;
        }

        let confidence = match route {
            TranslationRoute::FastPath => (1.0 - complexity.score * 0.4).clamp(0.5, 1.0),
            TranslationRoute::AiPath => 0.6,
            TranslationRoute::Fallback => 0.3,
        };

        let reasoning = format!(
            "complexity {:.2} ({:?}) routes to {}",
            complexity.score,
            complexity.overall,
            route.as_str()
        );

        RouteDecision {
            route,
            confidence,
            reasoning,
            alternatives: alternatives(route),
            complexity,
        }
    }

    fn is_damped(&self, route: TranslationRoute) -> bool {
        let stats = self.stats_for(route);
        stats.total >= DAMPING_MIN_SAMPLES && stats.success_rate < self.route_success_threshold
    }

    pub fn record_success(&self, route: TranslationRoute) {
        self.successes[route.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, route: TranslationRoute) {
        self.failures[route.index()].fetch_add(1, Ordering::Relaxed);
    }

    fn stats_for(&self, route: TranslationRoute) -> RouteStats {
        let successes = self.successes[route.index()].load(Ordering::Relaxed);
        let failures = self.failures[route.index()].load(Ordering::Relaxed);
        let total = successes + failures;
        RouteStats {
            total,
            successes,
            failures,
            success_rate: if total == 0 {
                1.0
            } else {
                successes as f64 / total as f64
            },
        }
    }

    /// Snapshot of per-route counters; slightly stale reads are fine.
    pub fn route_statistics(&self) -> HashMap<&'static str, RouteStats> {
        TranslationRoute::ALL
            .iter()
            .map(|route| (route.as_str(), self.stats_for(*route)))
            .collect()
    }

    pub fn classified_count(&self) -> u64 {
        self.classified.load(Ordering::Relaxed)
    }

    pub fn reset_statistics(&self) {
        for counter in self.successes.iter().chain(self.failures.iter()) {
            counter.store(0, Ordering::Relaxed);
        }
        self.classified.store(0, Ordering::Relaxed);
    }
}

fn alternatives(chosen: TranslationRoute) -> Vec<TranslationRoute> {
    TranslationRoute::ALL
        .into_iter()
        .filter(|route| *route != chosen)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> QueryClassifier {
        QueryClassifier::new(true, 0.5)
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_simple_query_routes_fast() {
        let decision = classifier().classify("MATCH (n:User) RETURN n", false);
        assert_eq!(decision.route, TranslationRoute::FastPath);
        assert_eq!(decision.complexity.overall, QueryComplexity::Simple);
        assert!(decision.confidence > 0.7);
    }

    #[test]
    fn test_complex_query_routes_ai() {
        let query = "MATCH (a:User)-[r1:KNOWS*1..5]->(b:User)-[r2:OWNS]->(c:Device)<-[r3:CONNECTED_TO]-(d:IpAddress) \
                     WHERE a.age > 30 AND b.age < 65 AND count(r1) > 2 OR NOT c.os = 'linux' AND length(d.subnet) > 4 \
                     RETURN DISTINCT a, count(b), sum(c.risk_score), min(d.address), max(a.age) \
                     ORDER BY a.age DESC SKIP 10 LIMIT 100";
        let decision = classifier().classify(query, false);
        assert_eq!(decision.complexity.overall, QueryComplexity::Complex);
        assert_eq!(decision.route, TranslationRoute::AiPath);
    }

    #[test]
    fn test_non_query_routes_fallback() {
        let decision = classifier().classify("explain how to find nodes", false);
        assert_eq!(decision.route, TranslationRoute::Fallback);
    }

    #[test]
    fn test_force_ai_overrides() {
        let decision = classifier().classify("MATCH (n) RETURN n", true);
        assert_eq!(decision.route, TranslationRoute::AiPath);
        assert!(decision.reasoning.contains("Forced"));
    }

    #[test]
    fn test_score_in_unit_interval_with_factors() {
        let decision = classifier().classify("MATCH (n:User) WHERE n.age > 30 RETURN n", false);
        assert!(decision.complexity.score >= 0.0 && decision.complexity.score <= 1.0);
        assert_eq!(decision.complexity.factors.len(), WEIGHTS.len());
    }

    #[test]
    fn test_alternatives_exclude_chosen() {
        let decision = classifier().classify("MATCH (n) RETURN n", false);
        assert_eq!(decision.alternatives.len(), 2);
        assert!(!decision.alternatives.contains(&decision.route));
    }

    #[test]
    fn test_success_rate_tracking() {
        let classifier = classifier();
        classifier.record_success(TranslationRoute::FastPath);
        classifier.record_success(TranslationRoute::FastPath);
        classifier.record_failure(TranslationRoute::FastPath);

        let stats = classifier.route_statistics();
        let fast = &stats["fast_path"];
        assert_eq!(fast.total, 3);
        assert_eq!(fast.successes, 2);
        assert_eq!(fast.failures, 1);
        assert!((fast.success_rate - 2.0 / 3.0).abs() < 0.01);
    }

    #[test]
    fn test_damping_diverts_route() {
        let classifier = classifier();
        for _ in 0..6 {
            classifier.record_failure(TranslationRoute::FastPath);
        }
        let decision = classifier.classify("MATCH (n:User) RETURN n", false);
        assert_eq!(decision.route, TranslationRoute::AiPath);
    }

    #[test]
    fn test_no_damping_below_sample_floor() {
        let classifier = classifier();
        classifier.record_failure(TranslationRoute::FastPath);
        let decision = classifier.classify("MATCH (n:User) RETURN n", false);
        assert_eq!(decision.route, TranslationRoute::FastPath);
    }

    #[test]
    fn test_reset_statistics() {
        let classifier = classifier();
        classifier.record_success(TranslationRoute::AiPath);
        classifier.classify("MATCH (n) RETURN n", false);
        classifier.reset_statistics();
        assert_eq!(classifier.route_statistics()["ai_path"].total, 0);
        assert_eq!(classifier.classified_count(), 0);
    }

    #[test]
    fn test_learning_disabled_skips_history() {
        let classifier = QueryClassifier::new(false, 0.5);
        classifier.classify("MATCH (n) RETURN n", false);
        assert_eq!(classifier.classified_count(), 0);
    }
}
