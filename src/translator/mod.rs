//! The translation engine.
//!
//! [`TranslatorEngine`] owns the catalog, pattern cache, classifier, and
//! validator, and drives a request through routing, the deterministic
//! pipeline, and the optional AI fallback. One engine serves the whole
//! process; all per-request state stays on the stack.

pub mod errors;
pub mod models;

use std::sync::Arc;
use std::time::Instant;

use crate::ai_translator::{
    translate_with_retry, AiTranslatorClient, PatternCache, PatternCacheConfig, QueryClassifier,
    RouteDecision, SemanticValidator, TranslationRoute,
};
use crate::config::TranslatorConfig;
use crate::cypher;
use crate::gremlin;
use crate::kql_generator::KqlEmitter;
use crate::path_algorithms::ShortestPathTranslator;
use crate::query_planner::logical_plan::PathConstraint;
use crate::query_planner::{optimizer, plan_builder, PlanCtx};
use crate::resolver;
use crate::schema_catalog::SchemaCatalog;

pub use errors::{sort_by_span, TranslationError};
pub use models::{
    Dialect, KqlQuery, QueryContext, TranslationStrategy, TranslationSummary, Warning,
};

const AI_MAX_TOKENS: u32 = 1024;
const AI_TEMPERATURE: f32 = 0.0;

const AI_SYSTEM_PROMPT: &str = "You translate graph queries into Kusto Query Language for an \
Azure Sentinel workspace. Reply with a single KQL pipeline and nothing else.";

pub struct TranslatorEngine {
    catalog: Arc<SchemaCatalog>,
    cache: PatternCache,
    classifier: QueryClassifier,
    validator: SemanticValidator,
    ai_client: Option<Arc<dyn AiTranslatorClient>>,
    config: TranslatorConfig,
}

/// Aggregate counters exposed by the stats endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineStatistics {
    pub cache: crate::ai_translator::CacheStatistics,
    pub routes: std::collections::HashMap<&'static str, crate::ai_translator::RouteStats>,
    pub validations: u64,
    pub validation_errors: u64,
}

impl TranslatorEngine {
    pub fn new(catalog: Arc<SchemaCatalog>, config: TranslatorConfig) -> Self {
        let cache = PatternCache::new(PatternCacheConfig {
            capacity: config.cache_capacity,
            ttl: config.cache_ttl(),
            learning_enabled: true,
        });
        let classifier = QueryClassifier::new(true, config.route_success_threshold);

        let mut known_tables: Vec<String> = catalog
            .labels()
            .map(|label| label.table.clone())
            .chain(catalog.relationships().map(|rel| rel.table.clone()))
            .chain(catalog.tables().map(|table| table.name.clone()))
            .collect();
        known_tables.sort();
        known_tables.dedup();
        let validator = SemanticValidator::new(config.strict_mode, known_tables);

        TranslatorEngine {
            catalog,
            cache,
            classifier,
            validator,
            ai_client: None,
            config,
        }
    }

    /// Attach the fallback model client.
    pub fn with_ai_client(mut self, client: Arc<dyn AiTranslatorClient>) -> Self {
        self.ai_client = Some(client);
        self
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Translate one query. The entry point of the whole crate.
    pub async fn translate(
        &self,
        source: &str,
        dialect: Dialect,
        context: &QueryContext,
    ) -> Result<KqlQuery, TranslationError> {
        let deadline = Instant::now() + self.config.deadline();
        let decision = self.classifier.classify(source, context.force_ai);
        log::debug!(
            "request {}: route {} ({})",
            context.request_id,
            decision.route.as_str(),
            decision.reasoning
        );

        let result = match decision.route {
            TranslationRoute::FastPath => {
                self.run_fast_path(source, dialect, &decision, context, deadline)
                    .await
            }
            TranslationRoute::AiPath => {
                self.run_ai_path(source, dialect, &decision, context, deadline)
                    .await
            }
            TranslationRoute::Fallback => self.run_plan_path(source, dialect, &decision, deadline),
        };

        match &result {
            Ok(_) => {
                self.classifier.record_success(decision.route);
                self.cache.record_success(source);
            }
            Err(error) => {
                self.classifier.record_failure(decision.route);
                self.cache.record_failure(source);
                log::debug!("request {}: failed: {}", context.request_id, error);
            }
        }
        result
    }

    /// Validate API: structural checks over a KQL string.
    pub fn validate(&self, kql: &str) -> bool {
        self.validator.validate(kql).is_valid
    }

    pub fn validate_detailed(&self, kql: &str) -> crate::ai_translator::ValidationResult {
        self.validator.validate(kql)
    }

    pub fn statistics(&self) -> EngineStatistics {
        EngineStatistics {
            cache: self.cache.statistics(),
            routes: self.classifier.route_statistics(),
            validations: self.validator.validation_count(),
            validation_errors: self.validator.error_count(),
        }
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Translation metadata without running the emitter.
    pub fn translation_summary(
        &self,
        source: &str,
        dialect: Dialect,
    ) -> Result<TranslationSummary, TranslationError> {
        let ast = self.parse(source, dialect)?;
        let num_hops = ast
            .match_clause
            .paths
            .iter()
            .map(|path| path.hop_count())
            .sum();
        let has_variable_length_paths = ast
            .match_clause
            .paths
            .iter()
            .any(|path| path.has_variable_length());
        let num_conditions = ast
            .where_clause
            .as_ref()
            .map(|w| w.conditions.condition_count())
            .unwrap_or(0);
        let has_aggregation = ast.has_aggregation();
        let estimated_complexity = self.classifier.complexity(source).overall;

        Ok(TranslationSummary {
            num_hops,
            has_variable_length_paths,
            num_conditions,
            has_aggregation,
            estimated_complexity,
        })
    }

    /// Programmatic shortest-path API.
    pub fn translate_shortest_path(
        &self,
        source: &str,
        target: &str,
        relationship: Option<&str>,
        max_length: Option<u32>,
    ) -> Result<KqlQuery, TranslationError> {
        let constraints = PathConstraint {
            max_length,
            ..Default::default()
        };
        let query =
            ShortestPathTranslator::new().translate(source, target, relationship, &constraints, None)?;
        Ok(KqlQuery {
            query,
            strategy: TranslationStrategy::PlanPath,
            confidence: 1.0,
            diagnostics: Vec::new(),
        })
    }

    async fn run_fast_path(
        &self,
        source: &str,
        dialect: Dialect,
        decision: &RouteDecision,
        context: &QueryContext,
        deadline: Instant,
    ) -> Result<KqlQuery, TranslationError> {
        if let Some(entry) = self.cache.get(source) {
            log::debug!("cache hit ({} prior hits)", entry.hit_count);
            return Ok(KqlQuery {
                query: entry.kql_template,
                strategy: TranslationStrategy::FastPath,
                confidence: decision.confidence.clamp(0.0, 1.0),
                diagnostics: Vec::new(),
            });
        }

        match self.run_plan_path(source, dialect, decision, deadline) {
            Ok(result) => {
                self.cache
                    .put(source, &result.query, decision.complexity.overall);
                Ok(result)
            }
            Err(error) if error.is_downgradable() => {
                self.ai_rescue(source, decision, context, deadline, error)
                    .await
            }
            Err(error) => Err(error),
        }
    }

    /// The deterministic parse → resolve → plan → optimize → emit path.
    fn run_plan_path(
        &self,
        source: &str,
        dialect: Dialect,
        decision: &RouteDecision,
        deadline: Instant,
    ) -> Result<KqlQuery, TranslationError> {
        check_deadline(deadline)?;
        let ast = self.parse(source, dialect)?;
        let optional_match = ast.match_clause.optional;

        check_deadline(deadline)?;
        let resolved = resolver::resolve(ast, &self.catalog)?;

        check_deadline(deadline)?;
        let plan = plan_builder::build_plan(&resolved, &self.catalog)?;
        let mut plan_ctx = PlanCtx::new(self.catalog.clone(), &resolved);
        let plan = optimizer::optimize(plan, &mut plan_ctx, self.config.optimizer_iteration_cap)?;

        check_deadline(deadline)?;
        let kql = KqlEmitter::new(&self.catalog).emit(&plan)?;

        let validation = self.validator.validate(&kql);
        if !validation.is_valid {
            return Err(TranslationError::InvalidGeneratedKql(validation.errors));
        }

        let mut diagnostics: Vec<Warning> =
            validation.warnings.into_iter().map(Warning::new).collect();
        if optional_match {
            diagnostics.push(Warning::new(
                "OPTIONAL MATCH is approximated as a plain graph-match; unmatched rows are dropped",
            ));
        }

        Ok(KqlQuery {
            query: kql,
            strategy: TranslationStrategy::PlanPath,
            confidence: decision.confidence.clamp(0.0, 1.0),
            diagnostics,
        })
    }

    async fn run_ai_path(
        &self,
        source: &str,
        dialect: Dialect,
        decision: &RouteDecision,
        context: &QueryContext,
        deadline: Instant,
    ) -> Result<KqlQuery, TranslationError> {
        // Forced requests go straight to the model; otherwise a
        // deterministic translation is preferred when the pipeline can
        // handle the query.
        if context.force_ai {
            let original = TranslationError::UnsupportedPattern("AI routing forced".to_string());
            return self
                .ai_rescue(source, decision, context, deadline, original)
                .await;
        }
        match self.run_plan_path(source, dialect, decision, deadline) {
            Ok(result) => Ok(result),
            Err(error) if error.is_downgradable() => {
                self.ai_rescue(source, decision, context, deadline, error)
                    .await
            }
            Err(error) => Err(error),
        }
    }

    async fn ai_rescue(
        &self,
        source: &str,
        decision: &RouteDecision,
        context: &QueryContext,
        deadline: Instant,
        original: TranslationError,
    ) -> Result<KqlQuery, TranslationError> {
        if !(self.config.enable_ai && context.enable_ai) {
            return Err(TranslationError::UnsupportedPattern(original.to_string()));
        }
        let Some(client) = &self.ai_client else {
            return Err(TranslationError::UnsupportedPattern(original.to_string()));
        };

        let remaining = deadline
            .checked_duration_since(Instant::now())
            .ok_or(TranslationError::Timeout)?;

        let prompt = format!(
            "Translate this graph query to KQL.\n\nQuery: {}\n\nKnown tables: {}",
            source,
            self.catalog
                .labels()
                .map(|label| label.table.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let translation = tokio::time::timeout(
            remaining,
            translate_with_retry(
                client.as_ref(),
                &prompt,
                AI_MAX_TOKENS,
                AI_TEMPERATURE,
                Some(AI_SYSTEM_PROMPT),
            ),
        )
        .await
        .map_err(|_| TranslationError::Timeout)??;

        let kql = translation.content.trim().to_string();
        let validation = self.validator.validate(&kql);
        if !validation.is_valid {
            return Err(TranslationError::InvalidGeneratedKql(validation.errors));
        }

        self.cache.put(source, &kql, decision.complexity.overall);

        Ok(KqlQuery {
            query: kql,
            strategy: TranslationStrategy::AiPath,
            confidence: decision.confidence.clamp(0.0, 1.0),
            diagnostics: validation.warnings.into_iter().map(Warning::new).collect(),
        })
    }

    fn parse(
        &self,
        source: &str,
        dialect: Dialect,
    ) -> Result<cypher::ast::Query, TranslationError> {
        match dialect {
            Dialect::Cypher => Ok(cypher::parse_query(source).map_err(|e| match e {
                cypher::CypherError::Lex(lex) => TranslationError::Lex(lex),
                cypher::CypherError::Parse(parse) => TranslationError::Parse(parse),
            })?),
            Dialect::Gremlin => Ok(gremlin::parse_and_lower(source)?),
        }
    }
}

fn check_deadline(deadline: Instant) -> Result<(), TranslationError> {
    if Instant::now() >= deadline {
        return Err(TranslationError::Timeout);
    }
    Ok(())
}
