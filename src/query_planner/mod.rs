//! Logical planning and optimization.
//!
//! [`plan_builder::build_plan`] turns a resolved AST into the initial
//! plan tree; [`optimizer::optimize`] applies the ordered rewrite
//! pipeline to fixpoint. The translator engine drives the two stages
//! separately so an optimizer failure can still be downgraded to a
//! fallback route.

pub mod errors;
pub mod logical_expr;
pub mod logical_plan;
pub mod optimizer;
pub mod plan_builder;
pub mod plan_ctx;
pub mod transformed;

use std::sync::Arc;

use crate::resolver::ResolvedQuery;
use crate::schema_catalog::SchemaCatalog;

pub use errors::{OptimizerError, PlannerError};
pub use logical_plan::LogicalPlan;
pub use plan_ctx::PlanCtx;

/// Convenience entry: build and optimize in one call. Optimizer failures
/// are reported distinctly so callers can elect a fallback route.
pub fn evaluate_read_query(
    resolved: &ResolvedQuery,
    catalog: Arc<SchemaCatalog>,
    iteration_cap: u32,
) -> Result<Arc<LogicalPlan>, EvaluateError> {
    let plan = plan_builder::build_plan(resolved, &catalog)?;
    let mut plan_ctx = PlanCtx::new(catalog, resolved);
    let plan = optimizer::optimize(plan, &mut plan_ctx, iteration_cap)?;
    Ok(plan)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluateError {
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),
}
