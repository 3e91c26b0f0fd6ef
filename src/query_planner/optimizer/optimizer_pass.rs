//! Optimizer pass trait and result types.
//!
//! Every rewrite rule implements [`OptimizerPass`]. A pass is pure with
//! respect to the plan: it either returns `Transformed::Yes` with a new
//! tree or `Transformed::No` with the original. Traversal inside a pass
//! is post-order (children first) via [`super::rewrite_bottom_up`].

use std::sync::Arc;

use crate::query_planner::errors::OptimizerError;
use crate::query_planner::logical_plan::LogicalPlan;
use crate::query_planner::plan_ctx::PlanCtx;
use crate::query_planner::transformed::Transformed;

pub type OptimizerResult<T> = Result<T, OptimizerError>;

pub trait OptimizerPass {
    fn name(&self) -> &'static str;

    fn optimize(
        &self,
        logical_plan: Arc<LogicalPlan>,
        plan_ctx: &mut PlanCtx,
    ) -> OptimizerResult<Transformed<Arc<LogicalPlan>>>;
}
