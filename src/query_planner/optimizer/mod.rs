//! Ordered rewrite-rule pipeline.
//!
//! Rules run in a fixed order each pass; passes repeat until no rule
//! changes the plan or the iteration cap is reached, in which case the
//! last stable plan is used. Rules must be monotonic: they move
//! predicates toward sources or annotate scans, never the reverse, so
//! the pipeline cannot oscillate.

use std::sync::Arc;

use crate::query_planner::errors::OptimizerError;
use crate::query_planner::logical_plan::{
    Filter, GraphMatch, Join, Limit, LogicalPlan, Project, Sort,
};
use crate::query_planner::plan_ctx::PlanCtx;
use crate::query_planner::transformed::Transformed;

pub mod filter_pushdown;
pub mod index_hint;
pub mod join_order;
pub mod optimizer_pass;
pub mod predicate_pushdown;
pub mod time_range;

use filter_pushdown::FilterPushdown;
use index_hint::IndexHint;
use join_order::JoinOrder;
use optimizer_pass::{OptimizerPass, OptimizerResult};
use predicate_pushdown::PredicatePushdown;
use time_range::TimeRangeExtraction;

/// Hard cap on rule-pipeline passes when the config does not override it.
pub const DEFAULT_ITERATION_CAP: u32 = 32;

pub fn optimize(
    plan: Arc<LogicalPlan>,
    plan_ctx: &mut PlanCtx,
    iteration_cap: u32,
) -> Result<Arc<LogicalPlan>, OptimizerError> {
    let passes: [&dyn OptimizerPass; 5] = [
        &FilterPushdown,
        &PredicatePushdown,
        &JoinOrder,
        &TimeRangeExtraction,
        &IndexHint,
    ];

    let mut plan = plan;
    for iteration in 0..iteration_cap.max(1) {
        let mut changed = false;
        for pass in passes {
            let transformed = pass.optimize(plan.clone(), plan_ctx)?;
            if transformed.is_transformed() {
                log::trace!("optimizer pass '{}' changed the plan", pass.name());
                changed = true;
            }
            plan = transformed.get_plan();
        }
        if !changed {
            log::debug!("optimizer reached fixpoint after {} pass(es)", iteration + 1);
            return Ok(plan);
        }
    }

    log::debug!(
        "optimizer stopped at the iteration cap ({}); using last stable plan",
        iteration_cap
    );
    Ok(plan)
}

/// Post-order rewrite: children first, then the (possibly rebuilt) node
/// itself is offered to `f`.
pub(crate) fn rewrite_bottom_up<F>(
    plan: Arc<LogicalPlan>,
    plan_ctx: &mut PlanCtx,
    f: &mut F,
) -> OptimizerResult<Transformed<Arc<LogicalPlan>>>
where
    F: FnMut(Arc<LogicalPlan>, &mut PlanCtx) -> OptimizerResult<Transformed<Arc<LogicalPlan>>>,
{
    let (rebuilt, child_changed) = match plan.as_ref() {
        LogicalPlan::Scan(_) | LogicalPlan::ShortestPath(_) | LogicalPlan::AllPaths(_) => {
            (plan.clone(), false)
        }

        LogicalPlan::Filter(filter) => {
            let child = rewrite_bottom_up(filter.input.clone(), plan_ctx, f)?;
            if child.is_transformed() {
                (
                    Arc::new(LogicalPlan::Filter(Filter::new(
                        child.get_plan(),
                        filter.predicate.clone(),
                    ))),
                    true,
                )
            } else {
                (plan.clone(), false)
            }
        }

        LogicalPlan::GraphMatch(graph_match) => {
            let child = rewrite_bottom_up(graph_match.source.clone(), plan_ctx, f)?;
            if child.is_transformed() {
                let mut rebuilt = GraphMatch {
                    source: child.get_plan(),
                    path: graph_match.path.clone(),
                    bindings: graph_match.bindings.clone(),
                    predicate: graph_match.predicate.clone(),
                    cost: graph_match.cost,
                };
                rebuilt.reestimate();
                (Arc::new(LogicalPlan::GraphMatch(rebuilt)), true)
            } else {
                (plan.clone(), false)
            }
        }

        LogicalPlan::Join(join) => {
            let left = rewrite_bottom_up(join.left.clone(), plan_ctx, f)?;
            let right = rewrite_bottom_up(join.right.clone(), plan_ctx, f)?;
            if left.is_transformed() || right.is_transformed() {
                (
                    Arc::new(LogicalPlan::Join(Join::new(
                        left.get_plan(),
                        right.get_plan(),
                        join.on.clone(),
                        join.kind,
                    ))),
                    true,
                )
            } else {
                (plan.clone(), false)
            }
        }

        LogicalPlan::Project(project) => {
            let child = rewrite_bottom_up(project.input.clone(), plan_ctx, f)?;
            if child.is_transformed() {
                let input = child.get_plan();
                let cost = input.cost();
                (
                    Arc::new(LogicalPlan::Project(Project {
                        input,
                        items: project.items.clone(),
                        distinct: project.distinct,
                        cost,
                    })),
                    true,
                )
            } else {
                (plan.clone(), false)
            }
        }

        LogicalPlan::Sort(sort) => {
            let child = rewrite_bottom_up(sort.input.clone(), plan_ctx, f)?;
            if child.is_transformed() {
                let input = child.get_plan();
                let cost = input.cost();
                (
                    Arc::new(LogicalPlan::Sort(Sort {
                        input,
                        keys: sort.keys.clone(),
                        cost,
                    })),
                    true,
                )
            } else {
                (plan.clone(), false)
            }
        }

        LogicalPlan::Limit(limit) => {
            let child = rewrite_bottom_up(limit.input.clone(), plan_ctx, f)?;
            if child.is_transformed() {
                let input = child.get_plan();
                let cost = input.cost();
                (
                    Arc::new(LogicalPlan::Limit(Limit {
                        input,
                        n: limit.n,
                        offset: limit.offset,
                        cost,
                    })),
                    true,
                )
            } else {
                (plan.clone(), false)
            }
        }
    };

    match f(rebuilt, plan_ctx)? {
        Transformed::Yes(new_plan) => Ok(Transformed::Yes(new_plan)),
        Transformed::No(same) => {
            if child_changed {
                Ok(Transformed::Yes(same))
            } else {
                Ok(Transformed::No(same))
            }
        }
    }
}
