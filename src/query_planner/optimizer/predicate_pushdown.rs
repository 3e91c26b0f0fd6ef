//! Predicate pushdown pass.
//!
//! Splits conjunctions at `Filter` nodes and pushes each conjunct
//! independently: into `GraphMatch.predicate` when it only touches
//! pattern variables, or onto the matching side of a `Join`. The
//! residual conjuncts stay in a `Filter` above.

use std::collections::HashSet;
use std::sync::Arc;

use crate::query_planner::logical_expr::{combine_conjuncts, split_conjuncts, LogicalExpr};
use crate::query_planner::logical_plan::{Filter, Join, LogicalPlan};
use crate::query_planner::optimizer::optimizer_pass::{OptimizerPass, OptimizerResult};
use crate::query_planner::optimizer::rewrite_bottom_up;
use crate::query_planner::plan_ctx::PlanCtx;
use crate::query_planner::transformed::Transformed;

pub struct PredicatePushdown;

impl OptimizerPass for PredicatePushdown {
    fn name(&self) -> &'static str {
        "PredicatePushdown"
    }

    fn optimize(
        &self,
        logical_plan: Arc<LogicalPlan>,
        plan_ctx: &mut PlanCtx,
    ) -> OptimizerResult<Transformed<Arc<LogicalPlan>>> {
        rewrite_bottom_up(logical_plan, plan_ctx, &mut |plan, _ctx| {
            Ok(push_conjuncts(plan))
        })
    }
}

fn push_conjuncts(plan: Arc<LogicalPlan>) -> Transformed<Arc<LogicalPlan>> {
    let LogicalPlan::Filter(filter) = plan.as_ref() else {
        return Transformed::No(plan);
    };

    let conjuncts = split_conjuncts(&filter.predicate);
    if conjuncts.len() < 2 {
        // Whole-predicate moves are FilterPushdown's job.
        return Transformed::No(plan);
    }

    match filter.input.as_ref() {
        LogicalPlan::GraphMatch(graph_match) => {
            let pattern_vars: HashSet<&str> = graph_match.path.variables().into_iter().collect();
            let (pushable, residual): (Vec<LogicalExpr>, Vec<LogicalExpr>) = conjuncts
                .into_iter()
                .partition(|conjunct| conjunct.variables().is_subset(&pattern_vars));

            if pushable.is_empty() {
                return Transformed::No(plan);
            }

            let mut rebuilt = graph_match.clone();
            let mut merged = rebuilt.predicate.take().map(|p| vec![p]).unwrap_or_default();
            merged.extend(pushable);
            rebuilt.predicate = combine_conjuncts(merged);
            rebuilt.reestimate();
            let inner = Arc::new(LogicalPlan::GraphMatch(rebuilt));

            Transformed::Yes(match combine_conjuncts(residual) {
                Some(residual) => Arc::new(LogicalPlan::Filter(Filter::new(inner, residual))),
                None => inner,
            })
        }

        LogicalPlan::Join(join) => {
            let left_vars: HashSet<&str> = join.left.provided_variables().into_iter().collect();
            let right_vars: HashSet<&str> = join.right.provided_variables().into_iter().collect();

            let mut left_push = Vec::new();
            let mut right_push = Vec::new();
            let mut residual = Vec::new();
            for conjunct in conjuncts {
                let vars = conjunct.variables();
                if vars.is_subset(&left_vars) {
                    left_push.push(conjunct);
                } else if vars.is_subset(&right_vars) {
                    right_push.push(conjunct);
                } else {
                    residual.push(conjunct);
                }
            }

            if left_push.is_empty() && right_push.is_empty() {
                return Transformed::No(plan);
            }

            let mut left = join.left.clone();
            if let Some(predicate) = combine_conjuncts(left_push) {
                left = Arc::new(LogicalPlan::Filter(Filter::new(left, predicate)));
            }
            let mut right = join.right.clone();
            if let Some(predicate) = combine_conjuncts(right_push) {
                right = Arc::new(LogicalPlan::Filter(Filter::new(right, predicate)));
            }

            let inner = Arc::new(LogicalPlan::Join(Join::new(
                left,
                right,
                join.on.clone(),
                join.kind,
            )));
            Transformed::Yes(match combine_conjuncts(residual) {
                Some(residual) => Arc::new(LogicalPlan::Filter(Filter::new(inner, residual))),
                None => inner,
            })
        }

        _ => Transformed::No(plan),
    }
}
