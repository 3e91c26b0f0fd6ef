//! Index-hint pass.
//!
//! An equality predicate on a label's node-id column is a point seek;
//! annotate the underlying `Scan` with the preferred index column. The
//! predicate itself stays in place; the hint only tells the emitter to
//! surface the seek in the scan stage of the pipeline.

use std::sync::Arc;

use crate::query_planner::logical_expr::{split_conjuncts, LogicalExpr, Operator};
use crate::query_planner::logical_plan::LogicalPlan;
use crate::query_planner::optimizer::optimizer_pass::{OptimizerPass, OptimizerResult};
use crate::query_planner::optimizer::rewrite_bottom_up;
use crate::query_planner::plan_ctx::PlanCtx;
use crate::query_planner::transformed::Transformed;

pub struct IndexHint;

impl OptimizerPass for IndexHint {
    fn name(&self) -> &'static str {
        "IndexHint"
    }

    fn optimize(
        &self,
        logical_plan: Arc<LogicalPlan>,
        plan_ctx: &mut PlanCtx,
    ) -> OptimizerResult<Transformed<Arc<LogicalPlan>>> {
        rewrite_bottom_up(logical_plan, plan_ctx, &mut |plan, ctx| Ok(annotate(plan, ctx)))
    }
}

/// Column of an `id_column == literal` conjunct, if this conjunct is one.
fn id_equality<'a>(conjunct: &'a LogicalExpr, ctx: &PlanCtx) -> Option<&'a str> {
    let LogicalExpr::OperatorApplicationExp(op) = conjunct else {
        return None;
    };
    if op.operator != Operator::Eq || op.operands.len() != 2 {
        return None;
    }
    let LogicalExpr::PropertyRef(prop) = &op.operands[0] else {
        return None;
    };
    let LogicalExpr::Literal(_) = &op.operands[1] else {
        return None;
    };
    let column = prop.column.as_deref()?;
    if ctx.id_column_of(&prop.variable) == Some(column) {
        Some(column)
    } else {
        None
    }
}

fn annotate(plan: Arc<LogicalPlan>, ctx: &PlanCtx) -> Transformed<Arc<LogicalPlan>> {
    match plan.as_ref() {
        LogicalPlan::GraphMatch(graph_match) => {
            let Some(predicate) = &graph_match.predicate else {
                return Transformed::No(plan);
            };
            let LogicalPlan::Scan(scan) = graph_match.source.as_ref() else {
                return Transformed::No(plan);
            };
            if scan.index_hint.is_some() {
                return Transformed::No(plan);
            }

            let Some(column) = split_conjuncts(predicate)
                .iter()
                .find_map(|conjunct| id_equality(conjunct, ctx).map(str::to_string))
            else {
                return Transformed::No(plan);
            };

            let mut scan = scan.clone();
            scan.index_hint = Some(column);
            let mut rebuilt = graph_match.clone();
            rebuilt.source = Arc::new(LogicalPlan::Scan(scan));
            Transformed::Yes(Arc::new(LogicalPlan::GraphMatch(rebuilt)))
        }

        LogicalPlan::Scan(scan) => {
            if scan.index_hint.is_some() {
                return Transformed::No(plan);
            }
            let Some(predicate) = &scan.predicate else {
                return Transformed::No(plan);
            };
            // The scanned table's own id column.
            let id_column = ctx
                .catalog
                .labels()
                .find(|label| label.table == scan.table)
                .map(|label| label.id_column.clone());
            let Some(id_column) = id_column else {
                return Transformed::No(plan);
            };

            let hit = split_conjuncts(predicate).iter().any(|conjunct| {
                matches!(conjunct,
                    LogicalExpr::OperatorApplicationExp(op)
                        if op.operator == Operator::Eq
                            && op.operands.len() == 2
                            && matches!(&op.operands[0], LogicalExpr::PropertyRef(p) if p.column.as_deref() == Some(id_column.as_str()))
                            && matches!(&op.operands[1], LogicalExpr::Literal(_)))
            });
            if !hit {
                return Transformed::No(plan);
            }

            let mut rebuilt = scan.clone();
            rebuilt.index_hint = Some(id_column);
            Transformed::Yes(Arc::new(LogicalPlan::Scan(rebuilt)))
        }

        _ => Transformed::No(plan),
    }
}
