//! Join ordering pass.
//!
//! Inner joins are commutative; place the smaller estimated-row side on
//! the left (build side). The strict comparison keeps the rule stable
//! once rows are equal or already ordered.

use std::sync::Arc;

use crate::query_planner::logical_plan::{Join, JoinKind, LogicalPlan};
use crate::query_planner::optimizer::optimizer_pass::{OptimizerPass, OptimizerResult};
use crate::query_planner::optimizer::rewrite_bottom_up;
use crate::query_planner::plan_ctx::PlanCtx;
use crate::query_planner::transformed::Transformed;

pub struct JoinOrder;

impl OptimizerPass for JoinOrder {
    fn name(&self) -> &'static str {
        "JoinOrder"
    }

    fn optimize(
        &self,
        logical_plan: Arc<LogicalPlan>,
        plan_ctx: &mut PlanCtx,
    ) -> OptimizerResult<Transformed<Arc<LogicalPlan>>> {
        rewrite_bottom_up(logical_plan, plan_ctx, &mut |plan, _ctx| Ok(reorder(plan)))
    }
}

fn reorder(plan: Arc<LogicalPlan>) -> Transformed<Arc<LogicalPlan>> {
    let LogicalPlan::Join(join) = plan.as_ref() else {
        return Transformed::No(plan);
    };
    if join.kind != JoinKind::Inner {
        return Transformed::No(plan);
    }
    if join.left.cost().rows <= join.right.cost().rows {
        return Transformed::No(plan);
    }

    Transformed::Yes(Arc::new(LogicalPlan::Join(Join::new(
        join.right.clone(),
        join.left.clone(),
        join.on.clone(),
        join.kind,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_planner::logical_plan::Scan;

    fn scan(table: &str, rows: u64) -> Arc<LogicalPlan> {
        Arc::new(LogicalPlan::Scan(Scan::new(table, rows)))
    }

    #[test]
    fn test_smaller_side_moves_left() {
        let join = Arc::new(LogicalPlan::Join(Join::new(
            scan("big", 100_000),
            scan("small", 10),
            None,
            JoinKind::Inner,
        )));
        let mut ctx = PlanCtx::new(
            Arc::new(crate::schema_catalog::SchemaCatalog::builtin_default()),
            &crate::resolver::resolve(
                crate::cypher::parse_query("MATCH (n:User) RETURN n").unwrap(),
                &crate::schema_catalog::SchemaCatalog::builtin_default(),
            )
            .unwrap(),
        );
        let result = JoinOrder.optimize(join, &mut ctx).unwrap();
        assert!(result.is_transformed());
        let LogicalPlan::Join(reordered) = result.get_plan().as_ref().clone() else {
            panic!("expected Join");
        };
        let LogicalPlan::Scan(left) = reordered.left.as_ref() else {
            panic!("expected Scan");
        };
        assert_eq!(left.table, "small");
    }

    #[test]
    fn test_ordered_join_is_stable() {
        let join = Arc::new(LogicalPlan::Join(Join::new(
            scan("small", 10),
            scan("big", 100_000),
            None,
            JoinKind::Inner,
        )));
        let mut ctx = PlanCtx::new(
            Arc::new(crate::schema_catalog::SchemaCatalog::builtin_default()),
            &crate::resolver::resolve(
                crate::cypher::parse_query("MATCH (n:User) RETURN n").unwrap(),
                &crate::schema_catalog::SchemaCatalog::builtin_default(),
            )
            .unwrap(),
        );
        let result = JoinOrder.optimize(join, &mut ctx).unwrap();
        assert!(!result.is_transformed());
    }

    #[test]
    fn test_left_outer_join_untouched() {
        let join = Arc::new(LogicalPlan::Join(Join::new(
            scan("big", 100_000),
            scan("small", 10),
            None,
            JoinKind::LeftOuter,
        )));
        let mut ctx = PlanCtx::new(
            Arc::new(crate::schema_catalog::SchemaCatalog::builtin_default()),
            &crate::resolver::resolve(
                crate::cypher::parse_query("MATCH (n:User) RETURN n").unwrap(),
                &crate::schema_catalog::SchemaCatalog::builtin_default(),
            )
            .unwrap(),
        );
        let result = JoinOrder.optimize(join, &mut ctx).unwrap();
        assert!(!result.is_transformed());
    }
}
