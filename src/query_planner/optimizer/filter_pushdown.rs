//! Filter pushdown pass.
//!
//! Relocates whole `Filter` predicates toward data sources: through
//! projection-only `Project` nodes, into `GraphMatch.predicate`, into
//! `Scan.predicate` for single-node patterns, and onto one side of a
//! `Join` when the predicate only touches that side. Never reorders
//! across `Limit` or `Sort`.

use std::sync::Arc;

use crate::query_planner::logical_expr::{combine_conjuncts, LogicalExpr};
use crate::query_planner::logical_plan::{Filter, Join, LogicalPlan, Project};
use crate::query_planner::optimizer::optimizer_pass::{OptimizerPass, OptimizerResult};
use crate::query_planner::optimizer::rewrite_bottom_up;
use crate::query_planner::plan_ctx::PlanCtx;
use crate::query_planner::transformed::Transformed;

pub struct FilterPushdown;

impl OptimizerPass for FilterPushdown {
    fn name(&self) -> &'static str {
        "FilterPushdown"
    }

    fn optimize(
        &self,
        logical_plan: Arc<LogicalPlan>,
        plan_ctx: &mut PlanCtx,
    ) -> OptimizerResult<Transformed<Arc<LogicalPlan>>> {
        rewrite_bottom_up(logical_plan, plan_ctx, &mut |plan, _ctx| {
            Ok(push_filter(plan))
        })
    }
}

fn push_filter(plan: Arc<LogicalPlan>) -> Transformed<Arc<LogicalPlan>> {
    let LogicalPlan::Filter(filter) = plan.as_ref() else {
        return Transformed::No(plan);
    };

    match filter.input.as_ref() {
        // Adjacent filters merge into one conjunction.
        LogicalPlan::Filter(inner) => {
            let merged = combine_conjuncts(vec![
                inner.predicate.clone(),
                filter.predicate.clone(),
            ])
            .unwrap_or_else(|| filter.predicate.clone());
            Transformed::Yes(Arc::new(LogicalPlan::Filter(Filter::new(
                inner.input.clone(),
                merged,
            ))))
        }

        LogicalPlan::GraphMatch(graph_match) => {
            let predicate_vars = filter.predicate.variables();
            let pattern_vars: std::collections::HashSet<&str> =
                graph_match.path.variables().into_iter().collect();
            if !predicate_vars.is_subset(&pattern_vars) {
                return Transformed::No(plan);
            }

            // Single-node pattern over its own table: the predicate can
            // ride the scan itself when every property is column-backed.
            if graph_match.path.relationships.is_empty() && filter.predicate.fully_resolved() {
                if let LogicalPlan::Scan(scan) = graph_match.source.as_ref() {
                    let mut scan = scan.clone();
                    scan.predicate = Some(merge(scan.predicate.take(), filter.predicate.clone()));
                    scan.reestimate();
                    let mut rebuilt = graph_match.clone();
                    rebuilt.source = Arc::new(LogicalPlan::Scan(scan));
                    rebuilt.reestimate();
                    return Transformed::Yes(Arc::new(LogicalPlan::GraphMatch(rebuilt)));
                }
            }

            let mut rebuilt = graph_match.clone();
            rebuilt.predicate = Some(merge(rebuilt.predicate.take(), filter.predicate.clone()));
            rebuilt.reestimate();
            Transformed::Yes(Arc::new(LogicalPlan::GraphMatch(rebuilt)))
        }

        LogicalPlan::Join(join) => {
            let predicate_vars = filter.predicate.variables();
            let left_vars: std::collections::HashSet<&str> =
                join.left.provided_variables().into_iter().collect();
            let right_vars: std::collections::HashSet<&str> =
                join.right.provided_variables().into_iter().collect();

            if predicate_vars.is_subset(&left_vars) {
                let new_left = Arc::new(LogicalPlan::Filter(Filter::new(
                    join.left.clone(),
                    filter.predicate.clone(),
                )));
                return Transformed::Yes(Arc::new(LogicalPlan::Join(Join::new(
                    new_left,
                    join.right.clone(),
                    join.on.clone(),
                    join.kind,
                ))));
            }
            if predicate_vars.is_subset(&right_vars) {
                let new_right = Arc::new(LogicalPlan::Filter(Filter::new(
                    join.right.clone(),
                    filter.predicate.clone(),
                )));
                return Transformed::Yes(Arc::new(LogicalPlan::Join(Join::new(
                    join.left.clone(),
                    new_right,
                    join.on.clone(),
                    join.kind,
                ))));
            }
            Transformed::No(plan)
        }

        // Projection without aggregation is transparent to filters.
        LogicalPlan::Project(project) if projection_only(project) => {
            let pushed = Arc::new(LogicalPlan::Filter(Filter::new(
                project.input.clone(),
                filter.predicate.clone(),
            )));
            let cost = pushed.cost();
            Transformed::Yes(Arc::new(LogicalPlan::Project(Project {
                input: pushed,
                items: project.items.clone(),
                distinct: project.distinct,
                cost,
            })))
        }

        _ => Transformed::No(plan),
    }
}

fn merge(existing: Option<LogicalExpr>, incoming: LogicalExpr) -> LogicalExpr {
    match existing {
        Some(current) => combine_conjuncts(vec![current, incoming.clone()]).unwrap_or(incoming),
        None => incoming,
    }
}

fn projection_only(project: &Project) -> bool {
    project.items.iter().all(|item| {
        matches!(
            item.expression,
            LogicalExpr::Variable(_) | LogicalExpr::PropertyRef(_) | LogicalExpr::Star
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::parse_query;
    use crate::query_planner::optimizer::optimizer_pass::OptimizerPass;
    use crate::query_planner::plan_builder::build_plan;
    use crate::resolver::resolve;
    use crate::schema_catalog::SchemaCatalog;

    fn run(input: &str) -> Arc<LogicalPlan> {
        let catalog = Arc::new(SchemaCatalog::builtin_default());
        let query = parse_query(input).expect("parse failed");
        let resolved = resolve(query, &catalog).expect("resolve failed");
        let plan = build_plan(&resolved, &catalog).expect("plan failed");
        let mut ctx = PlanCtx::new(catalog, &resolved);
        FilterPushdown
            .optimize(plan, &mut ctx)
            .expect("pass failed")
            .get_plan()
    }

    #[test]
    fn test_single_node_filter_reaches_scan() {
        let plan = run("MATCH (n:User) WHERE n.age > 30 RETURN n");
        let LogicalPlan::Project(project) = plan.as_ref() else {
            panic!("expected Project at root");
        };
        let LogicalPlan::GraphMatch(gm) = project.input.as_ref() else {
            panic!("expected Filter to be absorbed into GraphMatch");
        };
        let LogicalPlan::Scan(scan) = gm.source.as_ref() else {
            panic!("expected Scan");
        };
        assert!(scan.predicate.is_some(), "predicate should ride the scan");
        assert!(scan.cost.rows < scan.base_rows as f64);
    }

    #[test]
    fn test_relationship_filter_lands_in_graph_match() {
        let plan = run("MATCH (n:User)-[r:KNOWS]->(m:User) WHERE n.age > 30 RETURN n, m");
        let LogicalPlan::Project(project) = plan.as_ref() else {
            panic!("expected Project at root");
        };
        let LogicalPlan::GraphMatch(gm) = project.input.as_ref() else {
            panic!("expected GraphMatch");
        };
        assert!(gm.predicate.is_some());
        let LogicalPlan::Scan(scan) = gm.source.as_ref() else {
            panic!("expected Scan");
        };
        assert!(scan.predicate.is_none(), "edge scan must stay clean");
    }

    #[test]
    fn test_unresolved_property_stays_out_of_scan() {
        // No catalog backing for `a.weight`, so the predicate may reach
        // the GraphMatch but not the pseudo-table scan.
        let plan = run("MATCH (a) WHERE a.weight > 1 RETURN a");
        let LogicalPlan::Project(project) = plan.as_ref() else {
            panic!("expected Project at root");
        };
        let LogicalPlan::GraphMatch(gm) = project.input.as_ref() else {
            panic!("expected GraphMatch");
        };
        assert!(gm.predicate.is_some());
        let LogicalPlan::Scan(scan) = gm.source.as_ref() else {
            panic!("expected Scan");
        };
        assert!(scan.predicate.is_none());
    }

    #[test]
    fn test_join_side_pushdown() {
        let plan = run("MATCH (n:User), (m:Device) WHERE n.age > 30 RETURN n, m");
        let LogicalPlan::Project(project) = plan.as_ref() else {
            panic!("expected Project at root");
        };
        let LogicalPlan::Join(join) = project.input.as_ref() else {
            panic!("expected Join to remain with filter pushed to a side");
        };
        // After one pass the filter sits on the left input; further
        // passes merge it downward into the scan.
        assert!(matches!(
            join.left.as_ref(),
            LogicalPlan::Filter(_) | LogicalPlan::GraphMatch(_)
        ));
    }
}
