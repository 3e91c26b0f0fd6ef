//! Time-range extraction pass.
//!
//! Detects `v.time >= c1 AND v.time <= c2` predicates over a label's
//! designated timestamp column and lifts them into a `time_range`
//! annotation on the underlying `Scan`, removing the now-redundant
//! conjuncts. The emitter then places the time predicate first in the
//! pipeline, where the backend prunes by ingestion time.

use std::sync::Arc;

use crate::query_planner::logical_expr::{
    combine_conjuncts, split_conjuncts, Literal, LogicalExpr, Operator,
};
use crate::query_planner::logical_plan::{GraphMatch, LogicalPlan, Scan, TimeRange};
use crate::query_planner::optimizer::optimizer_pass::{OptimizerPass, OptimizerResult};
use crate::query_planner::optimizer::rewrite_bottom_up;
use crate::query_planner::plan_ctx::PlanCtx;
use crate::query_planner::transformed::Transformed;

pub struct TimeRangeExtraction;

impl OptimizerPass for TimeRangeExtraction {
    fn name(&self) -> &'static str {
        "TimeRange"
    }

    fn optimize(
        &self,
        logical_plan: Arc<LogicalPlan>,
        plan_ctx: &mut PlanCtx,
    ) -> OptimizerResult<Transformed<Arc<LogicalPlan>>> {
        rewrite_bottom_up(logical_plan, plan_ctx, &mut |plan, ctx| {
            Ok(extract(plan, ctx))
        })
    }
}

/// A `column op literal` conjunct against a known timestamp column.
fn time_bound<'a>(
    conjunct: &'a LogicalExpr,
    time_column: &str,
) -> Option<(Operator, &'a Literal)> {
    let LogicalExpr::OperatorApplicationExp(op) = conjunct else {
        return None;
    };
    if !matches!(op.operator, Operator::Gte | Operator::Lte) || op.operands.len() != 2 {
        return None;
    }
    let LogicalExpr::PropertyRef(prop) = &op.operands[0] else {
        return None;
    };
    if prop.column.as_deref() != Some(time_column) {
        return None;
    }
    let LogicalExpr::Literal(literal) = &op.operands[1] else {
        return None;
    };
    Some((op.operator, literal))
}

/// Split `conjuncts` into (time_range, residual) for the given column.
/// Both bounds must be present for the annotation to fire.
fn extract_bounds(
    conjuncts: Vec<LogicalExpr>,
    time_column: &str,
) -> (Option<TimeRange>, Vec<LogicalExpr>) {
    let mut start = None;
    let mut end = None;
    for conjunct in &conjuncts {
        match time_bound(conjunct, time_column) {
            Some((Operator::Gte, literal)) if start.is_none() => start = Some(literal.clone()),
            Some((Operator::Lte, literal)) if end.is_none() => end = Some(literal.clone()),
            _ => {}
        }
    }

    let (Some(start), Some(end)) = (start, end) else {
        return (None, conjuncts);
    };

    let mut taken = (false, false);
    let residual = conjuncts
        .into_iter()
        .filter(|conjunct| match time_bound(conjunct, time_column) {
            Some((Operator::Gte, _)) if !taken.0 => {
                taken.0 = true;
                false
            }
            Some((Operator::Lte, _)) if !taken.1 => {
                taken.1 = true;
                false
            }
            _ => true,
        })
        .collect();

    (
        Some(TimeRange {
            column: time_column.to_string(),
            start,
            end,
        }),
        residual,
    )
}

fn extract(plan: Arc<LogicalPlan>, ctx: &PlanCtx) -> Transformed<Arc<LogicalPlan>> {
    match plan.as_ref() {
        LogicalPlan::GraphMatch(graph_match) => extract_from_graph_match(graph_match, &plan, ctx),
        LogicalPlan::Scan(scan) => extract_from_scan(scan, &plan, ctx),
        _ => Transformed::No(plan),
    }
}

fn extract_from_graph_match(
    graph_match: &GraphMatch,
    plan: &Arc<LogicalPlan>,
    ctx: &PlanCtx,
) -> Transformed<Arc<LogicalPlan>> {
    let Some(predicate) = &graph_match.predicate else {
        return Transformed::No(plan.clone());
    };
    let LogicalPlan::Scan(scan) = graph_match.source.as_ref() else {
        return Transformed::No(plan.clone());
    };
    if scan.time_range.is_some() {
        return Transformed::No(plan.clone());
    }

    // The annotation is only sound when the scanned table is the one the
    // timestamp column lives in.
    for variable in graph_match.path.variables() {
        let Some(time_column) = ctx.time_column_of(variable) else {
            continue;
        };
        let owning_table = ctx
            .label_of(variable)
            .and_then(|label| ctx.catalog.label(label))
            .map(|meta| meta.table.as_str());
        if owning_table != Some(scan.table.as_str()) {
            continue;
        }

        let time_column = time_column.to_string();
        let (range, residual) = extract_bounds(split_conjuncts(predicate), &time_column);
        let Some(range) = range else {
            continue;
        };

        let mut scan = scan.clone();
        scan.time_range = Some(range);
        scan.reestimate();

        let mut rebuilt = graph_match.clone();
        rebuilt.source = Arc::new(LogicalPlan::Scan(scan));
        rebuilt.predicate = combine_conjuncts(residual);
        rebuilt.reestimate();
        return Transformed::Yes(Arc::new(LogicalPlan::GraphMatch(rebuilt)));
    }

    Transformed::No(plan.clone())
}

fn extract_from_scan(
    scan: &Scan,
    plan: &Arc<LogicalPlan>,
    ctx: &PlanCtx,
) -> Transformed<Arc<LogicalPlan>> {
    if scan.time_range.is_some() {
        return Transformed::No(plan.clone());
    }
    let Some(predicate) = &scan.predicate else {
        return Transformed::No(plan.clone());
    };

    let Some(time_column) = ctx
        .catalog
        .labels()
        .find(|label| label.table == scan.table)
        .and_then(|label| label.time_column.clone())
    else {
        return Transformed::No(plan.clone());
    };

    let (range, residual) = extract_bounds(split_conjuncts(predicate), &time_column);
    let Some(range) = range else {
        return Transformed::No(plan.clone());
    };

    let mut rebuilt = scan.clone();
    rebuilt.time_range = Some(range);
    rebuilt.predicate = combine_conjuncts(residual);
    rebuilt.reestimate();
    Transformed::Yes(Arc::new(LogicalPlan::Scan(rebuilt)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::parse_query;
    use crate::query_planner::optimizer::{optimize, DEFAULT_ITERATION_CAP};
    use crate::query_planner::plan_builder::build_plan;
    use crate::resolver::resolve;
    use crate::schema_catalog::SchemaCatalog;

    fn run_pipeline(input: &str) -> Arc<LogicalPlan> {
        let catalog = Arc::new(SchemaCatalog::builtin_default());
        let query = parse_query(input).expect("parse failed");
        let resolved = resolve(query, &catalog).expect("resolve failed");
        let plan = build_plan(&resolved, &catalog).expect("plan failed");
        let mut ctx = PlanCtx::new(catalog, &resolved);
        optimize(plan, &mut ctx, DEFAULT_ITERATION_CAP).expect("optimize failed")
    }

    fn find_scan(plan: &LogicalPlan) -> Option<&Scan> {
        match plan {
            LogicalPlan::Scan(scan) => Some(scan),
            LogicalPlan::Filter(f) => find_scan(&f.input),
            LogicalPlan::GraphMatch(g) => find_scan(&g.source),
            LogicalPlan::Project(p) => find_scan(&p.input),
            LogicalPlan::Sort(s) => find_scan(&s.input),
            LogicalPlan::Limit(l) => find_scan(&l.input),
            LogicalPlan::Join(j) => find_scan(&j.left).or_else(|| find_scan(&j.right)),
            _ => None,
        }
    }

    #[test]
    fn test_time_range_lifted_to_scan() {
        // `last_seen` maps to TimeGenerated, User's declared time column.
        let plan = run_pipeline(
            "MATCH (n:User) \
             WHERE n.last_seen >= '2026-01-01' AND n.last_seen <= '2026-02-01' AND n.age > 30 \
             RETURN n",
        );
        let scan = find_scan(&plan).expect("expected a scan");
        let range = scan.time_range.as_ref().expect("expected time_range");
        assert_eq!(range.column, "TimeGenerated");
        assert_eq!(range.start, Literal::String("2026-01-01".into()));
        assert_eq!(range.end, Literal::String("2026-02-01".into()));

        // The residual predicate keeps only the age conjunct.
        let residual = scan.predicate.as_ref().expect("expected residual");
        assert_eq!(split_conjuncts(residual).len(), 1);
    }

    #[test]
    fn test_one_sided_bound_not_lifted() {
        let plan =
            run_pipeline("MATCH (n:User) WHERE n.last_seen >= '2026-01-01' RETURN n");
        let scan = find_scan(&plan).expect("expected a scan");
        assert!(scan.time_range.is_none());
    }

    #[test]
    fn test_label_without_time_column_untouched() {
        let plan = run_pipeline(
            "MATCH (ip:IpAddress) \
             WHERE ip.address >= '10.0.0.0' AND ip.address <= '10.255.255.255' \
             RETURN ip",
        );
        let scan = find_scan(&plan).expect("expected a scan");
        assert!(scan.time_range.is_none());
    }
}
