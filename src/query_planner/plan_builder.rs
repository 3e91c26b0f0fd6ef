//! Builds the initial logical plan from a resolved AST.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cypher::ast::{PathExpression, Query};
use crate::resolver::ResolvedQuery;
use crate::schema_catalog::SchemaCatalog;

use super::errors::PlannerError;
use super::logical_expr;
use super::logical_plan::{
    AllPaths, CostEstimate, Filter, GraphMatch, Join, JoinKind, Limit, LogicalPlan, PathPattern,
    PatternNode, PatternRel, Project, ProjectItem, Scan, Sort,
};

/// Pseudo sources used when a pattern has no catalog-backed tables.
pub const PSEUDO_NODES_TABLE: &str = "graph.nodes";
pub const PSEUDO_EDGES_TABLE: &str = "graph.edges";

const PSEUDO_TABLE_ROWS: u64 = 10_000;

/// Default depth cap for open-ended variable-length patterns.
const DEFAULT_MAX_DEPTH: u32 = 10;

pub fn build_plan(
    resolved: &ResolvedQuery,
    catalog: &SchemaCatalog,
) -> Result<Arc<LogicalPlan>, PlannerError> {
    let query = &resolved.ast;
    let paths = &query.match_clause.paths;
    if paths.is_empty() {
        return Err(PlannerError::EmptyTraversal);
    }

    let variable_length = paths.iter().any(PathExpression::has_variable_length);
    let mut plan = if variable_length {
        if paths.len() > 1 {
            return Err(PlannerError::MultiplePaths(
                "variable-length patterns cannot be combined with other paths in one MATCH"
                    .to_string(),
            ));
        }
        build_all_paths(&paths[0])?
    } else {
        let mut graph_matches = paths
            .iter()
            .map(|path| build_graph_match(path, catalog))
            .collect::<Result<Vec<_>, _>>()?;

        let mut plan = graph_matches.remove(0);
        for right in graph_matches {
            plan = Arc::new(LogicalPlan::Join(Join::new(
                plan,
                right,
                None,
                JoinKind::Inner,
            )));
        }
        plan
    };

    if let Some(where_clause) = &query.where_clause {
        let predicate = logical_expr::from_ast(&where_clause.conditions, resolved, catalog);
        plan = Arc::new(LogicalPlan::Filter(Filter::new(plan, predicate)));
    }

    plan = wrap_return(plan, query, resolved, catalog);
    Ok(plan)
}

fn build_graph_match(
    path: &PathExpression,
    catalog: &SchemaCatalog,
) -> Result<Arc<LogicalPlan>, PlannerError> {
    let pattern = to_pattern(path);

    // Scan choice: first catalog-backed relationship table, else the
    // single labeled node's table, else the pseudo graph tables.
    let mut scan = None;
    for rel in &pattern.relationships {
        if let Some(rel_type) = &rel.rel_type {
            if let Ok(meta) = catalog.relationship(rel_type) {
                scan = Some(Scan::new(meta.table.clone(), PSEUDO_TABLE_ROWS));
                break;
            }
        }
    }
    let scan = scan.unwrap_or_else(|| {
        if pattern.relationships.is_empty() {
            let labeled = pattern.nodes.first().and_then(|n| n.label.as_deref());
            match labeled.and_then(|label| catalog.label(label)) {
                Some(meta) => Scan::new(meta.table.clone(), meta.base_rows),
                None => Scan::new(PSEUDO_NODES_TABLE, PSEUDO_TABLE_ROWS),
            }
        } else {
            Scan::new(PSEUDO_EDGES_TABLE, PSEUDO_TABLE_ROWS)
        }
    });

    let mut bindings = BTreeMap::new();
    for node in path.nodes() {
        let (Some(variable), Some(label)) = (
            node.variable.as_ref(),
            node.labels.first().map(|l| l.name.as_str()),
        ) else {
            continue;
        };
        if let Some(meta) = catalog.label(label) {
            bindings.insert(
                variable.name.clone(),
                format!("{}.{}", meta.table, meta.id_column),
            );
        }
    }

    let mut graph_match = GraphMatch {
        source: Arc::new(LogicalPlan::Scan(scan)),
        path: pattern,
        bindings,
        predicate: None,
        cost: CostEstimate::zero(),
    };
    graph_match.reestimate();
    Ok(Arc::new(LogicalPlan::GraphMatch(graph_match)))
}

fn build_all_paths(path: &PathExpression) -> Result<Arc<LogicalPlan>, PlannerError> {
    if path.relationships().len() != 1 {
        return Err(PlannerError::InvalidPathStructure(
            "a variable-length pattern must be a single hop".to_string(),
        ));
    }
    let rel = &path.relationships()[0];
    let length = rel.length.unwrap_or(crate::cypher::ast::PathLength {
        min: None,
        max: None,
    });
    let min = length.min.unwrap_or(1);
    let max = length.max.unwrap_or(DEFAULT_MAX_DEPTH);
    if min > max {
        return Err(PlannerError::InvalidPathStructure(format!(
            "path length minimum {} exceeds maximum {}",
            min, max
        )));
    }

    let var_or = |node: &crate::cypher::ast::NodePattern, fallback: &str| {
        node.variable
            .as_ref()
            .map(|v| v.name.clone())
            .unwrap_or_else(|| fallback.to_string())
    };

    let rows = PSEUDO_TABLE_ROWS as f64;
    Ok(Arc::new(LogicalPlan::AllPaths(AllPaths {
        source: var_or(&path.nodes()[0], "source"),
        target: var_or(&path.nodes()[1], "target"),
        rel_type: rel.rel_type.as_ref().map(|t| t.name.clone()),
        direction: rel.direction,
        min,
        max,
        cycle_detect: false,
        cost: CostEstimate {
            rows: rows * 0.5,
            cpu: rows * max as f64,
            io: rows,
        },
    })))
}

fn to_pattern(path: &PathExpression) -> PathPattern {
    PathPattern {
        nodes: path
            .nodes()
            .iter()
            .map(|node| PatternNode {
                variable: node.variable.as_ref().map(|v| v.name.clone()),
                label: node.labels.first().map(|l| l.name.clone()),
                properties: node
                    .properties
                    .iter()
                    .map(|(key, value)| (key.clone(), (value).into()))
                    .collect(),
            })
            .collect(),
        relationships: path
            .relationships()
            .iter()
            .map(|rel| PatternRel {
                variable: rel.variable.as_ref().map(|v| v.name.clone()),
                rel_type: rel.rel_type.as_ref().map(|t| t.name.clone()),
                direction: rel.direction,
                length: rel.length.map(|l| (l.min, l.max)),
            })
            .collect(),
    }
}

fn wrap_return(
    mut plan: Arc<LogicalPlan>,
    query: &Query,
    resolved: &ResolvedQuery,
    catalog: &SchemaCatalog,
) -> Arc<LogicalPlan> {
    let return_clause = &query.return_clause;

    let items = return_clause
        .items
        .iter()
        .map(|item| ProjectItem {
            expression: logical_expr::from_ast(&item.expression, resolved, catalog),
            alias: item.alias.as_ref().map(|a| a.name.clone()),
        })
        .collect();

    let input_cost = plan.cost();
    plan = Arc::new(LogicalPlan::Project(Project {
        input: plan,
        items,
        distinct: return_clause.distinct,
        cost: input_cost,
    }));

    if !return_clause.order_by.is_empty() {
        let keys = return_clause
            .order_by
            .iter()
            .map(|(expr, order)| (logical_expr::from_ast(expr, resolved, catalog), *order))
            .collect();
        let cost = plan.cost();
        plan = Arc::new(LogicalPlan::Sort(Sort {
            input: plan,
            keys,
            cost,
        }));
    }

    if return_clause.limit.is_some() || return_clause.skip.is_some() {
        let input_cost = plan.cost();
        let rows = return_clause
            .limit
            .map(|n| (n as f64).min(input_cost.rows))
            .unwrap_or(input_cost.rows);
        plan = Arc::new(LogicalPlan::Limit(Limit {
            input: plan,
            n: return_clause.limit,
            offset: return_clause.skip,
            cost: CostEstimate {
                rows,
                cpu: input_cost.cpu,
                io: input_cost.io,
            },
        }));
    }

    plan
}
