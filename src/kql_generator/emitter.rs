//! Plan-to-KQL pipeline assembly.
//!
//! Walks the optimized plan in dependency order and emits a pipeline of
//! operators joined by ` | `. Graph stages are grounded in a table
//! source plus `make-graph`; patterns without catalog-backed tables fall
//! back to the pseudo `graph.nodes` / `graph.edges` sources.

use crate::query_planner::logical_expr::Literal;
use crate::query_planner::logical_plan::{
    AllPaths, GraphMatch, Join, LogicalPlan, PathPattern, PatternRel, Scan, ShortestPath,
};
use crate::query_planner::plan_builder::{PSEUDO_EDGES_TABLE, PSEUDO_NODES_TABLE};
use crate::cypher::ast::Direction;
use crate::path_algorithms::{PathRelationship, ShortestPathTranslator};
use crate::schema_catalog::SchemaCatalog;

use super::errors::EmitError;
use super::to_kql::{encode_literal, ExprContext, ToKql};

pub struct KqlEmitter<'a> {
    catalog: &'a SchemaCatalog,
}

impl<'a> KqlEmitter<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        KqlEmitter { catalog }
    }

    pub fn emit(&self, plan: &LogicalPlan) -> Result<String, EmitError> {
        Ok(self.emit_node(plan)?.join(" | "))
    }

    fn emit_node(&self, plan: &LogicalPlan) -> Result<Vec<String>, EmitError> {
        match plan {
            LogicalPlan::Scan(scan) => Ok(self.emit_scan(scan)?),

            LogicalPlan::GraphMatch(graph_match) => self.emit_graph_match(graph_match),

            LogicalPlan::Filter(filter) => {
                let mut segments = self.emit_node(&filter.input)?;
                segments.push(format!(
                    "where {}",
                    filter.predicate.to_kql(ExprContext::Filter)?
                ));
                Ok(segments)
            }

            LogicalPlan::Join(join) => self.emit_join(join),

            LogicalPlan::Project(project) => {
                let mut segments = self.emit_node(&project.input)?;
                let items = project
                    .items
                    .iter()
                    .map(|item| {
                        let rendered = item.expression.to_kql(ExprContext::Projection)?;
                        Ok(match &item.alias {
                            Some(alias) => format!("{} as {}", rendered, alias),
                            None => rendered,
                        })
                    })
                    .collect::<Result<Vec<_>, EmitError>>()?;
                let keyword = if project.distinct {
                    "distinct project"
                } else {
                    "project"
                };
                segments.push(format!("{} {}", keyword, items.join(", ")));
                Ok(segments)
            }

            LogicalPlan::Sort(sort) => {
                let mut segments = self.emit_node(&sort.input)?;
                let keys = sort
                    .keys
                    .iter()
                    .map(|(expr, order)| {
                        let rendered = expr.to_kql(ExprContext::Projection)?;
                        let direction = match order {
                            crate::cypher::ast::SortOrder::Asc => "asc",
                            crate::cypher::ast::SortOrder::Desc => "desc",
                        };
                        Ok(format!("{} {}", rendered, direction))
                    })
                    .collect::<Result<Vec<_>, EmitError>>()?;
                segments.push(format!("sort by {}", keys.join(", ")));
                Ok(segments)
            }

            LogicalPlan::Limit(limit) => {
                let mut segments = self.emit_node(&limit.input)?;
                if let Some(offset) = limit.offset {
                    segments.push(format!("offset {}", offset));
                }
                if let Some(n) = limit.n {
                    segments.push(format!("limit {}", n));
                }
                Ok(segments)
            }

            LogicalPlan::ShortestPath(shortest) => self.emit_shortest_path(shortest),

            LogicalPlan::AllPaths(all_paths) => self.emit_all_paths(all_paths),
        }
    }

    fn emit_scan(&self, scan: &Scan) -> Result<Vec<String>, EmitError> {
        let mut segments = vec![scan.table.clone()];

        if let Some(range) = &scan.time_range {
            segments.push(format!(
                "where {} >= {} and {} <= {}",
                range.column,
                datetime_literal(&range.start),
                range.column,
                datetime_literal(&range.end)
            ));
        }

        if let Some(predicate) = &scan.predicate {
            segments.push(format!("where {}", predicate.to_kql(ExprContext::Filter)?));
        }

        if !scan.projected_columns.is_empty() {
            segments.push(format!("project {}", scan.projected_columns.join(", ")));
        }

        Ok(segments)
    }

    fn emit_graph_match(&self, graph_match: &GraphMatch) -> Result<Vec<String>, EmitError> {
        let mut segments = self.emit_node(&graph_match.source)?;

        let scan_table = match graph_match.source.as_ref() {
            LogicalPlan::Scan(scan) => scan.table.clone(),
            _ => PSEUDO_EDGES_TABLE.to_string(),
        };
        segments.push(self.make_graph_clause(&graph_match.path, &scan_table));

        segments.push(format!(
            "graph-match {}",
            render_pattern(&graph_match.path)?
        ));

        if let Some(predicate) = &graph_match.predicate {
            segments.push(format!("where {}", predicate.to_kql(ExprContext::Filter)?));
        }

        Ok(segments)
    }

    /// `make-graph <src> --> <dst> with <node table> on <node id>`.
    fn make_graph_clause(&self, path: &PathPattern, scan_table: &str) -> String {
        for rel in &path.relationships {
            let Some(rel_type) = &rel.rel_type else {
                continue;
            };
            let Ok(meta) = self.catalog.relationship(rel_type) else {
                continue;
            };
            if meta.table != scan_table {
                continue;
            }
            let node_clause = self
                .catalog
                .label(&meta.from_label)
                .map(|label| format!(" with {} on {}", label.table, label.id_column))
                .unwrap_or_default();
            return format!(
                "make-graph {} --> {}{}",
                meta.source_column, meta.target_column, node_clause
            );
        }

        if path.relationships.is_empty() {
            // Node-only pattern: the node table doubles as a trivial
            // edge source keyed by the node id.
            let id_column = path
                .nodes
                .first()
                .and_then(|node| node.label.as_deref())
                .and_then(|label| self.catalog.label(label))
                .map(|meta| meta.id_column.clone())
                .unwrap_or_else(|| "node_id".to_string());
            format!("make-graph {} --> {}", id_column, id_column)
        } else {
            format!(
                "make-graph source_id --> target_id with {} on node_id",
                PSEUDO_NODES_TABLE
            )
        }
    }

    fn emit_join(&self, join: &Join) -> Result<Vec<String>, EmitError> {
        // Multiple MATCH paths compile to a cross-join of GraphMatch
        // nodes; KQL has no free cross-join, so they re-merge into one
        // graph-match with comma-separated patterns.
        let mut leaves = Vec::new();
        collect_join_leaves(join, &mut leaves)?;

        let Some((first, _)) = leaves.first() else {
            return Err(EmitError::UnrepresentableConstruct(
                "join with no graph patterns".to_string(),
            ));
        };

        let mut segments = self.emit_node(&first.source)?;
        let scan_table = match first.source.as_ref() {
            LogicalPlan::Scan(scan) => scan.table.clone(),
            _ => PSEUDO_EDGES_TABLE.to_string(),
        };
        segments.push(self.make_graph_clause(&first.path, &scan_table));

        let patterns = leaves
            .iter()
            .map(|(gm, _)| render_pattern(&gm.path))
            .collect::<Result<Vec<_>, _>>()?;
        segments.push(format!("graph-match {}", patterns.join(", ")));

        let mut predicates = Vec::new();
        for (gm, extra) in &leaves {
            if let Some(predicate) = &gm.predicate {
                predicates.push(predicate.to_kql(ExprContext::Filter)?);
            }
            for predicate in extra {
                predicates.push(predicate.to_kql(ExprContext::Filter)?);
            }
        }
        if !predicates.is_empty() {
            segments.push(format!("where {}", predicates.join(" and ")));
        }

        Ok(segments)
    }

    fn emit_shortest_path(&self, shortest: &ShortestPath) -> Result<Vec<String>, EmitError> {
        let translator = ShortestPathTranslator::new();
        let config = PathRelationship {
            variable: None,
            types: Vec::new(),
            direction: shortest.direction,
        };
        let query = translator
            .translate(
                &shortest.source,
                &shortest.target,
                shortest.rel_type.as_deref(),
                &shortest.constraints,
                Some(&config),
            )
            .map_err(|e| EmitError::UnrepresentableConstruct(e.to_string()))?;

        let mut segments = self.graph_preamble();
        segments.push(query);
        Ok(segments)
    }

    fn emit_all_paths(&self, all_paths: &AllPaths) -> Result<Vec<String>, EmitError> {
        let rel = match &all_paths.rel_type {
            Some(rel_type) => format!("[{}*{}..{}]", rel_type, all_paths.min, all_paths.max),
            None => format!("[*{}..{}]", all_paths.min, all_paths.max),
        };
        let pattern = match all_paths.direction {
            Direction::Incoming => {
                format!("(({})<-{}-({}))", all_paths.source, rel, all_paths.target)
            }
            Direction::Either => {
                format!("(({})-{}-({}))", all_paths.source, rel, all_paths.target)
            }
            Direction::Outgoing => {
                format!("(({})-{}->({}))", all_paths.source, rel, all_paths.target)
            }
        };

        let mut segments = self.graph_preamble();
        segments.push(format!("all_paths {}", pattern));
        if all_paths.cycle_detect {
            segments.push("where no_cycles".to_string());
        }
        Ok(segments)
    }

    /// Pseudo-table grounding for path operators.
    fn graph_preamble(&self) -> Vec<String> {
        vec![
            PSEUDO_EDGES_TABLE.to_string(),
            format!(
                "make-graph source_id --> target_id with {} on node_id",
                PSEUDO_NODES_TABLE
            ),
        ]
    }
}

fn collect_join_leaves<'p>(
    join: &'p Join,
    out: &mut Vec<(&'p GraphMatch, Vec<crate::query_planner::logical_expr::LogicalExpr>)>,
) -> Result<(), EmitError> {
    for side in [&join.left, &join.right] {
        match side.as_ref() {
            LogicalPlan::GraphMatch(gm) => out.push((gm, Vec::new())),
            LogicalPlan::Filter(filter) => match filter.input.as_ref() {
                LogicalPlan::GraphMatch(gm) => {
                    out.push((gm, vec![filter.predicate.clone()]));
                }
                _ => {
                    return Err(EmitError::UnrepresentableConstruct(
                        "join over non-pattern input".to_string(),
                    ));
                }
            },
            LogicalPlan::Join(inner) => collect_join_leaves(inner, out)?,
            _ => {
                return Err(EmitError::UnrepresentableConstruct(
                    "join over non-pattern input".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// `(n:User {name: 'John'})-[r:KNOWS]->(m:User)`
fn render_pattern(path: &PathPattern) -> Result<String, EmitError> {
    let mut out = String::new();
    out.push_str(&render_node(&path.nodes[0]));
    for (i, rel) in path.relationships.iter().enumerate() {
        out.push_str(&render_relationship(rel));
        out.push_str(&render_node(&path.nodes[i + 1]));
    }
    Ok(out)
}

fn render_node(node: &crate::query_planner::logical_plan::PatternNode) -> String {
    let mut inner = String::new();
    if let Some(variable) = &node.variable {
        inner.push_str(variable);
    }
    if let Some(label) = &node.label {
        inner.push(':');
        inner.push_str(label);
    }
    if !node.properties.is_empty() {
        let props = node
            .properties
            .iter()
            .map(|(key, value)| format!("{}: {}", key, encode_literal(value)))
            .collect::<Vec<_>>()
            .join(", ");
        if !inner.is_empty() {
            inner.push(' ');
        }
        inner.push_str(&format!("{{{}}}", props));
    }
    format!("({})", inner)
}

fn render_relationship(rel: &PatternRel) -> String {
    let mut inner = String::new();
    if let Some(variable) = &rel.variable {
        inner.push_str(variable);
    }
    if let Some(rel_type) = &rel.rel_type {
        inner.push(':');
        inner.push_str(rel_type);
    }
    if let Some((min, max)) = rel.length {
        inner.push('*');
        if let Some(min) = min {
            inner.push_str(&min.to_string());
        }
        inner.push_str("..");
        if let Some(max) = max {
            inner.push_str(&max.to_string());
        }
    }

    match rel.direction {
        Direction::Outgoing => format!("-[{}]->", inner),
        Direction::Incoming => format!("<-[{}]-", inner),
        Direction::Either => format!("-[{}]-", inner),
    }
}

fn datetime_literal(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => format!("datetime({})", s),
        other => encode_literal(other),
    }
}
