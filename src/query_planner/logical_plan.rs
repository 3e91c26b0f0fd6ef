//! Logical plan tree.
//!
//! Nodes reference children through `Arc` so rewrite rules can share
//! unchanged subtrees when they rebuild a parent. Every node carries a
//! [`CostEstimate`] assigned at build time and refreshed by rules that
//! move predicates around.

use std::sync::Arc;

use crate::cypher::ast::{Direction, SortOrder};

use super::logical_expr::{Literal, LogicalExpr, Operator};

/// Heuristic cost: estimated output rows plus abstract cpu/io work units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub rows: f64,
    pub cpu: f64,
    pub io: f64,
}

impl CostEstimate {
    pub fn zero() -> Self {
        CostEstimate {
            rows: 0.0,
            cpu: 0.0,
            io: 0.0,
        }
    }
}

/// Selectivity heuristic: equality 0.1, range 0.3, unknown 0.5.
/// Conjunctions multiply, disjunctions saturate.
pub fn selectivity(predicate: &LogicalExpr) -> f64 {
    match predicate {
        LogicalExpr::OperatorApplicationExp(op) => match op.operator {
            Operator::Eq => 0.1,
            _ if op.operator.is_range() => 0.3,
            Operator::And => op.operands.iter().map(selectivity).product(),
            Operator::Or => op
                .operands
                .iter()
                .map(selectivity)
                .sum::<f64>()
                .min(1.0),
            _ => 0.5,
        },
        _ => 0.5,
    }
}

/// Time-range annotation lifted out of a predicate by the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub column: String,
    pub start: Literal,
    pub end: Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub table: String,
    pub projected_columns: Vec<String>,
    pub predicate: Option<LogicalExpr>,
    pub time_range: Option<TimeRange>,
    pub index_hint: Option<String>,
    pub base_rows: u64,
    pub cost: CostEstimate,
}

impl Scan {
    pub fn new(table: impl Into<String>, base_rows: u64) -> Self {
        let base = base_rows as f64;
        Scan {
            table: table.into(),
            projected_columns: Vec::new(),
            predicate: None,
            time_range: None,
            index_hint: None,
            base_rows,
            cost: CostEstimate {
                rows: base,
                cpu: base,
                io: base,
            },
        }
    }

    /// Recompute the estimate after predicate changes.
    pub fn reestimate(&mut self) {
        let base = self.base_rows as f64;
        let sel = self.predicate.as_ref().map(selectivity).unwrap_or(1.0);
        self.cost = CostEstimate {
            rows: base * sel,
            cpu: base,
            io: base,
        };
    }
}

/// One node position in a graph-match pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternNode {
    pub variable: Option<String>,
    pub label: Option<String>,
    pub properties: Vec<(String, Literal)>,
}

/// One relationship position in a graph-match pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRel {
    pub variable: Option<String>,
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub length: Option<(Option<u32>, Option<u32>)>,
}

/// Resolved pattern topology retained by [`GraphMatch`] and the path
/// nodes. Arity follows the AST invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    pub nodes: Vec<PatternNode>,
    pub relationships: Vec<PatternRel>,
}

impl PathPattern {
    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = Vec::new();
        for node in &self.nodes {
            if let Some(v) = &node.variable {
                vars.push(v);
            }
        }
        for rel in &self.relationships {
            if let Some(v) = &rel.variable {
                vars.push(v);
            }
        }
        vars
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphMatch {
    pub source: Arc<LogicalPlan>,
    pub path: PathPattern,
    /// Variable → bound column expression (node-id column qualified by
    /// table) for catalog-backed variables.
    pub bindings: std::collections::BTreeMap<String, String>,
    pub predicate: Option<LogicalExpr>,
    pub cost: CostEstimate,
}

impl GraphMatch {
    pub fn reestimate(&mut self) {
        let source_rows = self.source.cost().rows;
        let hop_factor = 0.3_f64.powi(self.path.relationships.len() as i32);
        let sel = self.predicate.as_ref().map(selectivity).unwrap_or(1.0);
        let rows = source_rows * hop_factor.max(1e-6) * sel;
        self.cost = CostEstimate {
            rows,
            cpu: source_rows,
            io: self.source.cost().io,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub input: Arc<LogicalPlan>,
    pub predicate: LogicalExpr,
    pub cost: CostEstimate,
}

impl Filter {
    pub fn new(input: Arc<LogicalPlan>, predicate: LogicalExpr) -> Self {
        let input_cost = input.cost();
        let cost = CostEstimate {
            rows: input_cost.rows * selectivity(&predicate),
            cpu: input_cost.rows,
            io: input_cost.io,
        };
        Filter {
            input,
            predicate,
            cost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: Arc<LogicalPlan>,
    pub right: Arc<LogicalPlan>,
    pub on: Option<LogicalExpr>,
    pub kind: JoinKind,
    pub cost: CostEstimate,
}

impl Join {
    pub fn new(
        left: Arc<LogicalPlan>,
        right: Arc<LogicalPlan>,
        on: Option<LogicalExpr>,
        kind: JoinKind,
    ) -> Self {
        let rows = left.cost().rows * right.cost().rows;
        let cost = CostEstimate {
            rows,
            cpu: rows,
            io: left.cost().io + right.cost().io,
        };
        Join {
            left,
            right,
            on,
            kind,
            cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectItem {
    pub expression: LogicalExpr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub input: Arc<LogicalPlan>,
    pub items: Vec<ProjectItem>,
    pub distinct: bool,
    pub cost: CostEstimate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub input: Arc<LogicalPlan>,
    pub keys: Vec<(LogicalExpr, SortOrder)>,
    pub cost: CostEstimate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    pub input: Arc<LogicalPlan>,
    pub n: Option<u64>,
    pub offset: Option<u64>,
    pub cost: CostEstimate,
}

/// Constraints shared with the path-algorithm translators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathConstraint {
    pub max_length: Option<u32>,
    pub weighted: bool,
    pub weight_property: Option<String>,
    pub bidirectional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub source: String,
    pub target: String,
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub constraints: PathConstraint,
    pub cost: CostEstimate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllPaths {
    pub source: String,
    pub target: String,
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub min: u32,
    pub max: u32,
    pub cycle_detect: bool,
    pub cost: CostEstimate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    Scan(Scan),
    Filter(Filter),
    GraphMatch(GraphMatch),
    ShortestPath(ShortestPath),
    AllPaths(AllPaths),
    Join(Join),
    Project(Project),
    Sort(Sort),
    Limit(Limit),
}

impl LogicalPlan {
    pub fn cost(&self) -> CostEstimate {
        match self {
            LogicalPlan::Scan(n) => n.cost,
            LogicalPlan::Filter(n) => n.cost,
            LogicalPlan::GraphMatch(n) => n.cost,
            LogicalPlan::ShortestPath(n) => n.cost,
            LogicalPlan::AllPaths(n) => n.cost,
            LogicalPlan::Join(n) => n.cost,
            LogicalPlan::Project(n) => n.cost,
            LogicalPlan::Sort(n) => n.cost,
            LogicalPlan::Limit(n) => n.cost,
        }
    }

    /// Variables this subtree makes visible to predicates above it.
    pub fn provided_variables(&self) -> Vec<&str> {
        match self {
            LogicalPlan::Scan(_) => Vec::new(),
            LogicalPlan::Filter(f) => f.input.provided_variables(),
            LogicalPlan::GraphMatch(g) => g.path.variables(),
            LogicalPlan::ShortestPath(s) => vec![s.source.as_str(), s.target.as_str()],
            LogicalPlan::AllPaths(a) => vec![a.source.as_str(), a.target.as_str()],
            LogicalPlan::Join(j) => {
                let mut vars = j.left.provided_variables();
                vars.extend(j.right.provided_variables());
                vars
            }
            LogicalPlan::Project(p) => p.input.provided_variables(),
            LogicalPlan::Sort(s) => s.input.provided_variables(),
            LogicalPlan::Limit(l) => l.input.provided_variables(),
        }
    }
}
