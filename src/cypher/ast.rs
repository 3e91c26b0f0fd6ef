//! Typed Cypher AST.
//!
//! All nodes are immutable after construction and carry the source span
//! they were parsed from. Gremlin lowering produces the same tree, so
//! everything downstream of the parsers is dialect-agnostic.

use super::lexer::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Identifier {
            name: name.into(),
            span,
        }
    }

    /// Identifier fabricated by lowering or tests, with no source position.
    pub fn synthetic(name: impl Into<String>) -> Self {
        Identifier {
            name: name.into(),
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
    Either,
}

/// `*m..n` micro-syntax on a relationship. `None` bounds are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathLength {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub variable: Option<Identifier>,
    pub labels: Vec<Identifier>,
    pub properties: Vec<(String, Literal)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub variable: Option<Identifier>,
    pub rel_type: Option<Identifier>,
    pub direction: Direction,
    pub length: Option<PathLength>,
    pub span: Span,
}

impl RelationshipPattern {
    pub fn is_variable_length(&self) -> bool {
        self.length.is_some()
    }
}

/// Alternating node/relationship chain. The arity invariant
/// (`nodes.len() == relationships.len() + 1`) is enforced by the smart
/// constructor and can be assumed everywhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    nodes: Vec<NodePattern>,
    relationships: Vec<RelationshipPattern>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("path must alternate nodes and relationships: {nodes} node(s), {relationships} relationship(s)")]
pub struct PathArityError {
    pub nodes: usize,
    pub relationships: usize,
}

impl PathExpression {
    pub fn new(
        nodes: Vec<NodePattern>,
        relationships: Vec<RelationshipPattern>,
        span: Span,
    ) -> Result<Self, PathArityError> {
        if nodes.is_empty() || nodes.len() != relationships.len() + 1 {
            return Err(PathArityError {
                nodes: nodes.len(),
                relationships: relationships.len(),
            });
        }
        Ok(PathExpression {
            nodes,
            relationships,
            span,
        })
    }

    pub fn nodes(&self) -> &[NodePattern] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[RelationshipPattern] {
        &self.relationships
    }

    /// Number of hops in the pattern.
    pub fn hop_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn has_variable_length(&self) -> bool {
        self.relationships.iter().any(|r| r.is_variable_length())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub paths: Vec<PathExpression>,
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        span: Span,
    },
    Identifier(Identifier),
    /// `variable.name` property access.
    Property {
        variable: Identifier,
        name: Identifier,
        span: Span,
    },
    Comparison {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Logical {
        op: LogicalOp,
        operands: Vec<Expr>,
        span: Span,
    },
    Function {
        name: Identifier,
        args: Vec<Expr>,
        span: Span,
    },
    IsNull {
        operand: Box<Expr>,
        negated: bool,
        span: Span,
    },
    /// `[a, b, c]` literal list, only valid on the right of IN.
    List {
        items: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Property { span, .. }
            | Expr::Comparison { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Function { span, .. }
            | Expr::IsNull { span, .. }
            | Expr::List { span, .. } => *span,
            Expr::Identifier(id) => id.span,
        }
    }

    /// Count the comparison leaves, used by the translation summary.
    pub fn condition_count(&self) -> usize {
        match self {
            Expr::Comparison { .. } | Expr::IsNull { .. } => 1,
            Expr::Logical { operands, .. } => operands.iter().map(Expr::condition_count).sum(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub conditions: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub expression: Expr,
    pub alias: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnClause {
    pub items: Vec<ReturnItem>,
    pub distinct: bool,
    pub order_by: Vec<(Expr, SortOrder)>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub match_clause: MatchClause,
    pub where_clause: Option<WhereClause>,
    pub return_clause: ReturnClause,
    pub span: Span,
}

impl Query {
    /// Names of aggregation functions recognized in RETURN items.
    pub const AGGREGATIONS: [&'static str; 5] = ["count", "sum", "avg", "min", "max"];

    pub fn has_aggregation(&self) -> bool {
        fn is_agg(expr: &Expr) -> bool {
            match expr {
                Expr::Function { name, args, .. } => {
                    Query::AGGREGATIONS.contains(&name.name.to_ascii_lowercase().as_str())
                        || args.iter().any(is_agg)
                }
                _ => false,
            }
        }
        self.return_clause
            .items
            .iter()
            .any(|item| is_agg(&item.expression))
    }
}
