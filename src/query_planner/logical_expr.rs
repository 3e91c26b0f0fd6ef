//! Logical expressions: the resolved, dialect-free form of predicates and
//! projection items carried by plan nodes.

use std::collections::HashSet;

use crate::cypher::ast::{self, CompareOp, Expr, LogicalOp};
use crate::resolver::{BindingKind, ResolvedQuery};
use crate::schema_catalog::SchemaCatalog;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl From<&ast::Literal> for Literal {
    fn from(lit: &ast::Literal) -> Self {
        match lit {
            ast::Literal::String(s) => Literal::String(s.clone()),
            ast::Literal::Integer(i) => Literal::Integer(*i),
            ast::Literal::Float(f) => Literal::Float(*f),
            ast::Literal::Boolean(b) => Literal::Boolean(*b),
            ast::Literal::Null => Literal::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    And,
    Or,
    Not,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Eq
                | Operator::Neq
                | Operator::Lt
                | Operator::Lte
                | Operator::Gt
                | Operator::Gte
                | Operator::In
        )
    }

    /// Range comparisons for the selectivity heuristic.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorApplication {
    pub operator: Operator,
    pub operands: Vec<LogicalExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<LogicalExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRef {
    pub variable: String,
    pub property: String,
    /// Backing column when the resolver bound one.
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalExpr {
    Literal(Literal),
    Variable(String),
    Star,
    PropertyRef(PropertyRef),
    OperatorApplicationExp(OperatorApplication),
    FunctionCallExp(FunctionCall),
    List(Vec<LogicalExpr>),
}

impl LogicalExpr {
    /// Variables referenced anywhere in the expression.
    pub fn variables(&self) -> HashSet<&str> {
        let mut out = HashSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut HashSet<&'a str>) {
        match self {
            LogicalExpr::Variable(name) => {
                out.insert(name.as_str());
            }
            LogicalExpr::PropertyRef(prop) => {
                out.insert(prop.variable.as_str());
            }
            LogicalExpr::OperatorApplicationExp(op) => {
                for operand in &op.operands {
                    operand.collect_variables(out);
                }
            }
            LogicalExpr::FunctionCallExp(call) => {
                for arg in &call.args {
                    arg.collect_variables(out);
                }
            }
            LogicalExpr::List(items) => {
                for item in items {
                    item.collect_variables(out);
                }
            }
            LogicalExpr::Literal(_) | LogicalExpr::Star => {}
        }
    }

    /// True when every property reference has a resolved backing column.
    pub fn fully_resolved(&self) -> bool {
        match self {
            LogicalExpr::PropertyRef(prop) => prop.column.is_some(),
            LogicalExpr::OperatorApplicationExp(op) => {
                op.operands.iter().all(LogicalExpr::fully_resolved)
            }
            LogicalExpr::FunctionCallExp(call) => call.args.iter().all(LogicalExpr::fully_resolved),
            LogicalExpr::List(items) => items.iter().all(LogicalExpr::fully_resolved),
            _ => true,
        }
    }
}

/// Flatten nested ANDs into a conjunct list.
pub fn split_conjuncts(expr: &LogicalExpr) -> Vec<LogicalExpr> {
    match expr {
        LogicalExpr::OperatorApplicationExp(op) if op.operator == Operator::And => op
            .operands
            .iter()
            .flat_map(split_conjuncts)
            .collect(),
        other => vec![other.clone()],
    }
}

/// Rebuild a conjunction from conjuncts. Empty input yields `None`.
pub fn combine_conjuncts(conjuncts: Vec<LogicalExpr>) -> Option<LogicalExpr> {
    let mut iter = conjuncts.into_iter();
    let first = iter.next()?;
    Some(iter.fold(first, |acc, expr| {
        LogicalExpr::OperatorApplicationExp(OperatorApplication {
            operator: Operator::And,
            operands: vec![acc, expr],
        })
    }))
}

/// Convert a resolved AST expression into a logical expression.
///
/// `id(v)` calls are rewritten to a property reference on the variable's
/// node-id column; everything else converts structurally.
pub fn from_ast(expr: &Expr, resolved: &ResolvedQuery, catalog: &SchemaCatalog) -> LogicalExpr {
    match expr {
        Expr::Literal { value, .. } => LogicalExpr::Literal(value.into()),

        Expr::Identifier(ident) => {
            if ident.name == "*" {
                LogicalExpr::Star
            } else {
                LogicalExpr::Variable(ident.name.clone())
            }
        }

        Expr::Property { variable, name, .. } => {
            let column = resolved
                .property(&variable.name, &name.name)
                .map(|p| p.column.clone());
            LogicalExpr::PropertyRef(PropertyRef {
                variable: variable.name.clone(),
                property: name.name.clone(),
                column,
            })
        }

        Expr::Comparison { op, left, right, .. } => {
            let operator = match op {
                CompareOp::Eq => Operator::Eq,
                CompareOp::Neq => Operator::Neq,
                CompareOp::Lt => Operator::Lt,
                CompareOp::Lte => Operator::Lte,
                CompareOp::Gt => Operator::Gt,
                CompareOp::Gte => Operator::Gte,
                CompareOp::In => Operator::In,
            };
            LogicalExpr::OperatorApplicationExp(OperatorApplication {
                operator,
                operands: vec![
                    from_ast(left, resolved, catalog),
                    from_ast(right, resolved, catalog),
                ],
            })
        }

        Expr::Logical { op, operands, .. } => {
            let operator = match op {
                LogicalOp::And => Operator::And,
                LogicalOp::Or => Operator::Or,
                LogicalOp::Not => Operator::Not,
            };
            LogicalExpr::OperatorApplicationExp(OperatorApplication {
                operator,
                operands: operands
                    .iter()
                    .map(|operand| from_ast(operand, resolved, catalog))
                    .collect(),
            })
        }

        Expr::IsNull { operand, negated, .. } => LogicalExpr::OperatorApplicationExp(
            OperatorApplication {
                operator: if *negated {
                    Operator::IsNotNull
                } else {
                    Operator::IsNull
                },
                operands: vec![from_ast(operand, resolved, catalog)],
            },
        ),

        Expr::Function { name, args, .. } => {
            // id(v) resolves to the node-id column of v's label.
            if name.name.eq_ignore_ascii_case("id") && args.len() == 1 {
                if let Expr::Identifier(var) = &args[0] {
                    let binding = resolved.binding(&var.name);
                    let id_column = binding
                        .filter(|b| b.kind == BindingKind::Node)
                        .and_then(|b| b.label.as_ref())
                        .and_then(|label| catalog.label(label))
                        .map(|meta| meta.id_column.clone());
                    let property = id_column.clone().unwrap_or_else(|| "id".to_string());
                    return LogicalExpr::PropertyRef(PropertyRef {
                        variable: var.name.clone(),
                        property,
                        column: id_column,
                    });
                }
            }
            LogicalExpr::FunctionCallExp(FunctionCall {
                name: name.name.clone(),
                args: args
                    .iter()
                    .map(|arg| from_ast(arg, resolved, catalog))
                    .collect(),
            })
        }

        Expr::List { items, .. } => LogicalExpr::List(
            items
                .iter()
                .map(|item| from_ast(item, resolved, catalog))
                .collect(),
        ),
    }
}
