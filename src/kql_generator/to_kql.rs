//! Expression rendering to KQL.
//!
//! Operator mapping: `= → ==`, `<> → !=`, comparisons pass through,
//! `AND/OR/NOT → and/or/not(…)`. Property references print as
//! `variable.property`, the graph-property view the `graph-match`
//! stage exposes, not the backing column.

use crate::query_planner::logical_expr::{Literal, LogicalExpr, Operator};

use super::errors::EmitError;
use super::function_registry;

/// Rendering context: projection items keep aggregation names, filter
/// expressions map collection functions onto `array_length` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprContext {
    Filter,
    Projection,
}

pub trait ToKql {
    fn to_kql(&self, ctx: ExprContext) -> Result<String, EmitError>;
}

/// Strings are single-quoted with interior quotes escaped as `\'`;
/// booleans and null are lowercase keywords; numbers pass through.
pub fn encode_literal(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "null".to_string(),
    }
}

/// KQL operator keywords that cannot appear bare as identifiers.
const KQL_KEYWORDS: [&str; 16] = [
    "where", "project", "sort", "order", "by", "limit", "take", "top", "offset", "join",
    "union", "count", "extend", "summarize", "distinct", "in",
];

/// Bracket-quote identifiers that collide with KQL keywords.
pub fn quote_identifier(name: &str) -> String {
    if KQL_KEYWORDS.contains(&name.to_lowercase().as_str()) {
        format!("['{}']", name)
    } else {
        name.to_string()
    }
}

impl ToKql for LogicalExpr {
    fn to_kql(&self, ctx: ExprContext) -> Result<String, EmitError> {
        match self {
            LogicalExpr::Literal(literal) => Ok(encode_literal(literal)),

            LogicalExpr::Variable(name) => Ok(quote_identifier(name)),

            LogicalExpr::Star => Ok("*".to_string()),

            LogicalExpr::PropertyRef(prop) => Ok(format!(
                "{}.{}",
                quote_identifier(&prop.variable),
                quote_identifier(&prop.property)
            )),

            LogicalExpr::List(items) => {
                let rendered: Result<Vec<String>, EmitError> =
                    items.iter().map(|item| item.to_kql(ctx)).collect();
                Ok(format!("({})", rendered?.join(", ")))
            }

            LogicalExpr::FunctionCallExp(call) => render_function(call, ctx),

            LogicalExpr::OperatorApplicationExp(op) => {
                let operands: Result<Vec<String>, EmitError> = op
                    .operands
                    .iter()
                    .map(|operand| {
                        let rendered = operand.to_kql(ctx)?;
                        // Parenthesize nested logical operands so mixed
                        // and/or chains keep their parse.
                        let nested_logical = matches!(
                            operand,
                            LogicalExpr::OperatorApplicationExp(inner)
                                if matches!(inner.operator, Operator::And | Operator::Or)
                        );
                        Ok(if nested_logical {
                            format!("({})", rendered)
                        } else {
                            rendered
                        })
                    })
                    .collect();
                let operands = operands?;

                match op.operator {
                    Operator::Eq => Ok(binary(&operands, "==")),
                    Operator::Neq => Ok(binary(&operands, "!=")),
                    Operator::Lt => Ok(binary(&operands, "<")),
                    Operator::Lte => Ok(binary(&operands, "<=")),
                    Operator::Gt => Ok(binary(&operands, ">")),
                    Operator::Gte => Ok(binary(&operands, ">=")),
                    Operator::In => Ok(binary(&operands, "in")),
                    Operator::And => Ok(operands.join(" and ")),
                    Operator::Or => Ok(operands.join(" or ")),
                    Operator::Not => Ok(format!("not({})", operands.join(", "))),
                    Operator::IsNull => Ok(format!("isnull({})", operands.join(", "))),
                    Operator::IsNotNull => Ok(format!("isnotnull({})", operands.join(", "))),
                }
            }
        }
    }
}

fn binary(operands: &[String], op: &str) -> String {
    match operands {
        [left, right] => format!("{} {} {}", left, op, right),
        _ => operands.join(&format!(" {} ", op)),
    }
}

fn render_function(
    call: &crate::query_planner::logical_expr::FunctionCall,
    ctx: ExprContext,
) -> Result<String, EmitError> {
    let args: Result<Vec<String>, EmitError> =
        call.args.iter().map(|arg| arg.to_kql(ctx)).collect();
    let args = args?;

    let name = match ctx {
        ExprContext::Projection if function_registry::is_aggregate(&call.name) => {
            // count(*) collapses to count()
            if call.name.eq_ignore_ascii_case("count") && args.as_slice() == ["*"] {
                return Ok("count()".to_string());
            }
            function_registry::aggregate_function(&call.name)
                .unwrap_or("count")
                .to_string()
        }
        _ => match function_registry::scalar_function(&call.name) {
            Some(mapped) => mapped.to_string(),
            None => call.name.to_lowercase(),
        },
    };

    Ok(format!("{}({})", name, args.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_planner::logical_expr::{
        FunctionCall, OperatorApplication, PropertyRef,
    };

    fn prop(var: &str, name: &str) -> LogicalExpr {
        LogicalExpr::PropertyRef(PropertyRef {
            variable: var.into(),
            property: name.into(),
            column: None,
        })
    }

    fn lit_int(i: i64) -> LogicalExpr {
        LogicalExpr::Literal(Literal::Integer(i))
    }

    fn cmp(op: Operator, left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
        LogicalExpr::OperatorApplicationExp(OperatorApplication {
            operator: op,
            operands: vec![left, right],
        })
    }

    #[test]
    fn test_equality_maps_to_double_equals() {
        let expr = cmp(
            Operator::Eq,
            prop("n", "name"),
            LogicalExpr::Literal(Literal::String("Alice".into())),
        );
        assert_eq!(expr.to_kql(ExprContext::Filter).unwrap(), "n.name == 'Alice'");
    }

    #[test]
    fn test_comparison_passthrough() {
        assert_eq!(
            cmp(Operator::Gt, prop("n", "age"), lit_int(30))
                .to_kql(ExprContext::Filter)
                .unwrap(),
            "n.age > 30"
        );
        assert_eq!(
            cmp(Operator::Lte, prop("n", "age"), lit_int(25))
                .to_kql(ExprContext::Filter)
                .unwrap(),
            "n.age <= 25"
        );
        assert_eq!(
            cmp(Operator::Neq, prop("n", "status"), lit_int(1))
                .to_kql(ExprContext::Filter)
                .unwrap(),
            "n.status != 1"
        );
    }

    #[test]
    fn test_logical_lowercase_and_parens() {
        let inner_or = LogicalExpr::OperatorApplicationExp(OperatorApplication {
            operator: Operator::Or,
            operands: vec![
                cmp(Operator::Gt, prop("n", "age"), lit_int(30)),
                cmp(Operator::Lt, prop("n", "age"), lit_int(20)),
            ],
        });
        let expr = LogicalExpr::OperatorApplicationExp(OperatorApplication {
            operator: Operator::And,
            operands: vec![cmp(Operator::Eq, prop("n", "active"), lit_int(1)), inner_or],
        });
        assert_eq!(
            expr.to_kql(ExprContext::Filter).unwrap(),
            "n.active == 1 and (n.age > 30 or n.age < 20)"
        );
    }

    #[test]
    fn test_not_wraps_parens() {
        let expr = LogicalExpr::OperatorApplicationExp(OperatorApplication {
            operator: Operator::Not,
            operands: vec![cmp(Operator::Eq, prop("n", "x"), lit_int(1))],
        });
        assert_eq!(expr.to_kql(ExprContext::Filter).unwrap(), "not(n.x == 1)");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(
            encode_literal(&Literal::String("O'Brien".into())),
            "'O\\'Brien'"
        );
        assert_eq!(encode_literal(&Literal::Boolean(true)), "true");
        assert_eq!(encode_literal(&Literal::Null), "null");
    }

    #[test]
    fn test_in_list() {
        let expr = cmp(
            Operator::In,
            prop("n", "role"),
            LogicalExpr::List(vec![
                LogicalExpr::Literal(Literal::String("admin".into())),
                LogicalExpr::Literal(Literal::String("root".into())),
            ]),
        );
        assert_eq!(
            expr.to_kql(ExprContext::Filter).unwrap(),
            "n.role in ('admin', 'root')"
        );
    }

    #[test]
    fn test_filter_functions_map_to_array_length() {
        let expr = LogicalExpr::FunctionCallExp(FunctionCall {
            name: "LENGTH".into(),
            args: vec![prop("p", "edges")],
        });
        assert_eq!(
            expr.to_kql(ExprContext::Filter).unwrap(),
            "array_length(p.edges)"
        );
    }

    #[test]
    fn test_projection_aggregates_keep_names() {
        let expr = LogicalExpr::FunctionCallExp(FunctionCall {
            name: "COUNT".into(),
            args: vec![LogicalExpr::Variable("n".into())],
        });
        assert_eq!(expr.to_kql(ExprContext::Projection).unwrap(), "count(n)");

        let star = LogicalExpr::FunctionCallExp(FunctionCall {
            name: "count".into(),
            args: vec![LogicalExpr::Star],
        });
        assert_eq!(star.to_kql(ExprContext::Projection).unwrap(), "count()");
    }

    #[test]
    fn test_case_functions() {
        let expr = LogicalExpr::FunctionCallExp(FunctionCall {
            name: "UPPER".into(),
            args: vec![prop("n", "name")],
        });
        assert_eq!(
            expr.to_kql(ExprContext::Filter).unwrap(),
            "toupper(n.name)"
        );
    }

    #[test]
    fn test_keyword_identifiers_quoted() {
        assert_eq!(quote_identifier("name"), "name");
        assert_eq!(quote_identifier("where"), "['where']");
        assert_eq!(quote_identifier("Count"), "['Count']");

        let expr = prop("n", "order");
        assert_eq!(
            expr.to_kql(ExprContext::Filter).unwrap(),
            "n.['order']"
        );
    }

    #[test]
    fn test_isnull_rendering() {
        let expr = LogicalExpr::OperatorApplicationExp(OperatorApplication {
            operator: Operator::IsNotNull,
            operands: vec![prop("n", "name")],
        });
        assert_eq!(
            expr.to_kql(ExprContext::Filter).unwrap(),
            "isnotnull(n.name)"
        );
    }
}
