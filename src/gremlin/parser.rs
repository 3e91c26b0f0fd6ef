//! Gremlin step-chain parser.
//!
//! Parses `g.V().hasLabel('User').has('age', gt(30)).out('OWNS')…` into a
//! [`GremlinTraversal`]. Built from nom combinators; the step vocabulary
//! is checked here (names, argument counts) while semantic restrictions
//! are left to the lowering pass.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{opt, recognize};
use nom::multi::separated_list0;
use nom::sequence::delimited;
use nom::{IResult, Parser};

use super::ast::{GremlinTraversal, GremlinValue, HasPredicate, OrderDirection, Step};
use super::errors::GremlinError;

/// One parsed argument inside a step's parentheses.
#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Value(GremlinValue),
    /// `gt(30)`, `within('a', 'b')`, …
    Predicate { name: String, args: Vec<GremlinValue> },
    /// Bare identifier such as `asc` or `Order.desc`
    Ident(String),
}

pub fn parse_traversal(input: &str) -> Result<GremlinTraversal, GremlinError> {
    // The nom layer only recognizes the chain shape: `g`, dots, step
    // names, argument lists. Vocabulary and arity checks run after, so
    // their typed errors survive.
    let (rest, raw_steps) = match traversal(input.trim()) {
        Ok(parsed) => parsed,
        Err(e) => return Err(GremlinError::Parse(e.to_string())),
    };
    if !rest.trim().is_empty() {
        return Err(GremlinError::Parse(format!(
            "unexpected trailing input: '{}'",
            rest.trim()
        )));
    }

    let steps = raw_steps
        .into_iter()
        .map(|(name, args)| build_step(&name, args))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(GremlinTraversal { steps })
}

type RawStep = (String, Vec<Arg>);

fn traversal(input: &str) -> IResult<&str, Vec<RawStep>> {
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = tag("g").parse(input)?;

    let mut steps = Vec::new();
    let mut input = input;
    loop {
        let (rest, dot) = opt(ws(char('.'))).parse(input)?;
        if dot.is_none() {
            break;
        }
        let (rest, step) = raw_step(rest)?;
        steps.push(step);
        input = rest;
    }

    Ok((input, steps))
}

fn raw_step(input: &str) -> IResult<&str, RawStep> {
    let (input, name) = identifier(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), argument),
        ws(char(')')),
    )
    .parse(input)?;
    Ok((input, (name.to_string(), args)))
}

fn build_step(name: &str, args: Vec<Arg>) -> Result<Step, GremlinError> {
    let wrong_count = |expected: &str, found: usize| GremlinError::WrongArgCount {
        step: name.to_string(),
        expected: expected.to_string(),
        found,
    };

    match name {
        "V" => Ok(Step::Vertex {
            ids: values_only(name, args)?,
        }),
        "E" => Ok(Step::Edge),
        "hasLabel" => {
            let mut values = values_only(name, args)?;
            if values.len() != 1 {
                return Err(wrong_count("1", values.len()));
            }
            match values.remove(0) {
                GremlinValue::String(label) => Ok(Step::HasLabel { label }),
                other => Err(GremlinError::Parse(format!(
                    "hasLabel expects a string label, got {:?}",
                    other
                ))),
            }
        }
        "has" => {
            if args.len() != 2 {
                return Err(wrong_count("2", args.len()));
            }
            let mut args = args;
            let predicate_arg = args.remove(1);
            let property = match args.remove(0) {
                Arg::Value(GremlinValue::String(p)) => p,
                other => {
                    return Err(GremlinError::Parse(format!(
                        "has expects a string property name, got {:?}",
                        other
                    )));
                }
            };
            let predicate = match predicate_arg {
                Arg::Value(v) => HasPredicate::Eq(v),
                Arg::Predicate { name, args } => build_predicate(&name, args)?,
                Arg::Ident(other) => {
                    return Err(GremlinError::Parse(format!(
                        "has expects a value or predicate, got '{}'",
                        other
                    )));
                }
            };
            Ok(Step::Has {
                property,
                predicate,
            })
        }
        "hasId" => {
            let values = values_only(name, args)?;
            if values.is_empty() {
                return Err(wrong_count("at least 1", 0));
            }
            Ok(Step::HasId { ids: values })
        }
        "out" | "in" | "both" => {
            let mut values = values_only(name, args)?;
            if values.len() > 1 {
                return Err(wrong_count("0 or 1", values.len()));
            }
            let edge_label = match values.pop() {
                None => None,
                Some(GremlinValue::String(label)) => Some(label),
                Some(other) => {
                    return Err(GremlinError::Parse(format!(
                        "{} expects a string edge label, got {:?}",
                        name, other
                    )));
                }
            };
            Ok(match name {
                "out" => Step::Out { edge_label },
                "in" => Step::In { edge_label },
                _ => Step::Both { edge_label },
            })
        }
        "outE" | "inE" | "bothE" => Ok(Step::EdgeTraversal {
            direction: name.to_string(),
        }),
        "values" => {
            let values = values_only(name, args)?;
            if values.is_empty() {
                return Err(wrong_count("at least 1", 0));
            }
            let mut properties = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    GremlinValue::String(p) => properties.push(p),
                    other => {
                        return Err(GremlinError::Parse(format!(
                            "values expects string property names, got {:?}",
                            other
                        )));
                    }
                }
            }
            Ok(Step::Values { properties })
        }
        "valueMap" | "project" | "select" | "elementMap" => Ok(Step::OtherProjection {
            kind: name.to_string(),
        }),
        "limit" => {
            let mut values = values_only(name, args)?;
            if values.len() != 1 {
                return Err(wrong_count("1", values.len()));
            }
            match values.remove(0) {
                GremlinValue::Integer(n) if n >= 0 => Ok(Step::Limit { count: n as u64 }),
                other => Err(GremlinError::Parse(format!(
                    "limit expects a non-negative integer, got {:?}",
                    other
                ))),
            }
        }
        "order" => {
            if !args.is_empty() {
                return Err(wrong_count("0", args.len()));
            }
            Ok(Step::Order)
        }
        "by" => {
            if args.is_empty() || args.len() > 2 {
                return Err(wrong_count("1 or 2", args.len()));
            }
            let mut args = args;
            let direction = if args.len() == 2 {
                match args.remove(1) {
                    Arg::Ident(d) | Arg::Value(GremlinValue::String(d)) => {
                        match d.rsplit('.').next().unwrap_or(&d) {
                            "asc" | "incr" => OrderDirection::Asc,
                            "desc" | "decr" => OrderDirection::Desc,
                            other => {
                                return Err(GremlinError::Parse(format!(
                                    "unknown order direction '{}'",
                                    other
                                )));
                            }
                        }
                    }
                    other => {
                        return Err(GremlinError::Parse(format!(
                            "by expects an order direction, got {:?}",
                            other
                        )));
                    }
                }
            } else {
                OrderDirection::Asc
            };
            let property = match args.remove(0) {
                Arg::Value(GremlinValue::String(p)) | Arg::Ident(p) => p,
                other => {
                    return Err(GremlinError::Parse(format!(
                        "by expects a property name, got {:?}",
                        other
                    )));
                }
            };
            Ok(Step::By {
                property,
                direction,
            })
        }
        "count" => Ok(Step::Count),
        "dedup" => Ok(Step::Dedup),
        other => Err(GremlinError::UnsupportedPattern(format!(
            "unknown step '{}'",
            other
        ))),
    }
}

fn build_predicate(name: &str, mut args: Vec<GremlinValue>) -> Result<HasPredicate, GremlinError> {
    if name == "within" {
        if args.is_empty() {
            return Err(GremlinError::WrongArgCount {
                step: "within".to_string(),
                expected: "at least 1".to_string(),
                found: 0,
            });
        }
        return Ok(HasPredicate::Within(args));
    }

    if args.len() != 1 {
        return Err(GremlinError::WrongArgCount {
            step: name.to_string(),
            expected: "1".to_string(),
            found: args.len(),
        });
    }
    let value = args.remove(0);
    match name {
        "eq" => Ok(HasPredicate::Eq(value)),
        "neq" => Ok(HasPredicate::Neq(value)),
        "gt" => Ok(HasPredicate::Gt(value)),
        "gte" => Ok(HasPredicate::Gte(value)),
        "lt" => Ok(HasPredicate::Lt(value)),
        "lte" => Ok(HasPredicate::Lte(value)),
        other => Err(GremlinError::UnsupportedPattern(format!(
            "unknown predicate '{}'",
            other
        ))),
    }
}

fn values_only(step: &str, args: Vec<Arg>) -> Result<Vec<GremlinValue>, GremlinError> {
    args.into_iter()
        .map(|arg| match arg {
            Arg::Value(v) => Ok(v),
            other => Err(GremlinError::Parse(format!(
                "{} expects plain values, got {:?}",
                step, other
            ))),
        })
        .collect()
}

fn argument(input: &str) -> IResult<&str, Arg> {
    alt((predicate_arg, value_arg, ident_arg)).parse(input)
}

fn predicate_arg(input: &str) -> IResult<&str, Arg> {
    let (input, name) = identifier(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), value),
        ws(char(')')),
    )
    .parse(input)?;
    Ok((
        input,
        Arg::Predicate {
            name: name.to_string(),
            args,
        },
    ))
}

fn value_arg(input: &str) -> IResult<&str, Arg> {
    let (input, v) = value(input)?;
    Ok((input, Arg::Value(v)))
}

fn ident_arg(input: &str) -> IResult<&str, Arg> {
    let (input, _) = multispace0.parse(input)?;
    let word = take_while1(|c: char| c.is_alphanumeric() || c == '_');
    let tail = take_while1(|c: char| c.is_alphanumeric() || c == '_');
    let (input, ident) = recognize((word, opt((char('.'), tail)))).parse(input)?;
    Ok((input, Arg::Ident(ident.to_string())))
}

fn value(input: &str) -> IResult<&str, GremlinValue> {
    let (input, _) = multispace0.parse(input)?;
    alt((string_value, boolean_value, number_value)).parse(input)
}

fn string_value(input: &str) -> IResult<&str, GremlinValue> {
    let (input, s) = alt((
        delimited(char('\''), take_until("'"), char('\'')),
        delimited(char('"'), take_until("\""), char('"')),
    ))
    .parse(input)?;
    Ok((input, GremlinValue::String(s.to_string())))
}

fn boolean_value(input: &str) -> IResult<&str, GremlinValue> {
    alt((
        tag("true").map(|_| GremlinValue::Boolean(true)),
        tag("false").map(|_| GremlinValue::Boolean(false)),
    ))
    .parse(input)
}

fn number_value(input: &str) -> IResult<&str, GremlinValue> {
    let (rest, text) = recognize((
        opt(char('-')),
        digit1,
        opt((char('.'), digit1)),
    ))
    .parse(input)?;

    let value = if text.contains('.') {
        GremlinValue::Float(text.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
        })?)
    } else {
        GremlinValue::Integer(text.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?)
    };
    Ok((rest, value))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    let (input, _) = multispace0.parse(input)?;
    take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

/// Whitespace-handling combinator.
fn ws<'a, O, E: nom::error::ParseError<&'a str>, F>(
    inner: F,
) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
{
    delimited(multispace0, inner, multispace0)
}
