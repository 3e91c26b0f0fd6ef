//! Gremlin front end: step-chain parsing and lowering onto the Cypher AST.

pub mod ast;
pub mod errors;
pub mod lowering;
pub mod parser;

pub use errors::GremlinError;

use crate::cypher::ast::Query;

/// Parse a Gremlin traversal and lower it to the shared Cypher AST.
pub fn parse_and_lower(input: &str) -> Result<Query, GremlinError> {
    let traversal = parser::parse_traversal(input)?;
    lowering::lower_to_cypher(&traversal)
}
