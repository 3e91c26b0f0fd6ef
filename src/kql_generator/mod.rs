//! KQL emission: serializes the optimized logical plan to a pipeline of
//! KQL operators.

pub mod emitter;
pub mod errors;
pub mod function_registry;
pub mod to_kql;

pub use emitter::KqlEmitter;
pub use errors::EmitError;
pub use to_kql::{encode_literal, ExprContext, ToKql};
