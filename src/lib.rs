//! Kustograph - graph query translation for Azure Sentinel
//!
//! This crate compiles graph queries into Kusto Query Language:
//! - Cypher and Gremlin front ends over a shared typed AST
//! - Schema-catalog resolution onto workspace tables
//! - Logical planning, rewrite-rule optimization, and KQL emission
//! - A routing classifier with a learning pattern cache and an optional
//!   AI fallback

pub mod ai_translator;
pub mod backend;
pub mod config;
pub mod cypher;
pub mod gremlin;
pub mod kql_generator;
pub mod path_algorithms;
pub mod query_planner;
pub mod resolver;
pub mod schema_catalog;
pub mod server;
pub mod translator;

pub use translator::{Dialect, KqlQuery, QueryContext, TranslationError, TranslatorEngine};
