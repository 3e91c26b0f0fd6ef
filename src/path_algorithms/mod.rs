//! Specialized translators for graph path algorithms:
//! `shortestPath`, `allShortestPaths`, `allPaths`, and variable-length
//! patterns.

pub mod all_paths;
pub mod errors;
pub mod shortest_path;

pub use all_paths::{PathAlgorithmTranslator, PathEnumerationConfig, PathFilterConfig};
pub use errors::PathAlgorithmError;
pub use shortest_path::{PathNode, PathRelationship, ShortestPathTranslator};
