//! `allShortestPaths()` / `allPaths()` translation.
//!
//! Emits the `all_shortest_paths` and `all_paths` operators with
//! path-length filters, node/relationship exclusions, and opt-in cycle
//! detection.

use super::errors::PathAlgorithmError;

/// Filters applied to enumerated paths.
#[derive(Debug, Clone, Default)]
pub struct PathFilterConfig {
    pub max_path_length: Option<u32>,
    pub min_path_length: Option<u32>,
    pub node_filter: Option<String>,
    pub relationship_filter: Option<String>,
    pub excluded_nodes: Vec<String>,
    pub excluded_relationships: Vec<String>,
}

impl PathFilterConfig {
    pub fn validate(&self) -> Result<(), PathAlgorithmError> {
        if let (Some(min), Some(max)) = (self.min_path_length, self.max_path_length) {
            if max < min {
                return Err(PathAlgorithmError::InvertedBounds { min, max });
            }
        }
        Ok(())
    }
}

/// Enumeration bounds for `allPaths()`.
#[derive(Debug, Clone)]
pub struct PathEnumerationConfig {
    pub max_paths: Option<u32>,
    pub max_depth: u32,
    pub cycle_detection: bool,
}

impl Default for PathEnumerationConfig {
    fn default() -> Self {
        PathEnumerationConfig {
            max_paths: None,
            max_depth: 10,
            cycle_detection: true,
        }
    }
}

impl PathEnumerationConfig {
    pub fn validate(&self) -> Result<(), PathAlgorithmError> {
        if let Some(max_paths) = self.max_paths {
            if max_paths == 0 {
                return Err(PathAlgorithmError::NonPositiveMaxPaths);
            }
        }
        if self.max_depth == 0 {
            return Err(PathAlgorithmError::NegativeLength);
        }
        Ok(())
    }
}

pub struct PathAlgorithmTranslator;

impl PathAlgorithmTranslator {
    pub fn new() -> Self {
        PathAlgorithmTranslator
    }

    /// All paths with minimum hop count between source and target.
    pub fn translate_all_shortest_paths(
        &self,
        source: &str,
        target: &str,
        relationship: Option<&str>,
        filters: &PathFilterConfig,
        max_paths: Option<u32>,
    ) -> Result<String, PathAlgorithmError> {
        check_endpoints(source, target)?;
        filters.validate()?;

        let rel_pattern = relationship.unwrap_or("");
        let mut query = format!(
            "all_shortest_paths (({})-[{}]->({}))",
            source, rel_pattern, target
        );

        if let Some(max) = filters.max_path_length {
            query.push_str(&format!(" | where array_length(path) <= {}", max));
        }
        if let Some(min) = filters.min_path_length {
            query.push_str(&format!(" | where array_length(path) >= {}", min));
        }
        if let Some(node_filter) = &filters.node_filter {
            query.push_str(&format!(" | where {}", node_filter));
        }
        if let Some(max_paths) = max_paths {
            if max_paths == 0 {
                return Err(PathAlgorithmError::NonPositiveMaxPaths);
            }
            query.push_str(&format!(" | limit {}", max_paths));
        }

        Ok(query)
    }

    /// Enumerate all paths of bounded length.
    pub fn translate_all_paths(
        &self,
        source: &str,
        target: &str,
        relationship: Option<&str>,
        max_length: Option<u32>,
        filters: &PathFilterConfig,
        enumeration: &PathEnumerationConfig,
    ) -> Result<String, PathAlgorithmError> {
        check_endpoints(source, target)?;
        filters.validate()?;
        enumeration.validate()?;

        let max_length = max_length.unwrap_or(enumeration.max_depth);
        if max_length == 0 {
            return Err(PathAlgorithmError::NegativeLength);
        }

        let rel_pattern = length_pattern(relationship, 1, max_length);
        let mut query = format!("all_paths (({})-{}->({}))", source, rel_pattern, target);

        if let Some(max) = filters.max_path_length {
            query.push_str(&format!(" | where array_length(path) <= {}", max));
        }
        if let Some(min) = filters.min_path_length {
            query.push_str(&format!(" | where array_length(path) >= {}", min));
        }
        if let Some(node_filter) = &filters.node_filter {
            query.push_str(&format!(" | where {}", node_filter));
        }
        if let Some(relationship_filter) = &filters.relationship_filter {
            query.push_str(&format!(" | where {}", relationship_filter));
        }
        if enumeration.cycle_detection {
            query.push_str(" | where no_cycles");
        }
        if let Some(max_paths) = enumeration.max_paths {
            query.push_str(&format!(" | limit {}", max_paths));
        }

        Ok(query)
    }

    /// Path enumeration with the full filter set collapsed into a single
    /// `where` clause, including node/relationship exclusion lists.
    pub fn translate_filtered_paths(
        &self,
        source: &str,
        target: &str,
        filters: &PathFilterConfig,
        relationship: Option<&str>,
        max_length: Option<u32>,
    ) -> Result<String, PathAlgorithmError> {
        check_endpoints(source, target)?;
        filters.validate()?;

        let max_length = max_length.unwrap_or(10);
        let rel_pattern = length_pattern(relationship, 1, max_length);
        let mut query = format!("all_paths (({})-{}->({}))", source, rel_pattern, target);

        let mut conditions = Vec::new();
        if let Some(max) = filters.max_path_length {
            conditions.push(format!("array_length(path) <= {}", max));
        }
        if let Some(min) = filters.min_path_length {
            conditions.push(format!("array_length(path) >= {}", min));
        }
        if !filters.excluded_nodes.is_empty() {
            let excluded = filters
                .excluded_nodes
                .iter()
                .map(|node| format!("\"{}\"", node))
                .collect::<Vec<_>>()
                .join(", ");
            conditions.push(format!("not (any_element(path_nodes) in ({}))", excluded));
        }
        if !filters.excluded_relationships.is_empty() {
            let excluded = filters
                .excluded_relationships
                .iter()
                .map(|rel| format!("\"{}\"", rel))
                .collect::<Vec<_>>()
                .join(", ");
            conditions.push(format!(
                "not (any_element(path_relationships) in ({}))",
                excluded
            ));
        }
        if let Some(node_filter) = &filters.node_filter {
            conditions.push(format!("({})", node_filter));
        }
        if let Some(relationship_filter) = &filters.relationship_filter {
            conditions.push(format!("({})", relationship_filter));
        }

        if !conditions.is_empty() {
            query.push_str(&format!(" | where {}", conditions.join(" and ")));
        }

        Ok(query)
    }

    /// Variable-length pattern with explicit bounds inside `graph-match`.
    pub fn translate_variable_length(
        &self,
        source: &str,
        target: &str,
        min_length: u32,
        max_length: u32,
        relationship: Option<&str>,
        filters: &PathFilterConfig,
    ) -> Result<String, PathAlgorithmError> {
        check_endpoints(source, target)?;
        if min_length > max_length {
            return Err(PathAlgorithmError::InvertedBounds {
                min: min_length,
                max: max_length,
            });
        }
        filters.validate()?;

        let rel_pattern = length_pattern(relationship, min_length, max_length);
        let mut query = format!("graph-match (({})-{}->({}))", source, rel_pattern, target);

        if let Some(max) = filters.max_path_length {
            query.push_str(&format!(" | where path_length <= {}", max));
        }
        if let Some(node_filter) = &filters.node_filter {
            query.push_str(&format!(" | where {}", node_filter));
        }
        if let Some(relationship_filter) = &filters.relationship_filter {
            query.push_str(&format!(" | where {}", relationship_filter));
        }

        Ok(query)
    }
}

impl Default for PathAlgorithmTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_endpoints(source: &str, target: &str) -> Result<(), PathAlgorithmError> {
    if source.trim().is_empty() {
        return Err(PathAlgorithmError::EmptySource);
    }
    if target.trim().is_empty() {
        return Err(PathAlgorithmError::EmptyTarget);
    }
    Ok(())
}

/// `[KNOWS*1..5]` / `[*1..5]` micro-syntax.
fn length_pattern(relationship: Option<&str>, min: u32, max: u32) -> String {
    match relationship {
        Some(rel) => format!("[{}*{}..{}]", rel, min, max),
        None => format!("[*{}..{}]", min, max),
    }
}
