//! `shortestPath()` translation to `graph-shortest-paths`.
//!
//! Supports unweighted and weighted search, bidirectional wrapping,
//! multiple sources/targets as unions, and maximum-length constraints.

use crate::cypher::ast::Direction;
use crate::query_planner::logical_plan::PathConstraint;

use super::errors::PathAlgorithmError;

/// Node endpoint of a path search: a variable with optional labels.
#[derive(Debug, Clone, Default)]
pub struct PathNode {
    pub variable: String,
    pub labels: Vec<String>,
}

impl PathNode {
    pub fn new(variable: impl Into<String>) -> Self {
        PathNode {
            variable: variable.into(),
            labels: Vec::new(),
        }
    }

    /// KQL node reference: `n`, `n:Person`, or `n:Person|Actor`.
    pub fn to_kql(&self) -> String {
        if self.labels.is_empty() {
            return self.variable.clone();
        }
        let labels = self.labels.join("|");
        if self.variable.is_empty() {
            labels
        } else {
            format!("{}:{}", self.variable, labels)
        }
    }
}

/// Relationship configuration for a path search.
#[derive(Debug, Clone, Default)]
pub struct PathRelationship {
    pub variable: Option<String>,
    pub types: Vec<String>,
    pub direction: Direction,
}

impl PathRelationship {
    /// KQL relationship reference: `r`, `r:KNOWS`, or `KNOWS|OWNS`.
    pub fn to_kql(&self) -> String {
        let types = self.types.join("|");
        match (&self.variable, types.is_empty()) {
            (Some(variable), true) => variable.clone(),
            (Some(variable), false) => format!("{}:{}", variable, types),
            (None, _) => types,
        }
    }
}

pub fn validate_constraints(constraints: &PathConstraint) -> Result<(), PathAlgorithmError> {
    if constraints.weighted && constraints.weight_property.is_none() {
        return Err(PathAlgorithmError::MissingWeightProperty);
    }
    Ok(())
}

/// Translates shortest-path requests into KQL.
pub struct ShortestPathTranslator;

impl ShortestPathTranslator {
    pub fn new() -> Self {
        ShortestPathTranslator
    }

    /// Single-pair shortest path.
    ///
    /// `relationship` is the plain relationship type; richer
    /// configurations go through `relationship_config`.
    pub fn translate(
        &self,
        source: &str,
        target: &str,
        relationship: Option<&str>,
        constraints: &PathConstraint,
        relationship_config: Option<&PathRelationship>,
    ) -> Result<String, PathAlgorithmError> {
        if source.trim().is_empty() {
            return Err(PathAlgorithmError::EmptySource);
        }
        if target.trim().is_empty() {
            return Err(PathAlgorithmError::EmptyTarget);
        }
        validate_constraints(constraints)?;

        let default_config = PathRelationship::default();
        let config = relationship_config.unwrap_or(&default_config);

        let rel_ref = match relationship {
            Some(rel_type) => match &config.variable {
                Some(variable) => format!("{}:{}", variable, rel_type),
                None => rel_type.to_string(),
            },
            None => config.to_kql(),
        };

        let path_pattern = match config.direction {
            Direction::Incoming => format!("({})<-[{}]-({})", source, rel_ref, target),
            Direction::Either => format!("({})-[{}]-({})", source, rel_ref, target),
            Direction::Outgoing => format!("({})-[{}]->({})", source, rel_ref, target),
        };

        let operator = if constraints.bidirectional {
            "graph-shortest-paths(bidirectional)"
        } else {
            "graph-shortest-paths"
        };

        let mut query = if constraints.weighted {
            let weight = constraints
                .weight_property
                .as_deref()
                .ok_or(PathAlgorithmError::MissingWeightProperty)?;
            format!("{} weight={} {}", operator, weight, path_pattern)
        } else {
            format!("{} {}", operator, path_pattern)
        };

        if let Some(max_length) = constraints.max_length {
            query.push_str(&format!(" | where path_length <= {}", max_length));
        }

        Ok(query)
    }

    /// One query per target, combined with `union`.
    pub fn translate_multiple_targets(
        &self,
        source: &str,
        targets: &[&str],
        relationship: Option<&str>,
        constraints: &PathConstraint,
    ) -> Result<String, PathAlgorithmError> {
        if targets.is_empty() {
            return Err(PathAlgorithmError::EmptyNodeList("target"));
        }
        let paths = targets
            .iter()
            .map(|target| {
                self.translate(source, target, relationship, constraints, None)
                    .map(|q| format!("({})", q))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths.join(" union "))
    }

    /// One query per source, combined with `union`.
    pub fn translate_multiple_sources(
        &self,
        sources: &[&str],
        target: &str,
        relationship: Option<&str>,
        constraints: &PathConstraint,
    ) -> Result<String, PathAlgorithmError> {
        if sources.is_empty() {
            return Err(PathAlgorithmError::EmptyNodeList("source"));
        }
        let paths = sources
            .iter()
            .map(|source| {
                self.translate(source, target, relationship, constraints, None)
                    .map(|q| format!("({})", q))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths.join(" union "))
    }

    /// Minimum total edge weight instead of minimum hops.
    pub fn translate_weighted(
        &self,
        source: &str,
        target: &str,
        relationship: &str,
        weight_property: &str,
        max_length: Option<u32>,
    ) -> Result<String, PathAlgorithmError> {
        if weight_property.trim().is_empty() {
            return Err(PathAlgorithmError::MissingWeightProperty);
        }
        let constraints = PathConstraint {
            max_length,
            weighted: true,
            weight_property: Some(weight_property.to_string()),
            bidirectional: false,
        };
        self.translate(source, target, Some(relationship), &constraints, None)
    }

    /// Search from both endpoints simultaneously.
    pub fn translate_bidirectional(
        &self,
        source: &str,
        target: &str,
        relationship: Option<&str>,
        max_length: Option<u32>,
    ) -> Result<String, PathAlgorithmError> {
        let constraints = PathConstraint {
            max_length,
            weighted: false,
            weight_property: None,
            bidirectional: true,
        };
        self.translate(source, target, relationship, &constraints, None)
    }
}

impl Default for ShortestPathTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> ShortestPathTranslator {
        ShortestPathTranslator::new()
    }

    #[test]
    fn test_basic_shortest_path() {
        let query = translator()
            .translate("n", "m", Some("KNOWS"), &PathConstraint::default(), None)
            .unwrap();
        assert_eq!(query, "graph-shortest-paths (n)-[KNOWS]->(m)");
    }

    #[test]
    fn test_max_length_constraint() {
        let constraints = PathConstraint {
            max_length: Some(5),
            ..Default::default()
        };
        let query = translator()
            .translate("n", "m", Some("KNOWS"), &constraints, None)
            .unwrap();
        assert!(query.contains("graph-shortest-paths"));
        assert!(query.contains("(n)"));
        assert!(query.contains("-[KNOWS]->"));
        assert!(query.contains("(m)"));
        assert!(query.contains("path_length <= 5"));
    }

    #[test]
    fn test_weighted_path() {
        let query = translator()
            .translate_weighted("n", "m", "ROAD", "distance", None)
            .unwrap();
        assert!(query.contains("weight=distance"));
        assert!(query.contains("-[ROAD]->"));
    }

    #[test]
    fn test_weighted_without_property_fails() {
        let constraints = PathConstraint {
            weighted: true,
            ..Default::default()
        };
        assert_eq!(
            translator().translate("n", "m", None, &constraints, None),
            Err(PathAlgorithmError::MissingWeightProperty)
        );
    }

    #[test]
    fn test_bidirectional_wrapper() {
        let query = translator()
            .translate_bidirectional("n", "m", Some("KNOWS"), Some(3))
            .unwrap();
        assert!(query.starts_with("graph-shortest-paths(bidirectional)"));
        assert!(query.contains("path_length <= 3"));
    }

    #[test]
    fn test_direction_mapping() {
        let incoming = PathRelationship {
            direction: Direction::Incoming,
            ..Default::default()
        };
        let query = translator()
            .translate("n", "m", Some("KNOWS"), &PathConstraint::default(), Some(&incoming))
            .unwrap();
        assert!(query.contains("(n)<-[KNOWS]-(m)"));

        let both = PathRelationship {
            direction: Direction::Either,
            ..Default::default()
        };
        let query = translator()
            .translate("n", "m", Some("KNOWS"), &PathConstraint::default(), Some(&both))
            .unwrap();
        assert!(query.contains("(n)-[KNOWS]-(m)"));
        assert!(!query.contains("->"));
    }

    #[test]
    fn test_relationship_variable() {
        let config = PathRelationship {
            variable: Some("r".into()),
            ..Default::default()
        };
        let query = translator()
            .translate("n", "m", Some("KNOWS"), &PathConstraint::default(), Some(&config))
            .unwrap();
        assert!(query.contains("-[r:KNOWS]->"));
    }

    #[test]
    fn test_empty_endpoints_fail() {
        assert_eq!(
            translator().translate("", "m", None, &PathConstraint::default(), None),
            Err(PathAlgorithmError::EmptySource)
        );
        assert_eq!(
            translator().translate("n", "  ", None, &PathConstraint::default(), None),
            Err(PathAlgorithmError::EmptyTarget)
        );
    }

    #[test]
    fn test_multiple_targets_union() {
        let query = translator()
            .translate_multiple_targets("n", &["m", "p"], Some("KNOWS"), &PathConstraint::default())
            .unwrap();
        assert_eq!(query.matches(" union ").count(), 1);
        assert!(query.contains("(m)"));
        assert!(query.contains("(p)"));
    }

    #[test]
    fn test_multiple_sources_union() {
        let query = translator()
            .translate_multiple_sources(&["n", "p"], "m", Some("KNOWS"), &PathConstraint::default())
            .unwrap();
        assert!(query.contains("(n)-[KNOWS]->(m)"));
        assert!(query.contains("(p)-[KNOWS]->(m)"));
    }

    #[test]
    fn test_empty_target_list_fails() {
        assert_eq!(
            translator().translate_multiple_targets("n", &[], None, &PathConstraint::default()),
            Err(PathAlgorithmError::EmptyNodeList("target"))
        );
    }

    #[test]
    fn test_path_node_formatting() {
        assert_eq!(PathNode::new("n").to_kql(), "n");
        let labeled = PathNode {
            variable: "n".into(),
            labels: vec!["Person".into(), "Actor".into()],
        };
        assert_eq!(labeled.to_kql(), "n:Person|Actor");
    }
}
