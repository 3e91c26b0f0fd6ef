//! Resolver: one walk over the AST that binds variables, assigns stable
//! numeric ids, and checks every label, relationship type, and property
//! against the schema catalog.
//!
//! Unlabeled node variables stay catalog-free; their properties pass
//! through unresolved and the emitter falls back to the pseudo graph
//! tables. A labeled variable with an unknown property is always an
//! error, per the propagation policy.

pub mod errors;

use std::collections::HashMap;

use crate::cypher::ast::{
    Expr, Identifier, MatchClause, NodePattern, Query, RelationshipPattern, ReturnClause,
};
use crate::cypher::lexer::Span;
use crate::schema_catalog::{PropertyType, SchemaCatalog};

pub use errors::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Node,
    Relationship,
}

#[derive(Debug, Clone)]
pub struct VarBinding {
    pub id: u32,
    pub name: String,
    pub kind: BindingKind,
    pub label: Option<String>,
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProperty {
    pub table: String,
    pub column: String,
    pub property_type: PropertyType,
}

/// The AST plus binding and property-resolution side tables.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub ast: Query,
    bindings: HashMap<String, VarBinding>,
    properties: HashMap<(String, String), ResolvedProperty>,
}

impl ResolvedQuery {
    pub fn binding(&self, name: &str) -> Option<&VarBinding> {
        self.bindings.get(name)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &VarBinding> {
        self.bindings.values()
    }

    pub fn property(&self, variable: &str, property: &str) -> Option<&ResolvedProperty> {
        self.properties.get(&(variable.to_string(), property.to_string()))
    }
}

struct Resolver<'a> {
    catalog: &'a SchemaCatalog,
    bindings: HashMap<String, VarBinding>,
    properties: HashMap<(String, String), ResolvedProperty>,
    next_id: u32,
}

pub fn resolve(query: Query, catalog: &SchemaCatalog) -> Result<ResolvedQuery, ResolveError> {
    let mut resolver = Resolver {
        catalog,
        bindings: HashMap::new(),
        properties: HashMap::new(),
        next_id: 0,
    };

    resolver.resolve_match(&query.match_clause)?;
    if let Some(where_clause) = &query.where_clause {
        resolver.resolve_expr(&where_clause.conditions)?;
    }
    resolver.resolve_return(&query.return_clause)?;

    Ok(ResolvedQuery {
        ast: query,
        bindings: resolver.bindings,
        properties: resolver.properties,
    })
}

impl<'a> Resolver<'a> {
    fn resolve_match(&mut self, match_clause: &MatchClause) -> Result<(), ResolveError> {
        for path in &match_clause.paths {
            for node in path.nodes() {
                self.resolve_node(node)?;
            }
            for (i, rel) in path.relationships().iter().enumerate() {
                let left = &path.nodes()[i];
                let right = &path.nodes()[i + 1];
                self.resolve_relationship(rel, left, right)?;
            }
        }
        Ok(())
    }

    fn resolve_node(&mut self, node: &NodePattern) -> Result<(), ResolveError> {
        for label in &node.labels {
            if self.catalog.label(&label.name).is_none() {
                return Err(ResolveError::UnknownLabel {
                    label: label.name.clone(),
                    span: label.span,
                });
            }
        }

        let label = node.labels.first().map(|l| l.name.clone());
        let table = match &label {
            Some(l) => self.catalog.table_of(l).ok().map(str::to_string),
            None => None,
        };

        if let Some(variable) = &node.variable {
            self.bind(variable, BindingKind::Node, label.clone(), table);
        }

        // Inline property map keys are property references too.
        if let (Some(variable), Some(label)) = (&node.variable, &label) {
            for (property, _) in &node.properties {
                self.resolve_property(variable, property, label, node.span)?;
            }
        }

        Ok(())
    }

    fn resolve_relationship(
        &mut self,
        rel: &RelationshipPattern,
        left: &NodePattern,
        right: &NodePattern,
    ) -> Result<(), ResolveError> {
        let mut table = None;

        if let Some(rel_type) = &rel.rel_type {
            let meta = self.catalog.relationship(&rel_type.name).map_err(|_| {
                ResolveError::UnknownRelationship {
                    rel_type: rel_type.name.clone(),
                    span: rel_type.span,
                }
            })?;
            table = Some(meta.table.clone());

            // Arity: attached labels must be compatible with the
            // relationship's declared endpoints, honoring direction.
            let (expected_left, expected_right) = match rel.direction {
                crate::cypher::ast::Direction::Outgoing => {
                    (meta.from_label.as_str(), meta.to_label.as_str())
                }
                crate::cypher::ast::Direction::Incoming => {
                    (meta.to_label.as_str(), meta.from_label.as_str())
                }
                crate::cypher::ast::Direction::Either => {
                    (meta.from_label.as_str(), meta.to_label.as_str())
                }
            };

            let left_label = left.labels.first().map(|l| l.name.as_str());
            let right_label = right.labels.first().map(|l| l.name.as_str());

            let forward_ok = left_label.is_none_or(|l| l == expected_left)
                && right_label.is_none_or(|l| l == expected_right);
            let either_ok = rel.direction == crate::cypher::ast::Direction::Either
                && left_label.is_none_or(|l| l == expected_right)
                && right_label.is_none_or(|l| l == expected_left);

            if !forward_ok && !either_ok {
                return Err(ResolveError::RelationshipArityMismatch {
                    rel_type: rel_type.name.clone(),
                    expected_from: meta.from_label.clone(),
                    expected_to: meta.to_label.clone(),
                    span: rel.span,
                });
            }
        }

        if let Some(variable) = &rel.variable {
            self.bind(
                variable,
                BindingKind::Relationship,
                rel.rel_type.as_ref().map(|t| t.name.clone()),
                table,
            );
        }
        Ok(())
    }

    fn resolve_return(&mut self, return_clause: &ReturnClause) -> Result<(), ResolveError> {
        let mut seen_aliases: HashMap<&str, Span> = HashMap::new();
        for item in &return_clause.items {
            self.resolve_expr(&item.expression)?;
            if let Some(alias) = &item.alias {
                if seen_aliases.contains_key(alias.name.as_str()) {
                    return Err(ResolveError::DuplicateAlias {
                        alias: alias.name.clone(),
                        span: alias.span,
                    });
                }
                seen_aliases.insert(&alias.name, alias.span);
            }
        }
        for (expr, _) in &return_clause.order_by {
            self.resolve_expr(expr)?;
        }
        Ok(())
    }

    fn resolve_expr(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        match expr {
            Expr::Literal { .. } => Ok(()),

            Expr::Identifier(ident) => {
                if ident.name == "*" {
                    return Ok(());
                }
                if !self.bindings.contains_key(&ident.name) {
                    return Err(ResolveError::UnboundVariable {
                        name: ident.name.clone(),
                        span: ident.span,
                    });
                }
                Ok(())
            }

            Expr::Property { variable, name, span } => {
                let binding = self.bindings.get(&variable.name).cloned().ok_or_else(|| {
                    ResolveError::UnboundVariable {
                        name: variable.name.clone(),
                        span: variable.span,
                    }
                })?;
                if binding.kind == BindingKind::Node {
                    if let Some(label) = &binding.label {
                        let label = label.clone();
                        self.resolve_property(variable, &name.name, &label, *span)?;
                    }
                }
                Ok(())
            }

            Expr::Comparison { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }

            Expr::Logical { operands, .. } => {
                for operand in operands {
                    self.resolve_expr(operand)?;
                }
                Ok(())
            }

            Expr::Function { args, .. } => {
                for arg in args {
                    self.resolve_expr(arg)?;
                }
                Ok(())
            }

            Expr::IsNull { operand, .. } => self.resolve_expr(operand),

            Expr::List { items, .. } => {
                for item in items {
                    self.resolve_expr(item)?;
                }
                Ok(())
            }
        }
    }

    fn resolve_property(
        &mut self,
        variable: &Identifier,
        property: &str,
        label: &str,
        span: Span,
    ) -> Result<(), ResolveError> {
        let meta = self.catalog.column_of(label, property).map_err(|_| {
            ResolveError::UnknownProperty {
                variable: variable.name.clone(),
                property: property.to_string(),
                label: label.to_string(),
                span,
            }
        })?;
        let table = self
            .catalog
            .table_of(label)
            .map(str::to_string)
            .unwrap_or_default();
        self.properties.insert(
            (variable.name.clone(), property.to_string()),
            ResolvedProperty {
                table,
                column: meta.column.clone(),
                property_type: meta.property_type,
            },
        );
        Ok(())
    }

    fn bind(
        &mut self,
        variable: &Identifier,
        kind: BindingKind,
        label: Option<String>,
        table: Option<String>,
    ) {
        if let Some(existing) = self.bindings.get_mut(&variable.name) {
            // Re-mention of a bound variable; fill in a label learned
            // from a later pattern occurrence.
            if existing.label.is_none() && label.is_some() {
                existing.label = label;
                existing.table = table;
            }
            return;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.bindings.insert(
            variable.name.clone(),
            VarBinding {
                id,
                name: variable.name.clone(),
                kind,
                label,
                table,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::parse_query;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::builtin_default()
    }

    fn resolve_ok(input: &str) -> ResolvedQuery {
        let query = parse_query(input).expect("parse failed");
        resolve(query, &catalog()).expect("resolve failed")
    }

    fn resolve_err(input: &str) -> ResolveError {
        let query = parse_query(input).expect("parse failed");
        resolve(query, &catalog()).expect_err("expected resolve failure")
    }

    #[test]
    fn test_bindings_assigned_in_order() {
        let resolved = resolve_ok("MATCH (n:User)-[r:KNOWS]->(m:User) RETURN n, m");
        assert_eq!(resolved.binding("n").unwrap().id, 0);
        assert_eq!(resolved.binding("r").unwrap().id, 1);
        assert_eq!(resolved.binding("m").unwrap().id, 2);
        assert_eq!(resolved.binding("n").unwrap().kind, BindingKind::Node);
        assert_eq!(
            resolved.binding("r").unwrap().kind,
            BindingKind::Relationship
        );
    }

    #[test]
    fn test_label_resolves_table() {
        let resolved = resolve_ok("MATCH (n:User) RETURN n");
        let binding = resolved.binding("n").unwrap();
        assert_eq!(binding.label.as_deref(), Some("User"));
        assert_eq!(binding.table.as_deref(), Some("IdentityInfo"));
    }

    #[test]
    fn test_property_resolution() {
        let resolved = resolve_ok("MATCH (n:User) WHERE n.age > 30 RETURN n.name");
        let age = resolved.property("n", "age").unwrap();
        assert_eq!(age.column, "AccountAgeDays");
        assert_eq!(age.property_type, PropertyType::Integer);
        let name = resolved.property("n", "name").unwrap();
        assert_eq!(name.table, "IdentityInfo");
        assert_eq!(name.column, "AccountDisplayName");
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            resolve_err("MATCH (n:Ghost) RETURN n"),
            ResolveError::UnknownLabel { .. }
        ));
    }

    #[test]
    fn test_unknown_relationship() {
        assert!(matches!(
            resolve_err("MATCH (n:User)-[r:HATES]->(m:User) RETURN n"),
            ResolveError::UnknownRelationship { .. }
        ));
    }

    #[test]
    fn test_unknown_property() {
        assert!(matches!(
            resolve_err("MATCH (n:User) WHERE n.shoe_size > 10 RETURN n"),
            ResolveError::UnknownProperty { .. }
        ));
    }

    #[test]
    fn test_unknown_property_in_map() {
        assert!(matches!(
            resolve_err("MATCH (n:User {shoe_size: 10}) RETURN n"),
            ResolveError::UnknownProperty { .. }
        ));
    }

    #[test]
    fn test_unlabeled_property_passes() {
        // No label means no catalog check; pseudo tables handle emission.
        let resolved = resolve_ok("MATCH (a)-->(b) WHERE a.weight > 1 RETURN a");
        assert!(resolved.property("a", "weight").is_none());
    }

    #[test]
    fn test_unbound_variable_in_where() {
        assert!(matches!(
            resolve_err("MATCH (n:User) WHERE m.age > 30 RETURN n"),
            ResolveError::UnboundVariable { .. }
        ));
    }

    #[test]
    fn test_unbound_variable_in_return() {
        assert!(matches!(
            resolve_err("MATCH (n:User) RETURN m"),
            ResolveError::UnboundVariable { .. }
        ));
    }

    #[test]
    fn test_unbound_variable_in_order_by() {
        assert!(matches!(
            resolve_err("MATCH (n:User) RETURN n ORDER BY m.age"),
            ResolveError::UnboundVariable { .. }
        ));
    }

    #[test]
    fn test_duplicate_alias() {
        assert!(matches!(
            resolve_err("MATCH (n:User) RETURN n.name AS x, n.email AS x"),
            ResolveError::DuplicateAlias { .. }
        ));
    }

    #[test]
    fn test_arity_mismatch() {
        // OWNS connects User → Device; Device → Device is wrong
        assert!(matches!(
            resolve_err("MATCH (d:Device)-[r:OWNS]->(e:Device) RETURN d"),
            ResolveError::RelationshipArityMismatch { .. }
        ));
    }

    #[test]
    fn test_arity_incoming_direction() {
        // (d:Device)<-[:OWNS]-(u:User) reads Device ← User, which matches
        // OWNS: User → Device.
        resolve_ok("MATCH (d:Device)<-[r:OWNS]-(u:User) RETURN d, u");
    }

    #[test]
    fn test_arity_either_direction_accepts_reverse() {
        resolve_ok("MATCH (d:Device)-[r:OWNS]-(u:User) RETURN d, u");
    }

    #[test]
    fn test_arity_unlabeled_endpoints_pass() {
        resolve_ok("MATCH (a)-[r:OWNS]->(b) RETURN a, b");
    }
}
