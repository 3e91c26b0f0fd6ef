//! Schema catalog: the canonical mapping from graph vocabulary (labels,
//! relationship types, properties) to workspace tables and columns.
//!
//! The catalog is compiled once from a [`config::CatalogConfig`], validated,
//! and never mutated afterwards; lookups are O(1) hash-index hits, so it is
//! shared across worker threads without synchronization.

pub mod config;
pub mod errors;
pub mod types;

use std::collections::HashMap;

pub use config::CatalogConfig;
pub use errors::CatalogError;
pub use types::PropertyType;

/// Default table-size hint when a node mapping declares none.
const DEFAULT_BASE_ROWS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMeta {
    pub column: String,
    pub property_type: PropertyType,
}

#[derive(Debug, Clone)]
pub struct LabelMeta {
    pub label: String,
    pub table: String,
    pub id_column: String,
    pub time_column: Option<String>,
    pub base_rows: u64,
    properties: HashMap<String, PropertyMeta>,
}

impl LabelMeta {
    pub fn property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&String, &PropertyMeta)> {
        self.properties.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipStrength {
    Strong,
    Weak,
}

#[derive(Debug, Clone)]
pub struct RelationshipMeta {
    pub rel_type: String,
    pub from_label: String,
    pub to_label: String,
    pub table: String,
    pub source_column: String,
    pub target_column: String,
    pub join_template: Option<String>,
    pub strength: RelationshipStrength,
}

#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: String,
    pub column_type: PropertyType,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct TableMeta {
    pub name: String,
    columns: Vec<ColumnMeta>,
    by_name: HashMap<String, usize>,
}

impl TableMeta {
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }
}

/// Immutable, indexed schema catalog.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    labels: HashMap<String, LabelMeta>,
    relationships: HashMap<String, RelationshipMeta>,
    tables: HashMap<String, TableMeta>,
}

impl SchemaCatalog {
    /// Compile a declarative config into indexed form. Referential
    /// integrity is checked eagerly; the first violation fails the load.
    pub fn compile(config: CatalogConfig) -> Result<Self, CatalogError> {
        let mut labels = HashMap::new();
        for node in config.graph.nodes {
            let mut properties = HashMap::new();
            for (name, def) in node.properties {
                properties.insert(
                    name,
                    PropertyMeta {
                        column: def.column,
                        property_type: PropertyType::parse(&def.property_type)?,
                    },
                );
            }
            labels.insert(
                node.label.clone(),
                LabelMeta {
                    label: node.label,
                    table: node.table,
                    id_column: node.node_id,
                    time_column: node.time_column,
                    base_rows: node.base_rows.unwrap_or(DEFAULT_BASE_ROWS),
                    properties,
                },
            );
        }

        let mut relationships = HashMap::new();
        for rel in config.graph.relationships {
            let strength = match rel.strength.as_deref() {
                None | Some("strong") => RelationshipStrength::Strong,
                Some("weak") => RelationshipStrength::Weak,
                Some(other) => {
                    return Err(CatalogError::InvalidReference(format!(
                        "relationship '{}' has unknown strength '{}'",
                        rel.rel_type, other
                    )));
                }
            };
            relationships.insert(
                rel.rel_type.clone(),
                RelationshipMeta {
                    rel_type: rel.rel_type,
                    from_label: rel.from,
                    to_label: rel.to,
                    table: rel.table,
                    source_column: rel.source_column,
                    target_column: rel.target_column,
                    join_template: rel.join_template,
                    strength,
                },
            );
        }

        let mut tables = HashMap::new();
        for table in config.graph.tables {
            let mut columns = Vec::with_capacity(table.columns.len());
            let mut by_name = HashMap::new();
            for column in table.columns {
                by_name.insert(column.name.clone(), columns.len());
                columns.push(ColumnMeta {
                    name: column.name,
                    column_type: PropertyType::parse(&column.column_type)?,
                    required: column.required,
                });
            }
            tables.insert(
                table.name.clone(),
                TableMeta {
                    name: table.name,
                    columns,
                    by_name,
                },
            );
        }

        let catalog = SchemaCatalog {
            labels,
            relationships,
            tables,
        };

        let violations = catalog.validate();
        if let Some(first) = violations.into_iter().next() {
            return Err(first);
        }
        Ok(catalog)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        Self::compile(CatalogConfig::from_yaml_str(content)?)
    }

    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, CatalogError> {
        Self::compile(CatalogConfig::from_yaml_file(path)?)
    }

    /// The built-in security-graph schema.
    pub fn builtin_default() -> Self {
        Self::from_yaml_str(config::DEFAULT_SCHEMA_YAML)
            .unwrap_or_else(|e| panic!("built-in schema is invalid: {}", e))
    }

    pub fn label(&self, label: &str) -> Option<&LabelMeta> {
        self.labels.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &LabelMeta> {
        self.labels.values()
    }

    /// Backing table of a label.
    pub fn table_of(&self, label: &str) -> Result<&str, CatalogError> {
        self.labels
            .get(label)
            .map(|meta| meta.table.as_str())
            .ok_or_else(|| CatalogError::UnknownLabel(label.to_string()))
    }

    /// Backing column and type of a property.
    pub fn column_of(&self, label: &str, property: &str) -> Result<&PropertyMeta, CatalogError> {
        let meta = self
            .labels
            .get(label)
            .ok_or_else(|| CatalogError::UnknownLabel(label.to_string()))?;
        meta.property(property)
            .ok_or_else(|| CatalogError::UnknownProperty {
                label: label.to_string(),
                property: property.to_string(),
            })
    }

    pub fn relationship(&self, rel_type: &str) -> Result<&RelationshipMeta, CatalogError> {
        self.relationships
            .get(rel_type)
            .ok_or_else(|| CatalogError::UnknownRelationship(rel_type.to_string()))
    }

    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipMeta> {
        self.relationships.values()
    }

    pub fn table(&self, name: &str) -> Option<&TableMeta> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableMeta> {
        self.tables.values()
    }

    /// Tables backing a (from, to) label pair, if any relationship
    /// connects them in that direction.
    pub fn path_tables(&self, from: &str, to: &str) -> Result<(&str, &str), CatalogError> {
        let connected = self
            .relationships
            .values()
            .any(|rel| rel.from_label == from && rel.to_label == to);
        if !connected {
            return Err(CatalogError::NoPath {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let from_table = self.table_of(from)?;
        let to_table = self.table_of(to)?;
        Ok((from_table, to_table))
    }

    /// Cross-check referential integrity. Returns all violations rather
    /// than stopping at the first so a schema author sees the full list.
    pub fn validate(&self) -> Vec<CatalogError> {
        let mut errors = Vec::new();

        for rel in self.relationships.values() {
            if !self.labels.contains_key(&rel.from_label) {
                errors.push(CatalogError::InvalidReference(format!(
                    "relationship '{}' references unknown from-label '{}'",
                    rel.rel_type, rel.from_label
                )));
            }
            if !self.labels.contains_key(&rel.to_label) {
                errors.push(CatalogError::InvalidReference(format!(
                    "relationship '{}' references unknown to-label '{}'",
                    rel.rel_type, rel.to_label
                )));
            }
            if let Some(table) = self.tables.get(&rel.table) {
                for column in [&rel.source_column, &rel.target_column] {
                    if table.column(column).is_none() {
                        errors.push(CatalogError::InvalidReference(format!(
                            "relationship '{}' references unknown column '{}' in table '{}'",
                            rel.rel_type, column, rel.table
                        )));
                    }
                }
            }
        }

        for label in self.labels.values() {
            let Some(table) = self.tables.get(&label.table) else {
                // Tables section is optional; skip column checks when the
                // table is not declared.
                continue;
            };
            if table.column(&label.id_column).is_none() {
                errors.push(CatalogError::InvalidReference(format!(
                    "label '{}' id column '{}' missing from table '{}'",
                    label.label, label.id_column, label.table
                )));
            }
            if let Some(time_column) = &label.time_column {
                if table.column(time_column).is_none() {
                    errors.push(CatalogError::InvalidReference(format!(
                        "label '{}' time column '{}' missing from table '{}'",
                        label.label, time_column, label.table
                    )));
                }
            }
            for (name, prop) in label.properties() {
                if table.column(&prop.column).is_none() {
                    errors.push(CatalogError::InvalidReference(format!(
                        "property '{}' of label '{}' maps to unknown column '{}' in table '{}'",
                        name, label.label, prop.column, label.table
                    )));
                }
            }
        }

        errors
    }
}
