//! Shared context handed to the plan builder and optimizer rules.

use std::collections::HashMap;
use std::sync::Arc;

use crate::resolver::{BindingKind, ResolvedQuery};
use crate::schema_catalog::SchemaCatalog;

pub struct PlanCtx {
    pub catalog: Arc<SchemaCatalog>,
    /// Node variable → label, for catalog-backed variables.
    var_labels: HashMap<String, String>,
}

impl PlanCtx {
    pub fn new(catalog: Arc<SchemaCatalog>, resolved: &ResolvedQuery) -> Self {
        let mut var_labels = HashMap::new();
        for binding in resolved.bindings() {
            if binding.kind == BindingKind::Node {
                if let Some(label) = &binding.label {
                    var_labels.insert(binding.name.clone(), label.clone());
                }
            }
        }
        PlanCtx {
            catalog,
            var_labels,
        }
    }

    pub fn label_of(&self, variable: &str) -> Option<&str> {
        self.var_labels.get(variable).map(String::as_str)
    }

    /// The designated timestamp column of the variable's label, if the
    /// schema declares one.
    pub fn time_column_of(&self, variable: &str) -> Option<&str> {
        let label = self.var_labels.get(variable)?;
        self.catalog.label(label)?.time_column.as_deref()
    }

    /// The node-id column of the variable's label.
    pub fn id_column_of(&self, variable: &str) -> Option<&str> {
        let label = self.var_labels.get(variable)?;
        Some(self.catalog.label(label)?.id_column.as_str())
    }
}
