//! Minimal, backend-agnostic property type system used in schema
//! configuration files.
//!
//! The types map onto Kusto scalar types (`long`, `real`, `string`,
//! `bool`, `datetime`, `guid`) but are written in configuration with
//! friendly lowercase names and common aliases.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// Whole numbers (Kusto: int/long)
    Integer,

    /// Decimal numbers (Kusto: real/decimal)
    Float,

    /// Text (Kusto: string)
    String,

    /// True/False (Kusto: bool)
    Boolean,

    /// Timestamps (Kusto: datetime)
    DateTime,

    /// GUIDs (Kusto: guid)
    Guid,
}

impl PropertyType {
    /// Parse a type string from YAML configuration.
    ///
    /// Case-insensitive and accepts common aliases:
    /// `int`/`long` for integer, `double`/`real` for float, `text` for
    /// string, `bool` for boolean, `timestamp` for datetime, `uuid` for
    /// guid.
    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        match s.to_lowercase().trim() {
            "integer" | "int" | "long" => Ok(PropertyType::Integer),
            "float" | "double" | "real" | "decimal" => Ok(PropertyType::Float),
            "string" | "text" => Ok(PropertyType::String),
            "boolean" | "bool" => Ok(PropertyType::Boolean),
            "datetime" | "timestamp" => Ok(PropertyType::DateTime),
            "guid" | "uuid" => Ok(PropertyType::Guid),
            other => Err(CatalogError::UnknownType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Integer => "integer",
            PropertyType::Float => "float",
            PropertyType::String => "string",
            PropertyType::Boolean => "boolean",
            PropertyType::DateTime => "datetime",
            PropertyType::Guid => "guid",
        }
    }

    /// The Kusto scalar type this maps to.
    pub fn kusto_type(&self) -> &'static str {
        match self {
            PropertyType::Integer => "long",
            PropertyType::Float => "real",
            PropertyType::String => "string",
            PropertyType::Boolean => "bool",
            PropertyType::DateTime => "datetime",
            PropertyType::Guid => "guid",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
