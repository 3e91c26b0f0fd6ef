//! Cypher → KQL function name mapping.

use std::collections::HashMap;

use lazy_static::lazy_static;

lazy_static! {
    /// Scalar function translations applied in filter context.
    static ref SCALAR_FUNCTIONS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("size", "array_length");
        m.insert("length", "array_length");
        m.insert("count", "array_length");
        m.insert("upper", "toupper");
        m.insert("lower", "tolower");
        m.insert("tostring", "tostring");
        m.insert("toint", "toint");
        m.insert("trim", "trim");
        m
    };

    /// Aggregations allowed in projection context, kept under their own
    /// KQL names.
    static ref AGGREGATE_FUNCTIONS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("count", "count");
        m.insert("sum", "sum");
        m.insert("avg", "avg");
        m.insert("min", "min");
        m.insert("max", "max");
        m
    };
}

/// KQL name of a Cypher function in `where` context.
pub fn scalar_function(name: &str) -> Option<&'static str> {
    SCALAR_FUNCTIONS.get(name.to_lowercase().as_str()).copied()
}

/// KQL name of a Cypher aggregation in `project` context.
pub fn aggregate_function(name: &str) -> Option<&'static str> {
    AGGREGATE_FUNCTIONS.get(name.to_lowercase().as_str()).copied()
}

pub fn is_aggregate(name: &str) -> bool {
    AGGREGATE_FUNCTIONS.contains_key(name.to_lowercase().as_str())
}
