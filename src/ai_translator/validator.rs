//! Semantic KQL validation.
//!
//! Checks emitted (or AI-produced) KQL without executing it: balanced
//! brackets and quotes, a non-empty body, a recognized table source, and
//! known pipeline operators. In strict mode unknown operators and tables
//! are errors; otherwise they are warnings.

use std::sync::atomic::{AtomicU64, Ordering};

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Pseudo graph sources accepted alongside catalog tables.
const PSEUDO_TABLES: [&str; 3] = ["graph.nodes", "graph.edges", "graph.paths"];

const KNOWN_OPERATORS: [&str; 18] = [
    "where",
    "project",
    "distinct",
    "sort",
    "order",
    "limit",
    "take",
    "top",
    "offset",
    "summarize",
    "extend",
    "join",
    "union",
    "count",
    "make-graph",
    "graph-match",
    "graph-shortest-paths",
    "all_paths",
];

lazy_static! {
    static ref SOURCE_RE: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").unwrap_or_else(|e| panic!("source regex: {}", e));
    static ref OPERATOR_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*")
        .unwrap_or_else(|e| panic!("operator regex: {}", e));
}

pub struct SemanticValidator {
    strict_mode: bool,
    known_tables: Vec<String>,
    validation_count: AtomicU64,
    error_count: AtomicU64,
}

impl SemanticValidator {
    pub fn new(strict_mode: bool, known_tables: Vec<String>) -> Self {
        SemanticValidator {
            strict_mode,
            known_tables,
            validation_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        }
    }

    pub fn validate(&self, kql: &str) -> ValidationResult {
        self.validation_count.fetch_add(1, Ordering::Relaxed);

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let trimmed = kql.trim();
        if trimmed.is_empty() {
            errors.push("query body is empty".to_string());
            return self.finish(errors, warnings);
        }

        self.check_balance(trimmed, &mut errors);
        self.check_source(trimmed, &mut errors, &mut warnings);
        self.check_operators(trimmed, &mut errors, &mut warnings);

        self.finish(errors, warnings)
    }

    fn finish(&self, errors: Vec<String>, warnings: Vec<String>) -> ValidationResult {
        if !errors.is_empty() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn check_balance(&self, kql: &str, errors: &mut Vec<String>) {
        let mut parens = 0i64;
        let mut brackets = 0i64;
        let mut in_string = false;
        let mut escaped = false;

        for ch in kql.chars() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '\'' {
                    in_string = false;
                }
                continue;
            }
            match ch {
                '\'' => in_string = true,
                '(' => parens += 1,
                ')' => parens -= 1,
                '[' => brackets += 1,
                ']' => brackets -= 1,
                _ => {}
            }
            if parens < 0 || brackets < 0 {
                break;
            }
        }

        if parens != 0 {
            errors.push("unbalanced parentheses".to_string());
        }
        if brackets != 0 {
            errors.push("unbalanced square brackets".to_string());
        }
        if in_string {
            errors.push("unbalanced string quotes".to_string());
        }
    }

    fn check_source(&self, kql: &str, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
        let source = kql.split('|').next().unwrap_or("").trim();

        // Path operators may open the pipeline directly.
        if source.starts_with("graph-shortest-paths")
            || source.starts_with("all_paths")
            || source.starts_with("all_shortest_paths")
        {
            return;
        }

        if source.is_empty() || !SOURCE_RE.is_match(source) {
            errors.push(format!("missing or invalid table source: '{}'", source));
            return;
        }

        let known = PSEUDO_TABLES.contains(&source)
            || self.known_tables.iter().any(|table| table == source);
        if !known {
            let message = format!("unknown table source '{}'", source);
            if self.strict_mode {
                errors.push(message);
            } else {
                warnings.push(message);
            }
        }
    }

    fn check_operators(&self, kql: &str, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
        for segment in kql.split('|').skip(1) {
            let segment = segment.trim();
            let Some(word) = OPERATOR_RE.find(segment) else {
                continue;
            };
            let operator = word.as_str();
            if operator == "all_shortest_paths" || KNOWN_OPERATORS.contains(&operator) {
                continue;
            }
            let message = format!("unknown operator '{}'", operator);
            if self.strict_mode {
                errors.push(message);
            } else {
                warnings.push(message);
            }
        }
    }

    pub fn validation_count(&self) -> u64 {
        self.validation_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }
}
