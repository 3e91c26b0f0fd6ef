//! Unit tests - fast, dependency-free checks of individual stages.

mod parser_robustness_tests;
mod pipeline_property_tests;
