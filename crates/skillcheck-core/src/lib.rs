//! skillcheck-core — batched test generation, rubric evaluation, and scoring.
//!
//! This crate defines the data model, the provider trait, and the
//! generation and evaluation pipeline the rest of skillcheck builds on.

pub mod aggregate;
pub mod client;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod prompt;
pub mod sanitize;
pub mod skills;
pub mod traits;
pub mod validate;

pub use error::AssessmentError;
