//! skillcheck-providers — generative backend integrations.
//!
//! Implements the `LlmProvider` trait for Gemini and OpenAI, plus the
//! configuration loader that decides which one the pipeline talks to.

pub mod config;
pub mod error;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config_from, ProviderConfig, SkillcheckConfig};
pub use error::ProviderError;
