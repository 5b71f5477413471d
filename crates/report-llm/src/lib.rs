//! Narrative-generation provider abstraction
//!
//! This crate wraps the LLM service used for analysis generation:
//!
//! - [`LlmProvider`]: trait over chat-completion backends
//! - [`providers::OpenAiProvider`]: OpenAI-compatible HTTP implementation
//! - [`AnalysisEngine`]: prompt + JSON-context composition with an
//!   optional JSON output mode, the shape every report task consumes
//! - [`AgentTeam`]: sequential multi-agent runner for the config-driven
//!   agent endpoints

pub mod completion;
pub mod engine;
pub mod error;
pub mod provider;
pub mod providers;
pub mod team;

pub use completion::CompletionRequest;
pub use engine::{AnalysisEngine, AnalysisRequest};
pub use error::{LlmError, Result};
pub use provider::LlmProvider;
pub use providers::{OpenAiConfig, OpenAiProvider};
pub use team::{AgentSpec, AgentTeam};
