//! LLM provider trait definition

use crate::{CompletionRequest, Result};
use async_trait::async_trait;

/// Trait for chat-completion backends
///
/// Implementations provide access to a narrative-generation service.
/// The report pipeline only needs single-prompt completions with an
/// optional JSON output mode, so the surface is deliberately small.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion and return its text content
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;
}
