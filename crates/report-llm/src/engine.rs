//! Analysis engine: prompt composition over a provider
//!
//! Every report task talks to the narrative provider through this type:
//! a prompt, optional JSON context appended to it, and an optional JSON
//! output mode whose result is parsed before being handed back.

use crate::{CompletionRequest, LlmError, LlmProvider, Result};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_MAX_TOKENS: usize = 3000;

/// A single analysis call
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Instruction prompt
    pub prompt: String,
    /// Optional JSON context appended to the prompt
    pub context: Option<Value>,
    /// Per-call model override
    pub model: Option<String>,
    /// Max tokens override
    pub max_tokens: Option<usize>,
}

impl AnalysisRequest {
    /// Create a request with just a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
            model: None,
            max_tokens: None,
        }
    }

    /// Attach JSON context
    pub fn context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Override the engine's default model for this call
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override max tokens for this call
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Engine that generates analyses via an injected provider
#[derive(Clone)]
pub struct AnalysisEngine {
    provider: Arc<dyn LlmProvider>,
    default_model: String,
}

impl AnalysisEngine {
    /// Create an engine over the given provider
    pub fn new(provider: Arc<dyn LlmProvider>, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
        }
    }

    /// Generate a free-text analysis
    pub async fn generate(&self, request: AnalysisRequest) -> Result<String> {
        self.complete(request, false).await
    }

    /// Generate an analysis in JSON output mode and parse it
    pub async fn generate_json(&self, request: AnalysisRequest) -> Result<Value> {
        let raw = self.complete(request, true).await?;
        parse_json_output(&raw)
    }

    /// Convenience wrapper: prompt plus optional context, free text
    pub async fn analyze(&self, prompt: &str, context: Option<&Value>) -> Result<String> {
        let mut request = AnalysisRequest::new(prompt);
        if let Some(context) = context {
            request = request.context(context.clone());
        }
        self.generate(request).await
    }

    /// Convenience wrapper: prompt plus optional context, JSON output
    pub async fn analyze_json(&self, prompt: &str, context: Option<&Value>) -> Result<Value> {
        let mut request = AnalysisRequest::new(prompt);
        if let Some(context) = context {
            request = request.context(context.clone());
        }
        self.generate_json(request).await
    }

    async fn complete(&self, request: AnalysisRequest, json_mode: bool) -> Result<String> {
        let model = request
            .model
            .unwrap_or_else(|| self.default_model.clone());
        let prompt = prepare_prompt(&request.prompt, request.context.as_ref());

        let completion = CompletionRequest::builder(model)
            .prompt(prompt)
            .max_tokens(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS))
            .json_mode(json_mode)
            .build();

        self.provider.complete(completion).await
    }
}

/// Combine the instruction prompt with serialized JSON context
fn prepare_prompt(prompt: &str, context: Option<&Value>) -> String {
    match context {
        Some(context) => format!("{prompt}\n\nContext:\n{context}"),
        None => prompt.to_string(),
    }
}

/// Parse JSON-mode output, tolerating code-fence wrapping
fn parse_json_output(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.strip_suffix("```").unwrap_or(rest))
        .unwrap_or(trimmed);

    serde_json::from_str(inner.trim())
        .map_err(|e| LlmError::MalformedOutput(format!("{e}: {raw}")))
}
