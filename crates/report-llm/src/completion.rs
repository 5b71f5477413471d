//! Completion request type

/// A single-prompt completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// User prompt (context already folded in by the engine)
    pub prompt: String,

    /// Max tokens in the response
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Request a JSON object response from the provider
    pub json_mode: bool,
}

impl CompletionRequest {
    /// Create a request builder for the given model
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder {
            model: model.into(),
            prompt: String::new(),
            max_tokens: 3000,
            temperature: None,
            json_mode: false,
        }
    }
}

/// Builder for [`CompletionRequest`]
#[derive(Debug)]
pub struct CompletionRequestBuilder {
    model: String,
    prompt: String,
    max_tokens: usize,
    temperature: Option<f32>,
    json_mode: bool,
}

impl CompletionRequestBuilder {
    /// Set the prompt
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Request a JSON object response
    pub fn json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Build the request
    pub fn build(self) -> CompletionRequest {
        CompletionRequest {
            model: self.model,
            prompt: self.prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            json_mode: self.json_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = CompletionRequest::builder("gpt-4o")
            .prompt("Summarize the report")
            .build();

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.max_tokens, 3000);
        assert!(!request.json_mode);
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let request = CompletionRequest::builder("gpt-4.1")
            .prompt("Classify the company")
            .max_tokens(512)
            .temperature(0.2)
            .json_mode(true)
            .build();

        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.json_mode);
    }
}
