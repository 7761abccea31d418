//! Completion client: a single prompt in, generated text out.
//!
//! Wraps any [`Provider`] and validates sampling options before a request
//! leaves the process. No retries: provider failures surface as-is.

use deskpilot_core::error::ProviderError;
use deskpilot_core::message::Message;
use deskpilot_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// Sampling options for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    /// Must lie within `[0.0, 2.0]`.
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Generation stops before any of these sequences.
    pub stop: Vec<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4".into(),
            temperature: 0.7,
            max_tokens: None,
            stop: Vec::new(),
        }
    }
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            ..Self::default()
        }
    }

    pub fn with_stop(mut self, stop: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ProviderError::InvalidRequest(format!(
                "temperature {} is outside [0.0, 2.0]",
                self.temperature
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("model must not be empty".into()));
        }
        Ok(())
    }
}

/// Sends prompts to a provider and returns the generated text.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Complete a single user prompt.
    pub async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.complete_messages(vec![Message::user(prompt)], options)
            .await
    }

    /// Complete an explicit message list (system instruction plus turns).
    pub async fn complete_messages(
        &self,
        messages: Vec<Message>,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        options.validate()?;

        let request = ProviderRequest {
            model: options.model.clone(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stop: options.stop.clone(),
        };

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion finished"
            );
        }
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SequentialMockProvider;

    #[tokio::test]
    async fn returns_generated_text() {
        let provider = Arc::new(SequentialMockProvider::texts(["The answer is 42."]));
        let client = CompletionClient::new(provider.clone());

        let text = client
            .complete("What is the answer?", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "The answer is 42.");
        assert_eq!(provider.call_count(), 1);

        let sent = provider.requests();
        assert_eq!(sent[0].model, "gpt-4");
        assert_eq!(sent[0].messages[0].content, "What is the answer?");
    }

    #[tokio::test]
    async fn out_of_range_temperature_rejected_before_call() {
        let provider = Arc::new(SequentialMockProvider::texts(Vec::<String>::new()));
        let client = CompletionClient::new(provider.clone());

        for temperature in [-0.1, 2.1, f32::NAN] {
            let err = client
                .complete("hi", &CompletionOptions::new("gpt-4", temperature))
                .await
                .unwrap_err();
            assert!(matches!(err, ProviderError::InvalidRequest(_)));
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn boundary_temperatures_accepted() {
        let provider = Arc::new(SequentialMockProvider::texts(["a", "b"]));
        let client = CompletionClient::new(provider);
        assert!(client.complete("x", &CompletionOptions::new("gpt-4", 0.0)).await.is_ok());
        assert!(client.complete("x", &CompletionOptions::new("gpt-4", 2.0)).await.is_ok());
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(
            ProviderError::Timeout("slow".into()),
        )]));
        let client = CompletionClient::new(provider);
        let err = client.complete("x", &CompletionOptions::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[test]
    fn stop_sequences_builder() {
        let options = CompletionOptions::new("gpt-4", 0.0).with_stop(["\nObservation:"]);
        assert_eq!(options.stop, vec!["\nObservation:".to_string()]);
    }
}
