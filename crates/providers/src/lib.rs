//! LLM provider implementations for DeskPilot.
//!
//! All providers implement the `deskpilot_core::Provider` trait.
//! [`CompletionClient`] is the prompt-in, text-out facade the request
//! handlers and the agent loop use.

pub mod completion;
pub mod openai_compat;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use completion::{CompletionClient, CompletionOptions};
pub use openai_compat::OpenAiCompatProvider;

use deskpilot_config::AppConfig;
use deskpilot_core::error::ProviderError;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<OpenAiCompatProvider>, ProviderError> {
    let api_key = config
        .openai
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY is not set".into()))?;

    let provider = OpenAiCompatProvider::with_timeout(
        "openai",
        config.openai.base_url.clone(),
        api_key,
        Duration::from_secs(config.openai.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}
