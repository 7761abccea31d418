use deskpilot_core::error::{PromptError, ProviderError, ToolError};
use thiserror::Error;

/// Failures that end an agent run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model named a tool that is not registered for this flow.
    #[error("Unknown tool '{tool}' (available: {})", .available.join(", "))]
    ToolResolution { tool: String, available: Vec<String> },

    #[error("Flow '{flow}' requires tool '{tool}', which is not registered")]
    MissingTool { flow: String, tool: String },

    #[error("Completion failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Tool setup failed: {0}")]
    Tool(#[from] ToolError),
}
