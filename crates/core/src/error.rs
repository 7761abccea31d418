//! Error types for the DeskPilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all DeskPilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Record store errors ---
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Prompt rendering ---
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Map a transport failure from `reqwest` into a provider error.
    pub fn from_transport(err: impl std::fmt::Display, is_timeout: bool) -> Self {
        if is_timeout {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Search query must not be empty")]
    EmptyQuery,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Index query failed: {message} (status: {status_code})")]
    IndexError { status_code: u16, message: String },

    #[error("Index authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed index response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Not authorized by record store: {0}")]
    Unauthorized(String),

    #[error("Record store request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl StoreError {
    /// Whether this failure should trigger a re-authentication.
    pub fn is_auth(&self) -> bool {
        matches!(self, StoreError::Unauthorized(_))
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Unresolved placeholder '{{{0}}}' in prompt template")]
    Unresolved(String),

    #[error("Unterminated placeholder starting at byte {0}")]
    Unterminated(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn store_error_auth_classification() {
        assert!(StoreError::Unauthorized("expired".into()).is_auth());
        assert!(!StoreError::NotFound {
            collection: "tickets".into(),
            id: "abc".into(),
        }
        .is_auth());
        assert!(!StoreError::Network("reset".into()).is_auth());
    }

    #[test]
    fn tool_error_wraps_store_error_transparently() {
        let err = ToolError::from(StoreError::NotFound {
            collection: "tickets".into(),
            id: "c3oi15w89jl52t3".into(),
        });
        assert_eq!(err.to_string(), "Record not found: tickets/c3oi15w89jl52t3");
    }

    #[test]
    fn prompt_error_names_placeholder() {
        let err = PromptError::Unresolved("context".into());
        assert_eq!(
            err.to_string(),
            "Unresolved placeholder '{context}' in prompt template"
        );
    }
}
