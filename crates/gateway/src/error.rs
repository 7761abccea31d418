//! Handler errors and their HTTP rendering.
//!
//! Validation failures answer 400 with their message. Everything else
//! answers 500 with a generic message; the cause is logged, never sent.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use deskpilot_agent::AgentError;
use deskpilot_core::error::{ProviderError, PromptError, RetrievalError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message safe to return to a client.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::Validation(message) => message,
            _ => INTERNAL_ERROR,
        }
    }

    fn log(&self) {
        if !matches!(self, ApiError::Validation(_)) {
            error!(error = %self, "Request failed");
        }
    }
}

/// `{ "error": ... }`
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = json!({ "error": self.public_message() });
        (self.status(), Json(body)).into_response()
    }
}

/// An [`ApiError`] rendered as `{ "success": false, "error": ... }`.
#[derive(Debug)]
pub struct TicketApiError(pub ApiError);

impl From<ApiError> for TicketApiError {
    fn from(err: ApiError) -> Self {
        TicketApiError(err)
    }
}

impl From<AgentError> for TicketApiError {
    fn from(err: AgentError) -> Self {
        TicketApiError(ApiError::Agent(err))
    }
}

impl IntoResponse for TicketApiError {
    fn into_response(self) -> Response {
        self.0.log();
        let body = json!({ "success": false, "error": self.0.public_message() });
        (self.0.status(), Json(body)).into_response()
    }
}
