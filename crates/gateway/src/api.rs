//! Request handlers for the Q&A and ticket assistant endpoints.
//!
//! - `POST /query`: answer a question from the knowledge base
//! - `POST /summary`: summarize a ticket with the summary agent
//! - `POST /letter`: write a customer status letter with the letter agent
//!
//! Every handler validates its body before touching the network.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use deskpilot_agent::ReactAgent;
use deskpilot_core::prompt::PromptTemplate;
use deskpilot_core::retrieval::{Document, Retriever};
use deskpilot_providers::{CompletionClient, CompletionOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, TicketApiError};

// ── State ─────────────────────────────────────────────────────────────────

/// Collaborators of the Q&A service.
pub struct QueryState {
    pub retriever: Arc<dyn Retriever>,
    pub client: CompletionClient,
    pub options: CompletionOptions,
    /// Binds `{query}` and `{context}`.
    pub template: PromptTemplate,
}

/// The two ticket agents. Each owns its own tool registry.
pub struct TicketState {
    pub summary: ReactAgent,
    pub letter: ReactAgent,
}

// ── Q&A ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub prompt: Option<serde_json::Value>,
}

impl QueryRequest {
    /// The prompt as text. Strings are taken as-is and other truthy JSON
    /// values are serialized. Blank strings, `null`, `false` and zero yield
    /// `None`.
    pub fn prompt_text(&self) -> Option<String> {
        use serde_json::Value;

        match self.prompt.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }
}

/// One retrieved document as the client sees it.
#[derive(Debug, Serialize)]
pub struct SourceDocument {
    pub source: serde_json::Map<String, serde_json::Value>,
    pub content: String,
}

impl From<Document> for SourceDocument {
    fn from(doc: Document) -> Self {
        Self {
            source: doc.metadata,
            content: doc.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub context: Vec<SourceDocument>,
    pub response: String,
}

pub async fn query_handler(
    State(state): State<Arc<QueryState>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let prompt = body
        .ok()
        .and_then(|Json(req)| req.prompt_text())
        .ok_or(ApiError::Validation("Prompt is required"))?;

    let docs = state.retriever.search(&prompt, None).await?;
    debug!(documents = docs.len(), "Retrieved context");

    let context = serde_json::to_string(&docs)?;
    let rendered = state
        .template
        .render_pairs(&[("query", prompt.as_str()), ("context", context.as_str())])?;
    let response = state.client.complete(&rendered, &state.options).await?;

    Ok(Json(QueryResponse {
        context: docs.into_iter().map(SourceDocument::from).collect(),
        response,
    }))
}

// ── Tickets ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    #[serde(default)]
    pub ticket_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketOutput {
    /// The task text the agent was given.
    pub input: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub success: bool,
    pub data: TicketOutput,
}

pub async fn summary_handler(
    State(state): State<Arc<TicketState>>,
    body: Result<Json<TicketRequest>, JsonRejection>,
) -> Result<Json<TicketResponse>, TicketApiError> {
    run_flow(&state.summary, body).await
}

pub async fn letter_handler(
    State(state): State<Arc<TicketState>>,
    body: Result<Json<TicketRequest>, JsonRejection>,
) -> Result<Json<TicketResponse>, TicketApiError> {
    run_flow(&state.letter, body).await
}

async fn run_flow(
    agent: &ReactAgent,
    body: Result<Json<TicketRequest>, JsonRejection>,
) -> Result<Json<TicketResponse>, TicketApiError> {
    let ticket_id = body
        .ok()
        .and_then(|Json(req)| req.ticket_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::Validation("ticket_id is required"))?;

    let run = agent.run_ticket(&ticket_id).await?;
    info!(
        flow = %agent.flow().name,
        ticket_id = %ticket_id,
        tool_calls = run.tool_calls,
        capped = run.capped,
        "Ticket flow finished"
    );

    Ok(Json(TicketResponse {
        success: true,
        data: TicketOutput {
            input: run.input,
            output: run.output,
        },
    }))
}
