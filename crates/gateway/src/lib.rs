//! HTTP services for DeskPilot.
//!
//! Two services, deployable together or apart:
//!
//! - the **Q&A service** (`POST /query`): retrieval-augmented answers over
//!   the knowledge base
//! - the **ticket assistant** (`POST /summary`, `POST /letter`): agent
//!   flows over the helpdesk record store
//!
//! Both expose `GET /health` and share the same CORS, body-limit and trace
//! layers. Built on Axum.

pub mod api;
pub mod error;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use deskpilot_agent::{AgentError, letter_agent, summary_agent};
use deskpilot_config::{AppConfig, ConfigError};
use deskpilot_core::error::{PromptError, ProviderError, RetrievalError, StoreError};
use deskpilot_core::prompt::PromptTemplate;
use deskpilot_core::provider::Provider;
use deskpilot_core::ticket::RecordStore;
use deskpilot_providers::{CompletionClient, CompletionOptions};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub use api::{QueryState, TicketState};
pub use error::{ApiError, TicketApiError};

/// Which services to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Query,
    Tickets,
    All,
}

impl Service {
    pub fn serves_query(self) -> bool {
        matches!(self, Service::Query | Service::All)
    }

    pub fn serves_tickets(self) -> bool {
        matches!(self, Service::Tickets | Service::All)
    }
}

/// Startup failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Completion provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("Vector index: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Record store: {0}")]
    Store(#[from] StoreError),

    #[error("Agent setup: {0}")]
    Agent(#[from] AgentError),

    #[error("Prompt template: {0}")]
    Prompt(#[from] PromptError),

    #[error("Server I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn query_routes(state: Arc<QueryState>) -> Router {
    Router::new()
        .route("/query", post(api::query_handler))
        .with_state(state)
}

fn ticket_routes(state: Arc<TicketState>) -> Router {
    Router::new()
        .route("/summary", post(api::summary_handler))
        .route("/letter", post(api::letter_handler))
        .with_state(state)
}

/// CORS for the configured origins. Unparseable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Add `/health` and the shared layers:
/// - CORS restricted to `cors_origins`
/// - Request body size limit (1 MB)
/// - HTTP trace logging
fn finish(routes: Router, cors_origins: &[String]) -> Router {
    routes
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Router of the Q&A service.
pub fn query_router(state: Arc<QueryState>, cors_origins: &[String]) -> Router {
    finish(query_routes(state), cors_origins)
}

/// Router of the ticket assistant service.
pub fn tickets_router(state: Arc<TicketState>, cors_origins: &[String]) -> Router {
    finish(ticket_routes(state), cors_origins)
}

/// Both services on one router, for when they share a port.
pub fn combined_router(
    query: Arc<QueryState>,
    tickets: Arc<TicketState>,
    cors_origins: &[String],
) -> Router {
    finish(
        query_routes(query).merge(ticket_routes(tickets)),
        cors_origins,
    )
}

impl QueryState {
    /// Build the retriever and completion settings from `config`.
    pub async fn from_config(
        config: &AppConfig,
        embedder: Arc<dyn Provider>,
        client: CompletionClient,
    ) -> Result<Self, GatewayError> {
        let retriever = deskpilot_retrieval::build_from_config(config, embedder).await?;

        Ok(Self {
            retriever: Arc::new(retriever),
            client,
            options: CompletionOptions::new(config.openai.chat_model.clone(), config.qa.temperature),
            template: PromptTemplate::parse(config.qa.template.clone())?,
        })
    }
}

impl TicketState {
    /// Build both agents over the configured record store.
    pub async fn from_config(config: &AppConfig, client: CompletionClient) -> Result<Self, GatewayError> {
        let store = deskpilot_store::build_from_config(config)?;

        if config.store.eager_auth && config.has_store_credentials() {
            // A failed login here is retried on first use.
            if let Err(e) = store.authenticate().await {
                warn!(error = %e, "Record store login failed at startup");
            }
        } else if !config.has_store_credentials() {
            warn!("No record store credentials configured; ticket requests will fail");
        }

        let store: Arc<dyn RecordStore> = Arc::new(store);
        let options = CompletionOptions::new(config.agent_model(), config.agent.temperature);
        let max_iterations = config.agent.max_iterations;

        Ok(Self {
            summary: summary_agent(client.clone(), options.clone(), store.clone(), max_iterations)?,
            letter: letter_agent(client, options, store, max_iterations)?,
        })
    }
}

/// Start the selected services and serve until one of them stops.
///
/// The provider is built once and shared. When both services are selected
/// and resolve to the same port they are served from one listener.
pub async fn start(config: AppConfig, service: Service) -> Result<(), GatewayError> {
    config.validate()?;

    let provider = deskpilot_providers::build_from_config(&config)?;
    let client = CompletionClient::new(provider.clone());
    let origins = config.gateway.cors_origins.clone();

    let query = if service.serves_query() {
        Some(Arc::new(QueryState::from_config(&config, provider, client.clone()).await?))
    } else {
        None
    };
    let tickets = if service.serves_tickets() {
        Some(Arc::new(TicketState::from_config(&config, client).await?))
    } else {
        None
    };

    let mut apps: Vec<(u16, &'static str, Router)> = Vec::new();
    match (query, tickets) {
        (Some(q), Some(t)) if config.query_port() == config.tickets_port() => {
            apps.push((config.query_port(), "all", combined_router(q, t, &origins)));
        }
        (q, t) => {
            if let Some(q) = q {
                apps.push((config.query_port(), "query", query_router(q, &origins)));
            }
            if let Some(t) = t {
                apps.push((config.tickets_port(), "tickets", tickets_router(t, &origins)));
            }
        }
    }

    let mut servers = tokio::task::JoinSet::new();
    for (port, name, app) in apps {
        let addr = format!("{}:{port}", config.gateway.host);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(service = name, addr = %addr, "Service listening");
        servers.spawn(async move { axum::serve(listener, app).await });
    }

    while let Some(result) = servers.join_next().await {
        result??;
    }

    Ok(())
}
