//! Configuration loading, validation, and management for DeskPilot.
//!
//! Loads configuration from `~/.deskpilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.deskpilot/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion and embedding provider
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Vector index used by the Q&A flow
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Q&A prompt settings
    #[serde(default)]
    pub qa: QaConfig,

    /// Record store used by the ticket flows
    #[serde(default)]
    pub store: StoreConfig,

    /// Agent loop settings for the ticket flows
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// HTTP client timeout for provider calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-4".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-large".into()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Index name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// Data-plane host of the index. Resolved from the control plane when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default = "default_control_plane_url")]
    pub control_plane_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Documents returned when the caller doesn't ask for a specific count
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Metadata key holding the document text
    #[serde(default = "default_text_key")]
    pub text_key: String,
}

fn default_control_plane_url() -> String {
    "https://api.pinecone.io".into()
}
fn default_top_k() -> usize {
    4
}
fn default_text_key() -> String {
    "text".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index: None,
            host: None,
            control_plane_url: default_control_plane_url(),
            namespace: None,
            top_k: default_top_k(),
            text_key: default_text_key(),
        }
    }
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("api_key", &redact(&self.api_key))
            .field("index", &self.index)
            .field("host", &self.host)
            .field("control_plane_url", &self.control_plane_url)
            .field("namespace", &self.namespace)
            .field("top_k", &self.top_k)
            .field("text_key", &self.text_key)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    #[serde(default = "default_qa_temperature")]
    pub temperature: f32,

    /// Must reference `{query}` and `{context}`
    #[serde(default = "default_qa_template")]
    pub template: String,
}

fn default_qa_temperature() -> f32 {
    0.7
}
fn default_qa_template() -> String {
    "{query} Context: {context}".into()
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            temperature: default_qa_temperature(),
            template: default_qa_template(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    #[serde(default = "default_tickets_collection")]
    pub tickets_collection: String,

    #[serde(default = "default_messages_collection")]
    pub messages_collection: String,

    /// Relation field on tickets pointing at the assigned user
    #[serde(default = "default_assignee_field")]
    pub assignee_field: String,

    /// Authenticate at startup instead of on first use
    #[serde(default = "default_true")]
    pub eager_auth: bool,
}

fn default_store_url() -> String {
    "http://127.0.0.1:8090".into()
}
fn default_tickets_collection() -> String {
    "tickets".into()
}
fn default_messages_collection() -> String {
    "messages".into()
}
fn default_assignee_field() -> String {
    "assignee".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            admin_email: None,
            admin_password: None,
            tickets_collection: default_tickets_collection(),
            messages_collection: default_messages_collection(),
            assignee_field: default_assignee_field(),
            eager_auth: true,
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &redact(&self.admin_password))
            .field("tickets_collection", &self.tickets_collection)
            .field("messages_collection", &self.messages_collection)
            .field("assignee_field", &self.assignee_field)
            .field("eager_auth", &self.eager_auth)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool calls per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub temperature: f32,

    /// Model override for agent flows; falls back to `openai.chat_model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_max_iterations() -> u32 {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            temperature: 0.0,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Port of the Q&A service
    #[serde(default = "default_query_port")]
    pub query_port: u16,

    /// Port of the ticket assistant service
    #[serde(default = "default_tickets_port")]
    pub tickets_port: u16,

    /// Overrides both service ports (`PORT`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_query_port() -> u16 {
    3000
}
fn default_tickets_port() -> u16 {
    8080
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:5173".into(),
        "http://localhost:4200".into(),
        "https://chatgenius-prompt-server-project2.fly.dev".into(),
        "https://chatgenius-project2-final.netlify.app".into(),
    ]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            query_port: default_query_port(),
            tickets_port: default_tickets_port(),
            port: None,
            cors_origins: default_cors_origins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. Environment wins over the file.
    ///
    /// Recognized: `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `DESKPILOT_MODEL`,
    /// `PINECONE_API_KEY`, `PINECONE_INDEX`, `PINECONE_HOST`,
    /// `POCKETBASE_URL`, `POCKETBASE_ADMIN_EMAIL`, `POCKETBASE_ADMIN_PASSWORD`,
    /// `PORT`, `CORS_ORIGINS` (comma-separated).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Some(v) = get("DESKPILOT_MODEL") {
            self.openai.chat_model = v;
        }
        if let Some(v) = get("PINECONE_API_KEY") {
            self.retrieval.api_key = Some(v);
        }
        if let Some(v) = get("PINECONE_INDEX") {
            self.retrieval.index = Some(v);
        }
        if let Some(v) = get("PINECONE_HOST") {
            self.retrieval.host = Some(v);
        }
        if let Some(v) = get("POCKETBASE_URL") {
            self.store.url = v;
        }
        if let Some(v) = get("POCKETBASE_ADMIN_EMAIL") {
            self.store.admin_email = Some(v);
        }
        if let Some(v) = get("POCKETBASE_ADMIN_PASSWORD") {
            self.store.admin_password = Some(v);
        }
        if let Some(v) = get("PORT") {
            match v.trim().parse::<u16>() {
                Ok(port) => self.gateway.port = Some(port),
                Err(_) => tracing::warn!(value = %v, "Ignoring unparseable PORT"),
            }
        }
        if let Some(v) = get("CORS_ORIGINS") {
            self.gateway.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".deskpilot")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, t) in [
            ("qa.temperature", self.qa.temperature),
            ("agent.temperature", self.agent.temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        for var in ["{query}", "{context}"] {
            if !self.qa.template.contains(var) {
                return Err(ConfigError::ValidationError(format!(
                    "qa.template must reference {var}"
                )));
            }
        }

        Ok(())
    }

    /// Model used by the agent flows.
    pub fn agent_model(&self) -> &str {
        self.agent.model.as_deref().unwrap_or(&self.openai.chat_model)
    }

    /// Listen port of the Q&A service.
    pub fn query_port(&self) -> u16 {
        self.gateway.port.unwrap_or(self.gateway.query_port)
    }

    /// Listen port of the ticket assistant service.
    pub fn tickets_port(&self) -> u16 {
        self.gateway.port.unwrap_or(self.gateway.tickets_port)
    }

    pub fn has_store_credentials(&self) -> bool {
        self.store.admin_email.is_some() && self.store.admin_password.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
