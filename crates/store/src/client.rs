//! PocketBase-compatible record store client.

use crate::records::{ListResponse, MessageRecord, TicketRecord};
use crate::session::{Session, SessionManager};
use async_trait::async_trait;
use deskpilot_core::error::StoreError;
use deskpilot_core::ticket::{ListOptions, RecordStore, Ticket, TicketMessage};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

const ADMIN_AUTH_PATH: &str = "/api/admins/auth-with-password";

/// Collection and field names the client reads from.
#[derive(Debug, Clone)]
pub struct Collections {
    pub tickets: String,
    pub messages: String,
    /// Relation field on tickets that points at the assigned user.
    pub assignee_field: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            tickets: "tickets".into(),
            messages: "messages".into(),
            assignee_field: "assignee".into(),
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

pub struct PocketBaseClient {
    base_url: String,
    credentials: Option<Credentials>,
    collections: Collections,
    sessions: SessionManager,
    client: reqwest::Client,
}

impl PocketBaseClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            collections: Collections::default(),
            sessions: SessionManager::new(),
            client,
        })
    }

    pub fn with_collections(mut self, collections: Collections) -> Self {
        self.collections = collections;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in with the admin credentials and replace the held session.
    pub async fn authenticate(&self) -> Result<Session, StoreError> {
        let session = self.sessions.replace(|| self.login()).await?;
        info!(url = %self.base_url, "Authenticated with record store");
        Ok(session)
    }

    /// Run `op` with a valid session.
    ///
    /// An auth-class failure triggers exactly one re-authentication and one
    /// retry; a second auth failure is returned to the caller. Other errors
    /// are never retried.
    pub async fn with_session<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let session = self.sessions.current(|| self.login()).await?;

        match op(session.clone()).await {
            Err(e) if e.is_auth() => {
                warn!(generation = session.generation, "Store session rejected, re-authenticating");
                let fresh = self.sessions.refresh(&session, || self.login()).await?;
                op(fresh).await
            }
            other => other,
        }
    }

    async fn login(&self) -> Result<String, StoreError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            StoreError::Unauthorized("record store admin credentials are not configured".into())
        })?;

        let response = self
            .client
            .post(format!("{}{ADMIN_AUTH_PATH}", self.base_url))
            .json(&serde_json::json!({
                "identity": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        // Wrong credentials come back as 400 from the auth endpoint.
        if matches!(status, 400 | 401 | 403) {
            return Err(StoreError::Unauthorized(format!(
                "admin authentication rejected (status {status})"
            )));
        }
        let response = check_status(response, "auth", "admin").await?;

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedRecord(format!("auth response: {e}")))?;
        Ok(auth.token)
    }

    async fn fetch_ticket(&self, session: Session, id: &str) -> Result<Ticket, StoreError> {
        let url = format!(
            "{}/api/collections/{}/records/{id}",
            self.base_url, self.collections.tickets
        );
        debug!(id, "Fetching ticket");

        let response = self
            .client
            .get(&url)
            .header("Authorization", session.token())
            .query(&[("expand", self.collections.assignee_field.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = check_status(response, &self.collections.tickets, id).await?;
        let record: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedRecord(e.to_string()))?;

        TicketRecord::from_value(record, &self.collections.assignee_field)?.into_ticket()
    }

    async fn fetch_messages(
        &self,
        session: Session,
        ticket_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<TicketMessage>, StoreError> {
        let url = format!(
            "{}/api/collections/{}/records",
            self.base_url, self.collections.messages
        );
        let filter = format!("(ticket='{}')", escape_filter_value(ticket_id));
        let page = options.page.to_string();
        let per_page = options.page_size.to_string();
        debug!(ticket_id, page = options.page, "Listing messages");

        let response = self
            .client
            .get(&url)
            .header("Authorization", session.token())
            .query(&[
                ("filter", filter.as_str()),
                ("page", page.as_str()),
                ("perPage", per_page.as_str()),
                ("sort", options.sort.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = check_status(response, &self.collections.messages, ticket_id).await?;
        let list: ListResponse<MessageRecord> = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedRecord(e.to_string()))?;

        list.items.into_iter().map(MessageRecord::into_message).collect()
    }
}

#[async_trait]
impl RecordStore for PocketBaseClient {
    async fn get_ticket(&self, id: &str) -> Result<Ticket, StoreError> {
        if !is_record_id(id) {
            return Err(StoreError::NotFound {
                collection: self.collections.tickets.clone(),
                id: id.to_string(),
            });
        }
        self.with_session(|session| self.fetch_ticket(session, id)).await
    }

    async fn list_messages(
        &self,
        ticket_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<TicketMessage>, StoreError> {
        self.with_session(|session| self.fetch_messages(session, ticket_id, options))
            .await
    }
}

async fn check_status(
    response: reqwest::Response,
    collection: &str,
    id: &str,
) -> Result<reqwest::Response, StoreError> {
    let status = response.status().as_u16();

    if status == 401 || status == 403 {
        return Err(StoreError::Unauthorized(format!("status {status}")));
    }

    if status == 404 {
        return Err(StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    if !response.status().is_success() {
        let message = response.text().await.unwrap_or_default();
        warn!(status, body = %message, "Record store returned error");
        return Err(StoreError::ApiError {
            status_code: status,
            message,
        });
    }

    Ok(response)
}

/// Record ids are short alphanumeric strings; anything else cannot exist.
fn is_record_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_validation() {
        assert!(is_record_id("c3oi15w89jl52t3"));
        assert!(!is_record_id(""));
        assert!(!is_record_id("../admins"));
        assert!(!is_record_id("a b"));
    }

    #[test]
    fn filter_values_escaped() {
        assert_eq!(escape_filter_value("abc"), "abc");
        assert_eq!(escape_filter_value("a'b"), "a\\'b");
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            email: "admin@example.com".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("admin@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn invalid_id_short_circuits() {
        let client = PocketBaseClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
        match client.get_ticket("not/an/id").await {
            Err(StoreError::NotFound { collection, .. }) => assert_eq!(collection, "tickets"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_is_unauthorized() {
        let client = PocketBaseClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.get_ticket("abc123").await,
            Err(StoreError::Unauthorized(_))
        ));
    }
}
