//! Record store client for DeskPilot's ticket flows.
//!
//! Talks to a PocketBase-compatible REST API with an admin session that is
//! acquired lazily, held in memory, and refreshed at most once per call
//! when the store rejects it.

pub mod client;
pub mod records;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{Collections, Credentials, PocketBaseClient};
pub use session::{Session, SessionManager};

use deskpilot_config::AppConfig;
use deskpilot_core::error::StoreError;
use std::time::Duration;

/// Build the configured store client. Does not contact the store.
pub fn build_from_config(config: &AppConfig) -> Result<PocketBaseClient, StoreError> {
    let store = &config.store;
    let credentials = match (&store.admin_email, &store.admin_password) {
        (Some(email), Some(password)) => Some(Credentials {
            email: email.clone(),
            password: password.clone(),
        }),
        _ => None,
    };

    Ok(PocketBaseClient::new(
        store.url.clone(),
        credentials,
        Duration::from_secs(config.openai.timeout_secs),
    )?
    .with_collections(Collections {
        tickets: store.tickets_collection.clone(),
        messages: store.messages_collection.clone(),
        assignee_field: store.assignee_field.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use deskpilot_core::ticket::{ListOptions, RecordStore};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub store: issues `token-N` on the Nth login and accepts only
    /// tokens listed in `valid`.
    #[derive(Clone)]
    struct Stub {
        auth_calls: Arc<AtomicUsize>,
        record_calls: Arc<AtomicUsize>,
        valid: Arc<Vec<&'static str>>,
    }

    impl Stub {
        fn new(valid: Vec<&'static str>) -> Self {
            Self {
                auth_calls: Arc::new(AtomicUsize::new(0)),
                record_calls: Arc::new(AtomicUsize::new(0)),
                valid: Arc::new(valid),
            }
        }

        fn authorized(&self, headers: &HeaderMap) -> bool {
            self.record_calls.fetch_add(1, Ordering::SeqCst);
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|t| self.valid.iter().any(|v| *v == t))
        }
    }

    async fn auth(State(stub): State<Stub>, Json(body): Json<serde_json::Value>) -> Response {
        if body["password"] != "hunter2" {
            return (StatusCode::BAD_REQUEST, "Failed to authenticate.").into_response();
        }
        let n = stub.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Json(serde_json::json!({"token": format!("token-{n}"), "admin": {"id": "a1"}})).into_response()
    }

    async fn ticket(
        State(stub): State<Stub>,
        Path(id): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        if !stub.authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if id != "c3oi15w89jl52t3" {
            return (StatusCode::NOT_FOUND, r#"{"message":"not found"}"#).into_response();
        }
        let mut record = serde_json::json!({
            "id": id,
            "status": "open",
            "title": "Login issue",
            "created": "2024-01-05 09:00:00.000Z",
            "assignee": "u1"
        });
        if params.get("expand").map(String::as_str) == Some("assignee") {
            record["expand"] = serde_json::json!({"assignee": {"id": "u1", "name": "Dana"}});
        }
        Json(record).into_response()
    }

    async fn messages(
        State(stub): State<Stub>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        if !stub.authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        assert_eq!(params["filter"], "(ticket='c3oi15w89jl52t3')");
        assert_eq!(params["sort"], "created");
        assert_eq!(params["perPage"], "50");
        Json(serde_json::json!({
            "page": 1, "perPage": 50, "totalItems": 2, "totalPages": 1,
            "items": [
                {"id": "m1", "ticket": "c3oi15w89jl52t3", "content": "I cannot log in", "created": "2024-01-05 10:00:00.000Z"},
                {"id": "m2", "ticket": "c3oi15w89jl52t3", "content": "Resetting your password now", "created": "2024-01-05 10:05:00.000Z"}
            ]
        }))
        .into_response()
    }

    async fn spawn(stub: Stub) -> String {
        let router = Router::new()
            .route("/api/admins/auth-with-password", post(auth))
            .route("/api/collections/tickets/records/{id}", get(ticket))
            .route("/api/collections/messages/records", get(messages))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(url: String, password: &str) -> PocketBaseClient {
        PocketBaseClient::new(
            url,
            Some(Credentials {
                email: "admin@example.com".into(),
                password: password.into(),
            }),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lazy_login_then_fetch_ticket() {
        let stub = Stub::new(vec!["token-1"]);
        let client = client(spawn(stub.clone()).await, "hunter2");
        assert_eq!(stub.auth_calls.load(Ordering::SeqCst), 0);

        let ticket = client.get_ticket("c3oi15w89jl52t3").await.unwrap();
        assert_eq!(ticket.status, "open");
        assert_eq!(ticket.title, "Login issue");
        assert_eq!(ticket.assignee.unwrap().name, "Dana");

        client.get_ticket("c3oi15w89jl52t3").await.unwrap();
        assert_eq!(stub.auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_ticket_is_not_found() {
        let stub = Stub::new(vec!["token-1"]);
        let client = client(spawn(stub.clone()).await, "hunter2");
        match client.get_ticket("doesnotexist").await {
            Err(StoreError::NotFound { collection, id }) => {
                assert_eq!(collection, "tickets");
                assert_eq!(id, "doesnotexist");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(stub.record_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_session_reauthenticates_once() {
        // token-1 is rejected, token-2 accepted.
        let stub = Stub::new(vec!["token-2"]);
        let client = client(spawn(stub.clone()).await, "hunter2");

        let ticket = client.get_ticket("c3oi15w89jl52t3").await.unwrap();
        assert_eq!(ticket.id, "c3oi15w89jl52t3");
        assert_eq!(stub.auth_calls.load(Ordering::SeqCst), 2);
        assert_eq!(stub.record_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_rejection_propagates() {
        let stub = Stub::new(vec![]);
        let client = client(spawn(stub.clone()).await, "hunter2");

        let result = client.get_ticket("c3oi15w89jl52t3").await;
        assert!(matches!(result, Err(StoreError::Unauthorized(_))));
        assert_eq!(stub.auth_calls.load(Ordering::SeqCst), 2);
        assert_eq!(stub.record_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let stub = Stub::new(vec!["token-1"]);
        let client = client(spawn(stub.clone()).await, "wrong");
        assert!(matches!(
            client.authenticate().await,
            Err(StoreError::Unauthorized(_))
        ));
        assert_eq!(stub.record_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn eager_authentication_is_reused() {
        let stub = Stub::new(vec!["token-1"]);
        let client = client(spawn(stub.clone()).await, "hunter2");

        let session = client.authenticate().await.unwrap();
        assert_eq!(session.generation, 1);
        client
            .list_messages("c3oi15w89jl52t3", &ListOptions::default())
            .await
            .unwrap();
        assert_eq!(stub.auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn messages_listed_in_order() {
        let stub = Stub::new(vec!["token-1"]);
        let client = client(spawn(stub).await, "hunter2");

        let messages = client
            .list_messages("c3oi15w89jl52t3", &ListOptions::default())
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "I cannot log in");
        assert!(messages[0].created < messages[1].created);
    }

    #[test]
    fn build_from_config_uses_collections() {
        let mut config = AppConfig::default();
        config.store.url = "https://pb.example.com/".into();
        config.store.admin_email = Some("admin@example.com".into());
        config.store.admin_password = Some("pw".into());
        let client = build_from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://pb.example.com");
    }
}
