//! Pinecone-compatible vector index client.
//!
//! Only the data-plane `POST /query` call and the control-plane index
//! lookup are used; DeskPilot never writes vectors.

use async_trait::async_trait;
use deskpilot_core::error::RetrievalError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// One nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Nearest-neighbour lookup over stored vectors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<IndexMatch>, RetrievalError>;
}

/// HTTP client for a single Pinecone index.
pub struct PineconeIndex {
    host: String,
    api_key: String,
    namespace: Option<String>,
    client: reqwest::Client,
}

impl PineconeIndex {
    /// Connect to an index whose data-plane host is known.
    pub fn new(
        host: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            host: normalize_host(&host.into()),
            api_key: api_key.into(),
            namespace: None,
            client,
        })
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|n| !n.is_empty());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Look up the data-plane host of `index` through the control plane.
    pub async fn resolve_host(
        control_plane_url: &str,
        index: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<String, RetrievalError> {
        let url = format!("{}/indexes/{index}", control_plane_url.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Network(format!("HTTP client: {e}")))?;

        let response = client
            .get(&url)
            .header("Api-Key", api_key)
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let response = check_status(response).await?;
        let described: DescribeIndexResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;

        debug!(index, host = %described.host, "Resolved index host");
        Ok(normalize_host(&described.host))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<IndexMatch>, RetrievalError> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let response = check_status(response).await?;
        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;

        debug!(matches = parsed.matches.len(), top_k, "Index query finished");
        Ok(parsed.matches)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RetrievalError> {
    let status = response.status().as_u16();

    if status == 401 || status == 403 {
        return Err(RetrievalError::AuthenticationFailed(
            "Invalid index API key".into(),
        ));
    }

    if !response.status().is_success() {
        let message = response.text().await.unwrap_or_default();
        warn!(status, body = %message, "Vector index returned error");
        return Err(RetrievalError::IndexError {
            status_code: status,
            message,
        });
    }

    Ok(response)
}

/// Hosts reported by the control plane carry no scheme.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn host_gets_https_scheme() {
        assert_eq!(normalize_host("idx-abc.svc.pinecone.io"), "https://idx-abc.svc.pinecone.io");
        assert_eq!(normalize_host("http://127.0.0.1:9/"), "http://127.0.0.1:9");
    }

    #[test]
    fn query_request_is_camel_case() {
        let body = QueryRequest {
            vector: vec![0.5],
            top_k: 4,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["topK"], 4);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[tokio::test]
    async fn query_sends_vector_and_parses_matches() {
        let router = Router::new().route(
            "/query",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(headers["api-key"], "pc-test");
                assert_eq!(body["topK"], 2);
                assert_eq!(body["namespace"], "docs");
                Json(serde_json::json!({
                    "matches": [
                        {"id": "a", "score": 0.9, "metadata": {"text": "alpha", "source": "a.pdf"}},
                        {"id": "b", "score": 0.4}
                    ],
                    "namespace": "docs"
                }))
            }),
        );
        let host = spawn_stub(router).await;
        let index = PineconeIndex::new(host, "pc-test", Duration::from_secs(5))
            .unwrap()
            .with_namespace(Some("docs".into()));

        let matches = index.query(vec![0.1, 0.2], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[0].metadata.as_ref().unwrap()["text"], "alpha");
        assert!(matches[1].metadata.is_none());
    }

    #[tokio::test]
    async fn auth_failure_maps_to_error() {
        let router = Router::new().route("/query", post(|| async { StatusCode::UNAUTHORIZED }));
        let host = spawn_stub(router).await;
        let index = PineconeIndex::new(host, "bad", Duration::from_secs(5)).unwrap();
        assert!(matches!(
            index.query(vec![0.1], 4).await,
            Err(RetrievalError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn server_error_maps_to_index_error() {
        let router = Router::new().route(
            "/query",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let host = spawn_stub(router).await;
        let index = PineconeIndex::new(host, "k", Duration::from_secs(5)).unwrap();
        match index.query(vec![0.1], 4).await {
            Err(RetrievalError::IndexError { status_code, .. }) => assert_eq!(status_code, 503),
            other => panic!("expected IndexError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolve_host_reads_control_plane() {
        let router = Router::new().route(
            "/indexes/helpdesk",
            get(|| async { Json(serde_json::json!({"name": "helpdesk", "host": "helpdesk-xyz.svc.pinecone.io"})) }),
        );
        let control = spawn_stub(router).await;
        let host = PineconeIndex::resolve_host(&control, "helpdesk", "k", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(host, "https://helpdesk-xyz.svc.pinecone.io");
    }
}
