//! Similarity retrieval for the DeskPilot Q&A service.
//!
//! [`VectorRetriever`] embeds a query through any [`Provider`] and looks up
//! the nearest documents in a [`VectorIndex`], by default a hosted
//! Pinecone-compatible index.

pub mod index;
pub mod retriever;

pub use index::{IndexMatch, PineconeIndex, VectorIndex};
pub use retriever::VectorRetriever;

use deskpilot_config::AppConfig;
use deskpilot_core::error::RetrievalError;
use deskpilot_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the configured retriever, resolving the index host if needed.
pub async fn build_from_config(
    config: &AppConfig,
    embedder: Arc<dyn Provider>,
) -> Result<VectorRetriever, RetrievalError> {
    let settings = &config.retrieval;
    let timeout = Duration::from_secs(config.openai.timeout_secs);

    let api_key = settings
        .api_key
        .clone()
        .ok_or_else(|| RetrievalError::AuthenticationFailed("PINECONE_API_KEY is not set".into()))?;

    let host = match (&settings.host, &settings.index) {
        (Some(host), _) => host.clone(),
        (None, Some(index)) => {
            PineconeIndex::resolve_host(&settings.control_plane_url, index, &api_key, timeout).await?
        }
        (None, None) => {
            return Err(RetrievalError::IndexError {
                status_code: 0,
                message: "Neither PINECONE_HOST nor PINECONE_INDEX is set".into(),
            });
        }
    };

    let index = PineconeIndex::new(host, api_key, timeout)?.with_namespace(settings.namespace.clone());
    info!(host = %index.host(), "Vector index ready");

    Ok(
        VectorRetriever::new(embedder, Arc::new(index), config.openai.embedding_model.clone())
            .with_top_k(settings.top_k)
            .with_text_key(settings.text_key.clone()),
    )
}
