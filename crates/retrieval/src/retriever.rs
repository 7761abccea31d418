//! Similarity search: embed the query, ask the index, shape the hits into
//! documents.

use crate::index::{IndexMatch, VectorIndex};
use async_trait::async_trait;
use deskpilot_core::error::{ProviderError, RetrievalError};
use deskpilot_core::provider::{EmbeddingRequest, Provider};
use deskpilot_core::retrieval::{Document, Retriever, sort_by_relevance};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct VectorRetriever {
    embedder: Arc<dyn Provider>,
    index: Arc<dyn VectorIndex>,
    embedding_model: String,
    top_k: usize,
    text_key: String,
}

impl VectorRetriever {
    pub fn new(
        embedder: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            embedding_model: embedding_model.into(),
            top_k: 4,
            text_key: "text".into(),
        }
    }

    /// Set the number of documents returned when the caller passes no `k`.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Set the metadata key that holds the document text.
    pub fn with_text_key(mut self, key: impl Into<String>) -> Self {
        self.text_key = key.into();
        self
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, RetrievalError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![query.to_string()],
            })
            .await?;

        response.embeddings.into_iter().next().ok_or_else(|| {
            RetrievalError::Embedding(ProviderError::ApiError {
                status_code: 200,
                message: "Embedding response contained no vectors".into(),
            })
        })
    }

    fn to_document(&self, hit: IndexMatch) -> Document {
        let mut metadata = hit.metadata.unwrap_or_default();
        let content = match metadata.remove(&self.text_key) {
            Some(serde_json::Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => {
                warn!(id = %hit.id, key = %self.text_key, "Match has no text metadata");
                String::new()
            }
        };

        Document {
            content,
            metadata,
            score: hit.score,
        }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn search(&self, query: &str, k: Option<usize>) -> Result<Vec<Document>, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        let k = k.unwrap_or(self.top_k).max(1);

        let vector = self.embed_query(query).await?;
        let matches = self.index.query(vector, k).await?;

        let mut docs: Vec<Document> = matches
            .into_iter()
            .take(k)
            .map(|hit| self.to_document(hit))
            .collect();
        sort_by_relevance(&mut docs);

        debug!(count = docs.len(), k, "Retrieved documents");
        Ok(docs)
    }
}
