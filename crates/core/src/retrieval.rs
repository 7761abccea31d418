//! Retrieval domain types: scored documents and the retriever trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::RetrievalError;

/// A document returned by similarity search.
///
/// Metadata values are JSON scalars (strings, numbers, booleans) as stored
/// alongside the vector in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The document text.
    #[serde(rename = "pageContent")]
    pub content: String,

    /// Source metadata (file name, page, url, ...).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Similarity score, when the index reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: serde_json::Map::new(),
            score: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Sort documents by descending score; unscored documents sort last.
/// The sort is stable so equal scores keep index order.
pub fn sort_by_relevance(docs: &mut [Document]) {
    docs.sort_by(|a, b| {
        let a = a.score.unwrap_or(f32::NEG_INFINITY);
        let b = b.score.unwrap_or(f32::NEG_INFINITY);
        b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Similarity search over an external index.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` documents most relevant to `query`, best first.
    /// `None` uses the retriever's default `k`. No matches is `Ok(vec![])`.
    async fn search(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> std::result::Result<Vec<Document>, RetrievalError>;
}
