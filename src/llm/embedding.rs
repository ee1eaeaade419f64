//! Embedding provider — text in, fixed-length vector out.

use async_trait::async_trait;

use rig::embeddings::embedding::EmbeddingModel;

use crate::error::LlmError;

/// Abstraction over an embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;

    /// Embed a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Adapter exposing a rig `EmbeddingModel` as an `Embedder`.
pub struct RigEmbedder<M> {
    model: M,
}

impl<M: EmbeddingModel> RigEmbedder<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: EmbeddingModel> Embedder for RigEmbedder<M> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let embedding = self
            .model
            .embed_text(text)
            .await
            .map_err(|e| LlmError::EmbeddingFailed {
                reason: e.to_string(),
            })?;
        Ok(embedding.vec.iter().map(|v| *v as f32).collect())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self
            .model
            .embed_texts(texts.to_vec())
            .await
            .map_err(|e| LlmError::EmbeddingFailed {
                reason: e.to_string(),
            })?;
        Ok(embeddings
            .into_iter()
            .map(|e| e.vec.iter().map(|v| *v as f32).collect())
            .collect())
    }
}
