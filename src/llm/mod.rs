//! Generation and embedding providers.
//!
//! Both are backed by rig-core: Anthropic or OpenAI for text generation,
//! OpenAI for embeddings. The `RigAdapter`/`RigEmbedder` bridges keep rig
//! types out of the rest of the crate.

pub mod embedding;
pub mod provider;
mod rig_adapter;

pub use embedding::{Embedder, RigEmbedder};
pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::{CompletionClient, EmbeddingsClient};
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Supported generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    /// Parse a backend name ("anthropic" / "openai"), defaulting to Anthropic.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "openai" => LlmBackend::OpenAi,
            _ => LlmBackend::Anthropic,
        }
    }
}

/// Configuration for creating a generation provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Create a generation provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Anthropic => {
            use rig::providers::anthropic;

            let client: rig::client::Client<anthropic::client::AnthropicExt> =
                anthropic::Client::new(config.api_key.expose_secret()).map_err(|e| {
                    LlmError::RequestFailed {
                        provider: "anthropic".to_string(),
                        reason: format!("Failed to create Anthropic client: {}", e),
                    }
                })?;
            let model = client.completion_model(&config.model);
            tracing::info!("Generation backend: Anthropic (model: {})", config.model);
            Ok(Arc::new(RigAdapter::new(model, &config.model)))
        }
        LlmBackend::OpenAi => {
            use rig::providers::openai;

            let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
                openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
                    LlmError::RequestFailed {
                        provider: "openai".to_string(),
                        reason: format!("Failed to create OpenAI client: {}", e),
                    }
                })?;
            let model = client.completion_model(&config.model);
            tracing::info!("Generation backend: OpenAI (model: {})", config.model);
            Ok(Arc::new(RigAdapter::new(model, &config.model)))
        }
    }
}

/// Create an OpenAI-backed embedder.
pub fn create_embedder(
    api_key: &secrecy::SecretString,
    model: &str,
) -> Result<Arc<dyn Embedder>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(api_key.expose_secret()).map_err(|e| LlmError::EmbeddingFailed {
            reason: format!("Failed to create OpenAI client: {}", e),
        })?;
    let embedding_model = client.embedding_model(model);
    tracing::info!("Embedding backend: OpenAI (model: {})", model);
    Ok(Arc::new(RigEmbedder::new(embedding_model)))
}
