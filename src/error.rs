//! Error types for MailPilot.

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Mailbox error: {0}")]
    Mail(#[from] MailError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Generation/embedding provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Embedding request failed: {reason}")]
    EmbeddingFailed { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mailbox collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mailbox {operation} request failed: {reason}")]
    RequestFailed { operation: String, reason: String },

    #[error("Mailbox rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),
}

/// Persistence errors (draft slot + document index).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Tool execution errors.
///
/// Every variant is rendered into a readable tool-result message by the
/// agent loop; none of them aborts the turn.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    Unknown(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{collaborator} call failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },
}

impl From<MailError> for ToolError {
    fn from(e: MailError) -> Self {
        ToolError::Collaborator {
            collaborator: "mailbox",
            reason: e.to_string(),
        }
    }
}

impl From<LlmError> for ToolError {
    fn from(e: LlmError) -> Self {
        ToolError::Collaborator {
            collaborator: "generation provider",
            reason: e.to_string(),
        }
    }
}

impl From<StoreError> for ToolError {
    fn from(e: StoreError) -> Self {
        ToolError::Collaborator {
            collaborator: "store",
            reason: e.to_string(),
        }
    }
}

/// Result type alias for the assistant.
pub type Result<T> = std::result::Result<T, Error>;
