//! Tool abstraction and argument validation helpers.

use async_trait::async_trait;

use crate::error::ToolError;

/// A named, schema-declared operation the model may request.
///
/// Handlers return plain text: the result is appended to the conversation
/// as a tool message and read by the model on the next round.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Description read by the model to decide relevance.
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Validate arguments and execute.
    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError>;
}

// ── Argument helpers ────────────────────────────────────────────────

/// Extract a required string argument.
pub fn require_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required field '{key}'")))
}

/// Extract an optional string argument.
pub fn optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Extract an integer argument bounded to `[min, max]`, with a default when
/// absent. Out-of-range values are an error, not clamped.
pub fn bounded_int(
    params: &serde_json::Value,
    key: &str,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64, ToolError> {
    let value = match params.get(key) {
        None | Some(serde_json::Value::Null) => default,
        Some(v) => v.as_i64().ok_or_else(|| {
            ToolError::InvalidArguments(format!("field '{key}' must be an integer"))
        })?,
    };
    if value < min || value > max {
        return Err(ToolError::InvalidArguments(format!(
            "field '{key}' must be between {min} and {max}, got {value}"
        )));
    }
    Ok(value)
}
