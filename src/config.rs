//! Configuration types.

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Agent name for identification.
    pub name: String,
    /// System prompt prepended to every generation call.
    pub system_prompt: Option<String>,
    /// Maximum LLM→tool rounds per user turn before the loop is cut off.
    pub max_tool_rounds: usize,
    /// Number of documents retrieved per semantic search.
    pub retrieval_top_k: usize,
    /// Default number of messages pulled by `/ingest`.
    pub ingest_batch: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "mailpilot".to_string(),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tool_rounds: 8,
            retrieval_top_k: 3,
            ingest_batch: 50,
        }
    }
}

/// Default system prompt when `MAILPILOT_SYSTEM_PROMPT` is not set.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are MailPilot, an email assistant. You help the user manage their \
mailbox without opening it themselves.

You can read and summarize messages, search by keyword, sender, or date, \
draft emails, send them after review, generate daily digests, surface spam, \
urgent items, and replies, and search indexed past email semantically.

Rules:
1. NEVER send an email without explicit user approval first.
2. Always use compose_draft first; call send_draft only after the user \
   explicitly confirms (e.g. 'send it', 'yes, send').
3. Be concise, helpful, and conversational.
4. If unsure what the user wants, ask for clarification instead of guessing.";
