//! Drafting and sending tools.
//!
//! `compose_draft` is the only writer of the draft slot and `send_draft` the
//! only consumer; sending requires an explicit confirmation argument and an
//! existing draft, and nothing else in the crate touches the outbound path.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ToolError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::mail::Mailbox;
use crate::store::{Draft, DraftStore};
use crate::tools::tool::{Tool, optional_str, require_str};

const WRITER_PROMPT: &str = "You are an expert email writer. Write a complete, \
    well-structured email body. Start directly with the greeting. No preamble \
    or explanation.";

// ── compose_draft ───────────────────────────────────────────────────

/// Tool that drafts an email body and stores it for review.
pub struct ComposeDraftTool {
    llm: Arc<dyn LlmProvider>,
    drafts: Arc<dyn DraftStore>,
}

impl ComposeDraftTool {
    pub fn new(llm: Arc<dyn LlmProvider>, drafts: Arc<dyn DraftStore>) -> Self {
        Self { llm, drafts }
    }
}

#[async_trait]
impl Tool for ComposeDraftTool {
    fn name(&self) -> &str {
        "compose_draft"
    }

    fn description(&self) -> &str {
        "Draft a complete email from the user's instructions. Always show the \
         draft to the user for review; this tool never sends. Use send_draft \
         only after the user explicitly approves."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "Recipient email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Subject line"
                },
                "instructions": {
                    "type": "string",
                    "description": "What the email should say"
                },
                "tone": {
                    "type": "string",
                    "description": "Tone: professional, friendly, formal, casual (default professional)"
                }
            },
            "required": ["to", "subject", "instructions"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let to = require_str(&params, "to")?.trim();
        if !to.contains('@') {
            return Err(ToolError::InvalidArguments(format!(
                "'{to}' is not a valid email address"
            )));
        }
        let subject = require_str(&params, "subject")?;
        let instructions = require_str(&params, "instructions")?;
        let tone = optional_str(&params, "tone").unwrap_or("professional");

        let request = CompletionRequest::new(vec![
            ChatMessage::system(WRITER_PROMPT),
            ChatMessage::user(format!(
                "Write a {tone} email.\nTo: {to}\nSubject: {subject}\nInstructions: {instructions}"
            )),
        ]);
        let response = self.llm.complete(request).await?;
        let body = response.content.trim().to_string();

        // Overwrites any previous unsent draft.
        let draft = Draft {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.clone(),
        };
        self.drafts.put(&draft).await?;
        tracing::info!(to = %draft.to, "Draft stored");

        Ok(format!(
            "Draft email:\n{separator}\nTo: {to}\nSubject: {subject}\n\n{body}\n{separator}\n\
             Reply 'send it' to send, or describe the changes you'd like.",
            separator = "=".repeat(40),
        ))
    }
}

// ── send_draft ──────────────────────────────────────────────────────

/// Tool that sends the stored draft after explicit user approval.
pub struct SendDraftTool {
    mailbox: Arc<dyn Mailbox>,
    drafts: Arc<dyn DraftStore>,
}

impl SendDraftTool {
    pub fn new(mailbox: Arc<dyn Mailbox>, drafts: Arc<dyn DraftStore>) -> Self {
        Self { mailbox, drafts }
    }
}

#[async_trait]
impl Tool for SendDraftTool {
    fn name(&self) -> &str {
        "send_draft"
    }

    fn description(&self) -> &str {
        "Send the previously drafted email. Set confirmed=true ONLY when the \
         user has explicitly said to send (e.g. 'send it', 'yes, send'). Never \
         infer confirmation."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "confirmed": {
                    "type": "boolean",
                    "description": "True only when the user explicitly approved sending"
                }
            },
            "required": ["confirmed"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let confirmed = params
            .get("confirmed")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| {
                ToolError::InvalidArguments("missing required boolean field 'confirmed'".into())
            })?;

        if !confirmed {
            return Ok(
                "Email not sent. Ask the user to confirm with 'send it' when ready.".to_string(),
            );
        }

        // Read without clearing: a failed send must leave the draft intact.
        let draft = match self.drafts.peek().await? {
            Some(draft) => draft,
            None => return Ok("No draft found. Compose an email first.".to_string()),
        };

        self.mailbox
            .send(&draft.to, &draft.subject, &draft.body)
            .await?;

        // The message is out; a clear failure must not look like a send failure.
        if let Err(e) = self.drafts.take().await {
            tracing::error!(error = %e, "Draft sent but slot could not be cleared");
            return Ok(format!(
                "Email sent to {} | Subject: '{}'. WARNING: the stored draft could not \
                 be cleared ({e}); sending again would deliver a duplicate.",
                draft.to, draft.subject
            ));
        }

        Ok(format!(
            "Email sent to {} | Subject: '{}'",
            draft.to, draft.subject
        ))
    }
}
