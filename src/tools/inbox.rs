//! Read-only mailbox tools: listing, search, date fetch, spam, replies.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};

use crate::error::ToolError;
use crate::mail::{Mailbox, fetch_summaries};
use crate::tools::tool::{Tool, bounded_int, require_str};

/// Render a Gmail-style query for an epoch-seconds window.
fn window_query(after: i64, before: i64) -> String {
    format!("after:{after} before:{before}")
}

// ── list_recent ─────────────────────────────────────────────────────

/// Tool that lists the most recent inbox messages.
pub struct ListRecentTool {
    mailbox: Arc<dyn Mailbox>,
}

impl ListRecentTool {
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        Self { mailbox }
    }
}

#[async_trait]
impl Tool for ListRecentTool {
    fn name(&self) -> &str {
        "list_recent"
    }

    fn description(&self) -> &str {
        "Read the inbox and return the most recent emails. Use when the user \
         asks to check their email, see their inbox, or what they have received."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "count": {
                    "type": "integer",
                    "description": "Number of emails to fetch (1-20, default 5)"
                }
            }
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let count = bounded_int(&params, "count", 5, 1, 20)? as usize;

        let summaries = fetch_summaries(self.mailbox.as_ref(), &["INBOX"], count, None).await?;
        if summaries.is_empty() {
            return Ok("Your inbox is empty.".to_string());
        }
        Ok(summaries
            .iter()
            .map(|s| s.as_block())
            .collect::<Vec<_>>()
            .join("\n---\n"))
    }
}

// ── search_messages ─────────────────────────────────────────────────

/// Tool that searches the mailbox with the provider's query syntax.
pub struct SearchMessagesTool {
    mailbox: Arc<dyn Mailbox>,
}

impl SearchMessagesTool {
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        Self { mailbox }
    }
}

#[async_trait]
impl Tool for SearchMessagesTool {
    fn name(&self) -> &str {
        "search_messages"
    }

    fn description(&self) -> &str {
        "Search the mailbox with a query such as 'from:alice@example.com' or \
         'subject:invoice'. Use when the user wants to find a specific email \
         by sender, subject, or keyword."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Mailbox search query"
                },
                "count": {
                    "type": "integer",
                    "description": "Max results (1-20, default 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let query = require_str(&params, "query")?;
        let count = bounded_int(&params, "count", 5, 1, 20)? as usize;

        let summaries =
            fetch_summaries(self.mailbox.as_ref(), &[], count, Some(query)).await?;
        if summaries.is_empty() {
            return Ok(format!("No emails found for: '{query}'"));
        }
        Ok(summaries
            .iter()
            .map(|s| s.as_block())
            .collect::<Vec<_>>()
            .join("\n---\n"))
    }
}

// ── fetch_by_date ───────────────────────────────────────────────────

/// Tool that fetches everything received on a given calendar date.
pub struct FetchByDateTool {
    mailbox: Arc<dyn Mailbox>,
}

impl FetchByDateTool {
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        Self { mailbox }
    }
}

#[async_trait]
impl Tool for FetchByDateTool {
    fn name(&self) -> &str {
        "fetch_by_date"
    }

    fn description(&self) -> &str {
        "Fetch all emails received on a specific date (YYYY-MM-DD). Use when \
         the user asks for emails from a particular day."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": "string",
                    "description": "Calendar date in YYYY-MM-DD format"
                }
            },
            "required": ["date"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let raw = require_str(&params, "date")?;
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            ToolError::InvalidArguments(format!("'{raw}' is not a valid YYYY-MM-DD date"))
        })?;

        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        let query = window_query(start.timestamp(), end.timestamp());

        let summaries =
            fetch_summaries(self.mailbox.as_ref(), &[], 20, Some(&query)).await?;
        if summaries.is_empty() {
            return Ok(format!("No emails found for {raw}."));
        }

        let mut lines = vec![format!("Emails received on {raw}:")];
        lines.extend(summaries.iter().map(|s| s.as_line()));
        Ok(lines.join("\n"))
    }
}

// ── check_spam ──────────────────────────────────────────────────────

/// Tool that lists spam-labeled messages.
pub struct CheckSpamTool {
    mailbox: Arc<dyn Mailbox>,
}

impl CheckSpamTool {
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        Self { mailbox }
    }
}

#[async_trait]
impl Tool for CheckSpamTool {
    fn name(&self) -> &str {
        "check_spam"
    }

    fn description(&self) -> &str {
        "List messages in the spam folder. Use when the user asks about spam \
         or junk mail."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "count": {
                    "type": "integer",
                    "description": "Max results (1-50, default 10)"
                }
            }
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let count = bounded_int(&params, "count", 10, 1, 50)? as usize;

        let summaries = fetch_summaries(self.mailbox.as_ref(), &["SPAM"], count, None).await?;
        if summaries.is_empty() {
            return Ok("No spam emails found.".to_string());
        }

        let mut lines = vec![format!("{} spam email(s) detected:", summaries.len())];
        lines.extend(summaries.iter().map(|s| s.as_line()));
        Ok(lines.join("\n"))
    }
}

// ── check_replies ───────────────────────────────────────────────────

/// Tool that surfaces recent inbox messages that are replies.
pub struct CheckRepliesTool {
    mailbox: Arc<dyn Mailbox>,
}

impl CheckRepliesTool {
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        Self { mailbox }
    }
}

#[async_trait]
impl Tool for CheckRepliesTool {
    fn name(&self) -> &str {
        "check_replies"
    }

    fn description(&self) -> &str {
        "Check whether anyone replied to the user's emails recently. Accepts \
         up to 720 hours (30 days) back."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "hours_back": {
                    "type": "integer",
                    "description": "How many hours back to check (1-720, default 24)"
                }
            }
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let hours_back = bounded_int(&params, "hours_back", 24, 1, 720)?;

        let since = Utc::now() - Duration::hours(hours_back);
        let query = format!("in:inbox after:{}", since.timestamp());

        let summaries =
            fetch_summaries(self.mailbox.as_ref(), &[], 20, Some(&query)).await?;
        let replies: Vec<_> = summaries.iter().filter(|s| s.is_reply).collect();

        if replies.is_empty() {
            return Ok(format!(
                "No replies received in the last {hours_back} hours."
            ));
        }

        let mut lines = vec![format!(
            "{} reply/replies in the last {hours_back} hours:",
            replies.len()
        )];
        lines.extend(replies.iter().map(|s| s.as_line()));
        Ok(lines.join("\n"))
    }
}
