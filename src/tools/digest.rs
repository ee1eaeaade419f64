//! Summary tools: daily digest and urgent-item extraction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use regex::Regex;

use crate::error::ToolError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::mail::{MailSummary, Mailbox, fetch_summaries};
use crate::tools::tool::{Tool, bounded_int, optional_str};

/// Resolve a natural-language period descriptor to a half-open time window.
///
/// Rules, in order:
/// - empty or "today" → the trailing 24 hours
/// - "yesterday" → the 24 hours before that
/// - text containing "last"/"past"/"recent" → trailing N days, N taken from
///   the first integer in the text (1 when absent)
/// - a literal YYYY-MM-DD date → that calendar day
/// - anything else → same as "today"
pub fn resolve_period(descriptor: &str, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let normalized = descriptor.trim().to_lowercase();

    if normalized.is_empty() || normalized == "today" {
        return (now - Duration::days(1), now);
    }
    if normalized == "yesterday" {
        return (now - Duration::days(2), now - Duration::days(1));
    }
    if ["last", "past", "recent"].iter().any(|w| normalized.contains(w)) {
        let days = Regex::new(r"\d+")
            .ok()
            .and_then(|re| re.find(&normalized))
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(1);
        return (now - Duration::days(days), now);
    }
    if let Ok(date) = NaiveDate::parse_from_str(normalized.as_str(), "%Y-%m-%d") {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        return (start, start + Duration::days(1));
    }

    // Unrecognized descriptors fall back to the trailing day instead of failing.
    (now - Duration::days(1), now)
}

/// One summary line per message, as fed to the digest prompts.
fn snippet_line(summary: &MailSummary) -> String {
    format!(
        "From: {} | Subject: {} | {}",
        summary.from,
        summary.subject,
        summary.snippet.chars().take(100).collect::<String>(),
    )
}

// ── daily_summary ───────────────────────────────────────────────────

/// Tool that digests everything received in a time window.
pub struct DailySummaryTool {
    mailbox: Arc<dyn Mailbox>,
    llm: Arc<dyn LlmProvider>,
}

impl DailySummaryTool {
    pub fn new(mailbox: Arc<dyn Mailbox>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { mailbox, llm }
    }
}

#[async_trait]
impl Tool for DailySummaryTool {
    fn name(&self) -> &str {
        "daily_summary"
    }

    fn description(&self) -> &str {
        "Summarize all emails received in a period as a bulleted digest with \
         urgent items flagged. Accepts 'today', 'yesterday', 'last 2 days', or \
         a YYYY-MM-DD date; defaults to today."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "period": {
                    "type": "string",
                    "description": "Period to summarize: 'today', 'yesterday', 'last N days', or YYYY-MM-DD"
                }
            }
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let period = optional_str(&params, "period").unwrap_or("today");
        let (start, end) = resolve_period(period, Utc::now());
        let query = format!("after:{} before:{}", start.timestamp(), end.timestamp());

        let summaries =
            fetch_summaries(self.mailbox.as_ref(), &[], 30, Some(&query)).await?;
        if summaries.is_empty() {
            return Ok("No emails received in the specified time period.".to_string());
        }

        let lines: Vec<String> = summaries.iter().map(snippet_line).collect();
        let request = CompletionRequest::new(vec![
            ChatMessage::system(
                "You are an email assistant. Summarize these emails as a clear \
                 daily digest. Use bullet points. Highlight anything urgent.",
            ),
            ChatMessage::user(format!(
                "Summarize these {} emails:\n\n{}",
                lines.len(),
                lines.join("\n")
            )),
        ]);
        let response = self.llm.complete(request).await?;
        Ok(response.content.trim().to_string())
    }
}

// ── important_alerts ────────────────────────────────────────────────

/// Tool that extracts urgent items and deadlines from the inbox.
pub struct ImportantAlertsTool {
    mailbox: Arc<dyn Mailbox>,
    llm: Arc<dyn LlmProvider>,
}

impl ImportantAlertsTool {
    pub fn new(mailbox: Arc<dyn Mailbox>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { mailbox, llm }
    }
}

#[async_trait]
impl Tool for ImportantAlertsTool {
    fn name(&self) -> &str {
        "important_alerts"
    }

    fn description(&self) -> &str {
        "Scan recent inbox messages for urgent emails, deadlines, and action \
         items. Use when the user asks what needs attention."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "count": {
                    "type": "integer",
                    "description": "How many recent emails to scan (1-30, default 10)"
                }
            }
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let count = bounded_int(&params, "count", 10, 1, 30)? as usize;

        let summaries = fetch_summaries(self.mailbox.as_ref(), &["INBOX"], count, None).await?;
        if summaries.is_empty() {
            return Ok("No emails to analyse.".to_string());
        }

        let lines: Vec<String> = summaries.iter().map(snippet_line).collect();
        let request = CompletionRequest::new(vec![
            ChatMessage::system(
                "You are an email assistant. Analyse these emails and extract \
                 only urgent ones, deadlines, or action items. If nothing is \
                 urgent, say so clearly.",
            ),
            ChatMessage::user(lines.join("\n")),
        ]);
        let response = self.llm.complete(request).await?;
        Ok(response.content.trim().to_string())
    }
}
