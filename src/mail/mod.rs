//! Mailbox collaborator — list, fetch, and send messages.

pub mod gmail;

pub use gmail::GmailClient;

use async_trait::async_trait;

use crate::error::MailError;

/// A lightweight reference to a mailbox message.
#[derive(Debug, Clone)]
pub struct MessageRef {
    pub id: String,
}

/// Headers and preview of a single message.
#[derive(Debug, Clone, Default)]
pub struct MailSummary {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub snippet: String,
    /// Whether the message carries an In-Reply-To header.
    pub is_reply: bool,
}

impl MailSummary {
    /// Render as a multi-line block for tool output.
    pub fn as_block(&self) -> String {
        format!(
            "From: {}\nSubject: {}\nDate: {}\nPreview: {}",
            self.from,
            self.subject,
            self.date,
            self.snippet.chars().take(100).collect::<String>(),
        )
    }

    /// Render as a single line for list-style tool output.
    pub fn as_line(&self) -> String {
        format!("From: {} | Subject: {}", self.from, self.subject)
    }
}

/// Abstraction over the mailbox provider.
///
/// Authentication is out of scope: implementations are constructed once per
/// process with whatever capability they need (e.g. an OAuth access token).
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// List message references, most recent first.
    ///
    /// `labels` filters by mailbox label (e.g. INBOX, SPAM); `query` uses the
    /// provider's search syntax (e.g. `after:1717977600 before:1718064000`).
    async fn list(
        &self,
        labels: &[&str],
        max: usize,
        query: Option<&str>,
    ) -> Result<Vec<MessageRef>, MailError>;

    /// Fetch headers and snippet for one message.
    async fn get(&self, id: &str) -> Result<MailSummary, MailError>;

    /// Send a message. Returns the provider-assigned message id.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, MailError>;
}

/// List references and resolve each to a summary.
///
/// Shared by the read-only tools; a failed `get` fails the whole call since
/// partial listings would silently hide mail.
pub async fn fetch_summaries(
    mailbox: &dyn Mailbox,
    labels: &[&str],
    max: usize,
    query: Option<&str>,
) -> Result<Vec<MailSummary>, MailError> {
    let refs = mailbox.list(labels, max, query).await?;
    let mut summaries = Vec::with_capacity(refs.len());
    for r in &refs {
        summaries.push(mailbox.get(&r.id).await?);
    }
    Ok(summaries)
}
