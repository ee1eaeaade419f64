//! Ingest pipeline — mailbox → embeddings → document index.
//!
//! Pulls recent inbox messages, embeds a text rendering of each, and upserts
//! them into the index so `semantic_search` has something to retrieve.
//! Already-indexed messages are skipped, so re-running is cheap.

use crate::error::Error;
use crate::llm::Embedder;
use crate::mail::{MailSummary, Mailbox};
use crate::store::DocumentIndex;

/// Counts from one ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub indexed: usize,
    pub skipped: usize,
}

/// The text that gets embedded and searched for one message.
fn document_text(summary: &MailSummary) -> String {
    format!(
        "Subject: {}\nFrom: {}\nDate: {}\nContent: {}",
        summary.subject, summary.from, summary.date, summary.snippet
    )
}

/// Fetch up to `max` recent inbox messages and index the new ones.
pub async fn ingest(
    mailbox: &dyn Mailbox,
    embedder: &dyn Embedder,
    index: &dyn DocumentIndex,
    max: usize,
) -> Result<IngestReport, Error> {
    let refs = mailbox.list(&["INBOX"], max, None).await?;

    let mut skipped = 0;
    let mut pending: Vec<(String, String, serde_json::Value)> = Vec::new();
    for r in &refs {
        if index.contains(&r.id).await? {
            skipped += 1;
            continue;
        }
        let summary = mailbox.get(&r.id).await?;
        let metadata = serde_json::json!({
            "email_id": summary.id,
            "subject": summary.subject,
            "sender": summary.from,
            "date": summary.date,
        });
        pending.push((r.id.clone(), document_text(&summary), metadata));
    }

    if pending.is_empty() {
        tracing::info!(skipped, "Ingest: index already up to date");
        return Ok(IngestReport { indexed: 0, skipped });
    }

    let texts: Vec<String> = pending.iter().map(|(_, text, _)| text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    for ((id, text, metadata), embedding) in pending.iter().zip(embeddings.iter()) {
        index.upsert(id, embedding, text, metadata).await?;
    }

    let indexed = pending.len();
    tracing::info!(indexed, skipped, "Ingest complete");
    Ok(IngestReport { indexed, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LlmError, MailError};
    use crate::mail::MessageRef;
    use crate::store::LibSqlStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubMailbox {
        summaries: Vec<MailSummary>,
    }

    #[async_trait]
    impl Mailbox for StubMailbox {
        async fn list(
            &self,
            _labels: &[&str],
            max: usize,
            _query: Option<&str>,
        ) -> Result<Vec<MessageRef>, MailError> {
            Ok(self
                .summaries
                .iter()
                .take(max)
                .map(|s| MessageRef { id: s.id.clone() })
                .collect())
        }

        async fn get(&self, id: &str) -> Result<MailSummary, MailError> {
            self.summaries
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or_else(|| MailError::RequestFailed {
                    operation: "get".into(),
                    reason: "missing".into(),
                })
        }

        async fn send(&self, _: &str, _: &str, _: &str) -> Result<String, MailError> {
            panic!("ingest never sends");
        }
    }

    #[derive(Default)]
    struct CountingEmbedder {
        embedded: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            self.embedded.fetch_add(1, Ordering::Relaxed);
            Ok(vec![0.1, 0.2])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            self.embedded.fetch_add(texts.len(), Ordering::Relaxed);
            Ok(texts.iter().map(|_| vec![0.1, 0.2]).collect())
        }
    }

    fn summary(id: &str) -> MailSummary {
        MailSummary {
            id: id.into(),
            from: "sender@example.com".into(),
            subject: format!("Subject {id}"),
            date: "Mon, 9 Jun 2025 10:00:00 +0000".into(),
            snippet: "snippet".into(),
            is_reply: false,
        }
    }

    #[tokio::test]
    async fn ingest_indexes_new_messages() {
        let mailbox = StubMailbox {
            summaries: vec![summary("a"), summary("b")],
        };
        let embedder = CountingEmbedder::default();
        let index = Arc::new(LibSqlStore::open_memory().await.unwrap());

        let report = ingest(&mailbox, &embedder, index.as_ref(), 50).await.unwrap();
        assert_eq!(report, IngestReport { indexed: 2, skipped: 0 });
        assert_eq!(index.count().await.unwrap(), 2);
        assert_eq!(embedder.embedded.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn ingest_skips_already_indexed() {
        let mailbox = StubMailbox {
            summaries: vec![summary("a"), summary("b")],
        };
        let embedder = CountingEmbedder::default();
        let index = Arc::new(LibSqlStore::open_memory().await.unwrap());

        ingest(&mailbox, &embedder, index.as_ref(), 50).await.unwrap();
        let report = ingest(&mailbox, &embedder, index.as_ref(), 50).await.unwrap();

        assert_eq!(report, IngestReport { indexed: 0, skipped: 2 });
        assert_eq!(index.count().await.unwrap(), 2);
        // No re-embedding of already-indexed mail.
        assert_eq!(embedder.embedded.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn ingest_respects_max() {
        let mailbox = StubMailbox {
            summaries: vec![summary("a"), summary("b"), summary("c")],
        };
        let embedder = CountingEmbedder::default();
        let index = Arc::new(LibSqlStore::open_memory().await.unwrap());

        let report = ingest(&mailbox, &embedder, index.as_ref(), 2).await.unwrap();
        assert_eq!(report.indexed, 2);
    }

    #[test]
    fn document_text_layout() {
        let text = document_text(&summary("a"));
        assert!(text.starts_with("Subject: Subject a\n"));
        assert!(text.contains("From: sender@example.com"));
        assert!(text.ends_with("Content: snippet"));
    }
}
