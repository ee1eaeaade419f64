//! Semantic search over the indexed email knowledge base.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ToolError;
use crate::llm::{ChatMessage, CompletionRequest, Embedder, LlmProvider};
use crate::store::DocumentIndex;
use crate::tools::tool::{Tool, require_str};

/// Returned verbatim when nothing has been indexed yet.
pub const EMPTY_INDEX_MESSAGE: &str =
    "The email knowledge base is empty. Run /ingest to index past email first.";

/// Tool that answers questions from semantically retrieved past email.
pub struct SemanticSearchTool {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn DocumentIndex>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl SemanticSearchTool {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn DocumentIndex>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            top_k,
        }
    }

    fn render_context(hits: &[crate::store::ScoredDocument]) -> String {
        let mut context = String::new();
        for (i, hit) in hits.iter().enumerate() {
            let meta = |key: &str| {
                hit.metadata
                    .get(key)
                    .and_then(|v| v.as_str())
                    .unwrap_or("N/A")
                    .to_string()
            };
            let preview: String = hit
                .text
                .split("Content:")
                .last()
                .unwrap_or("")
                .trim()
                .chars()
                .take(200)
                .collect();
            context.push_str(&format!(
                "Email {}:\n  Subject: {}\n  From: {}\n  Date: {}\n  Preview: {}\n\n",
                i + 1,
                meta("subject"),
                meta("sender"),
                meta("date"),
                preview,
            ));
        }
        context
    }
}

#[async_trait]
impl Tool for SemanticSearchTool {
    fn name(&self) -> &str {
        "semantic_search"
    }

    fn description(&self) -> &str {
        "Search indexed past email by meaning. Use when the user describes an \
         old email without remembering the exact words, sender, or date."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Natural-language description of the email to find"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let query = require_str(&params, "query")?;

        // Checked first so an empty index costs no embedding or generation call.
        let count = self.index.count().await?;
        if count == 0 {
            return Ok(EMPTY_INDEX_MESSAGE.to_string());
        }

        let vector = self.embedder.embed(query).await?;
        let k = self.top_k.min(count as usize);
        let hits = self.index.query(&vector, k).await?;
        if hits.is_empty() {
            return Ok(format!("No emails found matching: '{query}'"));
        }

        let context = Self::render_context(&hits);
        let request = CompletionRequest::new(vec![
            ChatMessage::system(
                "You are an email assistant. The user has asked a question about \
                 their email, and the most relevant indexed messages have been \
                 retrieved. Answer naturally and specifically from these messages. \
                 If the exact email isn't there, say so honestly and mention what \
                 related messages were found.",
            ),
            ChatMessage::user(format!(
                "My question: {query}\n\nRelevant emails found:\n{context}"
            )),
        ]);
        let response = self.llm.complete(request).await?;
        Ok(response.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{
        CompletionResponse, ToolCompletionRequest, ToolCompletionResponse,
    };
    use crate::store::LibSqlStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            self.calls.fetch_add(texts.len(), Ordering::Relaxed);
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[derive(Default)]
    struct CountingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for CountingLlm {
        fn model_name(&self) -> &str {
            "stub"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(CompletionResponse {
                content: "You discussed the invoice with Alice.".to_string(),
                input_tokens: 0,
                output_tokens: 0,
            })
        }

        async fn complete_with_tools(
            &self,
            _request: ToolCompletionRequest,
        ) -> Result<ToolCompletionResponse, LlmError> {
            unreachable!("semantic search uses plain completion");
        }
    }

    #[tokio::test]
    async fn empty_index_short_circuits() {
        let index = Arc::new(LibSqlStore::open_memory().await.unwrap());
        let embedder = Arc::new(CountingEmbedder::default());
        let llm = Arc::new(CountingLlm::default());
        let tool = SemanticSearchTool::new(embedder.clone(), index, llm.clone(), 3);

        let out = tool
            .execute(serde_json::json!({"query": "the invoice email"}))
            .await
            .unwrap();
        assert_eq!(out, EMPTY_INDEX_MESSAGE);
        assert_eq!(embedder.calls.load(Ordering::Relaxed), 0);
        assert_eq!(llm.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn answers_from_retrieved_context() {
        let index = Arc::new(LibSqlStore::open_memory().await.unwrap());
        index
            .upsert(
                "m1",
                &[1.0, 0.0],
                "Subject: Invoice\nFrom: alice@example.com\nDate: today\nContent: invoice attached",
                &serde_json::json!({
                    "subject": "Invoice",
                    "sender": "alice@example.com",
                    "date": "today"
                }),
            )
            .await
            .unwrap();
        let embedder = Arc::new(CountingEmbedder::default());
        let llm = Arc::new(CountingLlm::default());
        let tool = SemanticSearchTool::new(embedder.clone(), index, llm.clone(), 3);

        let out = tool
            .execute(serde_json::json!({"query": "the invoice email"}))
            .await
            .unwrap();
        assert_eq!(out, "You discussed the invoice with Alice.");
        assert_eq!(embedder.calls.load(Ordering::Relaxed), 1);
        assert_eq!(llm.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn context_rendering_uses_metadata() {
        let hits = vec![crate::store::ScoredDocument {
            text: "Subject: X\nContent: the actual preview".into(),
            metadata: serde_json::json!({
                "subject": "X",
                "sender": "a@example.com",
                "date": "Mon"
            }),
            score: 0.9,
        }];
        let context = SemanticSearchTool::render_context(&hits);
        assert!(context.contains("Email 1:"));
        assert!(context.contains("Subject: X"));
        assert!(context.contains("the actual preview"));
    }
}
