//! libSQL backend implementing `DraftStore` and `DocumentIndex`.
//!
//! A single local database file holds both the draft slot and the document
//! index. SQLite's file locking covers the rare case of two processes
//! sharing the same file, so no extra mutual exclusion is needed.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use tracing::info;

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::{Draft, DocumentIndex, DraftStore, ScoredDocument};

/// libSQL-backed store.
///
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use,
/// though the assistant serializes turns anyway.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<Database>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create data directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&store.conn).await?;
        info!(path = %path.display(), "Store opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests).
    pub async fn open_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&store.conn).await?;
        Ok(store)
    }

    async fn read_draft(&self) -> Result<Option<Draft>, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT recipient, subject, body FROM draft WHERE slot = 1", ())
            .await
            .map_err(query_failed)?;
        match rows.next().await.map_err(query_failed)? {
            Some(row) => Ok(Some(Draft {
                to: row.get::<String>(0).map_err(query_failed)?,
                subject: row.get::<String>(1).map_err(query_failed)?,
                body: row.get::<String>(2).map_err(query_failed)?,
            })),
            None => Ok(None),
        }
    }
}

fn query_failed(e: libsql::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

// ── DraftStore ──────────────────────────────────────────────────────

#[async_trait]
impl DraftStore for LibSqlStore {
    async fn put(&self, draft: &Draft) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO draft (slot, recipient, subject, body, created_at)
                 VALUES (1, ?1, ?2, ?3, ?4)
                 ON CONFLICT (slot) DO UPDATE SET
                     recipient = excluded.recipient,
                     subject = excluded.subject,
                     body = excluded.body,
                     created_at = excluded.created_at",
                params![
                    draft.to.as_str(),
                    draft.subject.as_str(),
                    draft.body.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(query_failed)?;
        Ok(())
    }

    async fn peek(&self) -> Result<Option<Draft>, StoreError> {
        self.read_draft().await
    }

    async fn take(&self) -> Result<Option<Draft>, StoreError> {
        let draft = self.read_draft().await?;
        if draft.is_some() {
            self.conn
                .execute("DELETE FROM draft WHERE slot = 1", ())
                .await
                .map_err(query_failed)?;
        }
        Ok(draft)
    }
}

// ── DocumentIndex ───────────────────────────────────────────────────

#[async_trait]
impl DocumentIndex for LibSqlStore {
    async fn upsert(
        &self,
        id: &str,
        embedding: &[f32],
        text: &str,
        metadata: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let embedding_json = serde_json::to_string(embedding)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let metadata_json = serde_json::to_string(metadata)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO documents (id, embedding, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (id) DO UPDATE SET
                     embedding = excluded.embedding,
                     content = excluded.content,
                     metadata = excluded.metadata",
                params![
                    id,
                    embedding_json,
                    text,
                    metadata_json,
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(query_failed)?;
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredDocument>, StoreError> {
        // Brute-force scan: load every stored vector and rank by cosine
        // similarity. O(n), which is fine at inbox scale.
        let mut rows = self
            .conn
            .query("SELECT embedding, content, metadata FROM documents", ())
            .await
            .map_err(query_failed)?;

        let mut scored: Vec<ScoredDocument> = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_failed)? {
            let embedding_json: String = row.get(0).map_err(query_failed)?;
            let content: String = row.get(1).map_err(query_failed)?;
            let metadata_json: String = row.get(2).map_err(query_failed)?;

            let stored: Vec<f32> = serde_json::from_str(&embedding_json)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let metadata: serde_json::Value = serde_json::from_str(&metadata_json)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            scored.push(ScoredDocument {
                text: content,
                metadata,
                score: cosine_similarity(embedding, &stored),
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM documents", ())
            .await
            .map_err(query_failed)?;
        match rows.next().await.map_err(query_failed)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(query_failed)? as u64),
            None => Ok(0),
        }
    }

    async fn contains(&self, id: &str) -> Result<bool, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM documents WHERE id = ?1 LIMIT 1",
                params![id],
            )
            .await
            .map_err(query_failed)?;
        Ok(rows.next().await.map_err(query_failed)?.is_some())
    }
}

/// Cosine similarity of two vectors; 0.0 on mismatched length or zero norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> LibSqlStore {
        LibSqlStore::open_memory().await.unwrap()
    }

    #[tokio::test]
    async fn draft_put_overwrites() {
        let store = memory_store().await;
        let first = Draft {
            to: "a@example.com".into(),
            subject: "First".into(),
            body: "one".into(),
        };
        let second = Draft {
            to: "b@example.com".into(),
            subject: "Second".into(),
            body: "two".into(),
        };

        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        let stored = store.peek().await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn draft_take_clears_slot() {
        let store = memory_store().await;
        let draft = Draft {
            to: "a@example.com".into(),
            subject: "Hi".into(),
            body: "body".into(),
        };
        store.put(&draft).await.unwrap();

        assert_eq!(store.take().await.unwrap(), Some(draft));
        assert_eq!(store.take().await.unwrap(), None);
        assert_eq!(store.peek().await.unwrap(), None);
    }

    #[tokio::test]
    async fn draft_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mailpilot.db");

        let draft = Draft {
            to: "a@example.com".into(),
            subject: "Durable".into(),
            body: "still here".into(),
        };
        {
            let store = LibSqlStore::open(&path).await.unwrap();
            store.put(&draft).await.unwrap();
        }
        let store = LibSqlStore::open(&path).await.unwrap();
        assert_eq!(store.peek().await.unwrap(), Some(draft));
    }

    #[tokio::test]
    async fn index_upsert_and_query_ranks_by_similarity() {
        let store = memory_store().await;
        store
            .upsert("d1", &[1.0, 0.0], "about rust", &serde_json::json!({"subject": "rust"}))
            .await
            .unwrap();
        store
            .upsert("d2", &[0.0, 1.0], "about cooking", &serde_json::json!({"subject": "food"}))
            .await
            .unwrap();

        let hits = store.query(&[1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "about rust");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn index_upsert_replaces_by_id() {
        let store = memory_store().await;
        store
            .upsert("d1", &[1.0, 0.0], "old", &serde_json::json!({}))
            .await
            .unwrap();
        store
            .upsert("d1", &[1.0, 0.0], "new", &serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.query(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].text, "new");
    }

    #[tokio::test]
    async fn index_count_and_contains() {
        let store = memory_store().await;
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(!store.contains("d1").await.unwrap());

        store
            .upsert("d1", &[0.5, 0.5], "doc", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.contains("d1").await.unwrap());
    }

    #[test]
    fn cosine_similarity_edge_cases() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        // Zero vector and length mismatch both degrade to 0.
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
