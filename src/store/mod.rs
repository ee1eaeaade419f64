//! Persistence layer — libSQL-backed draft slot and document index.

pub mod libsql_backend;
pub mod migrations;

pub use libsql_backend::LibSqlStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// An unsent composed email awaiting explicit confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Single-slot durable holder for the most recently drafted message.
///
/// `put` overwrites unconditionally; the slot survives process restarts so
/// drafting and sending can happen in separate invocations.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Store a draft, replacing any existing one.
    async fn put(&self, draft: &Draft) -> Result<(), StoreError>;

    /// Read the current draft without clearing it.
    async fn peek(&self) -> Result<Option<Draft>, StoreError>;

    /// Return the current draft and clear the slot.
    async fn take(&self) -> Result<Option<Draft>, StoreError>;
}

/// A document retrieved from the similarity index.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub text: String,
    pub metadata: serde_json::Value,
    /// Cosine similarity against the query vector.
    pub score: f32,
}

/// Persistent store of embedded documents with top-k similarity query.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Insert or replace a document by id.
    async fn upsert(
        &self,
        id: &str,
        embedding: &[f32],
        text: &str,
        metadata: &serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Top-k nearest documents by cosine similarity, best first.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredDocument>, StoreError>;

    /// Number of documents stored.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Whether a document with this id is already indexed.
    async fn contains(&self, id: &str) -> Result<bool, StoreError>;
}
