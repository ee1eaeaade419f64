//! Tool abstraction and the assistant's built-in tools.

pub mod compose;
pub mod digest;
pub mod inbox;
pub mod knowledge;
pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::*;

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::llm::{Embedder, LlmProvider};
use crate::mail::Mailbox;
use crate::store::{DocumentIndex, DraftStore};

/// Build the full tool registry, wiring each tool to its collaborators.
pub fn builtin_registry(
    config: &AgentConfig,
    mailbox: Arc<dyn Mailbox>,
    llm: Arc<dyn LlmProvider>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn DocumentIndex>,
    drafts: Arc<dyn DraftStore>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(inbox::ListRecentTool::new(mailbox.clone())));
    registry.register(Arc::new(inbox::SearchMessagesTool::new(mailbox.clone())));
    registry.register(Arc::new(inbox::FetchByDateTool::new(mailbox.clone())));
    registry.register(Arc::new(inbox::CheckSpamTool::new(mailbox.clone())));
    registry.register(Arc::new(inbox::CheckRepliesTool::new(mailbox.clone())));
    registry.register(Arc::new(compose::ComposeDraftTool::new(
        llm.clone(),
        drafts.clone(),
    )));
    registry.register(Arc::new(compose::SendDraftTool::new(
        mailbox.clone(),
        drafts,
    )));
    registry.register(Arc::new(digest::DailySummaryTool::new(
        mailbox.clone(),
        llm.clone(),
    )));
    registry.register(Arc::new(digest::ImportantAlertsTool::new(
        mailbox,
        llm.clone(),
    )));
    registry.register(Arc::new(knowledge::SemanticSearchTool::new(
        embedder,
        index,
        llm,
        config.retrieval_top_k,
    )));
    registry
}
