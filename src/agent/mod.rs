//! The dialogue controller — one user turn in, one textual answer out.
//!
//! The controller owns no conversation state: the caller keeps the history
//! and passes it back each turn. Side effects live entirely inside tools;
//! the controller's only I/O is the generation provider call.

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::error::{Error, ToolError};
use crate::llm::{
    ChatMessage, CompletionRequest, LlmProvider, ToolCall, ToolCompletionRequest,
};
use crate::tools::ToolRegistry;

/// Shared collaborators for the controller.
pub struct AgentDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub tools: Arc<ToolRegistry>,
}

/// The assistant's reasoning loop.
pub struct Agent {
    config: AgentConfig,
    deps: AgentDeps,
}

impl Agent {
    pub fn new(config: AgentConfig, deps: AgentDeps) -> Self {
        Self { config, deps }
    }

    /// Run one user turn to completion.
    ///
    /// Appends the user message, then alternates generation calls and tool
    /// executions until the model answers in text, bounded by
    /// `max_tool_rounds`. The history only ever grows; existing entries are
    /// never touched.
    pub async fn respond(
        &self,
        history: &mut Vec<ChatMessage>,
        input: &str,
    ) -> Result<String, Error> {
        history.push(ChatMessage::user(input));

        let tool_definitions = self.deps.tools.definitions();

        for round in 0..self.config.max_tool_rounds {
            let request =
                ToolCompletionRequest::new(self.with_system(history), tool_definitions.clone());
            let response = self.deps.llm.complete_with_tools(request).await?;

            if response.tool_calls.is_empty() {
                let answer = response.content.unwrap_or_default();
                history.push(ChatMessage::assistant(answer.clone()));
                return Ok(answer);
            }

            tracing::debug!(
                round,
                calls = response.tool_calls.len(),
                "Model requested tools"
            );
            history.push(ChatMessage::assistant_with_calls(
                response.content.unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            for call in response.tool_calls {
                let result = self.execute_call(&call).await;
                history.push(ChatMessage::tool_result(call.id, call.name, result));
            }
        }

        tracing::warn!(
            max_rounds = self.config.max_tool_rounds,
            "Tool round budget exhausted, forcing a textual answer"
        );
        self.best_effort_answer(history).await
    }

    /// Execute one requested tool call, converting every failure into a
    /// readable result so the conversation can continue.
    async fn execute_call(&self, call: &ToolCall) -> String {
        let tool = match self.deps.tools.get(&call.name) {
            Some(tool) => tool,
            None => {
                let err = ToolError::Unknown(call.name.clone());
                tracing::warn!(tool = %call.name, "Model requested an unregistered tool");
                return format!("Error: {err}");
            }
        };

        match tool.execute(call.arguments.clone()).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(tool = %call.name, error = %err, "Tool failed");
                format!("Error: {err}")
            }
        }
    }

    /// Final fallback once the round budget is spent: one tool-free
    /// completion, and a fixed apology if even that fails.
    async fn best_effort_answer(
        &self,
        history: &mut Vec<ChatMessage>,
    ) -> Result<String, Error> {
        history.push(ChatMessage::user(
            "The tool budget for this turn is exhausted. Answer the original \
             request now using the results above; do not request more tools.",
        ));

        let request = CompletionRequest::new(self.with_system(history));
        let answer = match self.deps.llm.complete(request).await {
            Ok(response) if !response.content.trim().is_empty() => response.content,
            Ok(_) | Err(_) => {
                "I wasn't able to finish that request within this turn. \
                 Could you rephrase or narrow it down?"
                    .to_string()
            }
        };

        history.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }

    /// The request view: system prompt (if configured) ahead of the history.
    /// The stored history itself never contains system messages.
    fn with_system(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(ref prompt) = self.config.system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        messages.extend_from_slice(history);
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{
        CompletionResponse, Role, ToolCompletionResponse, ToolDefinition,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Generation stub that replays a script of canned responses.
    struct ScriptedLlm {
        script: Mutex<Vec<ToolCompletionResponse>>,
        plain_answer: String,
    }

    impl ScriptedLlm {
        fn new(script: Vec<ToolCompletionResponse>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                plain_answer: "best effort".to_string(),
            })
        }

        fn text(content: &str) -> ToolCompletionResponse {
            ToolCompletionResponse {
                content: Some(content.to_string()),
                tool_calls: Vec::new(),
                input_tokens: 0,
                output_tokens: 0,
            }
        }

        fn call(name: &str, args: serde_json::Value) -> ToolCompletionResponse {
            ToolCompletionResponse {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_1".into(),
                    name: name.into(),
                    arguments: args,
                }],
                input_tokens: 0,
                output_tokens: 0,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: self.plain_answer.clone(),
                input_tokens: 0,
                output_tokens: 0,
            })
        }

        async fn complete_with_tools(
            &self,
            _request: ToolCompletionRequest,
        ) -> Result<ToolCompletionResponse, LlmError> {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                // Degenerate provider: never stops asking for tools.
                return Ok(Self::call("echo", serde_json::json!({})));
            }
            Ok(script.remove(0))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl crate::tools::Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echo"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
            Ok(format!("echo: {params}"))
        }
    }

    fn agent_with(llm: Arc<dyn LlmProvider>, max_rounds: usize) -> Agent {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        Agent::new(
            AgentConfig {
                max_tool_rounds: max_rounds,
                ..Default::default()
            },
            AgentDeps {
                llm,
                tools: Arc::new(registry),
            },
        )
    }

    #[tokio::test]
    async fn plain_answer_ends_turn() {
        let llm = ScriptedLlm::new(vec![ScriptedLlm::text("hello there")]);
        let agent = agent_with(llm, 4);

        let mut history = Vec::new();
        let answer = agent.respond(&mut history, "hi").await.unwrap();
        assert_eq!(answer, "hello there");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn tool_round_then_answer() {
        let llm = ScriptedLlm::new(vec![
            ScriptedLlm::call("echo", serde_json::json!({"x": 1})),
            ScriptedLlm::text("done"),
        ]);
        let agent = agent_with(llm, 4);

        let mut history = Vec::new();
        let answer = agent.respond(&mut history, "go").await.unwrap();
        assert_eq!(answer, "done");
        // user, assistant(call), tool result, assistant(answer)
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].role, Role::Tool);
        assert!(history[2].content.contains("echo:"));
        assert_eq!(history[2].tool_name.as_deref(), Some("echo"));
    }

    #[tokio::test]
    async fn history_is_append_only() {
        let llm = ScriptedLlm::new(vec![
            ScriptedLlm::call("echo", serde_json::json!({})),
            ScriptedLlm::text("first"),
            ScriptedLlm::text("second"),
        ]);
        let agent = agent_with(llm, 4);

        let mut history = Vec::new();
        agent.respond(&mut history, "one").await.unwrap();
        let snapshot: Vec<String> = history.iter().map(|m| m.content.clone()).collect();

        agent.respond(&mut history, "two").await.unwrap();
        assert!(history.len() > snapshot.len());
        for (i, content) in snapshot.iter().enumerate() {
            assert_eq!(&history[i].content, content, "entry {i} was mutated");
        }
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_text() {
        let llm = ScriptedLlm::new(vec![
            ScriptedLlm::call("no_such_tool", serde_json::json!({})),
            ScriptedLlm::text("recovered"),
        ]);
        let agent = agent_with(llm, 4);

        let mut history = Vec::new();
        let answer = agent.respond(&mut history, "go").await.unwrap();
        assert_eq!(answer, "recovered");
        assert!(history[2].content.contains("unknown tool 'no_such_tool'"));
    }

    #[tokio::test]
    async fn round_cap_forces_textual_answer() {
        // Empty script: the stub requests a tool on every round forever.
        let llm = ScriptedLlm::new(Vec::new());
        let agent = agent_with(llm, 3);

        let mut history = Vec::new();
        let answer = agent.respond(&mut history, "loop").await.unwrap();
        assert_eq!(answer, "best effort");
        assert!(!answer.is_empty());

        // 3 rounds of (assistant + tool result), plus user, nudge, final answer.
        let tool_rounds = history.iter().filter(|m| m.role == Role::Tool).count();
        assert_eq!(tool_rounds, 3);
        assert_eq!(history.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn system_prompt_not_stored_in_history() {
        let llm = ScriptedLlm::new(vec![ScriptedLlm::text("ok")]);
        let agent = agent_with(llm, 4);

        let mut history = Vec::new();
        agent.respond(&mut history, "hi").await.unwrap();
        assert!(history.iter().all(|m| m.role != Role::System));
    }

    #[tokio::test]
    async fn registry_definitions_offered() {
        // Smoke-check the definitions the agent sends to the model.
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let defs: Vec<ToolDefinition> = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }
}
