//! Bridge from rig-core's `CompletionModel` to our `LlmProvider` trait.
//!
//! All rig-specific message shuffling lives here so the rest of the crate
//! only sees provider-agnostic types.

use async_trait::async_trait;

use rig::OneOrMany;
use rig::completion::{CompletionModel, ToolDefinition as RigToolDefinition};
use rig::message::{AssistantContent, Message, ToolResultContent, UserContent};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse, ToolDefinition,
};

/// Adapter exposing a rig `CompletionModel` as an `LlmProvider`.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }

    fn request_error(&self, reason: impl std::fmt::Display) -> LlmError {
        LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: reason.to_string(),
        }
    }

    fn invalid_response(&self, reason: impl Into<String>) -> LlmError {
        LlmError::InvalidResponse {
            provider: self.model_name.clone(),
            reason: reason.into(),
        }
    }

    /// Split our history into (preamble, rig messages).
    ///
    /// System messages become the preamble; everything else maps onto rig's
    /// user/assistant message shapes, with tool results as user-side
    /// `ToolResult` content so the provider can pair them with calls.
    fn convert_history(
        &self,
        messages: &[ChatMessage],
    ) -> Result<(Option<String>, Vec<Message>), LlmError> {
        let mut preamble_parts: Vec<&str> = Vec::new();
        let mut converted: Vec<Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => preamble_parts.push(&msg.content),
                Role::User => converted.push(Message::user(msg.content.clone())),
                Role::Assistant => {
                    if msg.tool_calls.is_empty() {
                        converted.push(Message::assistant(msg.content.clone()));
                    } else {
                        let mut content: Vec<AssistantContent> = Vec::new();
                        if !msg.content.is_empty() {
                            content.push(AssistantContent::text(msg.content.clone()));
                        }
                        for call in &msg.tool_calls {
                            content.push(AssistantContent::tool_call(
                                call.id.clone(),
                                call.name.clone(),
                                call.arguments.clone(),
                            ));
                        }
                        let content = OneOrMany::many(content)
                            .map_err(|_| self.invalid_response("assistant message with no content"))?;
                        converted.push(Message::Assistant { id: None, content });
                    }
                }
                Role::Tool => {
                    let call_id = msg.tool_call_id.clone().ok_or_else(|| {
                        self.invalid_response("tool result message without a call id")
                    })?;
                    let result = UserContent::tool_result(
                        call_id,
                        OneOrMany::one(ToolResultContent::text(msg.content.clone())),
                    );
                    converted.push(Message::User {
                        content: OneOrMany::one(result),
                    });
                }
            }
        }

        let preamble = if preamble_parts.is_empty() {
            None
        } else {
            Some(preamble_parts.join("\n\n"))
        };
        Ok((preamble, converted))
    }

    async fn run(
        &self,
        messages: &[ChatMessage],
        tools: Vec<ToolDefinition>,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let (preamble, mut converted) = self.convert_history(messages)?;
        let prompt = converted
            .pop()
            .ok_or_else(|| self.invalid_response("empty message history"))?;

        let mut builder = self.model.completion_request(prompt).messages(converted);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        let rig_tools: Vec<RigToolDefinition> = tools
            .into_iter()
            .map(|t| RigToolDefinition {
                name: t.name,
                description: t.description,
                parameters: t.parameters,
            })
            .collect();
        if !rig_tools.is_empty() {
            builder = builder.tools(rig_tools);
        }

        let response = self
            .model
            .completion(builder.build())
            .await
            .map_err(|e| self.request_error(e))?;

        let mut text_parts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        for item in response.choice.iter() {
            match item {
                AssistantContent::Text(text) => text_parts.push(text.text.clone()),
                AssistantContent::ToolCall(call) => tool_calls.push(ToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                }),
                _ => {}
            }
        }

        let content = if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        };

        Ok(ToolCompletionResponse {
            content,
            tool_calls,
            input_tokens: response.usage.input_tokens as u32,
            output_tokens: response.usage.output_tokens as u32,
        })
    }
}

#[async_trait]
impl<M: CompletionModel> LlmProvider for RigAdapter<M> {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self.run(&request.messages, Vec::new()).await?;
        Ok(CompletionResponse {
            content: response.content.unwrap_or_default(),
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        })
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        self.run(&request.messages, request.tools).await
    }
}
