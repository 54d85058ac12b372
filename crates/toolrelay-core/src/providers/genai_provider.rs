//! GenaiProvider - Unified provider using the genai crate
//!
//! Handles all genai-supported providers (OpenAI, Anthropic, Gemini, Ollama,
//! ...) as well as OpenAI-compatible endpoints (Azure, OpenRouter, Mistral,
//! Red Hat AI) via the ServiceTargetResolver.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use genai::chat::{ChatRequest, ChatStreamEvent};

use crate::logging::Logger;
use crate::types::ChatMessage;

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_tool_call, is_genai_supported, to_genai_messages, to_genai_options,
    to_genai_tools, ProviderConfig,
};
use super::traits::{ChatOptions, Provider, ProviderModelConfig};

/// Unified provider using genai for all supported LLM APIs
pub struct GenaiProvider {
    /// Provider identifier
    provider_id: String,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    pub fn new(provider_id: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider_id: provider_id.into(),
            logger,
        }
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider_id: &str) -> bool {
        is_genai_supported(provider_id)
    }

    /// Model id as the API expects it.
    ///
    /// Only a leading `<provider>/` naming this provider is dropped; other
    /// slashes belong to the id (`meta-llama/llama-3.1-8b-instruct`).
    pub fn model_name<'a>(&self, model: &'a str) -> &'a str {
        model
            .split_once('/')
            .filter(|(prefix, _)| prefix.eq_ignore_ascii_case(&self.provider_id))
            .map_or(model, |(_, name)| name)
    }

    fn api_error(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::api_error(self.provider_id.clone(), 500, message)
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model_config: ProviderModelConfig,
        options: ChatOptions,
    ) -> ProviderResult<ChatMessage> {
        self.logger.debug(&format!(
            "[GenaiProvider] chat called: provider={}, model={}, messages={}, tools={}",
            self.provider_id,
            model_config.model,
            messages.len(),
            options.tools.as_ref().map_or(0, Vec::len)
        ));

        let client = create_client(&ProviderConfig::new(self.provider_id.clone(), &model_config));

        let mut chat_req = ChatRequest::new(to_genai_messages(messages)?);
        if let Some(tools) = &options.tools {
            chat_req = chat_req.with_tools(to_genai_tools(tools.clone()));
        }

        let genai_options = to_genai_options(&options);
        let model_name = self.model_name(&model_config.model);

        let chat_stream = client
            .exec_chat_stream(model_name, chat_req, Some(&genai_options))
            .await
            .map_err(|e| self.api_error(e.to_string()))?;

        // Accumulate the stream into one assistant message
        let mut content = String::new();
        let mut tool_calls = Vec::new();
        let mut stream = Box::pin(chat_stream.stream);

        while let Some(event) = stream.next().await {
            match event.map_err(|e| self.api_error(e.to_string()))? {
                ChatStreamEvent::Chunk(chunk) => content.push_str(&chunk.content),
                ChatStreamEvent::End(end) => {
                    if let Some(captured) = end.captured_tool_calls() {
                        tool_calls.extend(captured.iter().map(|tc| from_genai_tool_call(tc)));
                    }
                }
                _ => {}
            }
        }

        self.logger.debug(&format!(
            "[GenaiProvider] Response: {} chars, {} tool calls",
            content.len(),
            tool_calls.len()
        ));

        if tool_calls.is_empty() {
            Ok(ChatMessage::assistant(content))
        } else {
            Ok(ChatMessage::assistant_with_tools(content, tool_calls))
        }
    }
}
