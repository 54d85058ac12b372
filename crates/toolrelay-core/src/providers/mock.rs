//! Mock provider for testing
//!
//! Provides deterministic, configurable responses without network
//! dependencies, and records every request it receives.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::types::{ChatMessage, MessageRole};

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed text response
    Fixed(String),
    /// Return the queued replies in order, failing once exhausted
    Scripted(VecDeque<ChatMessage>),
    /// Return the same reply forever
    Repeat(ChatMessage),
    /// Fail every request
    Error(String),
}

/// Configuration for the mock provider
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Delay before each reply in milliseconds (0 = no delay)
    pub delay_ms: u64,
}

/// A request as the mock saw it
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub messages: Vec<ChatMessage>,
    pub model: ProviderModelConfig,
    pub options: ChatOptions,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    config: Mutex<MockConfig>,
    requests: Mutex<Vec<MockRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a new mock provider with default config (echo)
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config: Mutex::new(config),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig { mode, delay_ms: 0 }, logger)
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create a provider replaying `replies` in order
    pub fn scripted(replies: impl IntoIterator<Item = ChatMessage>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Scripted(replies.into_iter().collect()), logger)
    }

    /// Create a provider giving the same reply to every request
    pub fn repeat(reply: ChatMessage, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Repeat(reply), logger)
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Error(message.into()), logger)
    }

    /// Set reply delay
    pub fn with_delay(self, delay_ms: u64) -> Self {
        self.config.lock().delay_ms = delay_ms;
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_user_message(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }

    fn next_reply(&self, messages: &[ChatMessage]) -> ProviderResult<ChatMessage> {
        let mut config = self.config.lock();
        match &mut config.mode {
            MockMode::Echo => Ok(ChatMessage::assistant(format!(
                "Echo: {}",
                Self::last_user_message(messages)
            ))),
            MockMode::Fixed(response) => Ok(ChatMessage::assistant(response.clone())),
            MockMode::Scripted(replies) => replies
                .pop_front()
                .ok_or_else(|| ProviderError::invalid_response("mock", "script exhausted")),
            MockMode::Repeat(reply) => Ok(reply.clone()),
            MockMode::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: ChatOptions,
    ) -> ProviderResult<ChatMessage> {
        self.logger.debug(&format!(
            "[MockProvider] chat called with {} messages",
            messages.len()
        ));

        let reply = self.next_reply(&messages);
        self.requests.lock().push(MockRequest {
            messages,
            model,
            options,
        });

        let delay_ms = self.config.lock().delay_ms;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        reply
    }
}
