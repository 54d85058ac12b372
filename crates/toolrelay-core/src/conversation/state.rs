//! Conversation state and the loop's state machine

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ChatMessage, QualifiedName, Tool, ToolCall};

/// History of one top-level request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// System message first, then user, then rounds of assistant and tool messages
    pub messages: Vec<ChatMessage>,
    /// Signatures fixed at conversation start; `None` when no tool exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool-call rounds performed so far
    #[serde(default)]
    pub rounds: u32,
}

impl Conversation {
    pub fn new(system_prompt: &str, user_text: &str, tools: Option<Vec<Tool>>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_text)],
            tools,
            rounds: 0,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Where the loop is
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// Next step is a model call with the full history
    AwaitingModel,
    /// Tool calls of the current round still to run, in emitted order
    DispatchingTools { queue: VecDeque<ToolCall> },
    /// Final answer
    Done(String),
}

/// A conversation suspended before a tool that needs confirmation
///
/// The caller holds this value and hands it back to
/// `ConversationLoop::resume` with a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub conversation: Conversation,
    /// The call awaiting confirmation
    pub call: ToolCall,
    #[serde(rename = "serverName")]
    pub server_name: String,
    #[serde(rename = "toolName")]
    pub tool_name: String,
    /// Arguments as they will be sent, after sanitizing
    pub arguments: Value,
    /// Calls of the same round after this one
    #[serde(default)]
    pub remaining: VecDeque<ToolCall>,
}

impl PendingApproval {
    /// `server.tool` of the call awaiting confirmation
    pub fn qualified_name(&self) -> String {
        self.target().to_string()
    }

    pub fn target(&self) -> QualifiedName {
        QualifiedName {
            server: self.server_name.clone(),
            tool: self.tool_name.clone(),
        }
    }
}

/// The user's answer to a `PendingApproval`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approve,
    Deny,
}

/// Result of driving a conversation
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// The model's final answer
    Answer(String),
    /// A tool call is waiting for confirmation
    ApprovalRequired(PendingApproval),
}

impl ChatOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            ChatOutcome::Answer(text) => Some(text),
            ChatOutcome::ApprovalRequired(_) => None,
        }
    }
}
