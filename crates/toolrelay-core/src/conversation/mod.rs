//! The conversation loop
//!
//! `ConversationLoop` answers one user message by alternating model calls
//! and tool rounds until the model replies without tool calls.
//!
//! ```text
//! AwaitingModel ──reply with calls──► DispatchingTools ──queue empty──► AwaitingModel
//!       │                                   │
//!       └──reply without calls──► Done      └──flagged tool──► ApprovalRequired (returned)
//! ```

mod engine;
mod error;
mod prompt;
mod state;

pub use engine::ConversationLoop;
pub use error::{ChatError, ChatResult};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use state::{ApprovalDecision, ChatOutcome, Conversation, LoopState, PendingApproval};
