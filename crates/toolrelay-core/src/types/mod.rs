//! Core types for tool-calling conversations
//!
//! This module contains the shared types used by the providers, the tool
//! directory and the conversation loop.

mod message;
mod tool;
pub mod schema;

pub use message::{ChatMessage, MessageRole};
pub use schema::{InputSchema, SchemaViolation, ValueKind};
pub use tool::{
    QualifiedName, Tool, ToolCall, ToolContent, ToolDescriptor, ToolOutput, QUALIFIED_SEPARATOR,
};
