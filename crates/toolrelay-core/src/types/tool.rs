//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::InputSchema;
use crate::tools::ToolError;

/// Separator between server and tool name in a qualified tool name
pub const QUALIFIED_SEPARATOR: char = '.';

/// Tool definition for function calling (what the model sees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (qualified `server.tool`)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// A tool discovered on a connected server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Name the server is registered under
    #[serde(rename = "serverName")]
    pub server_name: String,
    /// Tool name as reported by the server
    #[serde(rename = "toolName")]
    pub tool_name: String,
    /// Human readable description
    pub description: String,
    /// Declared input schema
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema,
}

impl ToolDescriptor {
    /// `server.tool`, unique across all connected servers
    pub fn qualified_name(&self) -> String {
        format!("{}{}{}", self.server_name, QUALIFIED_SEPARATOR, self.tool_name)
    }

    /// Function signature to hand to the model
    pub fn to_signature(&self) -> Tool {
        Tool::new(self.qualified_name(), self.description.clone())
            .with_schema(self.input_schema.to_value())
    }
}

impl From<&ToolDescriptor> for Tool {
    fn from(descriptor: &ToolDescriptor) -> Self {
        descriptor.to_signature()
    }
}

/// A qualified tool name split into its server and tool parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub server: String,
    pub tool: String,
}

impl QualifiedName {
    /// Split on the first separator; both sides must be non-empty
    pub fn parse(name: &str) -> Result<Self, ToolError> {
        match name.split_once(QUALIFIED_SEPARATOR) {
            Some((server, tool)) if !server.is_empty() && !tool.is_empty() => Ok(Self {
                server: server.to_string(),
                tool: tool.to_string(),
            }),
            _ => Err(ToolError::MalformedToolCall(name.to_string())),
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.server, QUALIFIED_SEPARATOR, self.tool)
    }
}

/// Tool call from the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Qualified name of the tool being called
    pub name: String,
    /// Arguments exactly as emitted by the model
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Parse the qualified name of this call
    pub fn target(&self) -> Result<QualifiedName, ToolError> {
        QualifiedName::parse(&self.name)
    }
}

/// One typed part of a structured tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Json {
        json: Value,
    },
    /// Any other part (image, resource, ...) kept as reported
    #[serde(untagged)]
    Other(Value),
}

impl ToolContent {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        ToolContent::Text { text: text.into() }
    }

    /// Create a json part
    pub fn json(json: Value) -> Self {
        ToolContent::Json { json }
    }
}

/// Result of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutput {
    /// Ordered list of typed parts
    Content(Vec<ToolContent>),
    /// Arbitrary value
    Value(Value),
}

impl ToolOutput {
    /// Single text part result
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Content(vec![ToolContent::text(text)])
    }

    /// Reduce to the string placed in a tool message.
    ///
    /// The first part of a non-empty content list wins when it is text
    /// (verbatim) or json (serialized). Everything else serializes the
    /// whole result.
    pub fn reduce(&self) -> String {
        if let ToolOutput::Content(parts) = self {
            match parts.first() {
                Some(ToolContent::Text { text }) => return text.clone(),
                Some(ToolContent::Json { json }) => return json.to_string(),
                _ => {}
            }
        }
        serde_json::to_string(self).unwrap_or_default()
    }
}
