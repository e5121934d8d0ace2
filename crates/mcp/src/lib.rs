//! Tool execution over the Model Context Protocol
//!
//! The [`ToolServer`] capability lists and invokes remote tools. [`McpClient`]
//! implements it over a spawned stdio subprocess.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod stdio;

pub use stdio::{McpClient, PROTOCOL_VERSION};

/// Tool server errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("failed to spawn tool server '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tool server transport error: {0}")]
    Transport(String),

    #[error("tool server returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("tool server returned JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("tool server terminated unexpectedly")]
    Terminated,

    #[error("invalid response from tool server: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, McpError>;

/// Entry of the `tools/list` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

impl RemoteTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }
}

/// Content block of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// Response of `tools/call`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(
        rename = "structuredContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content: Option<Value>,
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            ..Default::default()
        }
    }

    pub fn structured(value: Value) -> Self {
        Self {
            structured_content: Some(value),
            ..Default::default()
        }
    }
}

/// Tool listing and invocation capability
#[async_trait]
pub trait ToolServer: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<RemoteTool>>;
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_tool_deserialization() {
        let tool: RemoteTool = serde_json::from_value(json!({
            "name": "calculator",
            "description": "Basic arithmetic",
            "inputSchema": {"type": "object", "properties": {"a": {"type": "number"}}}
        }))
        .unwrap();

        assert_eq!(tool.name, "calculator");
        assert_eq!(tool.description.as_deref(), Some("Basic arithmetic"));
        assert_eq!(tool.input_schema["properties"]["a"]["type"], "number");
    }

    #[test]
    fn test_remote_tool_without_description_or_schema() {
        let tool: RemoteTool = serde_json::from_value(json!({"name": "ping"})).unwrap();
        assert!(tool.description.is_none());
        assert!(tool.input_schema.is_null());
    }

    #[test]
    fn test_call_tool_result_deserialization() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "4"}],
            "structuredContent": {"value": 4},
            "isError": false
        }))
        .unwrap();

        assert_eq!(result.content[0].kind, "text");
        assert_eq!(result.content[0].text.as_deref(), Some("4"));
        assert_eq!(result.structured_content, Some(json!({"value": 4})));
        assert_eq!(result.is_error, Some(false));
    }

    #[test]
    fn test_call_tool_result_null_structured_content() {
        let result: CallToolResult =
            serde_json::from_value(json!({"content": [], "structuredContent": null})).unwrap();
        assert!(result.structured_content.is_none());
    }

    #[test]
    fn test_call_tool_result_serialization_skips_absent_fields() {
        let value = serde_json::to_value(CallToolResult::text("ok")).unwrap();
        assert_eq!(value, json!({"content": [{"type": "text", "text": "ok"}]}));
    }

    #[test]
    fn test_error_display() {
        let err = McpError::Rpc {
            code: -32602,
            message: "Unknown tool".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "tool server returned JSON-RPC error -32602: Unknown tool"
        );
        assert_eq!(
            McpError::Terminated.to_string(),
            "tool server terminated unexpectedly"
        );
    }
}
