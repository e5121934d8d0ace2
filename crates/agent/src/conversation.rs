//! Conversation state
//!
//! The ordered turns sent verbatim as the model's context. A tool call is
//! only ever recorded together with its result, so the model never sees a
//! call without the matching result.

use serde_json::Value;

use toolbridge_provider::{Content, Part};

/// One unit of conversation history
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    UserText { text: String },
    ModelText { text: String },
    ModelToolCall { name: String, args: Value },
    ToolResult { name: String, result_text: String },
}

impl Turn {
    /// Role on the wire: tool results travel as `user` content
    pub fn role(&self) -> &'static str {
        match self {
            Turn::UserText { .. } | Turn::ToolResult { .. } => "user",
            Turn::ModelText { .. } | Turn::ModelToolCall { .. } => "model",
        }
    }

    pub fn to_content(&self) -> Content {
        let part = match self {
            Turn::UserText { text } | Turn::ModelText { text } => Part::text(text.clone()),
            Turn::ModelToolCall { name, args } => Part::function_call(name.clone(), args.clone()),
            Turn::ToolResult { name, result_text } => {
                Part::function_response(name.clone(), result_text.clone())
            }
        };

        Content {
            role: self.role().to_string(),
            parts: vec![part],
        }
    }
}

/// Append-only sequence of turns owned by a single query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation seeded with the user's query
    pub fn with_query(query: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push_user(query);
        conversation
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::UserText { text: text.into() });
    }

    pub fn push_model_text(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::ModelText { text: text.into() });
    }

    /// Record a dispatched call and its result as one adjacent pair
    pub fn push_tool_exchange(
        &mut self,
        name: impl Into<String>,
        args: Value,
        result_text: impl Into<String>,
    ) {
        let name = name.into();
        self.turns.push(Turn::ModelToolCall {
            name: name.clone(),
            args,
        });
        self.turns.push(Turn::ToolResult {
            name,
            result_text: result_text.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of tool calls recorded
    pub fn tool_calls(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, Turn::ModelToolCall { .. }))
            .count()
    }

    /// Every tool call is immediately followed by a result for the same tool
    pub fn is_consistent(&self) -> bool {
        self.turns.iter().enumerate().all(|(i, turn)| match turn {
            Turn::ModelToolCall { name, .. } => matches!(
                self.turns.get(i + 1),
                Some(Turn::ToolResult { name: result_name, .. }) if result_name == name
            ),
            Turn::ToolResult { name, .. } => matches!(
                i.checked_sub(1).and_then(|prev| self.turns.get(prev)),
                Some(Turn::ModelToolCall { name: call_name, .. }) if call_name == name
            ),
            _ => true,
        })
    }

    /// Context window in the model's wire format
    pub fn to_contents(&self) -> Vec<Content> {
        self.turns.iter().map(Turn::to_content).collect()
    }
}
