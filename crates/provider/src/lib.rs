//! Model provider network
//!
//! Function-calling model access: request/response types shared by the
//! orchestration loop and the HTTP client that speaks to the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use thiserror::Error;
use tracing::{debug, trace};

pub mod gemini;

pub use gemini::GeminiProvider;

/// Model provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("no api key configured")]
    NoApiKey,

    #[error("invalid response")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Function-call request emitted by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Tool result handed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

impl FunctionResponse {
    /// Wraps a result string as `{"result": text}`
    pub fn result(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: serde_json::json!({ "result": text.into() }),
        }
    }
}

/// One element of a content's part sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Part::FunctionCall {
            function_call: FunctionCall::new(name, args),
        }
    }

    pub fn function_response(name: impl Into<String>, result: impl Into<String>) -> Self {
        Part::FunctionResponse {
            function_response: FunctionResponse::result(name, result),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            Part::FunctionCall { function_call } => Some(function_call),
            _ => None,
        }
    }
}

/// A role-tagged entry of the context window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: "model".to_string(),
            parts,
        }
    }
}

/// Function declaration advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// Absent for tools without parameters: an object schema with empty
    /// `properties` is rejected by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl FunctionDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Some(parameters),
        }
    }

    /// Declaration of a tool that takes no arguments
    pub fn without_parameters(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }
}

/// Generation request
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub tools: Vec<FunctionDeclaration>,
}

/// Token accounting reported by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub candidates_tokens: u32,
    pub total_tokens: u32,
}

/// One generated candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl Candidate {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            parts,
            finish_reason: None,
        }
    }

    /// First function-call part, if any. Further calls in the same
    /// candidate are never dispatched.
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.parts.iter().find_map(Part::as_function_call)
    }

    /// All text parts concatenated in order
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

/// Generation response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage: Usage,
}

impl GenerateResponse {
    /// Single-candidate response
    pub fn single(parts: Vec<Part>) -> Self {
        Self {
            candidates: vec![Candidate::new(parts)],
            usage: Usage::default(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::single(vec![Part::text(text)])
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self::single(vec![Part::function_call(name, args)])
    }

    /// Response carrying no candidate at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn first_candidate(&self) -> Option<&Candidate> {
        let candidate = self.candidates.first();
        if candidate.is_none() {
            trace!("response carried no candidates");
        } else if self.candidates.len() > 1 {
            debug!(
                "response carried {} candidates, using the first",
                self.candidates.len()
            );
        }
        candidate
    }
}

/// Model generation capability
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}
