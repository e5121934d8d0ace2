//! Gemini node
//!
//! Google Generative Language `generateContent` access with function calling.

use crate::*;
use reqwest::Client;
use serde_json::json;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini provider
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_base = api_base
            .filter(|base| !base.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let default_model = default_model
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            default_model,
        }
    }

    fn model_url(&self, model: &str) -> String {
        let model = if model.is_empty() {
            self.default_model.as_str()
        } else {
            model
        };
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    fn build_request(&self, request: &GenerateRequest) -> serde_json::Value {
        let mut body = json!({
            "contents": request.contents,
        });

        if !request.tools.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": request.tools }]);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<GenerateResponse> {
        if !json.is_object() {
            return Err(ProviderError::InvalidResponse);
        }

        let mut candidates = Vec::new();
        if let Some(items) = json["candidates"].as_array() {
            for item in items {
                let mut parts = Vec::new();
                if let Some(raw_parts) = item["content"]["parts"].as_array() {
                    for raw in raw_parts {
                        if let Some(call) = raw.get("functionCall") {
                            let name = call["name"].as_str().unwrap_or("").to_string();
                            let args = match call.get("args") {
                                Some(args) if !args.is_null() => args.clone(),
                                _ => json!({}),
                            };
                            parts.push(Part::function_call(name, args));
                        } else if let Some(text) = raw["text"].as_str() {
                            parts.push(Part::text(text));
                        } else {
                            trace!("skipping unsupported part: {}", raw);
                        }
                    }
                }

                candidates.push(Candidate {
                    parts,
                    finish_reason: item["finishReason"].as_str().map(|s| s.to_string()),
                });
            }
        }

        let usage = if let Some(usage) = json["usageMetadata"].as_object() {
            let count = |key: &str| usage.get(key).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            Usage {
                prompt_tokens: count("promptTokenCount"),
                candidates_tokens: count("candidatesTokenCount"),
                total_tokens: count("totalTokenCount"),
            }
        } else {
            Usage::default()
        };

        Ok(GenerateResponse { candidates, usage })
    }
}

#[async_trait::async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        let url = self.model_url(&request.model);
        trace!("sending generateContent to {}", url);

        let body = self.build_request(&request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ProviderError::Api(error_message(status, &body)));
        }

        let json: serde_json::Value = response.json().await?;
        let parsed = self.parse_response(json)?;
        debug!(
            "generateContent returned {} candidate(s), {} total tokens",
            parsed.candidates.len(),
            parsed.usage.total_tokens
        );

        Ok(parsed)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// `error.message` from a JSON error body, else the status and raw body
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{}: {}", status, body.trim()))
}
