//! Agent loop - core processing engine
//!
//! Strict ping-pong between the model and the tool server: generate, and if
//! the model asked for a tool, dispatch that single call, record the pair,
//! and generate again. Every outcome, including failures, resolves to text.

use std::sync::Arc;
use tracing::{debug, info, warn};

use toolbridge_mcp::{CallToolResult, ToolServer};
use toolbridge_provider::{GenerateRequest, Provider};

use crate::catalog::ToolCatalog;
use crate::conversation::Conversation;

/// Generation calls allowed per query
pub const MAX_ITERATIONS: u32 = 10;

pub const NO_RESPONSE_MESSAGE: &str = "No response generated";
pub const EMPTY_RESPONSE_MESSAGE: &str = "Empty response";
pub const ITERATION_LIMIT_MESSAGE: &str = "Iteration limit reached";

/// Why a query stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model answered with text
    Answered,
    /// The model call failed or produced no candidate
    NoResponse,
    /// The tool server failed to execute the requested call
    DispatchFailed,
    /// Every allowed generation ended in a tool call
    IterationLimit,
}

/// Per-query iteration counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopState {
    pub iteration: u32,
    pub max_iterations: u32,
}

impl LoopState {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            iteration: 0,
            max_iterations,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    fn advance(&mut self) {
        self.iteration += 1;
    }
}

/// Result of one query, with the conversation that produced it
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: String,
    pub stop: StopReason,
    pub iterations: u32,
    pub conversation: Conversation,
}

/// The agent loop answers queries against a shared tool catalog
pub struct AgentLoop<P: Provider, S: ToolServer> {
    provider: Arc<P>,
    tools: Arc<S>,
    catalog: Arc<ToolCatalog>,
    model: String,
}

impl<P: Provider, S: ToolServer> AgentLoop<P, S> {
    pub fn new(
        provider: Arc<P>,
        tools: Arc<S>,
        catalog: Arc<ToolCatalog>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            catalog,
            model: model.into(),
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer a query. Never fails: errors come back as text.
    pub async fn run(&self, query: &str) -> String {
        self.process(query).await.answer
    }

    /// Answer a query and report how it ended
    pub async fn process(&self, query: &str) -> QueryOutcome {
        info!("Processing query ({} chars)", query.len());
        debug!("Query: {}", query.chars().take(100).collect::<String>());

        let mut conversation = Conversation::with_query(query);
        let mut state = LoopState::new(MAX_ITERATIONS);
        let declarations = self.catalog.declarations();

        while !state.exhausted() {
            state.advance();
            debug!("Agent iteration {}/{}", state.iteration, state.max_iterations);

            let request = GenerateRequest {
                model: self.model.clone(),
                contents: conversation.to_contents(),
                tools: declarations.clone(),
            };

            let response = match self.provider.generate(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Generation failed: {}", e);
                    let stop = StopReason::NoResponse;
                    return finish(conversation, state, stop, NO_RESPONSE_MESSAGE);
                }
            };

            let Some(candidate) = response.first_candidate() else {
                return finish(conversation, state, StopReason::NoResponse, NO_RESPONSE_MESSAGE);
            };
            debug!("Model returned {} part(s)", candidate.parts.len());

            let Some(call) = candidate.function_call().cloned() else {
                let text = candidate.text();
                if text.is_empty() {
                    let stop = StopReason::Answered;
                    return finish(conversation, state, stop, EMPTY_RESPONSE_MESSAGE);
                }
                conversation.push_model_text(text.clone());
                return finish(conversation, state, StopReason::Answered, text);
            };

            info!("Calling tool: {} {}", call.name, call.args);

            match self.tools.call_tool(&call.name, call.args.clone()).await {
                Ok(result) => {
                    if result.is_error == Some(true) {
                        debug!("Tool {} reported an error result", call.name);
                    }
                    let text = result_text(&result);
                    debug!("Tool result: {}", text);
                    conversation.push_tool_exchange(call.name, call.args, text);
                }
                Err(e) => {
                    warn!("Tool call {} failed: {}", call.name, e);
                    let message = format!("Error: {}", e);
                    return finish(conversation, state, StopReason::DispatchFailed, message);
                }
            }
        }

        warn!(
            "Iteration limit of {} reached without a final answer",
            state.max_iterations
        );
        finish(
            conversation,
            state,
            StopReason::IterationLimit,
            ITERATION_LIMIT_MESSAGE,
        )
    }
}

fn finish(
    conversation: Conversation,
    state: LoopState,
    stop: StopReason,
    answer: impl Into<String>,
) -> QueryOutcome {
    debug!("Query finished after {} iteration(s): {:?}", state.iteration, stop);
    QueryOutcome {
        answer: answer.into(),
        stop,
        iterations: state.iteration,
        conversation,
    }
}

/// Text handed back to the model for a tool result: the first content
/// block's text, else the structured content, else the whole result, as JSON.
pub fn result_text(result: &CallToolResult) -> String {
    if let Some(text) = result
        .content
        .first()
        .and_then(|block| block.text.as_deref())
        .filter(|text| !text.is_empty())
    {
        return text.to_string();
    }

    if let Some(structured) = &result.structured_content {
        return structured.to_string();
    }

    serde_json::to_string(result).unwrap_or_default()
}
