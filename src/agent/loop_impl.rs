use std::time::Duration;

use tokio::time::timeout;

use crate::agent::dispatch::{ToolRegistry, tool_descriptors};
use crate::agent::persona::Persona;
use crate::llm::provider::{ChatInput, ChatProvider, LlmError, LlmResult, Turn};
use crate::notify::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Hard bound on model round-trips per user turn. The model decides
    /// when to stop requesting tools, so the loop needs its own cap.
    pub max_round_trips: usize,
    pub request_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_round_trips: 5,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReply {
    pub text: String,
    /// Set when the reply is a fallback rather than a model answer.
    pub degraded: bool,
}

const EXHAUSTED_REPLY: &str =
    "I wasn't able to finish working through that one. Could you rephrase the question or ask me again?";

/// Run one conversation turn: build the working transcript, call the model,
/// execute any requested tools in order, and repeat until the model
/// produces a final text reply or the round-trip budget runs out.
///
/// Model-call failures (including timeout) are fatal to the turn and
/// propagate; tool dispatch never is. Tool side effects already executed
/// before a failure are not rolled back.
pub async fn respond<P: ChatProvider, N: Notify>(
    provider: &P,
    registry: &ToolRegistry<N>,
    persona: &Persona,
    history: &[Turn],
    user_message: &str,
    config: &EngineConfig,
) -> LlmResult<EngineReply> {
    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(Turn::system(persona.render_system_instruction()));
    turns.extend_from_slice(history);
    turns.push(Turn::user(user_message));

    let tools = tool_descriptors();
    let per_request = Duration::from_millis(config.request_timeout_ms);

    for _ in 0..config.max_round_trips {
        let request = ChatInput {
            turns: turns.clone(),
            tools: tools.clone(),
        };

        let output = match timeout(per_request, provider.complete(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(LlmError::Timeout),
        };

        if output.tool_calls.is_empty() {
            if output.text.is_empty() {
                return Err(LlmError::EmptyResponse);
            }
            return Ok(EngineReply {
                text: output.text,
                degraded: false,
            });
        }

        // Every requested call runs exactly once, synchronously and in
        // order, before the next model call goes out.
        let calls = output.tool_calls;
        turns.push(Turn::assistant_with_calls(output.text, calls.clone()));
        let results = registry.dispatch(&calls).await;
        turns.extend(results);
    }

    Ok(EngineReply {
        text: EXHAUSTED_REPLY.to_string(),
        degraded: true,
    })
}
