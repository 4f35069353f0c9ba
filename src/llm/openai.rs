use serde::{Deserialize, Serialize};

use super::provider::{
    ChatInput, ChatOutput, ChatProvider, LlmError, LlmResult, ToolCallRequest, Turn, TurnRole,
};
use crate::http::client::HttpClient;

/// Chat Completions provider. Speaks the `/v1/chat/completions` wire
/// format: tools go out as `function` declarations, tool invocations come
/// back on `choices[0].message.tool_calls`.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(
        http: HttpClient,
        api_key: Option<String>,
        model: String,
        base_url: String,
    ) -> LlmResult<Self> {
        let api_key = api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, input: &ChatInput) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: input.turns.iter().map(wire_message).collect(),
            tools: input
                .tools
                .iter()
                .map(|tool| WireTool {
                    kind: "function".to_string(),
                    function: WireFunctionDecl {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect(),
        }
    }

    fn extract_output(resp: ChatCompletionResponse) -> LlmResult<ChatOutput> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        let text = choice
            .message
            .content
            .unwrap_or_default()
            .trim()
            .to_string();

        if text.is_empty() && tool_calls.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(ChatOutput { text, tool_calls })
    }
}

impl ChatProvider for OpenAiProvider {
    async fn complete(&self, input: ChatInput) -> LlmResult<ChatOutput> {
        let payload = self.build_request(&input);
        let resp = self
            .http
            .post_json(&self.endpoint(), Some(&self.api_key), &payload)
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !(200..300).contains(&resp.status) {
            let body = resp.body.chars().take(400).collect::<String>();
            return Err(LlmError::HttpStatus {
                status: resp.status,
                body,
            });
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&resp.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        Self::extract_output(parsed)
    }
}

fn wire_message(turn: &Turn) -> WireMessage {
    let role = match turn.role {
        TurnRole::System => "system",
        TurnRole::User => "user",
        TurnRole::Assistant => "assistant",
        TurnRole::Tool => "tool",
    };

    let tool_calls = if turn.tool_calls.is_empty() {
        None
    } else {
        Some(
            turn.tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    kind: "function".to_string(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
        )
    };

    // Assistant turns that only carry tool calls go out with null content.
    let content = if turn.content.is_empty() && tool_calls.is_some() {
        None
    } else {
        Some(turn.content.clone())
    };

    WireMessage {
        role: role.to_string(),
        content,
        tool_calls,
        tool_call_id: turn.tool_call_id.clone(),
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionDecl,
}

#[derive(Debug, Serialize)]
struct WireFunctionDecl {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}
