use serde::Deserialize;
use serde_json::{Value, json};

use crate::llm::provider::{ToolCallRequest, ToolDescriptor, Turn};
use crate::notify::Notify;

/// The fixed set of tools advertised to the model on every round-trip.
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "record_user_details".to_string(),
            description: "Use this tool to record that a user is interested in being in touch \
                          and provided an email address"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "The email address of this user"
                    },
                    "name": {
                        "type": "string",
                        "description": "The user's name, if they provided it"
                    },
                    "notes": {
                        "type": "string",
                        "description": "Any additional information about the conversation"
                    }
                },
                "required": ["email"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "record_unknown_question".to_string(),
            description: "Always use this tool to record any question that couldn't be answered"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question that couldn't be answered"
                    }
                },
                "required": ["question"],
                "additionalProperties": false
            }),
        },
    ]
}

/// Name-to-callable dispatch over the registered tools. Tool names and
/// argument payloads come from model output and are only partially
/// trusted: nothing in here may abort the conversation turn.
#[derive(Debug, Clone)]
pub struct ToolRegistry<N> {
    notifier: N,
}

impl<N: Notify> ToolRegistry<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    /// Invoke every requested call in order, producing one paired tool
    /// turn per request. Order is preserved because the model correlates
    /// results to requests by `tool_call_id`.
    pub async fn dispatch(&self, calls: &[ToolCallRequest]) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(calls.len());
        for call in calls {
            let result = self.dispatch_one(call).await;
            turns.push(Turn::tool(call.id.clone(), result.to_string()));
        }
        turns
    }

    async fn dispatch_one(&self, call: &ToolCallRequest) -> Value {
        match call.name.as_str() {
            "record_user_details" => self.record_user_details(&call.arguments).await,
            "record_unknown_question" => self.record_unknown_question(&call.arguments).await,
            // Unregistered names resolve to an inert empty result.
            _ => json!({}),
        }
    }

    async fn record_user_details(&self, arguments: &str) -> Value {
        let args: UserDetailsArgs = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(err) => return invalid_args(&err),
        };

        self.notifier
            .push(&format!(
                "Recording {} with email {} and notes {}",
                args.name, args.email, args.notes
            ))
            .await;
        json!({"recorded": "ok"})
    }

    async fn record_unknown_question(&self, arguments: &str) -> Value {
        let args: UnknownQuestionArgs = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(err) => return invalid_args(&err),
        };

        self.notifier
            .push(&format!("Recording {}", args.question))
            .await;
        json!({"recorded": "ok"})
    }
}

fn invalid_args(err: &serde_json::Error) -> Value {
    json!({"error": format!("invalid arguments: {err}")})
}

#[derive(Debug, Deserialize)]
struct UserDetailsArgs {
    email: String,
    #[serde(default = "default_name")]
    name: String,
    #[serde(default = "default_notes")]
    notes: String,
}

#[derive(Debug, Deserialize)]
struct UnknownQuestionArgs {
    question: String,
}

fn default_name() -> String {
    "Name not provided".to_string()
}

fn default_notes() -> String {
    "not provided".to_string()
}
