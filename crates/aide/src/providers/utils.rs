use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use super::base::{Completion, FinishReason, Usage};
use crate::errors::AgentError;
use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{FunctionCall, Tool};

/// Convert internal Message format to OpenAI's chat message specification,
/// using the `function_call` / `function` role shape of the functions API
pub fn messages_to_openai_format(messages: &[Message]) -> Vec<Value> {
    let mut openai_messages = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role
        });

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    // User and system text is sent even when empty
                    if !text.text.is_empty() || message.role != Role::Assistant {
                        converted["content"] = json!(text.text);
                    }
                }
                MessageContent::FunctionRequest(request) => match &request.function_call {
                    Ok(function_call) => {
                        converted["content"] = json!("");
                        converted["function_call"] = json!({
                            "name": function_call.name,
                            "arguments": function_call.arguments.to_string(),
                        });
                    }
                    Err(e) => {
                        // The functions API has no slot for a call without a name
                        converted["content"] = json!(format!("Error: {}", e));
                    }
                },
                MessageContent::FunctionResponse(response) => {
                    converted["name"] = json!(response.name);
                    converted["content"] = json!(response.result.to_string());
                }
            }
        }

        if converted.get("content").is_some() || converted.get("function_call").is_some() {
            openai_messages.push(converted);
        }
    }

    openai_messages
}

/// Convert internal Tool format to OpenAI's function specification
pub fn tools_to_openai_format(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate function name: {}", tool.name));
        }

        result.push(json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to a completion
pub fn openai_response_to_completion(response: &Value) -> Result<Completion> {
    let choice = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .ok_or_else(|| anyhow!("No choices in completion response"))?;
    let original = choice
        .get("message")
        .ok_or_else(|| anyhow!("No message in completion choice"))?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(|v| v.as_str()) {
        if !text.is_empty() {
            message = message.with_text(text);
        }
    }

    if let Some(function_call) = original.get("function_call") {
        let name = function_call["name"].as_str().unwrap_or_default();
        let arguments = function_call["arguments"].as_str().unwrap_or("{}");

        let request = if name.is_empty() {
            Err(AgentError::FunctionNotFound(
                "The model requested a function call without a name".to_string(),
            ))
        } else {
            serde_json::from_str::<Value>(arguments)
                .map(|arguments| FunctionCall::new(name, arguments))
                .map_err(|e| {
                    AgentError::InvalidArguments(format!(
                        "Could not interpret arguments for {}: {}",
                        name, e
                    ))
                })
        };
        message = message.with_function_request(request);
    }

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|v| v.as_str())
        .map(FinishReason::from)
        .unwrap_or_else(|| FinishReason::Other(String::new()));

    Ok(Completion::new(message, finish_reason).with_usage(openai_usage(response)))
}

/// Token usage of a response, empty when the endpoint does not report it
pub fn openai_usage(response: &Value) -> Usage {
    let Some(usage) = response.get("usage") else {
        return Usage::default();
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transcript::Transcript;

    const OPENAI_FUNCTION_CALL_RESPONSE: &str = r#"{
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "function_call": {
                    "name": "getMyEvents",
                    "arguments": "{\"getFutureEventsOnly\": true}"
                }
            },
            "finish_reason": "function_call"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 25,
            "total_tokens": 35
        }
    }"#;

    #[test]
    fn test_messages_to_openai_format() {
        let messages = vec![
            Message::system().with_text("You are a personal assistant."),
            Message::user().with_text("Hello"),
        ];
        let formatted = messages_to_openai_format(&messages);

        assert_eq!(formatted.len(), 2);
        assert_eq!(formatted[0]["role"], "system");
        assert_eq!(formatted[0]["content"], "You are a personal assistant.");
        assert_eq!(formatted[1]["role"], "user");
        assert_eq!(formatted[1]["content"], "Hello");
    }

    #[test]
    fn test_messages_to_openai_format_function_exchange() {
        let messages = vec![
            Message::user().with_text("What's next in my calendar?"),
            Message::assistant().with_function_request(Ok(FunctionCall::new(
                "getMyEvents",
                json!({"getFutureEventsOnly": true}),
            ))),
            Message::function().with_function_response("getMyEvents", json!([{"subject": "Standup"}])),
        ];

        let formatted = messages_to_openai_format(&messages);

        assert_eq!(formatted.len(), 3);
        assert_eq!(formatted[1]["role"], "assistant");
        assert_eq!(formatted[1]["content"], "");
        assert_eq!(formatted[1]["function_call"]["name"], "getMyEvents");
        assert_eq!(
            formatted[1]["function_call"]["arguments"],
            "{\"getFutureEventsOnly\":true}"
        );
        assert_eq!(formatted[2]["role"], "function");
        assert_eq!(formatted[2]["name"], "getMyEvents");
        assert_eq!(formatted[2]["content"], "[{\"subject\":\"Standup\"}]");
    }

    #[test]
    fn test_messages_to_openai_format_keeps_empty_user_text() {
        let transcript = Transcript::new("You are a personal assistant.", "");
        let formatted = messages_to_openai_format(transcript.messages());

        let roles: Vec<_> = formatted.iter().map(|m| m["role"].clone()).collect();
        assert_eq!(roles, vec![json!("system"), json!("user")]);
        assert_eq!(formatted[1]["content"], "");
    }

    #[test]
    fn test_messages_to_openai_format_null_result() {
        let messages =
            vec![Message::function().with_function_response("getContactByName", Value::Null)];
        let formatted = messages_to_openai_format(&messages);
        assert_eq!(formatted[0]["content"], "null");
    }

    #[test]
    fn test_tools_to_openai_format() -> Result<()> {
        let tool = Tool::new(
            "getContactByName",
            "Get the details of a contact by name",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the contact"}
                },
                "required": ["name"]
            }),
        );

        let formatted = tools_to_openai_format(&[tool])?;

        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0]["name"], "getContactByName");
        assert_eq!(formatted[0]["parameters"]["required"][0], "name");
        Ok(())
    }

    #[test]
    fn test_tools_to_openai_format_duplicate() {
        let tool = Tool::new("sendEmail", "Send an email", json!({"type": "object"}));
        let result = tools_to_openai_format(&[tool.clone(), tool]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Duplicate function name"));
    }

    #[test]
    fn test_openai_response_to_completion_text() -> Result<()> {
        let response = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }]
        });

        let completion = openai_response_to_completion(&response)?;
        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(completion.message.role, Role::Assistant);
        assert_eq!(completion.message.text(), Some("Hello!".to_string()));
        assert_eq!(completion.usage, Usage::default());
        Ok(())
    }

    #[test]
    fn test_openai_response_to_completion_function_call() -> Result<()> {
        let response: Value = serde_json::from_str(OPENAI_FUNCTION_CALL_RESPONSE)?;
        let completion = openai_response_to_completion(&response)?;

        assert_eq!(completion.finish_reason, FinishReason::FunctionCall);
        assert_eq!(completion.message.text(), None);
        let request = completion.message.function_request().unwrap();
        let call = request.function_call.as_ref().unwrap();
        assert_eq!(call.name, "getMyEvents");
        assert_eq!(call.arguments, json!({"getFutureEventsOnly": true}));
        assert_eq!(completion.usage.total_tokens, Some(35));
        Ok(())
    }

    #[test]
    fn test_openai_response_to_completion_invalid_arguments() -> Result<()> {
        let mut response: Value = serde_json::from_str(OPENAI_FUNCTION_CALL_RESPONSE)?;
        response["choices"][0]["message"]["function_call"]["arguments"] = json!("invalid json {");

        let completion = openai_response_to_completion(&response)?;
        match &completion.message.function_request().unwrap().function_call {
            Err(AgentError::InvalidArguments(msg)) => {
                assert!(msg.starts_with("Could not interpret arguments for getMyEvents"));
            }
            other => panic!("Expected InvalidArguments error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_openai_response_to_completion_no_choices() {
        let result = openai_response_to_completion(&json!({"choices": []}));
        assert!(result.is_err());
    }

    #[test]
    fn test_openai_usage_computes_total() {
        let usage = openai_usage(&json!({
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        }));
        assert_eq!(usage.total_tokens, Some(7));
    }

    #[test]
    fn test_check_openai_context_length_error() {
        let error = json!({
            "code": "context_length_exceeded",
            "message": "This message is too long"
        });

        let result = check_openai_context_length_error(&error);
        assert_eq!(
            result.unwrap().to_string(),
            "Context length exceeded. Message: This message is too long"
        );

        let error = json!({
            "code": "other_error",
            "message": "Some other error"
        });
        assert!(check_openai_context_length_error(&error).is_none());
    }
}
