use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, Provider};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    check_openai_context_length_error, messages_to_openai_format, openai_response_to_completion,
    tools_to_openai_format,
};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// Sampling parameters are fixed for every round of every turn
pub const TEMPERATURE: f32 = 0.5;
pub const TOP_P: f32 = 1.0;
pub const MAX_TOKENS: i32 = 512;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                if let Some(err) = body
                    .get("error")
                    .and_then(check_openai_context_length_error)
                {
                    return Err(err.into());
                }
                Err(anyhow!("Request failed: {}: {}", status, body))
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<Completion> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_format(messages),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
        });

        if !tools.is_empty() {
            payload["functions"] = json!(tools_to_openai_format(tools)?);
        }

        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        let completion = openai_response_to_completion(&response)?;
        tracing::debug!(
            model = %self.config.model,
            finish_reason = ?completion.finish_reason,
            total_tokens = ?completion.usage.total_tokens,
            "completion received"
        );

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::FinishReason;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn _setup_mock_server(response: ResponseTemplate) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let config = OpenAiProviderConfig::new("test_api_key")
            .with_host(mock_server.uri())
            .with_model("gpt-3.5-turbo");

        let provider = OpenAiProvider::new(config).unwrap();
        (mock_server, provider)
    }

    fn events_tool() -> Tool {
        Tool::new(
            "getMyEvents",
            "Get the events in the calendar of the current user",
            json!({
                "type": "object",
                "properties": {
                    "getFutureEventsOnly": {"type": "boolean"}
                },
                "required": ["getFutureEventsOnly"]
            }),
        )
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_, provider) =
            _setup_mock_server(ResponseTemplate::new(200).set_body_json(response_body)).await;

        let messages = vec![
            Message::system().with_text("You are a personal assistant."),
            Message::user().with_text("Hello?"),
        ];

        let completion = provider.complete(&messages, &[]).await?;

        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(
            completion.message.text(),
            Some("Hello! How can I assist you today?".to_string())
        );
        assert_eq!(completion.usage.input_tokens, Some(12));
        assert_eq!(completion.usage.output_tokens, Some(15));
        assert_eq!(completion.usage.total_tokens, Some(27));

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sends_fixed_sampling_and_functions() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "max_tokens": 512,
                "temperature": 0.5,
                "top_p": 1.0,
                "functions": [{"name": "getMyEvents"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "function_call": {
                            "name": "getMyEvents",
                            "arguments": "{\"getFutureEventsOnly\":true}"
                        }
                    },
                    "finish_reason": "function_call"
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(
            OpenAiProviderConfig::new("key")
                .with_host(mock_server.uri())
                .with_model("gpt-4"),
        )?;

        let messages = vec![
            Message::system().with_text("system"),
            Message::user().with_text("What's next on my calendar?"),
        ];
        let completion = provider.complete(&messages, &[events_tool()]).await?;

        assert_eq!(completion.finish_reason, FinishReason::FunctionCall);
        let call = completion
            .message
            .function_request()
            .unwrap()
            .function_call
            .clone()?;
        assert_eq!(call.name, "getMyEvents");
        assert_eq!(call.arguments, json!({"getFutureEventsOnly": true}));

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let (_, provider) = _setup_mock_server(ResponseTemplate::new(503)).await;

        let messages = vec![Message::user().with_text("Hello?")];
        let result = provider.complete(&messages, &[]).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Server error"));
    }

    #[tokio::test]
    async fn test_complete_context_length_error() {
        let (_, provider) = _setup_mock_server(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": "context_length_exceeded",
                "message": "This model's maximum context length is 4097 tokens"
            }
        })))
        .await;

        let messages = vec![Message::user().with_text("Hello?")];
        let err = provider.complete(&messages, &[]).await.unwrap_err();

        assert!(err.to_string().starts_with("Context length exceeded"));
    }
}
