use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    FunctionCall,
    Length,
    ContentFilter,
    Other(String),
}

impl From<&str> for FinishReason {
    fn from(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "function_call" => FinishReason::FunctionCall,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// One round of the model: its message and the reason it ended
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: Message,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl Completion {
    pub fn new(message: Message, finish_reason: FinishReason) -> Self {
        Self {
            message,
            finish_reason,
            usage: Usage::default(),
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

/// Base trait for chat-completion models that support function calling
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next completion for the transcript, advertising the given functions.
    /// The first message of `messages` is the system prompt.
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<Completion>;
}
