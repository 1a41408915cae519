use super::role::Role;
use super::tool::FunctionCall;
use crate::errors::AgentResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// The model asked for a function call. Holds the error instead when the
/// request could not be decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRequest {
    pub function_call: AgentResult<FunctionCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Content passed inside a message, which can be both simple text and function content
pub enum MessageContent {
    Text(TextContent),
    FunctionRequest(FunctionRequest),
    FunctionResponse(FunctionResponse),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(TextContent { text: text.into() })
    }

    pub fn function_request(function_call: AgentResult<FunctionCall>) -> Self {
        MessageContent::FunctionRequest(FunctionRequest { function_call })
    }

    pub fn function_response<S: Into<String>>(name: S, result: Value) -> Self {
        MessageContent::FunctionResponse(FunctionResponse {
            name: name.into(),
            result,
        })
    }

    pub fn as_function_request(&self) -> Option<&FunctionRequest> {
        if let MessageContent::FunctionRequest(ref request) = self {
            Some(request)
        } else {
            None
        }
    }

    pub fn as_function_response(&self) -> Option<&FunctionResponse> {
        if let MessageContent::FunctionResponse(ref response) = self {
            Some(response)
        } else {
            None
        }
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl Message {
    fn with_role(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    pub fn system() -> Self {
        Self::with_role(Role::System)
    }

    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Self::with_role(Role::User)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Self::with_role(Role::Assistant)
    }

    /// Create a new function-result message with the current timestamp
    pub fn function() -> Self {
        Self::with_role(Role::Function)
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    pub fn with_function_request(self, function_call: AgentResult<FunctionCall>) -> Self {
        self.with_content(MessageContent::function_request(function_call))
    }

    pub fn with_function_response<S: Into<String>>(self, name: S, result: Value) -> Self {
        self.with_content(MessageContent::function_response(name, result))
    }

    /// All text content joined by newlines, `None` when the message carries no text
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|content| content.as_text())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }

    /// The first function request in the message, if any
    pub fn function_request(&self) -> Option<&FunctionRequest> {
        self.content
            .iter()
            .find_map(|content| content.as_function_request())
    }

    pub fn function_response(&self) -> Option<&FunctionResponse> {
        self.content
            .iter()
            .find_map(|content| content.as_function_response())
    }
}
