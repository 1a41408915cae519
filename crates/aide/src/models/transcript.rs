use serde_json::Value;

use super::message::Message;
use super::role::Role;
use super::tool::FunctionCall;

/// The message history of a single turn.
///
/// A transcript always starts with exactly one system message followed by the
/// user's message, and only ever grows by whole function exchanges: the
/// assistant's function call immediately followed by its result. That keeps
/// the last message a user or function message before every model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new<S, U>(system_prompt: S, user_text: U) -> Self
    where
        S: Into<String>,
        U: Into<String>,
    {
        Self {
            messages: vec![
                Message::system().with_text(system_prompt),
                Message::user().with_text(user_text),
            ],
        }
    }

    /// Record an executed function call and its result
    pub fn push_function_exchange(&mut self, call: FunctionCall, result: Value) {
        let name = call.name.clone();
        self.messages
            .push(Message::assistant().with_function_request(Ok(call)));
        self.messages
            .push(Message::function().with_function_response(name, result));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of function exchanges recorded so far
    pub fn function_exchanges(&self) -> usize {
        (self.messages.len() - 2) / 2
    }

    /// True when the transcript may be sent to the model as-is
    pub fn awaits_completion(&self) -> bool {
        matches!(
            self.messages.last().map(|message| message.role),
            Some(Role::User) | Some(Role::Function)
        )
    }
}
