use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::dispatch::{Presentation, Toolbox};
use crate::models::message::Message;
use crate::models::tool::FunctionCall;
use crate::models::transcript::Transcript;
use crate::operations::{catalog, Invocation};
use crate::prompt_template::system_prompt;
use crate::providers::base::{FinishReason, Provider};

pub const FALLBACK_MESSAGE: &str =
    "Sorry, I am unable to process your query at the moment. Please try again later.";
pub const FUNCTION_CALL_LIMIT_MESSAGE: &str =
    "Sorry, that request needed too many steps. Please try breaking it into smaller questions.";
pub const DEFAULT_MAX_FUNCTION_CALLS: usize = 10;

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model's final answer
    Answer(String),
    /// The query was out of scope, with the model's light-hearted message
    Unsupported(String),
    /// The model or its output could not be used
    Fallback,
    /// The model kept asking for functions past the per-turn bound
    FunctionCallLimit,
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Answer(text) | TurnOutcome::Unsupported(text) => text,
            TurnOutcome::Fallback => FALLBACK_MESSAGE,
            TurnOutcome::FunctionCallLimit => FUNCTION_CALL_LIMIT_MESSAGE,
        }
    }
}

/// What the user gets to see for a turn
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    ProfileCard {
        picture_url: Option<String>,
        details: String,
    },
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub outcome: TurnOutcome,
    pub presentation: Presentation,
    pub transcript: Transcript,
    pub function_calls: usize,
}

impl Turn {
    /// The reply for the user. A profile card is only used for an actual answer.
    pub fn reply(&self) -> Reply {
        let text = self.outcome.text().to_string();
        match (&self.outcome, &self.presentation) {
            (TurnOutcome::Answer(_), Presentation::ProfileCard { picture_url }) => {
                Reply::ProfileCard {
                    picture_url: picture_url.clone(),
                    details: text,
                }
            }
            _ => Reply::Text(text),
        }
    }
}

/// Agent drives one turn: it lets the model pick functions, runs them through
/// the toolbox and feeds the results back until the model answers.
pub struct Agent {
    provider: Arc<dyn Provider>,
    max_function_calls: usize,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            max_function_calls: DEFAULT_MAX_FUNCTION_CALLS,
        }
    }

    pub fn with_max_function_calls(mut self, max_function_calls: usize) -> Self {
        self.max_function_calls = max_function_calls;
        self
    }

    /// Run a turn for `user_text`. Never fails, every failure ends in a fallback outcome.
    pub async fn reply(&self, toolbox: &dyn Toolbox, user_text: &str) -> Turn {
        let system = match system_prompt(Utc::now()) {
            Ok(system) => system,
            Err(e) => {
                tracing::error!(error = %e, "could not render the system prompt");
                return Turn {
                    outcome: TurnOutcome::Fallback,
                    presentation: Presentation::Text,
                    transcript: Transcript::new("", user_text),
                    function_calls: 0,
                };
            }
        };

        let mut transcript = Transcript::new(system, user_text);
        let mut presentation = Presentation::Text;

        let outcome = loop {
            debug_assert!(transcript.awaits_completion());
            let completion = match self.provider.complete(transcript.messages(), catalog()).await
            {
                Ok(completion) => completion,
                Err(e) => {
                    tracing::warn!(error = %e, "model call failed");
                    break TurnOutcome::Fallback;
                }
            };

            match completion.finish_reason {
                FinishReason::Stop => match completion.message.text() {
                    Some(text) => break TurnOutcome::Answer(text),
                    None => {
                        tracing::warn!("model stopped without content");
                        break TurnOutcome::Fallback;
                    }
                },
                FinishReason::FunctionCall => {
                    let call = match requested_call(&completion.message) {
                        Some(call) => call,
                        None => break TurnOutcome::Fallback,
                    };

                    let operation = match Invocation::parse(&call) {
                        Ok(Invocation::Execute(operation)) => operation,
                        Ok(Invocation::Unsupported(message)) => {
                            break TurnOutcome::Unsupported(message)
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "model requested an unusable function call");
                            break TurnOutcome::Fallback;
                        }
                    };

                    if transcript.function_exchanges() >= self.max_function_calls {
                        tracing::warn!(
                            limit = self.max_function_calls,
                            "turn reached the function call limit"
                        );
                        break TurnOutcome::FunctionCallLimit;
                    }

                    let result = match toolbox.call(&operation).await {
                        Ok(output) => {
                            if let Presentation::ProfileCard { .. } = output.presentation {
                                presentation = output.presentation;
                            }
                            output.result
                        }
                        Err(e) => {
                            tracing::warn!(operation = %operation.name(), error = %e, "function failed");
                            json!({ "error": e.to_string() })
                        }
                    };
                    transcript.push_function_exchange(call, result);
                }
                other => {
                    tracing::warn!(finish_reason = ?other, "unexpected finish reason");
                    break TurnOutcome::Fallback;
                }
            }
        };

        Turn {
            outcome,
            presentation,
            function_calls: transcript.function_exchanges(),
            transcript,
        }
    }
}

fn requested_call(message: &Message) -> Option<FunctionCall> {
    match &message.function_request()?.function_call {
        Ok(call) => Some(call.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "model function call could not be read");
            None
        }
    }
}
