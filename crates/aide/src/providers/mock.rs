use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Completion, Provider};

/// A mock provider that returns pre-configured completions for testing.
/// `None` entries simulate a failed gateway call. Every transcript it is
/// asked to complete is recorded.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Option<Completion>>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    pub fn new(responses: Vec<Completion>) -> Self {
        Self::with_failures(responses.into_iter().map(Some).collect())
    }

    pub fn with_failures(responses: Vec<Option<Completion>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The transcripts received so far, one entry per call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], _tools: &[Tool]) -> Result<Completion> {
        self.requests.lock().unwrap().push(messages.to_vec());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(anyhow!("MockProvider has no more responses"));
        }
        responses
            .remove(0)
            .ok_or_else(|| anyhow!("simulated gateway failure"))
    }
}
