//! In-memory collaborators for driving the dispatcher without network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::{Completion, Error};
use crate::whatsapp::gateway::{Delivery, GatewayError, Messenger, OutgoingMessage, SendOutcome};

/// Answers prompts from a fixed script, in order, and remembers the prompts.
/// Running out of answers yields [`Error::Empty`].
pub struct ScriptedLlm {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Completion for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let answer = self.answers.lock().unwrap().pop_front();
        answer.map(|a| a.trim().to_string()).ok_or(Error::Empty)
    }
}

/// Accepts every envelope with a canned 200 and keeps a copy.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Messenger for RecordingMessenger {
    async fn send(&self, message: &OutgoingMessage) -> Result<SendOutcome, GatewayError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(SendOutcome::Delivered(Delivery {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: r#"{"messages":[{"id":"wamid.test"}]}"#.to_string(),
        }))
    }
}
