use crate::core::completion::Role;
use crate::core::transcript::Transcript;
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Ok,
    /// Synthesized from a provider failure; the content is the error text.
    Failed,
}

/// One turn in the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub role: Role,
    pub content: String,
    pub status: ExchangeStatus,
    pub at: DateTime<Local>,
}

impl Exchange {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), ExchangeStatus::Ok)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), ExchangeStatus::Ok)
    }

    pub fn failed(error_text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, error_text.into(), ExchangeStatus::Failed)
    }

    fn new(role: Role, content: String, status: ExchangeStatus) -> Self {
        Self {
            role,
            content,
            status,
            at: Local::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ExchangeStatus::Failed
    }
}

/// State for one user's interaction: the grounding transcript, if any, and
/// the conversation so far. History only ever grows.
#[derive(Debug, Clone, Default)]
pub struct Session {
    transcript: Option<Transcript>,
    history: Vec<Exchange>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Replace the grounding transcript wholesale.
    pub fn set_transcript(&mut self, transcript: Transcript) {
        self.transcript = Some(transcript);
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub(crate) fn push(&mut self, exchange: Exchange) {
        self.history.push(exchange);
    }
}
