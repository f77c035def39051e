use crate::live::LiveSession;
use crate::provider::{ChatMessage, ProviderError};

pub(in crate::app) enum ExplainPhase {
    Idle,
    Loading { request_id: u64 },
    Ready,
    Failed(ProviderError),
}

pub(in crate::app) struct ExplainState {
    pub phase: ExplainPhase,
    pub summary: Vec<String>,
    pub questions: Vec<String>,
    pub history: Vec<ChatMessage>,
    pub input: String,
    /// Set while a typed question is in flight; replies with another id
    /// are stale and dropped.
    pub pending_chat: Option<u64>,
    pub voice: Option<LiveSession>,
    /// Transcript fragments accumulate here until the turn completes.
    pub user_partial: String,
    pub model_partial: String,
}

impl Default for ExplainState {
    fn default() -> Self {
        Self {
            phase: ExplainPhase::Idle,
            summary: Vec::new(),
            questions: Vec::new(),
            history: Vec::new(),
            input: String::new(),
            pending_chat: None,
            voice: None,
            user_partial: String::new(),
            model_partial: String::new(),
        }
    }
}

impl ExplainState {
    pub fn voice_active(&self) -> bool {
        self.voice.is_some()
    }
}
