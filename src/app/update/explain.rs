use crate::app::messages::{ExplainContent, Message};
use crate::app::state::{App, ExplainPhase};
use crate::audio::AudioTimeline;
use crate::live::{LiveEvent, LiveSession, LiveSettings};
use crate::provider::{ChatMessage, ChatRole, ProviderError};
use iced::Task;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl App {
    /// Kick off the summary fetch the first time explain mode opens for
    /// this document and language.
    pub(in crate::app) fn ensure_explain_loaded(&mut self) -> Task<Message> {
        if !matches!(self.explain.phase, ExplainPhase::Idle) {
            return Task::none();
        }
        let Some(text) = self.document_text() else {
            return Task::none();
        };

        let request_id = self.next_request_id();
        self.explain.phase = ExplainPhase::Loading { request_id };
        let provider = Arc::clone(&self.provider);
        let language = self.language();
        info!(request_id, "Fetching summary and suggested questions");

        Task::perform(
            async move {
                let result = provider.summarize(&text, language).and_then(|summary| {
                    let questions = provider.suggest_questions(&text, language)?;
                    Ok(ExplainContent { summary, questions })
                });
                Message::ExplainLoaded { request_id, result }
            },
            |message| message,
        )
    }

    pub(in crate::app) fn handle_explain_loaded(
        &mut self,
        request_id: u64,
        result: Result<ExplainContent, ProviderError>,
    ) -> Task<Message> {
        if !matches!(self.explain.phase, ExplainPhase::Loading { request_id: id } if id == request_id)
        {
            debug!(request_id, "Dropping stale explain content");
            return Task::none();
        }
        match result {
            Ok(content) => {
                info!(
                    request_id,
                    summary_points = content.summary.len(),
                    questions = content.questions.len(),
                    "Explain content ready"
                );
                self.explain.summary = content.summary;
                self.explain.questions = content.questions;
                self.explain.phase = ExplainPhase::Ready;
            }
            Err(err) => {
                warn!(request_id, error = %err, "Explain content failed");
                self.explain.phase = ExplainPhase::Failed(err);
            }
        }
        Task::none()
    }

    pub(in crate::app) fn handle_chat_submitted(&mut self) -> Task<Message> {
        let question = self.explain.input.trim().to_string();
        if question.is_empty() || self.explain.pending_chat.is_some() {
            return Task::none();
        }
        let Some(text) = self.document_text() else {
            return Task::none();
        };

        self.explain.input.clear();
        self.explain.history.push(ChatMessage {
            role: ChatRole::User,
            text: question.clone(),
        });
        let history = self.explain.history.clone();

        let request_id = self.next_request_id();
        self.explain.pending_chat = Some(request_id);
        let provider = Arc::clone(&self.provider);
        let language = self.language();
        debug!(request_id, "Sending chat question");

        Task::perform(
            async move {
                // The question being asked is already the last history
                // entry; the provider call wants it separately.
                let prior = &history[..history.len() - 1];
                let result = provider.chat(&text, prior, &question, language);
                Message::ChatReplied { request_id, result }
            },
            |message| message,
        )
    }

    pub(in crate::app) fn handle_chat_replied(
        &mut self,
        request_id: u64,
        result: Result<String, ProviderError>,
    ) -> Task<Message> {
        if self.explain.pending_chat != Some(request_id) {
            debug!(request_id, "Dropping stale chat reply");
            return Task::none();
        }
        self.explain.pending_chat = None;
        match result {
            Ok(reply) => {
                self.explain.history.push(ChatMessage {
                    role: ChatRole::Assistant,
                    text: reply,
                });
            }
            Err(err) => {
                warn!(request_id, error = %err, "Chat reply failed");
                // Surface the failure in the transcript rather than a
                // separate error box; the child is mid-conversation.
                self.explain.history.push(ChatMessage {
                    role: ChatRole::Assistant,
                    text: crate::locale::friendly_provider_error(&err, self.language())
                        .to_string(),
                });
            }
        }
        Task::none()
    }

    /// Tear down the live voice session, halting its reply audio and
    /// folding any partial transcript lines into the history.
    pub(in crate::app) fn stop_voice_session(&mut self) {
        if let Some(session) = self.explain.voice.take() {
            session.stop();
            self.audio.stop_all();
            self.flush_voice_partials();
        }
    }

    pub(in crate::app) fn handle_voice_toggled(&mut self) -> Task<Message> {
        if self.explain.voice.is_some() {
            self.stop_voice_session();
            return Task::none();
        }
        let Some(text) = self.document_text() else {
            return Task::none();
        };

        self.audio.unlock();
        self.narrator.stop();
        info!("Starting live voice session");
        let session = LiveSession::start(
            LiveSettings {
                api_key: self.config.api_key.clone(),
                model: self.config.live_model.clone(),
                language: self.language(),
                document: text,
            },
            Arc::clone(&self.audio),
        );
        self.explain.voice = Some(session);
        Task::none()
    }

    /// Drain transcript events from the live session on each tick.
    pub(in crate::app) fn poll_voice_events(&mut self) {
        let Some(session) = &self.explain.voice else {
            return;
        };
        let mut closed = false;
        for event in session.poll_events() {
            match event {
                LiveEvent::UserTranscript(text) => self.explain.user_partial.push_str(&text),
                LiveEvent::ModelTranscript(text) => self.explain.model_partial.push_str(&text),
                LiveEvent::TurnComplete => self.flush_voice_partials(),
                LiveEvent::Error(detail) => {
                    warn!(%detail, "Live session error");
                    closed = true;
                }
                LiveEvent::Closed => closed = true,
            }
        }
        if closed {
            self.explain.voice = None;
            self.flush_voice_partials();
        }
    }

    fn flush_voice_partials(&mut self) {
        let user = std::mem::take(&mut self.explain.user_partial);
        if !user.trim().is_empty() {
            self.explain.history.push(ChatMessage {
                role: ChatRole::User,
                text: user.trim().to_string(),
            });
        }
        let model = std::mem::take(&mut self.explain.model_partial);
        if !model.trim().is_empty() {
            self.explain.history.push(ChatMessage {
                role: ChatRole::Assistant,
                text: model.trim().to_string(),
            });
        }
    }
}
