//! Boundary to the hosted multimodal model.
//!
//! Every non-trivial capability (text extraction, summaries, chat, speech,
//! images, video) is delegated through the [`StoryProvider`] trait; screens
//! and the narration pipeline only ever see this seam, so tests can swap in
//! fakes and the live client stays in one place.

mod gemini;

pub use gemini::{GeminiClient, GeminiSettings};

use crate::audio::AudioClip;
use crate::cancellation::CancellationToken;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reading languages offered in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    English,
    Spanish,
    French,
    Vietnamese,
}

pub const ALL_LANGUAGES: &[Language] = &[
    Language::English,
    Language::Spanish,
    Language::French,
    Language::Vietnamese,
];

impl Language {
    /// Name used in prompts so the model answers in the reader's language.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::Vietnamese => "Vietnamese",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prompt_name())
    }
}

/// Failure taxonomy for provider calls. Screens map these onto friendly
/// localized messages; the raw detail only goes to the log.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("provider unreachable: {0}")]
    Unavailable(String),
    #[error("provider overloaded")]
    Overloaded,
    #[error("invalid or missing API credentials")]
    InvalidCredentials,
    #[error("content declined by the provider's safety checks")]
    SafetyRejection,
    #[error("unexpected provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Errors that no amount of retrying will fix.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProviderError::SafetyRejection | ProviderError::InvalidCredentials
        )
    }
}

/// One turn of the explain-mode conversation. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// A comic panel as described by the model, before its image exists.
#[derive(Debug, Clone)]
pub struct SceneDescription {
    pub description: String,
    pub keywords: Vec<String>,
}

/// Raw generated image bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// A rendered video, either inline bytes or a fetchable URI.
#[derive(Debug, Clone)]
pub struct VideoAsset {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub trait StoryProvider: Send + Sync {
    /// OCR a page photo or PDF into plain text.
    fn extract_text(
        &self,
        bytes: &[u8],
        mime_type: &str,
        language: Language,
    ) -> Result<String, ProviderError>;

    /// Synthesize one chunk of speech; decoded 24 kHz mono PCM.
    fn synthesize_speech(&self, text: &str, language: Language)
    -> Result<AudioClip, ProviderError>;

    fn summarize(&self, text: &str, language: Language) -> Result<Vec<String>, ProviderError>;

    fn suggest_questions(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<String>, ProviderError>;

    fn chat(
        &self,
        document: &str,
        history: &[ChatMessage],
        message: &str,
        language: Language,
    ) -> Result<String, ProviderError>;

    fn describe_comic_scenes(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<SceneDescription>, ProviderError>;

    fn render_scene_image(&self, scene: &SceneDescription) -> Result<ImageData, ProviderError>;

    fn draft_video_prompt(&self, text: &str, language: Language) -> Result<String, ProviderError>;

    /// Long-running; polls the provider until done or cancelled.
    fn render_video(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<VideoAsset, ProviderError>;
}
