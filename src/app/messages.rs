use crate::provider::{ImageData, Language, ProviderError, SceneDescription};
use std::path::PathBuf;
use std::time::Instant;

/// Which document mode is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Reader,
    Explain,
    Comic,
    Video,
}

/// Summary and suggested questions, fetched together when explain mode
/// first opens.
#[derive(Debug, Clone)]
pub struct ExplainContent {
    pub summary: Vec<String>,
    pub questions: Vec<String>,
}

/// Messages emitted by the UI and by background tasks. Every task result
/// carries the request id it was issued with so stale replies can be
/// dropped after the user moved on.
#[derive(Debug, Clone)]
pub enum Message {
    Tick(Instant),

    PathInputChanged(String),
    ExtractRequested,
    Extracted {
        request_id: u64,
        name: String,
        result: Result<String, ProviderError>,
    },

    ModeSelected(Mode),
    GoHome,
    LanguageChanged(Language),
    ToggleTheme,
    FontSizeChanged(u32),

    PlayPressed,
    StopPressed,
    SpeedChanged(f32),
    VolumeChanged(f32),

    ExplainLoaded {
        request_id: u64,
        result: Result<ExplainContent, ProviderError>,
    },
    ExplainRetryPressed,
    ChatInputChanged(String),
    QuestionPicked(String),
    ChatSubmitted,
    ChatReplied {
        request_id: u64,
        result: Result<String, ProviderError>,
    },
    VoiceToggled,

    ComicRequested,
    ScenesDescribed {
        request_id: u64,
        result: Result<Vec<SceneDescription>, ProviderError>,
    },
    PanelRendered {
        request_id: u64,
        index: usize,
        result: Result<ImageData, ProviderError>,
    },

    VideoRequested,
    PromptDrafted {
        request_id: u64,
        result: Result<String, ProviderError>,
    },
    PromptEdited(String),
    VideoConfirmed,
    VideoRendered {
        request_id: u64,
        result: Result<PathBuf, ProviderError>,
    },
    VideoCancelled,
    OpenVideoPressed,
}
