mod comic;
mod explain;
mod home;
mod video;

pub(in crate::app) use comic::{ComicPhase, ComicState, Panel};
pub(in crate::app) use explain::{ExplainPhase, ExplainState};
pub(in crate::app) use home::{HomeState, UploadPhase};
pub(in crate::app) use video::{VideoPhase, VideoState};

use crate::audio::{AudioOutput, AudioTimeline};
use crate::config::AppConfig;
use crate::narration::{NarrationState, Narrator, SpeechSource};
use crate::provider::{Language, ProviderError, StoryProvider};
use iced::Task;
use std::sync::{Arc, Mutex};

use super::messages::{Message, Mode};

/// The extracted story currently loaded, if any.
pub(in crate::app) struct Document {
    /// File name of the uploaded page, for the top bar.
    pub name: String,
    pub text: String,
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::app) enum Screen {
    Home,
    Mode(Mode),
}

/// Narration status as of the last tick, snapshotted for the view.
#[derive(Default)]
pub(in crate::app) struct ReaderState {
    pub playing: bool,
    pub buffering: bool,
    pub playing_chunk: Option<usize>,
    pub error: Option<ProviderError>,
}

/// Core application state composed of per-screen sub-models.
pub struct App {
    pub(in crate::app) config: AppConfig,
    pub(in crate::app) provider: Arc<dyn StoryProvider>,
    pub(in crate::app) audio: Arc<AudioOutput>,
    pub(in crate::app) narrator: Arc<Narrator>,
    pub(in crate::app) language: Arc<Mutex<Language>>,
    pub(in crate::app) document: Option<Document>,
    pub(in crate::app) screen: Screen,
    pub(in crate::app) home: HomeState,
    pub(in crate::app) reader: ReaderState,
    pub(in crate::app) explain: ExplainState,
    pub(in crate::app) comic: ComicState,
    pub(in crate::app) video: VideoState,
    pub(in crate::app) request_seq: u64,
}

/// Bridges the narration pipeline to the configured provider, reading the
/// language at synthesis time so switches apply to new audio.
struct ProviderSpeech {
    provider: Arc<dyn StoryProvider>,
    language: Arc<Mutex<Language>>,
}

impl SpeechSource for ProviderSpeech {
    fn synthesize(&self, text: &str) -> Result<crate::audio::AudioClip, ProviderError> {
        let language = *self.language.lock().unwrap();
        self.provider.synthesize_speech(text, language)
    }
}

impl App {
    pub fn bootstrap(
        config: AppConfig,
        provider: Arc<dyn StoryProvider>,
    ) -> (Self, Task<Message>) {
        let audio = Arc::new(AudioOutput::new());
        let language = Arc::new(Mutex::new(config.language));
        let narrator = Arc::new(Narrator::new(
            Arc::new(ProviderSpeech {
                provider: Arc::clone(&provider),
                language: Arc::clone(&language),
            }),
            Arc::clone(&audio) as Arc<dyn AudioTimeline>,
        ));
        narrator.set_speed(config.speech_speed);
        audio.set_volume(config.speech_volume);

        let app = App {
            config,
            provider,
            audio,
            narrator,
            language,
            document: None,
            screen: Screen::Home,
            home: HomeState::default(),
            reader: ReaderState::default(),
            explain: ExplainState::default(),
            comic: ComicState::default(),
            video: VideoState::default(),
            request_seq: 0,
        };
        (app, Task::none())
    }

    pub(in crate::app) fn next_request_id(&mut self) -> u64 {
        self.request_seq = self.request_seq.wrapping_add(1);
        self.request_seq
    }

    pub(in crate::app) fn language(&self) -> Language {
        *self.language.lock().unwrap()
    }

    pub(in crate::app) fn document_text(&self) -> Option<String> {
        self.document.as_ref().map(|doc| doc.text.clone())
    }

    /// Refresh the narration snapshot the reader view renders from.
    pub(in crate::app) fn sync_narration(&mut self) {
        let state = self.narrator.state();
        self.reader.playing = state != NarrationState::Idle;
        self.reader.buffering = state == NarrationState::Buffering;
        self.reader.playing_chunk = if state == NarrationState::Playing {
            Some(self.narrator.current_chunk())
        } else {
            None
        };
        if let Some(err) = self.narrator.take_last_error() {
            self.reader.error = Some(err);
        }
    }

    /// Stop everything making noise. Used when leaving a screen or loading
    /// a new page.
    pub(in crate::app) fn silence(&mut self) {
        self.narrator.stop();
        self.stop_voice_session();
        self.audio.stop_all();
        self.reader = ReaderState::default();
    }
}
