mod comic;
mod explain;
mod home;
mod reader;
mod video;

use super::messages::{Message, Mode};
use super::state::{App, ComicPhase, ExplainPhase, Screen, UploadPhase, VideoPhase};
use crate::config::{ThemeMode, config_path, save_config};
use iced::time;
use iced::{Subscription, Task};
use std::time::Duration;
use tracing::{debug, info};

const TICK_INTERVAL: Duration = Duration::from_millis(120);

impl App {
    pub fn subscription(app: &App) -> Subscription<Message> {
        if app.needs_tick() {
            time::every(TICK_INTERVAL).map(Message::Tick)
        } else {
            Subscription::none()
        }
    }

    /// Anything moving in the background warrants polling for the view.
    fn needs_tick(&self) -> bool {
        self.reader.playing
            || self.explain.voice_active()
            || matches!(self.home.phase, UploadPhase::Extracting { .. })
            || matches!(
                self.comic.phase,
                ComicPhase::Describing { .. } | ComicPhase::Rendering { .. }
            )
            || matches!(
                self.video.phase,
                VideoPhase::Drafting { .. } | VideoPhase::Rendering { .. }
            )
            || matches!(self.explain.phase, ExplainPhase::Loading { .. })
            || self.explain.pending_chat.is_some()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick(_) => {
                self.sync_narration();
                self.poll_voice_events();
                Task::none()
            }

            Message::PathInputChanged(path) => {
                self.home.path_input = path;
                Task::none()
            }
            Message::ExtractRequested => self.handle_extract_requested(),
            Message::Extracted {
                request_id,
                name,
                result,
            } => self.handle_extracted(request_id, name, result),

            Message::ModeSelected(mode) => self.handle_mode_selected(mode),
            Message::GoHome => {
                info!("Returning to the upload screen");
                self.silence();
                self.screen = Screen::Home;
                self.home.phase = UploadPhase::Idle;
                Task::none()
            }
            Message::LanguageChanged(language) => self.handle_language_changed(language),
            Message::ToggleTheme => {
                self.config.theme = match self.config.theme {
                    ThemeMode::Day => ThemeMode::Night,
                    ThemeMode::Night => ThemeMode::Day,
                };
                info!(theme = %self.config.theme, "Toggled theme");
                save_config(&self.config, &config_path());
                Task::none()
            }
            Message::FontSizeChanged(size) => {
                self.config.font_size = size.clamp(16, 48);
                debug!(font_size = self.config.font_size, "Font size changed");
                save_config(&self.config, &config_path());
                Task::none()
            }

            Message::PlayPressed => self.handle_play_pressed(),
            Message::StopPressed => self.handle_stop_pressed(),
            Message::SpeedChanged(speed) => self.handle_speed_changed(speed),
            Message::VolumeChanged(volume) => self.handle_volume_changed(volume),

            Message::ExplainLoaded { request_id, result } => {
                self.handle_explain_loaded(request_id, result)
            }
            Message::ExplainRetryPressed => {
                self.explain.phase = ExplainPhase::Idle;
                self.ensure_explain_loaded()
            }
            Message::ChatInputChanged(input) => {
                self.explain.input = input;
                Task::none()
            }
            Message::QuestionPicked(question) => {
                self.explain.input = question;
                self.handle_chat_submitted()
            }
            Message::ChatSubmitted => self.handle_chat_submitted(),
            Message::ChatReplied { request_id, result } => {
                self.handle_chat_replied(request_id, result)
            }
            Message::VoiceToggled => self.handle_voice_toggled(),

            Message::ComicRequested => self.handle_comic_requested(),
            Message::ScenesDescribed { request_id, result } => {
                self.handle_scenes_described(request_id, result)
            }
            Message::PanelRendered {
                request_id,
                index,
                result,
            } => self.handle_panel_rendered(request_id, index, result),

            Message::VideoRequested => self.handle_video_requested(),
            Message::PromptDrafted { request_id, result } => {
                self.handle_prompt_drafted(request_id, result)
            }
            Message::PromptEdited(prompt) => {
                self.video.prompt = prompt;
                Task::none()
            }
            Message::VideoConfirmed => self.handle_video_confirmed(),
            Message::VideoRendered { request_id, result } => {
                self.handle_video_rendered(request_id, result)
            }
            Message::VideoCancelled => self.handle_video_cancelled(),
            Message::OpenVideoPressed => self.handle_open_video(),
        }
    }

    fn handle_mode_selected(&mut self, mode: Mode) -> Task<Message> {
        if self.document.is_none() {
            return Task::none();
        }
        debug!(?mode, "Switched mode");
        let leaving_reader = self.screen == Screen::Mode(Mode::Reader) && mode != Mode::Reader;
        if leaving_reader {
            self.narrator.stop();
            self.reader.playing = false;
            self.reader.playing_chunk = None;
        }
        let leaving_explain = self.screen == Screen::Mode(Mode::Explain) && mode != Mode::Explain;
        if leaving_explain {
            self.stop_voice_session();
        }
        self.screen = Screen::Mode(mode);
        match mode {
            Mode::Explain => self.ensure_explain_loaded(),
            _ => Task::none(),
        }
    }

    fn handle_language_changed(&mut self, language: crate::provider::Language) -> Task<Message> {
        if self.language() == language {
            return Task::none();
        }
        info!(%language, "Reading language changed");
        *self.language.lock().unwrap() = language;
        self.config.language = language;
        save_config(&self.config, &config_path());

        // Everything derived from the document is in the old language now.
        if let Some(text) = self.document_text() {
            self.narrator.set_document(&text);
        }
        self.explain.phase = ExplainPhase::Idle;
        self.explain.summary.clear();
        self.explain.questions.clear();
        if self.screen == Screen::Mode(Mode::Explain) {
            return self.ensure_explain_loaded();
        }
        Task::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::Document;
    use crate::audio::AudioClip;
    use crate::cancellation::CancellationToken;
    use crate::config::AppConfig;
    use crate::live::LiveSession;
    use crate::provider::{
        ChatMessage, ImageData, Language, ProviderError, SceneDescription, StoryProvider,
        VideoAsset,
    };
    use std::sync::Arc;

    struct NullProvider;

    impl StoryProvider for NullProvider {
        fn extract_text(
            &self,
            _bytes: &[u8],
            _mime_type: &str,
            _language: Language,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }

        fn synthesize_speech(
            &self,
            _text: &str,
            _language: Language,
        ) -> Result<AudioClip, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }

        fn summarize(
            &self,
            _text: &str,
            _language: Language,
        ) -> Result<Vec<String>, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }

        fn suggest_questions(
            &self,
            _text: &str,
            _language: Language,
        ) -> Result<Vec<String>, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }

        fn chat(
            &self,
            _document: &str,
            _history: &[ChatMessage],
            _message: &str,
            _language: Language,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }

        fn describe_comic_scenes(
            &self,
            _text: &str,
            _language: Language,
        ) -> Result<Vec<SceneDescription>, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }

        fn render_scene_image(
            &self,
            _scene: &SceneDescription,
        ) -> Result<ImageData, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }

        fn draft_video_prompt(
            &self,
            _text: &str,
            _language: Language,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }

        fn render_video(
            &self,
            _prompt: &str,
            _cancel: &CancellationToken,
        ) -> Result<VideoAsset, ProviderError> {
            Err(ProviderError::Unavailable("not wired".into()))
        }
    }

    fn test_app() -> App {
        let (app, _task) = App::bootstrap(AppConfig::default(), Arc::new(NullProvider));
        app
    }

    fn loaded_document() -> Document {
        Document {
            name: "page.jpg".into(),
            text: "One. Two.".into(),
            chunks: vec!["One.".into(), "Two.".into()],
        }
    }

    #[test]
    fn leaving_explain_stops_the_voice_session() {
        let mut app = test_app();
        app.document = Some(loaded_document());
        app.screen = Screen::Mode(Mode::Explain);
        app.explain.voice = Some(LiveSession::detached());

        let _ = app.handle_mode_selected(Mode::Reader);

        assert!(app.explain.voice.is_none());
        assert_eq!(app.screen, Screen::Mode(Mode::Reader));
    }

    #[test]
    fn extracted_page_keeps_the_file_name() {
        let mut app = test_app();
        app.home.phase = UploadPhase::Extracting { request_id: 7 };

        let _ = app.handle_extracted(
            7,
            "page.jpg".into(),
            Ok("Once upon a time. There was a fox.".into()),
        );

        let doc = app.document.as_ref().expect("document should be loaded");
        assert_eq!(doc.name, "page.jpg");
        assert_eq!(doc.chunks.len(), 2);
        assert_eq!(app.screen, Screen::Mode(Mode::Reader));
    }

    #[test]
    fn unreadable_page_is_rejected() {
        let mut app = test_app();
        app.home.phase = UploadPhase::Extracting { request_id: 3 };

        let _ = app.handle_extracted(3, "page.jpg".into(), Ok("Hi".into()));

        assert!(app.document.is_none());
        assert!(matches!(app.home.phase, UploadPhase::Failed(_)));
    }
}
