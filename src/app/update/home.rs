use crate::app::messages::{Message, Mode};
use crate::app::state::{App, ComicState, ExplainState, Screen, UploadPhase, VideoState};
use crate::provider::ProviderError;
use iced::Task;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Inline uploads beyond this bounce off the provider anyway.
const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// MIME types the extraction endpoint accepts from us.
fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

impl App {
    pub(in crate::app) fn handle_extract_requested(&mut self) -> Task<Message> {
        let raw = self.home.path_input.trim().to_string();
        if raw.is_empty() {
            return Task::none();
        }
        let path = std::path::PathBuf::from(&raw);
        let Some(mime_type) = mime_for_path(&path) else {
            warn!(path = %path.display(), "Unsupported file type");
            self.home.phase = UploadPhase::Failed(ProviderError::InvalidInput(format!(
                "unsupported file type: {raw}"
            )));
            return Task::none();
        };

        if let Ok(meta) = std::fs::metadata(&path) {
            if meta.len() > MAX_UPLOAD_BYTES {
                warn!(path = %path.display(), size = meta.len(), "File too large");
                self.home.phase = UploadPhase::Failed(ProviderError::InvalidInput(format!(
                    "file too large: {} bytes",
                    meta.len()
                )));
                return Task::none();
            }
        }

        let request_id = self.next_request_id();
        self.home.phase = UploadPhase::Extracting { request_id };
        let provider = Arc::clone(&self.provider);
        let language = self.language();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(raw);
        info!(path = %path.display(), mime_type, request_id, "Extracting page text");

        Task::perform(
            async move {
                let result = match std::fs::read(&path) {
                    Ok(bytes) => provider.extract_text(&bytes, mime_type, language),
                    Err(err) => Err(ProviderError::InvalidInput(format!(
                        "could not read {}: {err}",
                        path.display()
                    ))),
                };
                Message::Extracted {
                    request_id,
                    name,
                    result,
                }
            },
            |message| message,
        )
    }

    pub(in crate::app) fn handle_extracted(
        &mut self,
        request_id: u64,
        name: String,
        result: Result<String, ProviderError>,
    ) -> Task<Message> {
        if !matches!(self.home.phase, UploadPhase::Extracting { request_id: id } if id == request_id)
        {
            warn!(request_id, "Dropping stale extraction result");
            return Task::none();
        }

        match result {
            Ok(text) if crate::chunker::split_chunks(&text).is_empty() => {
                warn!(request_id, "Extraction produced no readable text");
                self.home.phase = UploadPhase::Failed(ProviderError::Malformed(
                    "no readable text on the page".into(),
                ));
                Task::none()
            }
            Ok(text) => {
                info!(request_id, chars = text.len(), "Page text extracted");
                self.silence();
                self.narrator.set_document(&text);
                self.document = Some(crate::app::state::Document {
                    name,
                    chunks: self.narrator.chunks(),
                    text,
                });
                self.explain = ExplainState::default();
                self.comic = ComicState::default();
                self.video = VideoState::default();
                self.home.phase = UploadPhase::Idle;
                self.screen = Screen::Mode(Mode::Reader);
                Task::none()
            }
            Err(err) => {
                warn!(request_id, error = %err, "Extraction failed");
                self.home.phase = UploadPhase::Failed(err);
                Task::none()
            }
        }
    }
}
