use crate::app::messages::Message;
use crate::app::state::{App, VideoPhase};
use crate::cancellation::CancellationToken;
use crate::provider::ProviderError;
use iced::Task;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

impl App {
    pub(in crate::app) fn handle_video_requested(&mut self) -> Task<Message> {
        if matches!(
            self.video.phase,
            VideoPhase::Drafting { .. } | VideoPhase::Rendering { .. }
        ) {
            return Task::none();
        }
        let Some(text) = self.document_text() else {
            return Task::none();
        };

        let request_id = self.next_request_id();
        self.video.phase = VideoPhase::Drafting { request_id };
        let provider = Arc::clone(&self.provider);
        let language = self.language();
        info!(request_id, "Drafting video prompt");

        Task::perform(
            async move {
                let result = provider.draft_video_prompt(&text, language);
                Message::PromptDrafted { request_id, result }
            },
            |message| message,
        )
    }

    pub(in crate::app) fn handle_prompt_drafted(
        &mut self,
        request_id: u64,
        result: Result<String, ProviderError>,
    ) -> Task<Message> {
        if !matches!(self.video.phase, VideoPhase::Drafting { request_id: id } if id == request_id)
        {
            debug!(request_id, "Dropping stale video prompt");
            return Task::none();
        }
        match result {
            Ok(prompt) => {
                info!(request_id, "Video prompt drafted");
                self.video.prompt = prompt;
                self.video.phase = VideoPhase::Confirm;
            }
            Err(err) => {
                warn!(request_id, error = %err, "Video prompt failed");
                self.video.phase = VideoPhase::Failed(err);
            }
        }
        Task::none()
    }

    pub(in crate::app) fn handle_video_confirmed(&mut self) -> Task<Message> {
        if !matches!(self.video.phase, VideoPhase::Confirm) {
            return Task::none();
        }
        let prompt = self.video.prompt.trim().to_string();
        if prompt.is_empty() {
            return Task::none();
        }

        let request_id = self.next_request_id();
        let cancel = CancellationToken::new();
        self.video.phase = VideoPhase::Rendering {
            request_id,
            cancel: cancel.clone(),
            started: Instant::now(),
        };
        let provider = Arc::clone(&self.provider);
        info!(request_id, "Video render confirmed");

        Task::perform(
            async move {
                let result = provider
                    .render_video(&prompt, &cancel)
                    .and_then(|asset| write_temp_video(request_id, &asset.bytes));
                Message::VideoRendered { request_id, result }
            },
            |message| message,
        )
    }

    pub(in crate::app) fn handle_video_rendered(
        &mut self,
        request_id: u64,
        result: Result<PathBuf, ProviderError>,
    ) -> Task<Message> {
        if !matches!(self.video.phase, VideoPhase::Rendering { request_id: id, .. } if id == request_id)
        {
            debug!(request_id, "Dropping stale video result");
            return Task::none();
        }
        match result {
            Ok(path) => {
                info!(request_id, path = %path.display(), "Video ready");
                self.video.phase = VideoPhase::Ready(path);
            }
            Err(err) => {
                warn!(request_id, error = %err, "Video render failed");
                self.video.phase = VideoPhase::Failed(err);
            }
        }
        Task::none()
    }

    pub(in crate::app) fn handle_video_cancelled(&mut self) -> Task<Message> {
        match &self.video.phase {
            VideoPhase::Rendering { cancel, .. } => {
                info!("Video render cancelled");
                cancel.cancel();
                self.video.phase = VideoPhase::Confirm;
            }
            VideoPhase::Confirm => {
                self.video.phase = VideoPhase::Idle;
            }
            _ => {}
        }
        Task::none()
    }

    pub(in crate::app) fn handle_open_video(&mut self) -> Task<Message> {
        if let VideoPhase::Ready(path) = &self.video.phase {
            if let Err(err) = open::that(path) {
                warn!(path = %path.display(), "Could not open video: {err}");
            }
        }
        Task::none()
    }
}

fn write_temp_video(request_id: u64, bytes: &[u8]) -> Result<PathBuf, ProviderError> {
    let path = std::env::temp_dir().join(format!("storylantern-{request_id}.mp4"));
    std::fs::write(&path, bytes)
        .map_err(|err| ProviderError::Unavailable(format!("could not save video: {err}")))?;
    Ok(path)
}
