use crate::app::messages::Message;
use crate::app::state::{App, ComicPhase, Panel};
use crate::provider::{ImageData, ProviderError, SceneDescription};
use iced::Task;
use iced::widget::image;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl App {
    pub(in crate::app) fn handle_comic_requested(&mut self) -> Task<Message> {
        if matches!(
            self.comic.phase,
            ComicPhase::Describing { .. } | ComicPhase::Rendering { .. }
        ) {
            return Task::none();
        }
        let Some(text) = self.document_text() else {
            return Task::none();
        };

        let request_id = self.next_request_id();
        self.comic.phase = ComicPhase::Describing { request_id };
        self.comic.panels.clear();
        let provider = Arc::clone(&self.provider);
        let language = self.language();
        info!(request_id, "Describing comic scenes");

        Task::perform(
            async move {
                let result = provider.describe_comic_scenes(&text, language);
                Message::ScenesDescribed { request_id, result }
            },
            |message| message,
        )
    }

    pub(in crate::app) fn handle_scenes_described(
        &mut self,
        request_id: u64,
        result: Result<Vec<SceneDescription>, ProviderError>,
    ) -> Task<Message> {
        if !matches!(self.comic.phase, ComicPhase::Describing { request_id: id } if id == request_id)
        {
            debug!(request_id, "Dropping stale scene list");
            return Task::none();
        }
        match result {
            Ok(scenes) => {
                info!(request_id, panels = scenes.len(), "Scenes described");
                self.comic.panels = scenes
                    .into_iter()
                    .map(|scene| Panel {
                        scene,
                        image: None,
                        failed: false,
                    })
                    .collect();
                self.render_next_panel(request_id, 0)
            }
            Err(err) => {
                warn!(request_id, error = %err, "Scene description failed");
                self.comic.phase = ComicPhase::Failed(err);
                Task::none()
            }
        }
    }

    pub(in crate::app) fn handle_panel_rendered(
        &mut self,
        request_id: u64,
        index: usize,
        result: Result<ImageData, ProviderError>,
    ) -> Task<Message> {
        if !matches!(self.comic.phase, ComicPhase::Rendering { request_id: id, .. } if id == request_id)
        {
            debug!(request_id, index, "Dropping stale panel");
            return Task::none();
        }
        if let Some(panel) = self.comic.panels.get_mut(index) {
            match result {
                Ok(data) => {
                    debug!(index, bytes = data.bytes.len(), "Panel rendered");
                    panel.image = Some(image::Handle::from_bytes(data.bytes));
                }
                Err(err) => {
                    // One bad panel should not sink the strip; it shows a
                    // placeholder and the rest keep rendering.
                    warn!(index, error = %err, "Panel render failed");
                    panel.failed = true;
                }
            }
        }
        self.render_next_panel(request_id, index + 1)
    }

    /// Panels render one at a time to stay friendly to provider rate
    /// limits.
    fn render_next_panel(&mut self, request_id: u64, index: usize) -> Task<Message> {
        let Some(panel) = self.comic.panels.get(index) else {
            info!(request_id, "Comic finished");
            self.comic.phase = ComicPhase::Ready;
            return Task::none();
        };
        self.comic.phase = ComicPhase::Rendering {
            request_id,
            next: index,
        };
        let provider = Arc::clone(&self.provider);
        let scene = panel.scene.clone();

        Task::perform(
            async move {
                let result = provider.render_scene_image(&scene);
                Message::PanelRendered {
                    request_id,
                    index,
                    result,
                }
            },
            |message| message,
        )
    }
}
