use crate::provider::{ProviderError, SceneDescription};
use iced::widget::image;

pub(in crate::app) enum ComicPhase {
    Idle,
    Describing {
        request_id: u64,
    },
    /// Panels render one at a time; `next` is the index being drawn.
    Rendering {
        request_id: u64,
        next: usize,
    },
    Ready,
    Failed(ProviderError),
}

pub(in crate::app) struct Panel {
    pub scene: SceneDescription,
    pub image: Option<image::Handle>,
    pub failed: bool,
}

pub(in crate::app) struct ComicState {
    pub phase: ComicPhase,
    pub panels: Vec<Panel>,
}

impl Default for ComicState {
    fn default() -> Self {
        Self {
            phase: ComicPhase::Idle,
            panels: Vec::new(),
        }
    }
}
