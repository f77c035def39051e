use crate::cancellation::CancellationToken;
use crate::provider::ProviderError;
use std::path::PathBuf;
use std::time::Instant;

pub(in crate::app) enum VideoPhase {
    Idle,
    Drafting {
        request_id: u64,
    },
    /// The drafted prompt is on screen for the child (or a grown-up) to
    /// tweak before committing to a long render.
    Confirm,
    Rendering {
        request_id: u64,
        cancel: CancellationToken,
        started: Instant,
    },
    Ready(PathBuf),
    Failed(ProviderError),
}

pub(in crate::app) struct VideoState {
    pub phase: VideoPhase,
    pub prompt: String,
}

impl Default for VideoState {
    fn default() -> Self {
        Self {
            phase: VideoPhase::Idle,
            prompt: String::new(),
        }
    }
}
