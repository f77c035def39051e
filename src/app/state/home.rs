use crate::provider::ProviderError;

/// Upload screen lifecycle. Exactly one of these at a time; no flags.
pub(in crate::app) enum UploadPhase {
    Idle,
    Extracting { request_id: u64 },
    Failed(ProviderError),
}

pub(in crate::app) struct HomeState {
    pub path_input: String,
    pub phase: UploadPhase,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            path_input: String::new(),
            phase: UploadPhase::Idle,
        }
    }
}
