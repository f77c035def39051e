use crate::app::messages::Message;
use crate::app::state::App;
use crate::config::{config_path, save_config};
use iced::Task;
use tracing::{info, warn};

impl App {
    pub(in crate::app) fn handle_play_pressed(&mut self) -> Task<Message> {
        // First user gesture; the output device opens here.
        self.audio.unlock();
        self.reader.error = None;
        match self.narrator.play() {
            Ok(()) => {
                info!("Narration started");
                self.sync_narration();
            }
            Err(err) => {
                warn!(error = %err, "Could not start narration");
            }
        }
        Task::none()
    }

    pub(in crate::app) fn handle_stop_pressed(&mut self) -> Task<Message> {
        self.narrator.stop();
        self.sync_narration();
        Task::none()
    }

    pub(in crate::app) fn handle_speed_changed(&mut self, speed: f32) -> Task<Message> {
        let clamped = speed.clamp(0.5, 1.8);
        self.narrator.set_speed(clamped);
        self.config.speech_speed = clamped;
        save_config(&self.config, &config_path());
        Task::none()
    }

    pub(in crate::app) fn handle_volume_changed(&mut self, volume: f32) -> Task<Message> {
        let clamped = volume.clamp(0.0, 1.0);
        self.audio.set_volume(clamped);
        self.config.speech_volume = clamped;
        save_config(&self.config, &config_path());
        Task::none()
    }
}
