//! Configuration loading for the reading companion.
//!
//! All user-tunable settings are centralized here and loaded from
//! `conf/config.toml` if present. Any missing or invalid entries fall back to
//! sensible defaults so the UI can still launch, even without an API key.

mod defaults;
mod io;

pub use io::{config_path, load_config, parse_config, save_config};

use crate::provider::Language;
use serde::Deserialize;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    /// Empty means "not configured"; the `GEMINI_API_KEY` environment
    /// variable overrides whatever the file says.
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "crate::config::defaults::default_font_size")]
    pub font_size: u32,
    #[serde(default = "crate::config::defaults::default_line_spacing")]
    pub line_spacing: f32,
    #[serde(default = "crate::config::defaults::default_window_width")]
    pub window_width: f32,
    #[serde(default = "crate::config::defaults::default_window_height")]
    pub window_height: f32,
    #[serde(default = "crate::config::defaults::default_speech_speed")]
    pub speech_speed: f32,
    #[serde(default = "crate::config::defaults::default_speech_volume")]
    pub speech_volume: f32,
    #[serde(default = "crate::config::defaults::default_text_model")]
    pub text_model: String,
    #[serde(default = "crate::config::defaults::default_tts_model")]
    pub tts_model: String,
    #[serde(default = "crate::config::defaults::default_tts_voice")]
    pub tts_voice: String,
    #[serde(default = "crate::config::defaults::default_image_model")]
    pub image_model: String,
    #[serde(default = "crate::config::defaults::default_video_model")]
    pub video_model: String,
    #[serde(default = "crate::config::defaults::default_live_model")]
    pub live_model: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: String::new(),
            language: Language::default(),
            theme: ThemeMode::default(),
            font_size: defaults::default_font_size(),
            line_spacing: defaults::default_line_spacing(),
            window_width: defaults::default_window_width(),
            window_height: defaults::default_window_height(),
            speech_speed: defaults::default_speech_speed(),
            speech_volume: defaults::default_speech_volume(),
            text_model: defaults::default_text_model(),
            tts_model: defaults::default_tts_model(),
            tts_voice: defaults::default_tts_voice(),
            image_model: defaults::default_image_model(),
            video_model: defaults::default_video_model(),
            live_model: defaults::default_live_model(),
            log_level: defaults::default_log_level(),
        }
    }
}

/// Theme mode.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    Day,
    Night,
}

impl Default for ThemeMode {
    fn default() -> Self {
        ThemeMode::Day
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ThemeMode::Day => "Day",
            ThemeMode::Night => "Night",
        };
        write!(f, "{}", label)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}
