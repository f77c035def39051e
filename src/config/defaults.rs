pub(crate) fn default_font_size() -> u32 {
    26
}

pub(crate) fn default_line_spacing() -> f32 {
    1.5
}

pub(crate) fn default_window_width() -> f32 {
    1100.0
}

pub(crate) fn default_window_height() -> f32 {
    760.0
}

pub(crate) fn default_speech_speed() -> f32 {
    1.0
}

pub(crate) fn default_speech_volume() -> f32 {
    1.0
}

pub(crate) fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

pub(crate) fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

pub(crate) fn default_tts_voice() -> String {
    "Leda".to_string()
}

pub(crate) fn default_image_model() -> String {
    "gemini-2.0-flash-preview-image-generation".to_string()
}

pub(crate) fn default_video_model() -> String {
    "veo-3.0-fast-generate-001".to_string()
}

pub(crate) fn default_live_model() -> String {
    "gemini-2.5-flash-native-audio-preview-09-2025".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
