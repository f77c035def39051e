use super::AppConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub fn config_path() -> PathBuf {
    PathBuf::from("conf/config.toml")
}

/// Read the config file, falling back to defaults on any problem. The
/// `GEMINI_API_KEY` environment variable wins over the file's `api_key`.
pub fn load_config(path: &Path) -> AppConfig {
    let mut config = match std::fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded config file");
            parse_config(&data, path)
        }
        Err(err) => {
            warn!(path = %path.display(), "Falling back to default config: {err}");
            AppConfig::default()
        }
    };

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            debug!("Using API key from environment");
            config.api_key = key.trim().to_string();
        }
    }
    config
}

pub fn parse_config(contents: &str, path: &Path) -> AppConfig {
    match toml::from_str::<AppConfig>(contents) {
        Ok(config) => {
            debug!("Parsed configuration from disk");
            config
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

/// Persist user-adjusted settings. Failures are logged and otherwise
/// ignored; losing a preference is not worth interrupting the child.
pub fn save_config(config: &AppConfig, path: &Path) {
    let serialized = match toml::to_string_pretty(config) {
        Ok(text) => text,
        Err(err) => {
            warn!("Could not serialize config: {err}");
            return;
        }
    };
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            warn!(path = %parent.display(), "Could not create config directory: {err}");
            return;
        }
    }
    match std::fs::write(path, serialized) {
        Ok(()) => debug!(path = %path.display(), "Saved config"),
        Err(err) => warn!(path = %path.display(), "Could not save config: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, ThemeMode};
    use crate::provider::Language;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = parse_config("font_size = 30\n", Path::new("test.toml"));
        assert_eq!(config.font_size, 30);
        assert_eq!(config.language, Language::English);
        assert_eq!(config.speech_speed, 1.0);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn invalid_toml_yields_defaults() {
        let config = parse_config("font_size = [nope", Path::new("test.toml"));
        assert_eq!(config.font_size, AppConfig::default().font_size);
    }

    #[test]
    fn parses_kebab_case_enums() {
        let config = parse_config(
            "theme = \"night\"\nlog_level = \"debug\"\nlanguage = \"vietnamese\"\n",
            Path::new("test.toml"),
        );
        assert_eq!(config.theme, ThemeMode::Night);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.language, Language::Vietnamese);
    }
}
