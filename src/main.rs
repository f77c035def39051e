//! Entry point for the reading companion.
//!
//! Responsibilities here are intentionally minimal:
//! - Initialize tracing with a reloadable filter.
//! - Load user configuration from `conf/config.toml`.
//! - Build the provider client.
//! - Launch the GUI application.

mod app;
mod audio;
mod cancellation;
mod chunker;
mod config;
mod live;
mod locale;
mod narration;
mod provider;

use crate::app::run_app;
use crate::config::{config_path, load_config};
use crate::provider::{GeminiClient, GeminiSettings, StoryProvider};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let config = load_config(&config_path());
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        level = %config.log_level,
        language = %config.language,
        text_model = %config.text_model,
        tts_model = %config.tts_model,
        "Starting reading companion"
    );
    if config.api_key.is_empty() {
        warn!("No API key configured; set api_key in conf/config.toml or GEMINI_API_KEY");
    }

    let provider: Arc<dyn StoryProvider> = Arc::new(
        GeminiClient::new(GeminiSettings {
            api_key: config.api_key.clone(),
            text_model: config.text_model.clone(),
            tts_model: config.tts_model.clone(),
            tts_voice: config.tts_voice.clone(),
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
        })
        .context("Building provider client")?,
    );

    run_app(config, provider).context("Failed to start the GUI")?;
    Ok(())
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
