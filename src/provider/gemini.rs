//! REST client for the Gemini generative-language endpoints.

use super::{
    ChatMessage, ChatRole, ImageData, Language, ProviderError, SceneDescription, StoryProvider,
    VideoAsset,
};
use crate::audio::{AudioClip, OUTPUT_SAMPLE_RATE, pcm};
use crate::cancellation::CancellationToken;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// How long we keep polling a long-running video operation before giving up.
const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(5);
const VIDEO_POLL_LIMIT: u32 = 120;

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub text_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub image_model: String,
    pub video_model: String,
}

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Building HTTP client")?;
        Ok(Self { http, settings })
    }

    fn post(&self, url: &str, payload: &Value) -> Result<Value, ProviderError> {
        if self.settings.api_key.trim().is_empty() {
            return Err(ProviderError::InvalidCredentials);
        }
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.settings.api_key.trim())
            .json(payload)
            .send()
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;

        if !status.is_success() {
            debug!(%status, body = %truncate(&body, 400), "Provider returned an error status");
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::InvalidCredentials,
                429 | 503 => ProviderError::Overloaded,
                _ => ProviderError::Unavailable(format!("HTTP {status}")),
            });
        }

        serde_json::from_str(&body)
            .map_err(|err| ProviderError::Malformed(format!("invalid JSON: {err}")))
    }

    fn get(&self, url: &str) -> Result<Value, ProviderError> {
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", self.settings.api_key.trim())
            .send()
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!("HTTP {status}")));
        }
        response
            .json()
            .map_err(|err| ProviderError::Malformed(format!("invalid JSON: {err}")))
    }

    fn generate(&self, model: &str, payload: Value) -> Result<Value, ProviderError> {
        let url = format!("{API_BASE}/models/{model}:generateContent");
        self.post(&url, &payload)
    }

    fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });
        let body = self.generate(&self.settings.text_model, payload)?;
        first_text_part(&body)
    }
}

impl StoryProvider for GeminiClient {
    fn extract_text(
        &self,
        bytes: &[u8],
        mime_type: &str,
        language: Language,
    ) -> Result<String, ProviderError> {
        let instruction = format!(
            "Extract every word of readable story text from this page, in reading order. \
             Reply with the text only, no commentary. The book is in {}.",
            language.prompt_name()
        );
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "inlineData": { "mimeType": mime_type, "data": pcm::encode_base64(bytes) } },
                    { "text": instruction }
                ]
            }]
        });
        info!(mime_type, size = bytes.len(), "Requesting text extraction");
        let body = self.generate(&self.settings.text_model, payload)?;
        first_text_part(&body)
    }

    fn synthesize_speech(
        &self,
        text: &str,
        language: Language,
    ) -> Result<AudioClip, ProviderError> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("Read aloud in a warm storytelling voice, in {}: {text}",
                                            language.prompt_name()) }]
            }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.settings.tts_voice }
                    }
                }
            }
        });
        let body = self.generate(&self.settings.tts_model, payload)?;
        let (mime, data) = first_inline_data(&body)?;
        let bytes = pcm::decode_base64(&data)
            .map_err(|err| ProviderError::Malformed(format!("bad audio payload: {err}")))?;
        let rate = sample_rate_from_mime(&mime).unwrap_or(OUTPUT_SAMPLE_RATE);
        pcm::decode_pcm16(&bytes, rate, 1)
            .map_err(|err| ProviderError::Malformed(format!("bad PCM payload: {err}")))
    }

    fn summarize(&self, text: &str, language: Language) -> Result<Vec<String>, ProviderError> {
        let prompt = format!(
            "Summarize this story for a young child in {}. Reply with 3 to 5 short bullet \
             points, one per line, no other text.\n\n{text}",
            language.prompt_name()
        );
        Ok(parse_list(&self.generate_text(&prompt)?))
    }

    fn suggest_questions(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<String>, ProviderError> {
        let prompt = format!(
            "Suggest 3 short questions a curious child might ask about this story, in {}. \
             One per line, no other text.\n\n{text}",
            language.prompt_name()
        );
        Ok(parse_list(&self.generate_text(&prompt)?))
    }

    fn chat(
        &self,
        document: &str,
        history: &[ChatMessage],
        message: &str,
        language: Language,
    ) -> Result<String, ProviderError> {
        let mut contents = vec![json!({
            "role": "user",
            "parts": [{ "text": format!(
                "You are a friendly reading buddy for a child. Answer questions about the \
                 story below simply and kindly, in {}.\n\nSTORY:\n{document}",
                language.prompt_name()
            )}]
        })];
        for turn in history {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            contents.push(json!({ "role": role, "parts": [{ "text": turn.text }] }));
        }
        contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));

        let body = self.generate(&self.settings.text_model, json!({ "contents": contents }))?;
        first_text_part(&body)
    }

    fn describe_comic_scenes(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<SceneDescription>, ProviderError> {
        let prompt = format!(
            "Turn this story into 4 comic panels for a child, in {}. Reply with a JSON array \
             only, each element {{\"description\": string, \"keywords\": [string]}}.\n\n{text}",
            language.prompt_name()
        );
        parse_scenes(&self.generate_text(&prompt)?)
    }

    fn render_scene_image(&self, scene: &SceneDescription) -> Result<ImageData, ProviderError> {
        let prompt = format!(
            "A bright, friendly children's book illustration, no text in the image: {}",
            scene.description
        );
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        });
        let body = self.generate(&self.settings.image_model, payload)?;
        let (mime, data) = first_inline_data(&body)?;
        let bytes = pcm::decode_base64(&data)
            .map_err(|err| ProviderError::Malformed(format!("bad image payload: {err}")))?;
        Ok(ImageData {
            mime_type: mime,
            bytes,
        })
    }

    fn draft_video_prompt(&self, text: &str, language: Language) -> Result<String, ProviderError> {
        let prompt = format!(
            "Write one short, vivid prompt (under 60 words) for a video-generation model that \
             depicts the heart of this story as a gentle animated clip for children, \
             narrated in {}. Reply with the prompt only.\n\n{text}",
            language.prompt_name()
        );
        self.generate_text(&prompt)
    }

    fn render_video(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<VideoAsset, ProviderError> {
        let url = format!(
            "{API_BASE}/models/{}:predictLongRunning",
            self.settings.video_model
        );
        let body = self.post(&url, &json!({ "instances": [{ "prompt": prompt }] }))?;
        let operation = body
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Malformed("missing operation name".into()))?
            .to_string();
        info!(%operation, "Video render started");

        for attempt in 0..VIDEO_POLL_LIMIT {
            if cancel.is_cancelled() {
                return Err(ProviderError::InvalidInput("render cancelled".into()));
            }
            std::thread::sleep(VIDEO_POLL_INTERVAL);
            let status = self.get(&format!("{API_BASE}/{operation}"))?;
            if status.get("done").and_then(Value::as_bool).unwrap_or(false) {
                let uri = video_uri(&status)?;
                debug!(attempt, "Video operation finished; downloading");
                return self.download_video(&uri);
            }
        }
        Err(ProviderError::Unavailable(
            "video render did not finish in time".into(),
        ))
    }
}

impl GeminiClient {
    fn download_video(&self, uri: &str) -> Result<VideoAsset, ProviderError> {
        let response = self
            .http
            .get(uri)
            .header("x-goog-api-key", self.settings.api_key.trim())
            .send()
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "video download failed: HTTP {}",
                response.status()
            )));
        }
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("video/mp4")
            .to_string();
        let bytes = response
            .bytes()
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?
            .to_vec();
        Ok(VideoAsset { mime_type, bytes })
    }
}

/// Reject responses the provider flagged as unsafe before reading parts.
fn check_safety(body: &Value) -> Result<(), ProviderError> {
    if body
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
        .is_some()
    {
        return Err(ProviderError::SafetyRejection);
    }
    if body
        .pointer("/candidates/0/finishReason")
        .and_then(Value::as_str)
        .map(|reason| reason.eq_ignore_ascii_case("safety"))
        .unwrap_or(false)
    {
        return Err(ProviderError::SafetyRejection);
    }
    Ok(())
}

fn first_text_part(body: &Value) -> Result<String, ProviderError> {
    check_safety(body)?;
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Malformed("no content parts".into()))?;
    let mut text = String::new();
    for part in parts {
        if let Some(fragment) = part.get("text").and_then(Value::as_str) {
            text.push_str(fragment);
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Malformed("empty text response".into()));
    }
    Ok(trimmed.to_string())
}

fn first_inline_data(body: &Value) -> Result<(String, String), ProviderError> {
    check_safety(body)?;
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Malformed("no content parts".into()))?;
    for part in parts {
        if let Some(inline) = part.get("inlineData") {
            let mime = inline
                .get("mimeType")
                .and_then(Value::as_str)
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| ProviderError::Malformed("inlineData without data".into()))?
                .to_string();
            return Ok((mime, data));
        }
    }
    Err(ProviderError::Malformed("no inlineData part".into()))
}

/// e.g. "audio/pcm;rate=24000" -> 24000
fn sample_rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .filter_map(|piece| piece.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}

/// One item per non-empty line, with list markers stripped.
fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(['.', ')'])
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_scenes(text: &str) -> Result<Vec<SceneDescription>, ProviderError> {
    #[derive(serde::Deserialize)]
    struct SceneJson {
        description: String,
        #[serde(default)]
        keywords: Vec<String>,
    }

    let stripped = strip_code_fences(text);
    let scenes: Vec<SceneJson> = serde_json::from_str(stripped)
        .map_err(|err| ProviderError::Malformed(format!("scene list not valid JSON: {err}")))?;
    if scenes.is_empty() {
        return Err(ProviderError::Malformed("scene list is empty".into()));
    }
    Ok(scenes
        .into_iter()
        .map(|scene| SceneDescription {
            description: scene.description,
            keywords: scene.keywords,
        })
        .collect())
}

/// Models often wrap JSON replies in markdown fences despite instructions.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn video_uri(status: &Value) -> Result<String, ProviderError> {
    if let Some(err) = status.get("error") {
        warn!(%err, "Video operation failed");
        return Err(ProviderError::Unavailable(format!(
            "video render failed: {err}"
        )));
    }
    status
        .pointer("/response/generateVideoResponse/generatedSamples/0/video/uri")
        .or_else(|| status.pointer("/response/generatedVideos/0/video/uri"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Malformed("finished operation had no video".into()))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_text_part() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Once upon" }, { "text": " a time." }] }
            }]
        });
        assert_eq!(first_text_part(&body).unwrap(), "Once upon a time.");
    }

    #[test]
    fn block_reason_maps_to_safety_rejection() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(
            first_text_part(&body),
            Err(ProviderError::SafetyRejection)
        ));
    }

    #[test]
    fn safety_finish_reason_maps_to_safety_rejection() {
        let body = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        assert!(matches!(
            first_text_part(&body),
            Err(ProviderError::SafetyRejection)
        ));
    }

    #[test]
    fn parses_bulleted_lists() {
        let items = parse_list("- The fox ran.\n* It hid.\n3. The end.\n\n");
        assert_eq!(items, vec!["The fox ran.", "It hid.", "The end."]);
    }

    #[test]
    fn parses_fenced_scene_json() {
        let text = "```json\n[{\"description\": \"A fox in a forest\", \
                    \"keywords\": [\"fox\", \"forest\"]}]\n```";
        let scenes = parse_scenes(text).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].keywords, vec!["fox", "forest"]);
    }

    #[test]
    fn scene_parse_failure_is_malformed() {
        assert!(matches!(
            parse_scenes("sorry, I cannot"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn reads_sample_rate_from_mime() {
        assert_eq!(sample_rate_from_mime("audio/pcm;rate=24000"), Some(24_000));
        assert_eq!(sample_rate_from_mime("audio/pcm"), None);
    }

    #[test]
    fn finds_video_uri_in_finished_operation() {
        let status = json!({
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": "https://example/video.mp4" } }
            ]}}
        });
        assert_eq!(video_uri(&status).unwrap(), "https://example/video.mp4");
    }
}
