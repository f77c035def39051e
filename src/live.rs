//! Bidirectional voice session against the Gemini live API.
//!
//! One worker thread owns both the microphone capture stream and the
//! websocket. Mic audio is downsampled to 16 kHz mono PCM and streamed up;
//! model audio comes back as 24 kHz PCM and is scheduled on the shared
//! output. Transcripts surface as [`LiveEvent`]s drained from the UI tick.

use crate::audio::{AudioOutput, AudioTimeline, pcm};
use crate::cancellation::CancellationToken;
use crate::provider::Language;
use anyhow::{Context, Result, anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use tungstenite::Message;

const LIVE_HOST: &str = "generativelanguage.googleapis.com";
const UPLOAD_SAMPLE_RATE: u32 = 16_000;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const SOCKET_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// What the model heard the child say.
    UserTranscript(String),
    /// What the model is saying back.
    ModelTranscript(String),
    TurnComplete,
    Error(String),
    Closed,
}

#[derive(Debug, Clone)]
pub struct LiveSettings {
    pub api_key: String,
    pub model: String,
    pub language: Language,
    pub document: String,
}

pub struct LiveSession {
    cancel: CancellationToken,
    events: Arc<Mutex<VecDeque<LiveEvent>>>,
}

impl LiveSession {
    /// Connect and start streaming. The capture stream has to live on the
    /// session thread, so connection errors also arrive as [`LiveEvent`]s.
    pub fn start(settings: LiveSettings, output: Arc<AudioOutput>) -> Self {
        let cancel = CancellationToken::new();
        let events = Arc::new(Mutex::new(VecDeque::new()));

        let worker = Worker {
            settings,
            output,
            cancel: cancel.clone(),
            events: Arc::clone(&events),
        };
        if let Err(err) = std::thread::Builder::new()
            .name("live-session".into())
            .spawn(move || worker.run())
        {
            warn!(error = %err, "Could not spawn live session thread");
        }

        Self { cancel, events }
    }

    /// Session shell with no worker thread, for exercising screen teardown.
    #[cfg(test)]
    pub fn detached() -> Self {
        Self {
            cancel: CancellationToken::new(),
            events: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn stop(&self) {
        info!("Stopping live session");
        self.cancel.cancel();
    }

    pub fn poll_events(&self) -> Vec<LiveEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    settings: LiveSettings,
    output: Arc<AudioOutput>,
    cancel: CancellationToken,
    events: Arc<Mutex<VecDeque<LiveEvent>>>,
}

impl Worker {
    fn run(self) {
        if let Err(err) = self.session() {
            warn!(error = %err, "Live session ended with an error");
            self.push(LiveEvent::Error(err.to_string()));
        }
        self.push(LiveEvent::Closed);
    }

    fn push(&self, event: LiveEvent) {
        self.events.lock().unwrap().push_back(event);
    }

    fn session(&self) -> Result<()> {
        let mut socket = connect(&self.settings.api_key)?;
        send_json(&mut socket, &setup_message(&self.settings))?;
        info!(model = %self.settings.model, "Live session connected");

        // The capture stream is not Send, so it is created here and kept
        // alive for the whole session.
        let mic = Arc::new(Mutex::new(Vec::<f32>::new()));
        let (_stream, mic_rate, mic_channels) = open_microphone(Arc::clone(&mic))?;

        let mut reply_cursor = Duration::ZERO;
        loop {
            if self.cancel.is_cancelled() {
                socket.close(None).ok();
                return Ok(());
            }

            let captured = std::mem::take(&mut *mic.lock().unwrap());
            if !captured.is_empty() {
                let mono = to_mono(&captured, mic_channels);
                let resampled = resample_linear(&mono, mic_rate, UPLOAD_SAMPLE_RATE);
                send_json(&mut socket, &audio_chunk(&resampled))?;
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    let body: Value = serde_json::from_str(text.as_str())
                        .context("Parsing live server message")?;
                    self.handle_server_content(&body, &mut reply_cursor);
                }
                Ok(Message::Binary(bytes)) => {
                    if let Ok(body) = serde_json::from_slice::<Value>(&bytes) {
                        self.handle_server_content(&body, &mut reply_cursor);
                    }
                }
                Ok(Message::Close(_)) => return Ok(()),
                Ok(_) => {}
                Err(tungstenite::Error::Io(err))
                    if matches!(
                        err.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) => {}
                Err(err) => return Err(anyhow!("live socket read failed: {err}")),
            }
        }
    }

    fn handle_server_content(&self, body: &Value, reply_cursor: &mut Duration) {
        let Some(content) = body.get("serverContent") else {
            return;
        };

        if content
            .get("interrupted")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            debug!("Model reply interrupted by the child");
            self.output.stop_all();
            *reply_cursor = Duration::ZERO;
        }

        if let Some(text) = content
            .pointer("/inputTranscription/text")
            .and_then(Value::as_str)
        {
            self.push(LiveEvent::UserTranscript(text.to_string()));
        }
        if let Some(text) = content
            .pointer("/outputTranscription/text")
            .and_then(Value::as_str)
        {
            self.push(LiveEvent::ModelTranscript(text.to_string()));
        }

        if let Some(parts) = content.pointer("/modelTurn/parts").and_then(Value::as_array) {
            for part in parts {
                let Some(data) = part.pointer("/inlineData/data").and_then(Value::as_str) else {
                    continue;
                };
                match pcm::decode_base64(data)
                    .and_then(|bytes| pcm::decode_pcm16(&bytes, crate::audio::OUTPUT_SAMPLE_RATE, 1))
                {
                    Ok(clip) => {
                        let start = (*reply_cursor).max(self.output.now());
                        self.output.schedule(&clip, start, 1.0);
                        *reply_cursor = start + clip.duration();
                    }
                    Err(err) => warn!(error = %err, "Dropping undecodable reply audio"),
                }
            }
        }

        if content
            .get("turnComplete")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            self.push(LiveEvent::TurnComplete);
        }
    }
}

type Socket = tungstenite::WebSocket<native_tls::TlsStream<TcpStream>>;

/// TLS websocket with a short read timeout so the loop can interleave mic
/// uploads with server reads. The handshakes run under a generous timeout;
/// only the established socket gets the short polling one.
fn connect(api_key: &str) -> Result<Socket> {
    if api_key.trim().is_empty() {
        bail!("no API key configured");
    }
    let url = format!(
        "wss://{LIVE_HOST}/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent?key={}",
        api_key.trim()
    );
    let tcp = TcpStream::connect((LIVE_HOST, 443)).context("Connecting to live endpoint")?;
    tcp.set_read_timeout(Some(CONNECT_TIMEOUT))
        .context("Setting socket read timeout")?;
    let connector = native_tls::TlsConnector::new().context("Building TLS connector")?;
    let tls = connector
        .connect(LIVE_HOST, tcp)
        .map_err(|err| anyhow!("TLS handshake with live endpoint failed: {err}"))?;
    let (socket, _response) = tungstenite::client::client(url.as_str(), tls)
        .map_err(|err| anyhow!("websocket handshake failed: {err}"))?;
    socket
        .get_ref()
        .get_ref()
        .set_read_timeout(Some(SOCKET_POLL))
        .context("Setting socket poll timeout")?;
    Ok(socket)
}

fn send_json(socket: &mut Socket, payload: &Value) -> Result<()> {
    socket
        .send(Message::Text(payload.to_string().into()))
        .context("Sending live message")
}

fn setup_message(settings: &LiveSettings) -> Value {
    let instruction = format!(
        "You are a warm, patient reading buddy for a young child. Talk about the story \
         below, answer simply, and always reply in {}.\n\nSTORY:\n{}",
        settings.language.prompt_name(),
        settings.document
    );
    json!({
        "setup": {
            "model": format!("models/{}", settings.model),
            "generationConfig": { "responseModalities": ["AUDIO"] },
            "systemInstruction": { "parts": [{ "text": instruction }] },
            "inputAudioTranscription": {},
            "outputAudioTranscription": {}
        }
    })
}

fn audio_chunk(samples: &[f32]) -> Value {
    json!({
        "realtimeInput": {
            "mediaChunks": [{
                "mimeType": format!("audio/pcm;rate={UPLOAD_SAMPLE_RATE}"),
                "data": pcm::encode_base64(&pcm::encode_pcm16(samples))
            }]
        }
    })
}

fn open_microphone(buffer: Arc<Mutex<Vec<f32>>>) -> Result<(cpal::Stream, u32, u16)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("No microphone available")?;
    let config = device
        .default_input_config()
        .context("Querying microphone format")?;
    let rate = config.sample_rate();
    let channels = config.channels();
    debug!(rate, channels, "Opening microphone");

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config.into(),
            move |data: &[f32], _| buffer.lock().unwrap().extend_from_slice(data),
            |err| warn!(error = %err, "Microphone stream error"),
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config.into(),
            move |data: &[i16], _| {
                let mut buffer = buffer.lock().unwrap();
                buffer.extend(data.iter().map(|&s| f32::from(s) / 32_768.0));
            },
            |err| warn!(error = %err, "Microphone stream error"),
            None,
        ),
        other => bail!("unsupported microphone sample format {other:?}"),
    }
    .context("Opening microphone stream")?;
    stream.play().context("Starting microphone stream")?;
    Ok((stream, rate, channels))
}

fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (samples.len() as f64 / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let base = pos as usize;
        let frac = (pos - base as f64) as f32;
        let a = samples[base];
        let b = samples.get(base + 1).copied().unwrap_or(a);
        out.push(a + (b - a) * frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_downmix_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(to_mono(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn resampling_halves_sample_count() {
        let input: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let out = resample_linear(&input, 32_000, 16_000);
        assert_eq!(out.len(), 50);
        assert!((out[1] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn resampling_is_identity_at_equal_rates() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&input, 16_000, 16_000), input);
    }

    #[test]
    fn setup_message_names_the_model() {
        let settings = LiveSettings {
            api_key: "k".into(),
            model: "gemini-live".into(),
            language: Language::English,
            document: "A story.".into(),
        };
        let setup = setup_message(&settings);
        assert_eq!(
            setup.pointer("/setup/model").unwrap().as_str().unwrap(),
            "models/gemini-live"
        );
    }

    #[test]
    fn audio_chunk_declares_upload_rate() {
        let chunk = audio_chunk(&[0.0; 160]);
        let mime = chunk
            .pointer("/realtimeInput/mediaChunks/0/mimeType")
            .unwrap()
            .as_str()
            .unwrap();
        assert_eq!(mime, "audio/pcm;rate=16000");
    }
}
