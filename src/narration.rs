//! Paced read-aloud pipeline.
//!
//! A producer thread synthesizes sentence chunks ahead of playback and a
//! consumer thread schedules them back to back on the audio timeline. The
//! channel between them is bounded, so synthesis can never run more than a
//! few chunks ahead of the listener.

use crate::audio::{AudioClip, AudioTimeline};
use crate::cancellation::CancellationToken;
use crate::chunker::split_chunks;
use crate::provider::ProviderError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicU32, AtomicUsize, Ordering};
use std::sync::mpsc::{RecvTimeoutError, sync_channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How many synthesized chunks may sit in the queue awaiting playback.
const PREFETCH_DEPTH: usize = 3;
/// The consumer keeps roughly this much audio scheduled ahead of the clock.
const SCHEDULE_LEAD: Duration = Duration::from_secs(1);
/// Granularity of cancellation checks while waiting.
const POLL_SLICE: Duration = Duration::from_millis(25);

/// Synthesis backend for one chunk of text. Object-safe so screens can hand
/// the narrator whatever provider they are configured with.
pub trait SpeechSource: Send + Sync {
    fn synthesize(&self, text: &str) -> Result<AudioClip, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationState {
    /// Nothing playing. Either never started, stopped, or finished.
    Idle,
    /// Started but waiting on synthesis with no audio left to play.
    Buffering,
    Playing,
}

#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("There is no text to read aloud")]
    EmptyDocument,
}

const STATE_IDLE: u8 = 0;
const STATE_BUFFERING: u8 = 1;
const STATE_PLAYING: u8 = 2;

struct Shared {
    state: AtomicU8,
    current_chunk: AtomicUsize,
    rate_bits: AtomicU32,
    cache: Mutex<HashMap<usize, AudioClip>>,
    last_error: Mutex<Option<ProviderError>>,
}

impl Shared {
    fn set_state(&self, state: NarrationState) {
        let raw = match state {
            NarrationState::Idle => STATE_IDLE,
            NarrationState::Buffering => STATE_BUFFERING,
            NarrationState::Playing => STATE_PLAYING,
        };
        self.state.store(raw, Ordering::Release);
    }

    fn state(&self) -> NarrationState {
        match self.state.load(Ordering::Acquire) {
            STATE_BUFFERING => NarrationState::Buffering,
            STATE_PLAYING => NarrationState::Playing,
            _ => NarrationState::Idle,
        }
    }

    fn rate(&self) -> f32 {
        f32::from_bits(self.rate_bits.load(Ordering::Acquire))
    }
}

pub struct Narrator {
    source: Arc<dyn SpeechSource>,
    timeline: Arc<dyn AudioTimeline>,
    chunks: Mutex<Vec<String>>,
    shared: Arc<Shared>,
    run: Mutex<Option<CancellationToken>>,
}

impl Narrator {
    pub fn new(source: Arc<dyn SpeechSource>, timeline: Arc<dyn AudioTimeline>) -> Self {
        Self {
            source,
            timeline,
            chunks: Mutex::new(Vec::new()),
            shared: Arc::new(Shared {
                state: AtomicU8::new(STATE_IDLE),
                current_chunk: AtomicUsize::new(0),
                rate_bits: AtomicU32::new(1.0_f32.to_bits()),
                cache: Mutex::new(HashMap::new()),
                last_error: Mutex::new(None),
            }),
            run: Mutex::new(None),
        }
    }

    /// Replace the text being read. Stops playback and invalidates the
    /// synthesized-audio cache, since chunk indices now mean something else.
    pub fn set_document(&self, text: &str) {
        self.stop();
        let chunks = split_chunks(text);
        info!(chunk_count = chunks.len(), "Loaded document for narration");
        *self.chunks.lock().unwrap() = chunks;
        self.shared.cache.lock().unwrap().clear();
        self.shared.current_chunk.store(0, Ordering::Release);
    }

    pub fn chunks(&self) -> Vec<String> {
        self.chunks.lock().unwrap().clone()
    }

    /// Begin reading from the first chunk. Calling this while a run is
    /// already active does nothing.
    pub fn play(&self) -> Result<(), NarrationError> {
        let mut run = self.run.lock().unwrap();
        if let Some(existing) = &*run {
            if !existing.is_cancelled() && self.shared.state() != NarrationState::Idle {
                debug!("Play requested while already narrating; ignoring");
                return Ok(());
            }
        }
        let chunks = self.chunks.lock().unwrap().clone();
        if chunks.is_empty() {
            return Err(NarrationError::EmptyDocument);
        }

        self.shared.set_state(NarrationState::Buffering);
        self.shared.current_chunk.store(0, Ordering::Release);
        *self.shared.last_error.lock().unwrap() = None;

        let cancel = CancellationToken::new();
        let (tx, rx) = sync_channel::<(usize, AudioClip)>(PREFETCH_DEPTH);

        let producer = ProducerLoop {
            source: Arc::clone(&self.source),
            shared: Arc::clone(&self.shared),
            cancel: cancel.clone(),
            chunks,
        };
        if let Err(err) = std::thread::Builder::new()
            .name("narration-synth".into())
            .spawn(move || producer.run(tx))
        {
            warn!(error = %err, "Could not spawn synthesis thread");
        }

        let consumer = ConsumerLoop {
            timeline: Arc::clone(&self.timeline),
            shared: Arc::clone(&self.shared),
            cancel: cancel.clone(),
        };
        if let Err(err) = std::thread::Builder::new()
            .name("narration-play".into())
            .spawn(move || consumer.run(rx))
        {
            warn!(error = %err, "Could not spawn playback thread");
        }

        *run = Some(cancel);
        Ok(())
    }

    /// Halt playback immediately. The cache is kept, so playing again
    /// restarts from the first chunk without re-synthesizing.
    pub fn stop(&self) {
        let mut run = self.run.lock().unwrap();
        if let Some(cancel) = run.take() {
            info!("Stopping narration");
            cancel.cancel();
            self.timeline.stop_all();
            self.shared.set_state(NarrationState::Idle);
            self.shared.current_chunk.store(0, Ordering::Release);
        }
    }

    pub fn state(&self) -> NarrationState {
        let mut run = self.run.lock().unwrap();
        let Some(cancel) = run.as_ref() else {
            return NarrationState::Idle;
        };
        // A cancelled run is idle even if its threads have not yet
        // observed the token.
        if cancel.is_cancelled() {
            run.take();
            return NarrationState::Idle;
        }
        let state = self.shared.state();
        if state == NarrationState::Idle {
            // The run finished on its own; drop the stale token.
            run.take();
        }
        state
    }

    pub fn current_chunk(&self) -> usize {
        if self.run.lock().unwrap().is_none() {
            return 0;
        }
        self.shared.current_chunk.load(Ordering::Acquire)
    }

    /// Playback rate multiplier. Takes effect from the next scheduled chunk;
    /// audio already handed to the output keeps its original rate.
    pub fn set_speed(&self, rate: f32) {
        let clamped = rate.clamp(0.5, 1.8);
        self.shared
            .rate_bits
            .store(clamped.to_bits(), Ordering::Release);
    }

    pub fn speed(&self) -> f32 {
        self.shared.rate()
    }

    pub fn take_last_error(&self) -> Option<ProviderError> {
        self.shared.last_error.lock().unwrap().take()
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        if let Some(cancel) = self.run.lock().unwrap().take() {
            cancel.cancel();
        }
    }
}

struct ProducerLoop {
    source: Arc<dyn SpeechSource>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    chunks: Vec<String>,
}

impl ProducerLoop {
    fn run(self, tx: std::sync::mpsc::SyncSender<(usize, AudioClip)>) {
        for (index, text) in self.chunks.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return;
            }
            let cached = self.shared.cache.lock().unwrap().get(&index).cloned();
            let clip = match cached {
                Some(clip) => clip,
                None => match self.source.synthesize(text) {
                    Ok(clip) => {
                        self.shared
                            .cache
                            .lock()
                            .unwrap()
                            .insert(index, clip.clone());
                        clip
                    }
                    Err(err) if err.is_terminal() => {
                        warn!(index, error = %err, "Synthesis failed; ending run");
                        *self.shared.last_error.lock().unwrap() = Some(err);
                        return;
                    }
                    Err(err) => {
                        warn!(index, error = %err, "Synthesis failed; skipping chunk");
                        *self.shared.last_error.lock().unwrap() = Some(err);
                        continue;
                    }
                },
            };
            // Blocks while the playback queue is full. That is the
            // backpressure keeping prefetch bounded.
            if tx.send((index, clip)).is_err() {
                return;
            }
        }
        debug!(chunk_count = self.chunks.len(), "Synthesis finished");
    }
}

struct ConsumerLoop {
    timeline: Arc<dyn AudioTimeline>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl ConsumerLoop {
    fn run(self, rx: std::sync::mpsc::Receiver<(usize, AudioClip)>) {
        let mut cursor = Duration::ZERO;
        loop {
            if self.cancel.is_cancelled() {
                return;
            }
            match rx.recv_timeout(POLL_SLICE) {
                Ok((index, clip)) => {
                    if self.cancel.is_cancelled() {
                        return;
                    }
                    let rate = self.shared.rate();
                    let start = cursor.max(self.timeline.now());
                    self.shared.current_chunk.store(index, Ordering::Release);
                    self.shared.set_state(NarrationState::Playing);
                    self.timeline.schedule(&clip, start, rate);
                    cursor = start + clip.duration().div_f32(rate);
                    self.pace(cursor);
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Queue ran dry. If the scheduled audio has also run
                    // out, the listener is waiting on synthesis.
                    if self.timeline.now() >= cursor {
                        self.shared.set_state(NarrationState::Buffering);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        // Let the tail of the audio finish before going idle.
        while !self.cancel.is_cancelled() && self.timeline.now() < cursor {
            std::thread::sleep(POLL_SLICE);
        }
        if !self.cancel.is_cancelled() {
            self.shared.set_state(NarrationState::Idle);
            self.shared.current_chunk.store(0, Ordering::Release);
            debug!("Narration run complete");
        }
    }

    /// Sleep until the schedule lead shrinks, so chunks are committed to the
    /// output close to when they are heard and rate changes land quickly.
    fn pace(&self, cursor: Duration) {
        while !self.cancel.is_cancelled()
            && cursor.saturating_sub(self.timeline.now()) > SCHEDULE_LEAD
        {
            std::thread::sleep(POLL_SLICE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Instant;

    struct FakeTimeline {
        epoch: Instant,
        scheduled: Mutex<Vec<(f32, Duration, f32)>>,
        stops: AtomicUsize,
    }

    impl FakeTimeline {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                epoch: Instant::now(),
                scheduled: Mutex::new(Vec::new()),
                stops: AtomicUsize::new(0),
            })
        }

        fn first_samples(&self) -> Vec<f32> {
            self.scheduled.lock().unwrap().iter().map(|s| s.0).collect()
        }
    }

    impl AudioTimeline for FakeTimeline {
        fn now(&self) -> Duration {
            self.epoch.elapsed()
        }

        fn schedule(&self, clip: &AudioClip, at: Duration, rate: f32) {
            let first = clip.samples.first().copied().unwrap_or(f32::NAN);
            self.scheduled.lock().unwrap().push((first, at, rate));
        }

        fn stop_all(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// 10ms mono clip whose first sample tags which chunk it came from.
    fn tagged_clip(tag: f32) -> AudioClip {
        AudioClip {
            samples: vec![tag; 10],
            sample_rate: 1000,
            channels: 1,
        }
    }

    struct IndexedSource {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl SpeechSource for IndexedSource {
        fn synthesize(&self, text: &str) -> Result<AudioClip, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(text) {
                return Err(ProviderError::Unavailable("synthetic failure".into()));
            }
            let tag = match text {
                "One." => 0.1,
                "Two." => 0.2,
                "Three." => 0.3,
                other => panic!("unexpected chunk {other:?}"),
            };
            Ok(tagged_clip(tag))
        }
    }

    fn wait_for_idle(narrator: &Narrator) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while narrator.state() != NarrationState::Idle {
            assert!(Instant::now() < deadline, "narration never went idle");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn schedules_chunks_in_document_order() {
        let timeline = FakeTimeline::new();
        let narrator = Narrator::new(
            Arc::new(IndexedSource {
                calls: AtomicUsize::new(0),
                fail_on: None,
            }),
            timeline.clone(),
        );
        narrator.set_document("One. Two. Three.");
        narrator.play().unwrap();
        wait_for_idle(&narrator);

        assert_eq!(timeline.first_samples(), vec![0.1, 0.2, 0.3]);
        let starts: Vec<Duration> = timeline
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.1)
            .collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn failed_chunk_is_skipped() {
        let timeline = FakeTimeline::new();
        let narrator = Narrator::new(
            Arc::new(IndexedSource {
                calls: AtomicUsize::new(0),
                fail_on: Some("Two."),
            }),
            timeline.clone(),
        );
        narrator.set_document("One. Two. Three.");
        narrator.play().unwrap();
        wait_for_idle(&narrator);

        assert_eq!(timeline.first_samples(), vec![0.1, 0.3]);
        assert!(narrator.take_last_error().is_some());
    }

    #[test]
    fn safety_rejection_ends_the_run() {
        struct RejectingSource;
        impl SpeechSource for RejectingSource {
            fn synthesize(&self, text: &str) -> Result<AudioClip, ProviderError> {
                match text {
                    "One." => Ok(tagged_clip(0.1)),
                    _ => Err(ProviderError::SafetyRejection),
                }
            }
        }

        let timeline = FakeTimeline::new();
        let narrator = Narrator::new(Arc::new(RejectingSource), timeline.clone());
        narrator.set_document("One. Two. Three.");
        narrator.play().unwrap();
        wait_for_idle(&narrator);

        // Unlike a transient failure, a rejection is not skipped past:
        // nothing after the rejected chunk is scheduled.
        assert_eq!(timeline.first_samples(), vec![0.1]);
        assert!(matches!(
            narrator.take_last_error(),
            Some(ProviderError::SafetyRejection)
        ));
    }

    #[test]
    fn empty_document_is_an_error() {
        let narrator = Narrator::new(
            Arc::new(IndexedSource {
                calls: AtomicUsize::new(0),
                fail_on: None,
            }),
            FakeTimeline::new(),
        );
        narrator.set_document("   \n  ");
        assert!(matches!(narrator.play(), Err(NarrationError::EmptyDocument)));
    }

    #[test]
    fn stop_halts_playback_and_resets_position() {
        struct SlowSource;
        impl SpeechSource for SlowSource {
            fn synthesize(&self, _text: &str) -> Result<AudioClip, ProviderError> {
                std::thread::sleep(Duration::from_millis(20));
                Ok(tagged_clip(1.0))
            }
        }

        let timeline = FakeTimeline::new();
        let narrator = Narrator::new(Arc::new(SlowSource), timeline.clone());
        narrator.set_document("One. Two. Three. Four. Five. Six.");
        narrator.play().unwrap();
        std::thread::sleep(Duration::from_millis(40));
        narrator.stop();

        assert_eq!(narrator.state(), NarrationState::Idle);
        assert_eq!(narrator.current_chunk(), 0);
        assert!(timeline.stops.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn play_while_playing_is_a_no_op() {
        let timeline = FakeTimeline::new();
        let narrator = Narrator::new(
            Arc::new(IndexedSource {
                calls: AtomicUsize::new(0),
                fail_on: None,
            }),
            timeline.clone(),
        );
        narrator.set_document("One. Two. Three.");
        narrator.play().unwrap();
        narrator.play().unwrap();
        wait_for_idle(&narrator);

        assert_eq!(timeline.first_samples(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn speed_change_applies_to_later_chunks() {
        struct GatedSource {
            gate: Mutex<mpsc::Receiver<()>>,
        }
        impl SpeechSource for GatedSource {
            fn synthesize(&self, _text: &str) -> Result<AudioClip, ProviderError> {
                self.gate.lock().unwrap().recv().ok();
                Ok(tagged_clip(1.0))
            }
        }

        let (gate_tx, gate_rx) = mpsc::channel();
        let timeline = FakeTimeline::new();
        let narrator = Narrator::new(
            Arc::new(GatedSource {
                gate: Mutex::new(gate_rx),
            }),
            timeline.clone(),
        );
        narrator.set_document("One. Two. Three.");
        narrator.play().unwrap();

        gate_tx.send(()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while timeline.scheduled.lock().unwrap().len() < 1 {
            assert!(Instant::now() < deadline, "first chunk never scheduled");
            std::thread::sleep(Duration::from_millis(5));
        }
        narrator.set_speed(1.5);
        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
        wait_for_idle(&narrator);

        let rates: Vec<f32> = timeline
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.2)
            .collect();
        assert_eq!(rates, vec![1.0, 1.5, 1.5]);
    }

    #[test]
    fn replay_reuses_cached_audio() {
        let source = Arc::new(IndexedSource {
            calls: AtomicUsize::new(0),
            fail_on: None,
        });
        let timeline = FakeTimeline::new();
        let narrator = Narrator::new(source.clone(), timeline.clone());
        narrator.set_document("One. Two. Three.");
        narrator.play().unwrap();
        wait_for_idle(&narrator);
        narrator.play().unwrap();
        wait_for_idle(&narrator);

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(timeline.scheduled.lock().unwrap().len(), 6);
    }

    #[test]
    fn new_document_invalidates_cache() {
        let source = Arc::new(IndexedSource {
            calls: AtomicUsize::new(0),
            fail_on: None,
        });
        let narrator = Narrator::new(source.clone(), FakeTimeline::new());
        narrator.set_document("One. Two. Three.");
        narrator.play().unwrap();
        wait_for_idle(&narrator);
        narrator.set_document("One. Two. Three.");
        narrator.play().unwrap();
        wait_for_idle(&narrator);

        assert_eq!(source.calls.load(Ordering::SeqCst), 6);
    }
}
