//! Shared audio output device.
//!
//! One process-wide output handle, created lazily on the first `unlock`
//! (which must run from a user-input handler) and reused by every playback
//! feature for the rest of the session. Rodio output streams are not `Send`,
//! so the device lives on a dedicated thread and callers talk to it over a
//! command channel.

use crate::audio::pcm::AudioClip;
use rodio::source::Zero;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source, buffer::SamplesBuffer};
use std::sync::mpsc::{self, Sender};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Nominal output rate; matches the provider's synthesized PCM.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Scheduling seam between the narration pipeline and the real device, so
/// the pipeline can be exercised against a recording fake in tests.
pub trait AudioTimeline: Send + Sync {
    /// Monotonic clock shared by every scheduled source.
    fn now(&self) -> Duration;
    /// Queue a clip to start at `at` (clamped to now if already past) with
    /// the given playback rate.
    fn schedule(&self, clip: &AudioClip, at: Duration, rate: f32);
    /// Halt every scheduled-but-unfinished source.
    fn stop_all(&self);
}

enum OutputCmd {
    Unlock,
    Schedule {
        clip: AudioClip,
        at: Duration,
        rate: f32,
    },
    StopAll,
    SetVolume(f32),
}

/// Handle to the audio-output thread. Cheap to clone; inject one wherever
/// playback is needed instead of reaching for a hidden global.
pub struct AudioOutput {
    cmd: Mutex<Sender<OutputCmd>>,
    epoch: Instant,
    unlocked: Arc<AtomicBool>,
}

impl AudioOutput {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<OutputCmd>();
        let epoch = Instant::now();
        std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || run_output_thread(rx, epoch))
            .ok();
        Self {
            cmd: Mutex::new(tx),
            epoch,
            unlocked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create (or resume) the output device. Must be called from a
    /// user-initiated input handler before any asynchronous playback is
    /// attempted; scheduling against a locked output is a logged no-op.
    pub fn unlock(&self) {
        self.unlocked.store(true, Ordering::Release);
        self.send(OutputCmd::Unlock);
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::Acquire)
    }

    pub fn set_volume(&self, volume: f32) {
        self.send(OutputCmd::SetVolume(volume.clamp(0.0, 2.0)));
    }

    fn send(&self, cmd: OutputCmd) {
        let sender = match self.cmd.lock() {
            Ok(sender) => sender.clone(),
            Err(_) => return,
        };
        if sender.send(cmd).is_err() {
            warn!("Audio output thread is gone; dropping command");
        }
    }
}

impl AudioTimeline for AudioOutput {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn schedule(&self, clip: &AudioClip, at: Duration, rate: f32) {
        if !self.is_unlocked() {
            warn!("Audio output not unlocked yet; dropping scheduled clip");
            return;
        }
        self.send(OutputCmd::Schedule {
            clip: clip.clone(),
            at,
            rate,
        });
    }

    fn stop_all(&self) {
        self.send(OutputCmd::StopAll);
    }
}

struct Device {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Sink,
    volume: f32,
}

impl Device {
    fn open(volume: f32) -> Option<Device> {
        let (stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(err) => {
                warn!("Failed to open audio output: {err}");
                return None;
            }
        };
        let sink = match Sink::try_new(&handle) {
            Ok(sink) => sink,
            Err(err) => {
                warn!("Failed to create audio sink: {err}");
                return None;
            }
        };
        sink.set_volume(volume);
        info!("Audio output device opened");
        Some(Device {
            _stream: stream,
            handle,
            sink,
            volume,
        })
    }

    /// Replace the sink, discarding everything queued on the old one.
    fn reset_sink(&mut self) {
        self.sink.stop();
        if let Ok(sink) = Sink::try_new(&self.handle) {
            sink.set_volume(self.volume);
            self.sink = sink;
        }
    }
}

/// Decide how much lead-in silence a clip needs and advance the queue-end
/// estimate. The sink plays appended sources back to back, so the silence
/// must only cover the distance from the end of what is already queued to
/// the requested start, never from the wall clock (that would double-count
/// the backlog and open a gap between consecutive clips).
fn queue_clip(
    queued_until: &mut Duration,
    now: Duration,
    at: Duration,
    play_len: Duration,
) -> Duration {
    let backlog = (*queued_until).max(now);
    let lead = at.saturating_sub(backlog);
    *queued_until = backlog + lead + play_len;
    lead
}

fn run_output_thread(rx: mpsc::Receiver<OutputCmd>, epoch: Instant) {
    let mut device: Option<Device> = None;
    let mut volume = 1.0f32;
    let mut queued_until = Duration::ZERO;

    while let Ok(cmd) = rx.recv() {
        match cmd {
            OutputCmd::Unlock => {
                if device.is_none() {
                    device = Device::open(volume);
                } else if let Some(dev) = &device {
                    // Tolerate a suspended device by nudging it back.
                    dev.sink.play();
                }
            }
            OutputCmd::Schedule { clip, at, rate } => {
                let Some(dev) = &device else {
                    warn!("Schedule requested before the output was unlocked");
                    continue;
                };
                if clip.is_empty() {
                    continue;
                }
                let play_len = clip.duration().div_f32(rate.max(0.1));
                let lead = queue_clip(&mut queued_until, epoch.elapsed(), at, play_len);
                if lead > Duration::ZERO {
                    let silence =
                        Zero::<f32>::new(clip.channels, clip.sample_rate).take_duration(lead);
                    dev.sink.append(silence);
                }
                let source =
                    SamplesBuffer::new(clip.channels, clip.sample_rate, clip.samples.clone())
                        .speed(rate.max(0.1));
                dev.sink.append(source);
                dev.sink.play();
                debug!(
                    lead_ms = lead.as_millis() as u64,
                    rate,
                    samples = clip.samples.len(),
                    "Scheduled audio clip"
                );
            }
            OutputCmd::StopAll => {
                queued_until = Duration::ZERO;
                if let Some(dev) = &mut device {
                    dev.reset_sink();
                    debug!("Halted all scheduled audio sources");
                }
            }
            OutputCmd::SetVolume(v) => {
                volume = v;
                if let Some(dev) = &mut device {
                    dev.volume = v;
                    dev.sink.set_volume(v);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::queue_clip;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn back_to_back_clips_get_no_silence() {
        // Two half-second clips requested seamlessly: the second arrives
        // while the first is still playing and must append directly.
        let mut queued_until = Duration::ZERO;
        let lead = queue_clip(&mut queued_until, ms(0), ms(0), ms(500));
        assert_eq!(lead, Duration::ZERO);
        assert_eq!(queued_until, ms(500));

        let lead = queue_clip(&mut queued_until, ms(5), ms(500), ms(500));
        assert_eq!(lead, Duration::ZERO);
        assert_eq!(queued_until, ms(1000));
    }

    #[test]
    fn gap_after_drained_queue_gets_silence_from_queue_end() {
        // Sink ran dry at 500 ms, the next clip wants to start at 2 s and
        // the clock reads 1 s: only the 1 s from now to the start is
        // silence, not the 1.5 s from the stale queue end.
        let mut queued_until = ms(500);
        let lead = queue_clip(&mut queued_until, ms(1000), ms(2000), ms(300));
        assert_eq!(lead, ms(1000));
        assert_eq!(queued_until, ms(2300));
    }

    #[test]
    fn late_clip_clamps_to_the_queue_end() {
        // A clip asked to start in the past of the queue appends with no
        // silence at all.
        let mut queued_until = ms(1000);
        let lead = queue_clip(&mut queued_until, ms(300), ms(200), ms(400));
        assert_eq!(lead, Duration::ZERO);
        assert_eq!(queued_until, ms(1400));
    }

    #[test]
    fn faster_rate_shortens_the_queued_length() {
        // The queue-end estimate must use played duration, so a 1 s clip
        // at 2x occupies half a second of sink time.
        let mut queued_until = Duration::ZERO;
        queue_clip(
            &mut queued_until,
            ms(0),
            ms(0),
            Duration::from_secs(1).div_f32(2.0),
        );
        assert_eq!(queued_until, ms(500));
    }
}
