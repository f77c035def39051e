pub mod output;
pub mod pcm;

pub use output::{AudioOutput, AudioTimeline, OUTPUT_SAMPLE_RATE};
pub use pcm::AudioClip;
