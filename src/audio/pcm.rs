//! Raw audio codec for the provider's wire format: base64-wrapped,
//! signed 16-bit little-endian PCM.

use anyhow::{Result, bail};
use base64::{Engine as _, engine::general_purpose};
use std::time::Duration;

/// A decoded, playable waveform for one text chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() / self.channels.max(1) as usize;
        Duration::from_secs_f64(frames as f64 / self.sample_rate.max(1) as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(data.trim())?)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Interpret a byte view as signed 16-bit little-endian samples normalized
/// to [-1, 1]. Works on any `&[u8]`, including a sub-slice of a larger
/// allocation; byte pairing starts at the slice's own first byte, never at
/// the backing allocation's.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioClip> {
    if bytes.len() % 2 != 0 {
        bail!("PCM16 payload has odd byte length {}", bytes.len());
    }
    if channels == 0 {
        bail!("PCM16 payload claims zero channels");
    }
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();
    Ok(AudioClip {
        samples,
        sample_rate,
        channels,
    })
}

/// Symmetric encode for outbound microphone frames.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let quantized = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        bytes.extend_from_slice(&quantized.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_subslice_identically_to_copied_buffer() {
        // Regression for the offset-handling defect class: a view into a
        // larger allocation must decode exactly like a standalone copy.
        let mut backing = vec![0xAAu8; 6];
        backing.extend_from_slice(&[0x00, 0x40, 0x00, 0xC0, 0xFF, 0x7F, 0x00, 0x80]);
        let view = &backing[6..];
        let copied: Vec<u8> = view.to_vec();

        let from_view = decode_pcm16(view, 24_000, 1).unwrap();
        let from_copy = decode_pcm16(&copied, 24_000, 1).unwrap();
        assert_eq!(from_view, from_copy);
        assert_eq!(from_view.samples.len(), 4);
    }

    #[test]
    fn samples_are_normalized() {
        let clip = decode_pcm16(&[0xFF, 0x7F, 0x00, 0x80, 0x00, 0x00], 24_000, 1).unwrap();
        assert!((clip.samples[0] - (32767.0 / 32768.0)).abs() < 1e-6);
        assert!((clip.samples[1] - -1.0).abs() < 1e-6);
        assert_eq!(clip.samples[2], 0.0);
    }

    #[test]
    fn odd_length_is_rejected() {
        assert!(decode_pcm16(&[0x01, 0x02, 0x03], 24_000, 1).is_err());
    }

    #[test]
    fn encode_is_symmetric_with_decode() {
        let samples = vec![0.0, 0.5, -0.5, 0.999];
        let bytes = encode_pcm16(&samples);
        let clip = decode_pcm16(&bytes, 16_000, 1).unwrap();
        for (a, b) in samples.iter().zip(clip.samples.iter()) {
            assert!((a - b).abs() < 1.0 / 32000.0, "{a} vs {b}");
        }
    }

    #[test]
    fn duration_accounts_for_channels() {
        let clip = AudioClip {
            samples: vec![0.0; 48_000],
            sample_rate: 24_000,
            channels: 2,
        };
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn base64_roundtrip() {
        let bytes = vec![1u8, 2, 3, 250];
        assert_eq!(decode_base64(&encode_base64(&bytes)).unwrap(), bytes);
    }
}
