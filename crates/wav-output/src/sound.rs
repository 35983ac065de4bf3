use std::sync::Arc;

use crate::config::DeviceConfig;
use crate::decode::DecodedWav;

/// A WAV resource converted to a device format.
///
/// The bytes are shared with the playback cursor while the sound plays, so freeing
/// (dropping) a sound mid-playback never leaves the callback reading released memory.
#[derive(Debug)]
pub struct Sound {
    data: Arc<[u8]>,
    config: DeviceConfig,
    source_rate: u32,
    source_channels: usize,
    source_bits: Option<u16>,
    source_bytes: usize,
}

impl Sound {
    pub(crate) fn new(data: Vec<u8>, config: DeviceConfig, decoded: &DecodedWav) -> Self {
        Self {
            data: data.into(),
            config,
            source_rate: decoded.sample_rate,
            source_channels: decoded.channels,
            source_bits: decoded.bits_per_sample,
            source_bytes: decoded.source_bytes(),
        }
    }

    /// Converted bytes in the device format.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Device configuration this sound was converted for.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn frames(&self) -> usize {
        self.data.len() / self.config.frame_bytes()
    }

    pub fn duration_ms(&self) -> u64 {
        if self.config.frequency == 0 {
            return 0;
        }
        (self.frames() as u64).saturating_mul(1000) / u64::from(self.config.frequency)
    }

    /// Ratio of converted size to source PCM size.
    pub fn len_mult(&self) -> f64 {
        if self.source_bytes == 0 {
            return 1.0;
        }
        self.data.len() as f64 / self.source_bytes as f64
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    pub fn source_channels(&self) -> usize {
        self.source_channels
    }

    pub fn source_bits_per_sample(&self) -> Option<u16> {
        self.source_bits
    }

    pub(crate) fn shared_data(&self) -> Arc<[u8]> {
        self.data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(rate: u32, channels: usize, frames: usize) -> DecodedWav {
        DecodedWav {
            sample_rate: rate,
            channels,
            bits_per_sample: Some(16),
            samples: vec![0.0; frames * channels],
        }
    }

    #[test]
    fn duration_and_frames_follow_device_format() {
        let config = DeviceConfig::new(44_100, 2, 1024);
        let sound = Sound::new(vec![0; 44_100 * 4], config, &decoded(44_100, 2, 44_100));
        assert_eq!(sound.frames(), 44_100);
        assert_eq!(sound.duration_ms(), 1000);
        assert!((sound.len_mult() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn len_mult_reflects_upconversion() {
        let config = DeviceConfig::new(44_100, 2, 1024);
        // 22.05 kHz mono 16-bit -> 44.1 kHz stereo: 4x the bytes.
        let sound = Sound::new(vec![0; 400], config, &decoded(22_050, 1, 50));
        assert!((sound.len_mult() - 4.0).abs() < 1e-9);
        assert_eq!(sound.source_rate(), 22_050);
        assert_eq!(sound.source_channels(), 1);
    }
}
