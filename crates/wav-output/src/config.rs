use std::fmt;

use crate::error::OutputError;
use crate::mix::MAX_VOLUME;

/// Largest channel count accepted by [`DeviceConfig::validate`].
pub const MAX_CHANNELS: u16 = 8;

/// Sample layout of converted sounds and of the bytes handed to the fill callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// Signed 16-bit little-endian, interleaved.
    #[default]
    S16Le,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::S16Le => 2,
        }
    }
}

/// Device parameters fixed between open and close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Output sample rate in Hz.
    pub frequency: u32,
    /// Interleaved channel count (1 = mono, 2 = stereo).
    pub channels: u16,
    pub format: SampleFormat,
    /// Device buffer size in frames.
    pub buffer_frames: u32,
}

impl DeviceConfig {
    pub fn new(frequency: u32, channels: u16, buffer_frames: u32) -> Self {
        Self {
            frequency,
            channels,
            format: SampleFormat::S16Le,
            buffer_frames,
        }
    }

    /// Reject parameters no device can honour.
    pub fn validate(&self) -> Result<(), OutputError> {
        if self.frequency == 0 {
            return Err(OutputError::InvalidConfig("frequency must be > 0".into()));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(OutputError::InvalidConfig(format!(
                "channels must be 1..={MAX_CHANNELS}, got {}",
                self.channels
            )));
        }
        if self.buffer_frames == 0 {
            return Err(OutputError::InvalidConfig("buffer size must be > 0".into()));
        }
        Ok(())
    }

    /// Bytes per interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        self.format.bytes_per_sample() * self.channels as usize
    }

    /// Whether sounds converted for `self` can be played on `other`.
    ///
    /// The buffer size does not affect the byte layout, so it is ignored.
    pub fn same_layout(&self, other: &DeviceConfig) -> bool {
        self.frequency == other.frequency
            && self.channels == other.channels
            && self.format == other.format
    }
}

impl fmt::Display for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz / {} ch / {:?} / {} frames",
            self.frequency, self.channels, self.format, self.buffer_frames
        )
    }
}

/// Adapter-wide options chosen at construction.
#[derive(Clone, Debug)]
pub struct OutputOptions {
    /// Output device substring match; `None` picks the host default.
    pub device: Option<String>,
    /// Initial mixing volume, `0..=MAX_VOLUME`.
    pub volume: u8,
    /// Resampler input chunk size in frames used while converting sounds.
    pub resample_chunk_frames: usize,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            device: None,
            volume: MAX_VOLUME,
            resample_chunk_frames: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_fields() {
        assert!(DeviceConfig::new(0, 2, 1024).validate().is_err());
        assert!(DeviceConfig::new(44_100, 0, 1024).validate().is_err());
        assert!(DeviceConfig::new(44_100, 2, 0).validate().is_err());
        assert!(DeviceConfig::new(44_100, MAX_CHANNELS + 1, 1024).validate().is_err());
        assert!(DeviceConfig::new(44_100, 2, 1024).validate().is_ok());
    }

    #[test]
    fn frame_bytes_counts_all_channels() {
        assert_eq!(DeviceConfig::new(22_050, 1, 512).frame_bytes(), 2);
        assert_eq!(DeviceConfig::new(22_050, 2, 512).frame_bytes(), 4);
    }

    #[test]
    fn same_layout_ignores_buffer_size() {
        let a = DeviceConfig::new(48_000, 2, 512);
        let b = DeviceConfig::new(48_000, 2, 4096);
        let c = DeviceConfig::new(44_100, 2, 512);
        assert!(a.same_layout(&b));
        assert!(!a.same_layout(&c));
    }
}
