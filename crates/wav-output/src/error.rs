use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the output adapter.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The operation needs an open device.
    #[error("audio device is not open")]
    NotOpen,
    /// Rejected device parameters.
    #[error("invalid device config: {0}")]
    InvalidConfig(String),
    /// The output device could not be found or configured.
    #[error("output device unavailable: {0}")]
    Device(String),
    /// The output stream could not be built, started or paused.
    #[error("output stream error: {0}")]
    Stream(String),
    #[error("read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The source could not be probed or decoded as WAV.
    #[error("decode failed: {0}")]
    Decode(String),
    /// Channel mapping or resampling to the device format failed.
    #[error("format conversion failed: {0}")]
    Conversion(String),
    /// The sound was converted for a different device configuration.
    #[error("sound format {sound} does not match open device {device}")]
    FormatMismatch { sound: String, device: String },
}
