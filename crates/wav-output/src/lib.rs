//! WAV output adapter.
//!
//! Opens an output device, converts WAV resources to the device format and plays one
//! resource at a time through the device's fill callback.

pub mod adapter;
pub mod config;
pub mod convert;
pub mod cursor;
pub mod decode;
pub mod device;
pub mod error;
pub mod mix;
pub mod playback;
pub mod sound;

pub use adapter::{AudioOutput, FillFn, OutputBackend, OutputStream, PlaybackEvent};
pub use config::{DeviceConfig, OutputOptions, SampleFormat};
pub use cursor::{PlaybackState, PlaybackStatus};
pub use error::OutputError;
pub use mix::MAX_VOLUME;
pub use playback::CpalBackend;
pub use sound::Sound;
