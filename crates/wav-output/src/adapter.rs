//! The audio output adapter.
//!
//! [`AudioOutput`] owns one output stream at a time plus the playback cursor shared
//! with that stream's fill callback. All methods run on the caller's thread; the
//! callback runs on the backend's audio thread and only touches the cursor (under its
//! mutex), the volume atomic and the event channel (`try_send`, never blocking).

use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};

use crate::config::{DeviceConfig, OutputOptions};
use crate::cursor::{PlaybackCursor, PlaybackStatus};
use crate::error::OutputError;
use crate::mix::MAX_VOLUME;
use crate::playback::CpalBackend;
use crate::sound::Sound;
use crate::{convert, decode};

/// Fill routine handed to a backend: write exactly `out.len()` bytes of `S16Le` audio.
pub type FillFn = Box<dyn FnMut(&mut [u8]) + Send + 'static>;

/// A running (or paused) output stream.
pub trait OutputStream {
    fn resume(&self) -> Result<(), OutputError>;
    fn pause(&self) -> Result<(), OutputError>;
}

/// Something that can open a timed output stream driven by a [`FillFn`].
pub trait OutputBackend {
    type Stream: OutputStream;

    /// Open a **paused** stream for `requested`.
    ///
    /// Returns the stream and the configuration actually obtained, which may differ
    /// from `requested` in frequency or buffer size but never in channel count.
    fn open(
        &self,
        requested: &DeviceConfig,
        fill: FillFn,
    ) -> Result<(Self::Stream, DeviceConfig), OutputError>;
}

/// Notifications emitted from the fill callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The active sound played to its last byte.
    Finished,
}

const EVENT_QUEUE_LEN: usize = 16;

struct OpenDevice<S> {
    stream: S,
    config: DeviceConfig,
}

/// Single-voice WAV output over a backend (CPAL by default).
pub struct AudioOutput<B: OutputBackend = CpalBackend> {
    backend: B,
    options: OutputOptions,
    cursor: Arc<Mutex<PlaybackCursor>>,
    volume: Arc<AtomicU8>,
    events_tx: Sender<PlaybackEvent>,
    events_rx: Receiver<PlaybackEvent>,
    device: Option<OpenDevice<B::Stream>>,
}

impl AudioOutput<CpalBackend> {
    /// Adapter over the default CPAL host.
    pub fn new(options: OutputOptions) -> Self {
        let backend = CpalBackend::new(options.device.clone());
        Self::with_backend(backend, options)
    }
}

impl<B: OutputBackend> AudioOutput<B> {
    pub fn with_backend(backend: B, options: OutputOptions) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::bounded(EVENT_QUEUE_LEN);
        Self {
            backend,
            volume: Arc::new(AtomicU8::new(options.volume.min(MAX_VOLUME))),
            options,
            cursor: Arc::new(Mutex::new(PlaybackCursor::new())),
            events_tx,
            events_rx,
            device: None,
        }
    }

    /// Open the output device and register the fill callback.
    ///
    /// Opening an already open adapter succeeds without touching the device and
    /// returns the configuration it was opened with.
    pub fn open(
        &mut self,
        frequency: u32,
        channels: u16,
        buffer_frames: u32,
    ) -> Result<DeviceConfig, OutputError> {
        if let Some(dev) = &self.device {
            tracing::debug!(config = %dev.config, "audio device already open");
            return Ok(dev.config);
        }

        let requested = DeviceConfig::new(frequency, channels, buffer_frames);
        requested.validate()?;

        lock_cursor(&self.cursor).reset();
        let fill = self.fill_fn();
        let (stream, obtained) = self
            .backend
            .open(&requested, fill)
            .inspect_err(|e| tracing::warn!("couldn't open audio: {e}"))?;

        tracing::info!(
            rate_hz = obtained.frequency,
            channels = obtained.channels,
            buffer_frames = obtained.buffer_frames,
            "audio device opened"
        );
        self.device = Some(OpenDevice {
            stream,
            config: obtained,
        });
        Ok(obtained)
    }

    /// Release the device; no-op when not open.
    pub fn close(&mut self) {
        let Some(dev) = self.device.take() else {
            return;
        };
        if let Err(e) = dev.stream.pause() {
            tracing::warn!("pause before close failed: {e}");
        }
        drop(dev);
        lock_cursor(&self.cursor).reset();
        tracing::info!("audio device closed");
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Configuration obtained at open, if open.
    pub fn device_config(&self) -> Option<DeviceConfig> {
        self.device.as_ref().map(|d| d.config)
    }

    /// Load a WAV file and convert it to the open device's format.
    pub fn load_wav(&self, path: impl AsRef<Path>) -> Result<Sound, OutputError> {
        let config = self.require_open()?;
        let path = path.as_ref();
        let decoded = decode::decode_wav_file(path)
            .inspect_err(|e| tracing::warn!(path = ?path, "load failed: {e}"))?;
        self.convert(&decoded, config)
    }

    /// Same as [`AudioOutput::load_wav`] for a WAV image held in memory.
    pub fn load_wav_bytes(&self, bytes: Vec<u8>) -> Result<Sound, OutputError> {
        let config = self.require_open()?;
        let decoded = decode::decode_wav_bytes(bytes)?;
        self.convert(&decoded, config)
    }

    /// Release a sound. `None` is a no-op.
    ///
    /// A sound that is still playing keeps sounding until it drains or is replaced;
    /// the cursor holds its own reference to the bytes.
    pub fn free_sound(&self, sound: Option<Sound>) {
        if let Some(sound) = sound {
            tracing::debug!(bytes = sound.len_bytes(), "sound freed");
            drop(sound);
        }
    }

    /// Make `sound` the active playback source and unpause the device.
    ///
    /// `None` stops playback: the next fill and every one after it are silent.
    ///
    /// The device is resumed before the cursor changes, so a failed resume leaves the
    /// previous playback state untouched.
    pub fn play(&self, sound: Option<&Sound>) -> Result<(), OutputError> {
        let dev = self.device.as_ref().ok_or(OutputError::NotOpen)?;
        if let Some(sound) = sound {
            if !sound.config().same_layout(&dev.config) {
                return Err(OutputError::FormatMismatch {
                    sound: sound.config().to_string(),
                    device: dev.config.to_string(),
                });
            }
        }
        dev.stream.resume()?;

        let mut cursor = lock_cursor(&self.cursor);
        match sound {
            Some(sound) => {
                // The callback sends `Finished` under this lock, so nothing from the
                // previous sound can arrive after this drain.
                while self.events_rx.try_recv().is_ok() {}
                cursor.start(sound.shared_data());
                tracing::debug!(bytes = sound.len_bytes(), "playback started");
            }
            None => {
                cursor.stop();
                tracing::debug!("playback stopped");
            }
        }
        Ok(())
    }

    pub fn set_volume(&self, volume: u8) {
        self.volume.store(volume.min(MAX_VOLUME), Ordering::Relaxed);
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> PlaybackStatus {
        lock_cursor(&self.cursor).status()
    }

    /// Receiver for [`PlaybackEvent`]s. Events from earlier sounds are discarded on
    /// every `play(Some(..))`.
    pub fn events(&self) -> Receiver<PlaybackEvent> {
        self.events_rx.clone()
    }

    fn require_open(&self) -> Result<DeviceConfig, OutputError> {
        self.device_config().ok_or(OutputError::NotOpen)
    }

    fn convert(
        &self,
        decoded: &decode::DecodedWav,
        config: DeviceConfig,
    ) -> Result<Sound, OutputError> {
        let data =
            convert::convert_to_device(decoded, &config, self.options.resample_chunk_frames)?;
        let sound = Sound::new(data, config, decoded);
        tracing::debug!(
            source_rate_hz = sound.source_rate(),
            source_channels = sound.source_channels(),
            bytes = sound.len_bytes(),
            len_mult = sound.len_mult(),
            "sound loaded"
        );
        Ok(sound)
    }

    fn fill_fn(&self) -> FillFn {
        let cursor = self.cursor.clone();
        let volume = self.volume.clone();
        let events = self.events_tx.clone();
        Box::new(move |out: &mut [u8]| {
            let mut cursor = lock_cursor(&cursor);
            let result = cursor.fill(out, volume.load(Ordering::Relaxed));
            if result.finished {
                let _ = events.try_send(PlaybackEvent::Finished);
            }
            drop(cursor);
        })
    }
}

impl<B: OutputBackend> Drop for AudioOutput<B> {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock_cursor(cursor: &Mutex<PlaybackCursor>) -> MutexGuard<'_, PlaybackCursor> {
    cursor.lock().unwrap_or_else(PoisonError::into_inner)
}
