//! Playback stage (CPAL output stream).
//!
//! Builds the CPAL output stream behind [`CpalBackend`]. The real-time callback:
//! - asks the adapter's fill routine for `S16Le` bytes into a reusable scratch buffer
//! - converts those samples to the device's native sample format

use cpal::traits::{DeviceTrait, StreamTrait};

use crate::adapter::{FillFn, OutputBackend, OutputStream};
use crate::config::{DeviceConfig, SampleFormat};
use crate::device;
use crate::error::OutputError;

/// [`OutputBackend`] over the default CPAL host.
#[derive(Clone, Debug, Default)]
pub struct CpalBackend {
    /// Output device substring match; `None` uses the host default.
    device_name: Option<String>,
}

impl CpalBackend {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

/// An open CPAL output stream.
pub struct CpalStream {
    stream: cpal::Stream,
}

impl OutputStream for CpalStream {
    fn resume(&self) -> Result<(), OutputError> {
        self.stream
            .play()
            .map_err(|e| OutputError::Stream(format!("play: {e}")))
    }

    fn pause(&self) -> Result<(), OutputError> {
        self.stream
            .pause()
            .map_err(|e| OutputError::Stream(format!("pause: {e}")))
    }
}

impl OutputBackend for CpalBackend {
    type Stream = CpalStream;

    fn open(
        &self,
        requested: &DeviceConfig,
        fill: FillFn,
    ) -> Result<(CpalStream, DeviceConfig), OutputError> {
        let host = cpal::default_host();
        let device = device::pick_device(&host, self.device_name.as_deref())
            .map_err(|e| OutputError::Device(format!("{e:#}")))?;
        let supported =
            device::pick_output_config(&device, requested.channels, requested.frequency)
                .map_err(|e| OutputError::Device(format!("{e:#}")))?;

        let mut stream_config: cpal::StreamConfig = supported.clone().into();
        let buffer_frames = match device::pick_buffer_size(&supported, requested.buffer_frames) {
            Some(cpal::BufferSize::Fixed(frames)) => {
                stream_config.buffer_size = cpal::BufferSize::Fixed(frames);
                frames
            }
            _ => requested.buffer_frames,
        };

        if let Ok(desc) = device.description() {
            tracing::info!(device = %desc, "output device");
        }
        tracing::info!(
            requested_rate_hz = requested.frequency,
            output_rate_hz = stream_config.sample_rate,
            channels = stream_config.channels,
            sample_format = ?supported.sample_format(),
            buffer_size = ?stream_config.buffer_size,
            "device output config"
        );

        let stream = build_output_stream(&device, &stream_config, supported.sample_format(), fill)?;
        // Streams start paused; `play()` resumes them.
        stream
            .pause()
            .map_err(|e| OutputError::Stream(format!("pause: {e}")))?;

        let obtained = DeviceConfig {
            frequency: stream_config.sample_rate,
            channels: stream_config.channels,
            format: SampleFormat::S16Le,
            buffer_frames,
        };
        Ok((CpalStream { stream }, obtained))
    }
}

/// Build a CPAL output stream whose callback is driven by `fill`.
///
/// `fill` always produces `S16Le`; the callback converts to `sample_format`.
pub fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    fill: FillFn,
) -> Result<cpal::Stream, OutputError> {
    match sample_format {
        cpal::SampleFormat::I16 => build_stream::<i16>(device, config, fill),
        cpal::SampleFormat::F32 => build_stream::<f32>(device, config, fill),
        cpal::SampleFormat::I32 => build_stream::<i32>(device, config, fill),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, config, fill),
        other => Err(OutputError::Device(format!(
            "Unsupported sample format: {other:?}"
        ))),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut fill: FillFn,
) -> Result<cpal::Stream, OutputError>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let mut scratch: Vec<u8> = Vec::new();
    let err_fn = |err| tracing::warn!("stream error: {err}");

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _| render_into(data, &mut scratch, &mut fill),
            err_fn,
            None,
        )
        .map_err(|e| OutputError::Stream(format!("build output stream: {e}")))
}

/// Run `fill` for `data.len()` samples and convert the result into `data`.
///
/// `scratch` only grows when the device asks for a larger period than before.
fn render_into<T>(data: &mut [T], scratch: &mut Vec<u8>, fill: &mut FillFn)
where
    T: cpal::Sample + cpal::FromSample<i16>,
{
    let needed = data.len() * 2;
    if scratch.len() < needed {
        scratch.resize(needed, 0);
    }
    let bytes = &mut scratch[..needed];
    fill(bytes);
    for (dst, src) in data.iter_mut().zip(bytes.chunks_exact(2)) {
        *dst = <T as cpal::Sample>::from_sample::<i16>(i16::from_le_bytes([src[0], src[1]]));
    }
}
