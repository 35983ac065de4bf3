//! Conversion of decoded audio to the open device's format.
//!
//! Three steps, each skipped when it would be a no-op:
//! 1. channel mapping (mono↔stereo, best-effort otherwise)
//! 2. sample-rate conversion with Rubato's sinc resampler
//! 3. packing `f32` into signed 16-bit little-endian bytes

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{
    Async, FixedAsync, Resampler, SincInterpolationParameters, SincInterpolationType,
    WindowFunction, calculate_cutoff,
};

use crate::config::{DeviceConfig, SampleFormat};
use crate::decode::DecodedWav;
use crate::error::OutputError;

/// Convert `decoded` into bytes laid out for `config`.
pub fn convert_to_device(
    decoded: &DecodedWav,
    config: &DeviceConfig,
    chunk_frames: usize,
) -> Result<Vec<u8>, OutputError> {
    if decoded.channels == 0 {
        return Err(OutputError::Conversion("source has no channels".into()));
    }
    let dst_channels = config.channels as usize;

    let mapped = remap_channels(&decoded.samples, decoded.channels, dst_channels);
    let resampled = resample(
        &mapped,
        dst_channels,
        decoded.sample_rate,
        config.frequency,
        chunk_frames,
    )?;

    match config.format {
        SampleFormat::S16Le => Ok(to_s16_le_bytes(&resampled)),
    }
}

/// Re-interleave `samples` from `src_channels` to `dst_channels`.
///
/// Mapping rules:
/// - mono → any: duplicate channel 0
/// - stereo → mono: average L/R
/// - same count: pass-through
/// - other layouts: clamp the destination channel to the available source channels
pub fn remap_channels(samples: &[f32], src_channels: usize, dst_channels: usize) -> Vec<f32> {
    if src_channels == dst_channels || src_channels == 0 || dst_channels == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / src_channels;
    let mut out = Vec::with_capacity(frames * dst_channels);
    for frame in samples.chunks_exact(src_channels) {
        for dst_ch in 0..dst_channels {
            let sample = match (src_channels, dst_channels) {
                (1, _) => frame[0],
                (2, 1) => 0.5 * (frame[0] + frame[1]),
                _ => frame[dst_ch.min(src_channels - 1)],
            };
            out.push(sample);
        }
    }
    out
}

/// Resample interleaved `samples` from `src_rate` to `dst_rate`.
///
/// The whole input is pushed through the resampler in `chunk_frames` blocks (the tail
/// zero-padded), then the resampler delay is trimmed so the result holds
/// `ceil(frames * dst_rate / src_rate)` frames aligned with the input.
pub fn resample(
    samples: &[f32],
    channels: usize,
    src_rate: u32,
    dst_rate: u32,
    chunk_frames: usize,
) -> Result<Vec<f32>, OutputError> {
    if src_rate == dst_rate || samples.is_empty() || channels == 0 {
        return Ok(samples.to_vec());
    }
    if src_rate == 0 || dst_rate == 0 {
        return Err(OutputError::Conversion(format!(
            "cannot resample {src_rate} Hz -> {dst_rate} Hz"
        )));
    }

    let in_frames = samples.len() / channels;
    let f_ratio = dst_rate as f64 / src_rate as f64;
    let expected_frames = (in_frames as f64 * f_ratio).ceil() as usize;

    let sinc_len = 128;
    let window = WindowFunction::BlackmanHarris2;
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff: calculate_cutoff(sinc_len, window),
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window,
    };

    let chunk = chunk_frames.max(1);
    let mut resampler =
        Async::<f32>::new_sinc(f_ratio, 1.1, &params, chunk, channels, FixedAsync::Input)
            .map_err(|e| OutputError::Conversion(format!("resampler init: {e}")))?;

    let delay = resampler.output_delay();
    let wanted_frames = expected_frames + delay;

    let mut in_block = vec![0.0f32; chunk * channels];
    let mut out_block = vec![0.0f32; resampler.output_frames_max() * channels];
    let mut out = Vec::with_capacity(wanted_frames * channels);
    let mut offset = 0usize;
    let mut idle_rounds = 0usize;

    while out.len() / channels < wanted_frames {
        in_block.fill(0.0);
        if offset < in_frames {
            let take = chunk.min(in_frames - offset);
            in_block[..take * channels]
                .copy_from_slice(&samples[offset * channels..(offset + take) * channels]);
            offset += take;
        }

        let input = InterleavedSlice::new(&in_block, channels, chunk)
            .map_err(|e| OutputError::Conversion(format!("input slice: {e}")))?;
        let out_capacity_frames = out_block.len() / channels;
        let mut output = InterleavedSlice::new_mut(&mut out_block, channels, out_capacity_frames)
            .map_err(|e| OutputError::Conversion(format!("output slice: {e}")))?;

        let (_nbr_in, nbr_out) = resampler
            .process_into_buffer(&input, &mut output, None)
            .map_err(|e| OutputError::Conversion(format!("resample: {e}")))?;

        if nbr_out == 0 {
            idle_rounds += 1;
            if idle_rounds > 8 {
                break;
            }
            continue;
        }
        idle_rounds = 0;
        out.extend_from_slice(&out_block[..nbr_out * channels]);
    }

    let start = (delay * channels).min(out.len());
    let mut trimmed = out.split_off(start);
    trimmed.truncate(expected_frames * channels);
    tracing::debug!(
        from_hz = src_rate,
        to_hz = dst_rate,
        in_frames,
        out_frames = trimmed.len() / channels,
        "resampled"
    );
    Ok(trimmed)
}

/// Pack `f32` samples as signed 16-bit little-endian bytes.
pub fn to_s16_le_bytes(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = <i16 as cpal::Sample>::from_sample::<f32>(s.clamp(-1.0, 1.0));
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}
