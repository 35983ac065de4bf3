//! WAV decode stage.
//!
//! Uses Symphonia to probe a RIFF/WAVE source and decode all of it into interleaved
//! `f32` samples. Sounds are loaded whole, so there is no background thread here.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::OutputError;

/// Fully decoded source audio, still at the source rate and channel count.
#[derive(Clone, Debug)]
pub struct DecodedWav {
    pub sample_rate: u32,
    pub channels: usize,
    /// Source bit depth (best-effort).
    pub bits_per_sample: Option<u16>,
    /// Interleaved samples in `-1.0..=1.0`, whole frames only.
    pub samples: Vec<f32>,
}

impl DecodedWav {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Size of the PCM payload as stored in the source file.
    pub fn source_bytes(&self) -> usize {
        let bytes_per_sample = self
            .bits_per_sample
            .map(|b| usize::from(b).div_ceil(8))
            .unwrap_or(2);
        self.samples.len() * bytes_per_sample
    }
}

/// Open `path` and decode it.
pub fn decode_wav_file(path: &Path) -> Result<DecodedWav, OutputError> {
    let file = File::open(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_wav(Box::new(file))
}

/// Decode a WAV file held in memory.
pub fn decode_wav_bytes(bytes: Vec<u8>) -> Result<DecodedWav, OutputError> {
    decode_wav(Box::new(std::io::Cursor::new(bytes)))
}

/// Probe `source` as WAV and decode every packet of its default track.
pub fn decode_wav(source: Box<dyn MediaSource>) -> Result<DecodedWav, OutputError> {
    let mss = MediaSourceStream::new(source, Default::default());
    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| OutputError::Decode(format!("probe: {e}")))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| OutputError::Decode("no default audio track".into()))?;
    let track_id = track.id;
    let codec_params: CodecParameters = track.codec_params.clone();

    let channels = codec_params
        .channels
        .ok_or_else(|| OutputError::Decode("unknown channel layout".into()))?
        .count();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| OutputError::Decode("unknown sample rate".into()))?;
    let bits_per_sample = codec_params
        .bits_per_sample
        .or(codec_params.bits_per_coded_sample)
        .and_then(|v| u16::try_from(v).ok());

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| OutputError::Decode(format!("codec: {e}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(OutputError::Decode(format!("read packet: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!("skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(OutputError::Decode(format!("decode: {e}"))),
        };

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, *decoded.spec());
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    samples.truncate(samples.len() - samples.len() % channels.max(1));
    tracing::debug!(
        rate_hz = sample_rate,
        channels,
        frames = samples.len() / channels.max(1),
        "wav decoded"
    );

    Ok(DecodedWav {
        sample_rate,
        channels,
        bits_per_sample,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn create_wav_i16(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let spec = hound::WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        buffer
    }

    #[test]
    fn decodes_stereo_pcm16() {
        let samples: Vec<i16> = (0..200).map(|i| (i * 100) as i16).collect();
        let wav = create_wav_i16(&samples, 22_050, 2);
        let decoded = decode_wav_bytes(wav).unwrap();
        assert_eq!(decoded.sample_rate, 22_050);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.bits_per_sample, Some(16));
        assert_eq!(decoded.frames(), 100);
        assert_eq!(decoded.source_bytes(), 400);
        assert!((decoded.samples[1] - 100.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn decodes_float_wav() {
        let mut buffer = Vec::new();
        {
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate: 8_000,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            };
            let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), spec).unwrap();
            for _ in 0..64 {
                writer.write_sample(0.25f32).unwrap();
            }
            writer.finalize().unwrap();
        }
        let decoded = decode_wav_bytes(buffer).unwrap();
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.frames(), 64);
        assert!(decoded.samples.iter().all(|s| (*s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_wav_bytes(b"definitely not a riff file".to_vec()).unwrap_err();
        assert!(matches!(err, OutputError::Decode(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = decode_wav_file(Path::new("/nonexistent/dir/sound.wav")).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }
}
