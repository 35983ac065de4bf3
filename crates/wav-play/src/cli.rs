use std::path::PathBuf;

use clap::Parser;

use crate::config::PlayConfig;

#[derive(Parser, Debug)]
#[command(name = "wav-play", version, about = "Play a WAV file through the audio output adapter")]
pub struct Args {
    /// Path to a WAV file
    #[arg(required_unless_present = "list_devices")]
    pub path: Option<PathBuf>,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Use a specific output device by substring match
    #[arg(long)]
    pub device: Option<String>,

    /// Output sample rate in Hz
    #[arg(long, default_value_t = 44_100)]
    pub frequency: u32,

    /// Output channel count (1 = mono, 2 = stereo)
    #[arg(long, default_value_t = 2)]
    pub channels: u16,

    /// Device buffer size in frames
    #[arg(long, default_value_t = 1024)]
    pub samples: u32,

    /// Mixing volume, 0..=128
    #[arg(long, default_value_t = 128, value_parser = clap::value_parser!(u8).range(0..=128))]
    pub volume: u8,

    /// Number of times to play the file
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,
}

impl Args {
    /// Playback settings, or `None` when only listing devices.
    pub fn play_config(&self) -> Option<PlayConfig> {
        let path = self.path.clone()?;
        Some(PlayConfig {
            path,
            device: self.device.clone(),
            frequency: self.frequency,
            channels: self.channels,
            samples: self.samples,
            volume: self.volume,
            repeat: self.repeat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cd_quality_stereo() {
        let args = Args::try_parse_from(["wav-play", "boom.wav"]).unwrap();
        let cfg = args.play_config().unwrap();
        assert_eq!(cfg.frequency, 44_100);
        assert_eq!(cfg.channels, 2);
        assert_eq!(cfg.samples, 1024);
        assert_eq!(cfg.volume, 128);
        assert_eq!(cfg.repeat, 1);
        assert_eq!(cfg.path, PathBuf::from("boom.wav"));
    }

    #[test]
    fn list_devices_needs_no_path() {
        let args = Args::try_parse_from(["wav-play", "--list-devices"]).unwrap();
        assert!(args.list_devices);
        assert!(args.play_config().is_none());
    }

    #[test]
    fn path_is_required_for_playback() {
        assert!(Args::try_parse_from(["wav-play"]).is_err());
    }

    #[test]
    fn volume_above_max_is_rejected() {
        assert!(Args::try_parse_from(["wav-play", "--volume", "200", "a.wav"]).is_err());
        assert!(Args::try_parse_from(["wav-play", "--repeat", "0", "a.wav"]).is_err());
    }
}
