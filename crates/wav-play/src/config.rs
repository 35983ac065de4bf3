use std::path::PathBuf;

use wav_output::OutputOptions;

/// Settings for one `wav-play` run.
#[derive(Clone, Debug)]
pub struct PlayConfig {
    pub path: PathBuf,
    pub device: Option<String>,
    pub frequency: u32,
    pub channels: u16,
    pub samples: u32,
    pub volume: u8,
    pub repeat: u32,
}

impl PlayConfig {
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            device: normalize_device_name(self.device.clone()),
            volume: self.volume,
            ..OutputOptions::default()
        }
    }
}

fn normalize_device_name(device: Option<String>) -> Option<String> {
    device.and_then(|name| {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_device_name_trims_and_drops_empty() {
        assert_eq!(normalize_device_name(None), None);
        assert_eq!(normalize_device_name(Some("".to_string())), None);
        assert_eq!(normalize_device_name(Some("  ".to_string())), None);
        assert_eq!(
            normalize_device_name(Some("  USB DAC ".to_string())),
            Some("USB DAC".to_string())
        );
    }

    #[test]
    fn output_options_carry_volume() {
        let cfg = PlayConfig {
            path: PathBuf::from("a.wav"),
            device: Some(" speakers ".into()),
            frequency: 22_050,
            channels: 1,
            samples: 512,
            volume: 64,
            repeat: 1,
        };
        let opts = cfg.output_options();
        assert_eq!(opts.volume, 64);
        assert_eq!(opts.device.as_deref(), Some("speakers"));
    }
}
