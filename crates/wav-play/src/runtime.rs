//! `wav-play` runtime helpers.
//!
//! Provides device listing and the open → load → play → wait → close sequence.

use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, select};
use wav_output::{AudioOutput, OutputBackend, PlaybackEvent, device};

use crate::config::PlayConfig;

/// Slack on top of the sound's duration before giving up on a `Finished` event.
const FINISH_GRACE: Duration = Duration::from_secs(2);

/// How a playback run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    Completed,
    Interrupted,
}

/// Print available output devices to stdout.
pub fn list_devices() -> Result<()> {
    let host = cpal::default_host();
    let infos = device::list_device_infos(&host)?;
    for (i, d) in infos.iter().enumerate() {
        let marker = if d.is_default { " (default)" } else { "" };
        println!(
            "#{i}: {}{marker} [{}-{} Hz, up to {} ch]",
            d.name, d.min_rate, d.max_rate, d.max_channels
        );
    }
    Ok(())
}

/// Play `config.path` on the CPAL output selected by `config`.
pub fn run_play(config: &PlayConfig, stop_rx: &Receiver<()>) -> Result<PlayOutcome> {
    let mut output = AudioOutput::new(config.output_options());
    play_with(&mut output, config, stop_rx)
}

/// Open `output`, play the file `config.repeat` times and close it again.
///
/// A message on `stop_rx` silences playback and returns [`PlayOutcome::Interrupted`].
pub fn play_with<B: OutputBackend>(
    output: &mut AudioOutput<B>,
    config: &PlayConfig,
    stop_rx: &Receiver<()>,
) -> Result<PlayOutcome> {
    let obtained = output
        .open(config.frequency, config.channels, config.samples)
        .context("open audio device")?;
    tracing::info!(config = %obtained, "device ready");

    let sound = output
        .load_wav(&config.path)
        .with_context(|| format!("load {:?}", config.path))?;
    tracing::info!(
        path = ?config.path,
        source_rate_hz = sound.source_rate(),
        source_channels = sound.source_channels(),
        duration_ms = sound.duration_ms(),
        "sound loaded"
    );

    if sound.is_empty() {
        tracing::warn!(path = ?config.path, "file has no audio frames");
        output.close();
        return Ok(PlayOutcome::Completed);
    }

    let events = output.events();
    let timeout = Duration::from_millis(sound.duration_ms()) + FINISH_GRACE;
    let mut outcome = PlayOutcome::Completed;

    for round in 1..=config.repeat {
        output.play(Some(&sound)).context("start playback")?;
        tracing::debug!(round, of = config.repeat, "playing");

        select! {
            recv(events) -> ev => {
                if ev != Ok(PlaybackEvent::Finished) {
                    tracing::warn!("playback event channel closed");
                }
            }
            recv(stop_rx) -> _ => {
                tracing::info!("interrupted");
                outcome = PlayOutcome::Interrupted;
            }
            recv(crossbeam_channel::after(timeout)) -> _ => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "playback did not finish in time"
                );
            }
        }
        if outcome == PlayOutcome::Interrupted {
            break;
        }
    }

    if let Err(e) = output.play(None) {
        tracing::warn!("stop playback: {e}");
    }
    output.free_sound(Some(sound));
    output.close();
    Ok(outcome)
}
