//! wav-play: open an output device, load a WAV file converted to the device format and
//! play it to completion through the single-voice output adapter.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wav_play::{cli, runtime};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,wav_output=info,wav_play=info")
        }))
        .init();

    if args.list_devices {
        return runtime::list_devices();
    }
    let Some(config) = args.play_config() else {
        return Ok(());
    };

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("install Ctrl-C handler")?;

    match runtime::run_play(&config, &stop_rx)? {
        runtime::PlayOutcome::Completed => Ok(()),
        runtime::PlayOutcome::Interrupted => std::process::exit(130),
    }
}
