//! vaultscribe entrypoint.
//!
//! Validates configuration, runs the startup checks that must fail before
//! anything touches the vault, then hands the session to either the console
//! printer or the full-screen TUI. Both presenters are views over the same
//! session worker.

mod cli;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use vaultscribe::audio::Recorder;
use vaultscribe::config::AppConfig;
use vaultscribe::{init_logging, init_tracing, log_debug, log_file_path};

fn main() -> Result<()> {
    let mut config = AppConfig::parse();

    if config.list_input_devices {
        return list_input_devices();
    }

    config.validate()?;
    init_logging(&config);
    init_tracing(&config);
    log_debug("=== vaultscribe started ===");
    log_debug(&format!("log file: {:?}", log_file_path()));

    // A missing microphone is a configuration error: fail here, before the
    // session creates anything in the vault.
    let recorder = Recorder::new(config.input_device.as_deref())
        .context("no usable audio input device")?;
    log_debug(&format!("input device: {}", recorder.device_name()));

    if config.tui {
        drop(recorder); // the TUI re-opens the device on each start
        tui::run(config)
    } else {
        cli::run(config, recorder)
    }
}

fn list_input_devices() -> Result<()> {
    match Recorder::list_devices() {
        Ok(devices) if devices.is_empty() => {
            println!("No audio input devices detected.");
        }
        Ok(devices) => {
            println!("Detected audio input devices:");
            for name in devices {
                println!("  - {name}");
            }
        }
        Err(err) => {
            println!("Failed to list audio input devices: {err:#}");
        }
    }
    Ok(())
}
