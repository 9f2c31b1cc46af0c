//! Plain console presenter: lifecycle messages plus a live countdown line.

use anyhow::{bail, Context, Result};
use crossbeam_channel::RecvTimeoutError;
use std::io::{self, Write};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use vaultscribe::audio::Recorder;
use vaultscribe::config::AppConfig;
use vaultscribe::session::{self, SessionEvent, SessionState};

/// Cadence of the countdown repaint between events.
const TICK: Duration = Duration::from_millis(100);

pub fn run(config: AppConfig, recorder: Recorder) -> Result<()> {
    println!(
        "Recording in {}-second chunks. Press Ctrl+C to stop.",
        config.chunk_duration
    );

    let mut handle = session::start(config, Box::new(recorder));
    let stop = handle.stop_flag.clone();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::Relaxed);
    })
    .context("failed to install Ctrl+C handler")?;

    let mut countdown = Countdown::new();
    let result = loop {
        match handle.receiver.recv_timeout(TICK) {
            Ok(event) => {
                countdown.clear_line();
                match event {
                    SessionEvent::NoteCreated { path } => {
                        println!("Session note: {}", path.display());
                    }
                    SessionEvent::ModelLoading { size } => {
                        println!(
                            "Loading Whisper model '{}' (first use downloads the weights)...",
                            size.label()
                        );
                    }
                    SessionEvent::ModelReady => {
                        println!("Model ready.");
                    }
                    SessionEvent::ChunkStarted { duration, .. } => {
                        countdown.arm(duration);
                    }
                    SessionEvent::StateChanged(SessionState::Processing) => {
                        countdown.disarm();
                        println!("Transcribing...");
                    }
                    SessionEvent::StateChanged(SessionState::Stopping) => {
                        countdown.disarm();
                        println!("Stopping...");
                    }
                    SessionEvent::ChunkSkipped { level_db, .. } => {
                        println!("Silence detected ({level_db:.1} dBFS); chunk skipped.");
                    }
                    SessionEvent::ChunkEmpty { .. } => {
                        println!("No speech detected in this chunk.");
                    }
                    SessionEvent::Fragment { text, .. } => {
                        println!("Added: {text}");
                    }
                    SessionEvent::ChunkFailed { seq, message } => {
                        eprintln!("Chunk {seq} failed: {message}");
                    }
                    SessionEvent::Fatal { message } => {
                        break Err(message);
                    }
                    SessionEvent::Finished { path, fragments } => {
                        println!(
                            "Dictation session ended; {fragments} fragment(s) saved to {}",
                            path.display()
                        );
                        break Ok(());
                    }
                    SessionEvent::StateChanged(_) => {}
                }
            }
            Err(RecvTimeoutError::Timeout) => countdown.repaint(),
            Err(RecvTimeoutError::Disconnected) => break Ok(()),
        }
    };

    handle.join();
    match result {
        Ok(()) => Ok(()),
        Err(message) => bail!("{message}"),
    }
}

/// Rewrites one `Recording: Ns...` line in place while a chunk records.
struct Countdown {
    until: Option<Instant>,
    line_active: bool,
}

impl Countdown {
    fn new() -> Self {
        Self {
            until: None,
            line_active: false,
        }
    }

    fn arm(&mut self, duration: Duration) {
        self.until = Some(Instant::now() + duration);
    }

    fn disarm(&mut self) {
        self.clear_line();
        self.until = None;
    }

    fn repaint(&mut self) {
        let Some(until) = self.until else {
            return;
        };
        let remaining = until.saturating_duration_since(Instant::now());
        let secs = remaining.as_secs_f32().ceil() as u64;
        print!("\rRecording: {secs}s...   ");
        let _ = io::stdout().flush();
        self.line_active = true;
    }

    fn clear_line(&mut self) {
        if self.line_active {
            print!("\r                        \r");
            let _ = io::stdout().flush();
            self.line_active = false;
        }
    }
}
