//! Sequential dictation session: capture → gate → transcribe → append.
//!
//! One worker thread drives the whole pipeline; presenters only watch a
//! channel of `SessionEvent`s and raise an atomic stop flag. Each chunk is
//! handed linearly from stage to stage, so there is no shared mutable state
//! to guard and no queueing between stages: the next capture does not begin
//! until the previous append has been flushed.

use crate::audio::{ChunkSource, GateDecision, SilenceGate};
use crate::config::{AppConfig, ModelSize};
use crate::log_debug;
use crate::model;
use crate::note::NoteWriter;
use crate::stt::{SpeechToText, Transcriber};
use anyhow::Result;
use chrono::{DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, Sender};
use regex::Regex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

/// Pause after a failed capture so a broken device cannot spin the loop hot.
const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// One fixed-duration segment of captured audio. Lives exactly as long as
/// its trip through the pipeline.
pub struct Chunk {
    pub seq: u64,
    pub samples: Vec<f32>,
    pub duration: Duration,
    pub captured_at: DateTime<Local>,
}

/// Lifecycle states of the dictation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Processing,
    Stopping,
    Stopped,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Processing => "processing",
            SessionState::Stopping => "stopping",
            SessionState::Stopped => "stopped",
        }
    }
}

/// Messages sent from the session worker to the presenter.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session note exists on disk. Sent before any audio is touched.
    NoteCreated { path: PathBuf },
    /// Model weights are being located (and downloaded on first use).
    ModelLoading { size: ModelSize },
    ModelReady,
    StateChanged(SessionState),
    ChunkStarted { seq: u64, duration: Duration },
    ChunkSkipped { seq: u64, level_db: f32 },
    /// The chunk passed the gate but decoded to nothing.
    ChunkEmpty { seq: u64 },
    Fragment { seq: u64, text: String },
    /// Per-chunk recoverable failure; the loop moves on to the next chunk.
    ChunkFailed { seq: u64, message: String },
    /// Unrecoverable failure; the worker has stopped.
    Fatal { message: String },
    Finished { path: PathBuf, fragments: usize },
}

/// Handle the presenter uses to watch and stop the worker.
pub struct SessionHandle {
    pub receiver: Receiver<SessionEvent>,
    pub stop_flag: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SessionHandle {
    /// Ask the worker to wind down after the in-flight chunk.
    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Wait for the worker thread to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn the session worker. Heavy setup (note file, model load) happens on
/// the worker thread so the caller's UI stays responsive; setup failures
/// arrive as a `Fatal` event.
pub fn start(config: AppConfig, source: Box<dyn ChunkSource>) -> SessionHandle {
    let (tx, rx) = unbounded();
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop = stop_flag.clone();
    let handle = thread::spawn(move || {
        if let Err(err) = run_worker(config, source, &tx, &stop) {
            let _ = tx.send(SessionEvent::Fatal {
                message: format!("{err:#}"),
            });
        }
    });
    SessionHandle {
        receiver: rx,
        stop_flag,
        handle: Some(handle),
    }
}

fn run_worker(
    config: AppConfig,
    mut source: Box<dyn ChunkSource>,
    events: &Sender<SessionEvent>,
    stop: &AtomicBool,
) -> Result<()> {
    // The note comes first: the session artifact must exist before any audio
    // is processed, and an unwritable vault must fail before the (slow) model
    // load kicks off.
    let mut writer = NoteWriter::create(&config.note_dir())?;
    let _ = events.send(SessionEvent::NoteCreated {
        path: writer.path().to_path_buf(),
    });

    let _ = events.send(SessionEvent::ModelLoading {
        size: config.model_size,
    });
    let model_dir = model::resolve_dir(config.model_dir.as_deref());
    let model_path = model::ensure_model(&model_dir, config.model_size)?;
    let mut stt = Transcriber::new(&model_path)?;
    let _ = events.send(SessionEvent::ModelReady);

    tracing::info!(
        model = config.model_size.label(),
        chunk_secs = config.chunk_duration,
        "session started"
    );

    let gate = SilenceGate::new(config.silence_threshold_db);
    run_loop(
        Duration::from_secs(config.chunk_duration),
        &config.lang,
        source.as_mut(),
        &mut stt,
        &gate,
        &mut writer,
        events,
        stop,
    )?;

    let fragments = writer.fragments_written();
    let path = writer.finish()?;
    tracing::info!(fragments, "session finished");
    let _ = events.send(SessionEvent::StateChanged(SessionState::Stopped));
    let _ = events.send(SessionEvent::Finished { path, fragments });
    Ok(())
}

/// Drive the capture → gate → transcribe → append loop until the stop flag
/// is raised. Public so the pipeline can be exercised with synthetic stages.
///
/// Stop-flag discipline: the flag is checked before each chunk (no chunk
/// starts once stopping begins) and again right after capture, so a chunk
/// interrupted mid-recording is discarded instead of being transcribed as a
/// truncated fragment.
#[allow(clippy::too_many_arguments)]
pub fn run_loop(
    chunk_duration: Duration,
    lang: &str,
    source: &mut dyn ChunkSource,
    stt: &mut dyn SpeechToText,
    gate: &SilenceGate,
    writer: &mut NoteWriter,
    events: &Sender<SessionEvent>,
    stop: &AtomicBool,
) -> Result<()> {
    let mut seq: u64 = 0;
    while !stop.load(Ordering::Relaxed) {
        seq += 1;
        let _ = events.send(SessionEvent::StateChanged(SessionState::Recording));
        let _ = events.send(SessionEvent::ChunkStarted {
            seq,
            duration: chunk_duration,
        });

        let captured_at = Local::now();
        let samples = match source.capture(chunk_duration, stop) {
            Ok(samples) => samples,
            Err(err) => {
                log_debug(&format!("chunk {seq} capture failed: {err:#}"));
                let _ = events.send(SessionEvent::ChunkFailed {
                    seq,
                    message: format!("{err:#}"),
                });
                thread::sleep(CAPTURE_RETRY_DELAY);
                continue;
            }
        };
        if stop.load(Ordering::Relaxed) {
            // Interrupted mid-chunk: drop the partial capture on the floor.
            break;
        }
        let chunk = Chunk {
            seq,
            samples,
            duration: chunk_duration,
            captured_at,
        };

        let _ = events.send(SessionEvent::StateChanged(SessionState::Processing));
        match gate.evaluate(&chunk.samples) {
            GateDecision::Skip { level_db } => {
                log_debug(&format!(
                    "chunk {seq} skipped as silence ({level_db:.1} dBFS)"
                ));
                let _ = events.send(SessionEvent::ChunkSkipped { seq, level_db });
                continue;
            }
            GateDecision::Pass { level_db } => {
                log_debug(&format!(
                    "chunk {seq} (captured {}) passed gate ({level_db:.1} dBFS)",
                    chunk.captured_at.format("%H:%M:%S")
                ));
            }
        }

        let raw = match stt.transcribe(&chunk.samples, lang) {
            Ok(text) => text,
            Err(err) => {
                log_debug(&format!("chunk {seq} transcription failed: {err:#}"));
                let _ = events.send(SessionEvent::ChunkFailed {
                    seq,
                    message: format!("{err:#}"),
                });
                continue;
            }
        };
        let text = sanitize_transcript(&raw);
        if text.is_empty() {
            let _ = events.send(SessionEvent::ChunkEmpty { seq });
            continue;
        }

        // A write failure is not recoverable: the session artifact is gone,
        // and carrying on would silently drop fragments.
        writer.append_fragment(&text)?;
        tracing::info!(seq, chars = text.len(), "chunk transcribed");
        let _ = events.send(SessionEvent::Fragment { seq, text });
    }

    let _ = events.send(SessionEvent::StateChanged(SessionState::Stopping));
    Ok(())
}

/// Collapse whitespace and strip the non-speech markers Whisper emits on
/// borderline audio (`[silence]`, `(music)`, and friends).
pub fn sanitize_transcript(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    static NON_SPEECH_RE: OnceLock<Regex> = OnceLock::new();
    let re = NON_SPEECH_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\[\s*\]|\(\s*\)|\[(?:\s*(?:silence|noise|inaudible|blank_audio|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background)\s*)\]|\((?:\s*(?:silence|noise|inaudible|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background|wind blowing)\s*)\)",
        )
        .expect("non-speech regex should compile")
    });
    let without_markers = re.replace_all(trimmed, " ");
    without_markers
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_whitespace() {
        assert_eq!(sanitize_transcript("  hello   world  "), "hello world");
    }

    #[test]
    fn sanitize_strips_non_speech_markers() {
        assert_eq!(sanitize_transcript("[silence] hello (music) there"), "hello there");
        assert_eq!(sanitize_transcript("[BLANK_AUDIO]"), "");
        assert_eq!(sanitize_transcript("( wind blowing )"), "");
    }

    #[test]
    fn sanitize_keeps_ordinary_brackets() {
        assert_eq!(
            sanitize_transcript("see [chapter four] for details"),
            "see [chapter four] for details"
        );
    }

    #[test]
    fn sanitize_handles_empty_input() {
        assert_eq!(sanitize_transcript("   "), "");
    }

    #[test]
    fn state_labels_are_stable() {
        assert_eq!(SessionState::Idle.label(), "idle");
        assert_eq!(SessionState::Recording.label(), "recording");
        assert_eq!(SessionState::Stopped.label(), "stopped");
    }
}
