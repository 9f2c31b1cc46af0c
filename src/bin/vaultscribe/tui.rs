//! Full-screen TUI presenter.
//!
//! A single-screen ratatui view over the session worker: status line, chunk
//! countdown gauge, scrolling live transcript, and a model selector that is
//! active while no session is running. No pipeline logic lives here.

use anyhow::{Context, Result};
use crossbeam_channel::TryRecvError;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use vaultscribe::audio::Recorder;
use vaultscribe::config::{AppConfig, ModelSize};
use vaultscribe::session::{self, SessionEvent, SessionHandle, SessionState};
use vaultscribe::log_debug;

/// Scrollback cap for the transcript pane.
const TRANSCRIPT_MAX_LINES: usize = 500;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(config: AppConfig) -> Result<()> {
    let guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;

    let mut app = TuiApp::new(config);
    loop {
        app.drain_session_events();
        terminal
            .draw(|frame| draw(frame, &app))
            .context("failed to draw frame")?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_exit() {
            break;
        }
    }

    drop(guard);
    Ok(())
}

struct TuiApp {
    config: AppConfig,
    model_size: ModelSize,
    state: SessionState,
    status: String,
    transcript: VecDeque<String>,
    note_path: Option<PathBuf>,
    fragments: usize,
    chunk_duration: Duration,
    recording_until: Option<Instant>,
    session: Option<SessionHandle>,
    session_done: bool,
    quit_requested: bool,
}

impl TuiApp {
    fn new(config: AppConfig) -> Self {
        let model_size = config.model_size;
        let chunk_duration = Duration::from_secs(config.chunk_duration);
        Self {
            config,
            model_size,
            state: SessionState::Idle,
            status: "Idle. Press 's' to start dictation.".to_string(),
            transcript: VecDeque::new(),
            note_path: None,
            fragments: 0,
            chunk_duration,
            recording_until: None,
            session: None,
            session_done: false,
            quit_requested: false,
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if let Some(session) = &self.session {
                    session.request_stop();
                    self.status = "Stopping...".to_string();
                }
                self.quit_requested = true;
            }
            KeyCode::Char('s') => self.toggle_session(),
            KeyCode::Left if self.session.is_none() => {
                self.model_size = self.model_size.prev();
            }
            KeyCode::Right if self.session.is_none() => {
                self.model_size = self.model_size.next();
            }
            _ => {}
        }
    }

    fn toggle_session(&mut self) {
        if let Some(session) = &self.session {
            session.request_stop();
            self.status = "Stopping...".to_string();
            return;
        }

        let recorder = match Recorder::new(self.config.input_device.as_deref()) {
            Ok(recorder) => recorder,
            Err(err) => {
                self.status = format!("Cannot open microphone: {err:#}");
                return;
            }
        };
        let mut session_config = self.config.clone();
        session_config.model_size = self.model_size;
        self.transcript.clear();
        self.fragments = 0;
        self.note_path = None;
        self.state = SessionState::Idle;
        self.status = "Starting session...".to_string();
        self.session = Some(session::start(session_config, Box::new(recorder)));
    }

    fn drain_session_events(&mut self) {
        let mut events = Vec::new();
        let mut disconnected = false;
        if let Some(session) = &self.session {
            loop {
                match session.receiver.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }
        for event in events {
            self.apply(event);
        }
        if disconnected {
            self.session_done = true;
        }
        if self.session_done {
            if let Some(mut session) = self.session.take() {
                session.join();
            }
            self.session_done = false;
            self.recording_until = None;
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::NoteCreated { path } => {
                self.status = format!("Session note: {}", path.display());
                self.note_path = Some(path);
            }
            SessionEvent::ModelLoading { size } => {
                self.status = format!(
                    "Loading Whisper model '{}' (first use downloads the weights)...",
                    size.label()
                );
            }
            SessionEvent::ModelReady => {
                self.status = "Model ready.".to_string();
            }
            SessionEvent::StateChanged(state) => {
                self.state = state;
                if state != SessionState::Recording {
                    self.recording_until = None;
                }
            }
            SessionEvent::ChunkStarted { duration, .. } => {
                self.chunk_duration = duration;
                self.recording_until = Some(Instant::now() + duration);
            }
            SessionEvent::ChunkSkipped { level_db, .. } => {
                self.status = format!("Silence detected ({level_db:.1} dBFS); chunk skipped.");
            }
            SessionEvent::ChunkEmpty { .. } => {
                self.status = "No speech detected in this chunk.".to_string();
            }
            SessionEvent::Fragment { text, .. } => {
                self.fragments += 1;
                self.transcript.push_back(text);
                while self.transcript.len() > TRANSCRIPT_MAX_LINES {
                    self.transcript.pop_front();
                }
            }
            SessionEvent::ChunkFailed { seq, message } => {
                log_debug(&format!("tui: chunk {seq} failed: {message}"));
                self.status = format!("Chunk {seq} failed: {message}");
            }
            SessionEvent::Fatal { message } => {
                self.status = format!("Session failed: {message}");
                self.state = SessionState::Stopped;
                self.session_done = true;
            }
            SessionEvent::Finished { path, fragments } => {
                self.status = format!(
                    "Session ended; {fragments} fragment(s) saved to {}",
                    path.display()
                );
                self.state = SessionState::Stopped;
                self.session_done = true;
            }
        }
    }

    fn should_exit(&self) -> bool {
        self.quit_requested && self.session.is_none()
    }

    fn countdown(&self) -> Option<(f64, u64)> {
        let until = self.recording_until?;
        let remaining = until.saturating_duration_since(Instant::now());
        let total = self.chunk_duration.as_secs_f64().max(0.001);
        let ratio = (1.0 - remaining.as_secs_f64() / total).clamp(0.0, 1.0);
        Some((ratio, remaining.as_secs_f64().ceil() as u64))
    }
}

fn draw(frame: &mut Frame, app: &TuiApp) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let state_style = match app.state {
        SessionState::Recording => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        SessionState::Processing => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD),
    };
    let header = Line::from(vec![
        Span::styled(app.state.label().to_uppercase(), state_style),
        Span::raw("  model: "),
        Span::styled(app.model_size.label(), Style::default().fg(Color::Cyan)),
        Span::raw(format!("  chunks: {}s  ", app.config.chunk_duration)),
        Span::raw(app.status.clone()),
    ]);
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("vaultscribe")),
        rows[0],
    );

    let (ratio, label) = match app.countdown() {
        Some((ratio, secs)) => (ratio, format!("Recording: {secs}s")),
        None => (0.0, app.state.label().to_string()),
    };
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Chunk"))
            .gauge_style(Style::default().fg(Color::Red))
            .ratio(ratio)
            .label(label),
        rows[1],
    );

    let transcript = app
        .transcript
        .iter()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let transcript_title = match &app.note_path {
        Some(path) => format!(
            "Live Transcript ({} fragments) | {}",
            app.fragments,
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        ),
        None => format!("Live Transcript ({} fragments)", app.fragments),
    };
    frame.render_widget(
        Paragraph::new(transcript)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(transcript_title),
            ),
        rows[2],
    );

    frame.render_widget(
        Paragraph::new("s start/stop   \u{2190}/\u{2192} model (while idle)   q quit"),
        rows[3],
    );
}

/// Puts the terminal into raw/alternate-screen mode and restores it on drop,
/// including the early-error paths.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        if let Err(err) = io::stdout().execute(EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err).context("failed to enter alternate screen");
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = io::stdout().execute(LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}
