//! Session note creation and append-only fragment writing.
//!
//! One Markdown file per session, named by the session start time. Fragments
//! are appended in chunk order and flushed immediately, so a crash loses at
//! most the in-flight chunk. The file is never read back or rewritten.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Markdown note for one dictation session.
pub struct NoteWriter {
    path: PathBuf,
    file: File,
    fragments_written: usize,
}

impl NoteWriter {
    /// Create the session note under `dir`, named by the current local time.
    pub fn create(dir: &Path) -> Result<Self> {
        Self::create_at(dir, Local::now())
    }

    fn create_at(dir: &Path, started: DateTime<Local>) -> Result<Self> {
        let stamp = started.format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!("LiveDictation_{stamp}.md"));
        // create_new keeps the one-file-per-session invariant honest: a name
        // collision is an error, not a silent truncation of an earlier note.
        let mut file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("cannot create session note '{}'", path.display()))?;

        writeln!(file, "# Live Dictation - {stamp}")
            .and_then(|_| writeln!(file))
            .and_then(|_| {
                writeln!(
                    file,
                    "*Started at: {}*",
                    started.format("%Y-%m-%d %H:%M:%S")
                )
            })
            .and_then(|_| writeln!(file))
            .and_then(|_| file.flush())
            .with_context(|| format!("cannot write session note '{}'", path.display()))?;

        Ok(Self {
            path,
            file,
            fragments_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fragments_written(&self) -> usize {
        self.fragments_written
    }

    /// Append one transcript fragment as its own newline-terminated line and
    /// flush it to disk before returning.
    pub fn append_fragment(&mut self, text: &str) -> Result<()> {
        writeln!(self.file, "{text}")
            .and_then(|_| self.file.flush())
            .with_context(|| format!("failed to append to '{}'", self.path.display()))?;
        self.fragments_written += 1;
        Ok(())
    }

    /// Final flush at session end; returns the note path for reporting.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.file
            .flush()
            .with_context(|| format!("failed to flush '{}'", self.path.display()))?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap()
    }

    #[test]
    fn creates_named_note_with_header_before_any_fragment() {
        let dir = tempdir().expect("tempdir");
        let writer = NoteWriter::create_at(dir.path(), fixed_time()).expect("create note");
        assert!(writer.path().ends_with("LiveDictation_2024-03-09_14-30-05.md"));
        assert_eq!(writer.fragments_written(), 0);

        let content = std::fs::read_to_string(writer.path()).expect("read note");
        assert!(content.starts_with("# Live Dictation - 2024-03-09_14-30-05\n"));
        assert!(content.contains("*Started at: 2024-03-09 14:30:05*"));
    }

    #[test]
    fn fragments_are_appended_in_order_and_newline_terminated() {
        let dir = tempdir().expect("tempdir");
        let mut writer = NoteWriter::create_at(dir.path(), fixed_time()).expect("create note");
        writer.append_fragment("first thought").expect("append");
        writer.append_fragment("second thought").expect("append");
        assert_eq!(writer.fragments_written(), 2);

        let path = writer.finish().expect("finish");
        let content = std::fs::read_to_string(path).expect("read note");
        assert!(content.ends_with("first thought\nsecond thought\n"));
    }

    #[test]
    fn refuses_to_clobber_an_existing_note() {
        let dir = tempdir().expect("tempdir");
        let _first = NoteWriter::create_at(dir.path(), fixed_time()).expect("create note");
        let second = NoteWriter::create_at(dir.path(), fixed_time());
        assert!(second.is_err());
    }

    #[test]
    fn create_fails_in_missing_directory() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        assert!(NoteWriter::create(&missing).is_err());
    }
}
