//! Whisper model weight cache and downloader.
//!
//! Weights live in a local cache directory as `ggml-<size>.bin`. On first
//! use of a size the file is fetched from the whisper.cpp Hugging Face repo,
//! streamed to a `.part` file, hashed, and renamed into place only once the
//! checksum (the server's linked ETag, a SHA-256 for LFS objects) matches.

use crate::config::ModelSize;
use crate::log_debug;
use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";
const DOWNLOAD_ATTEMPTS: u32 = 2;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Cache directory used when `--model-dir` is not given.
pub fn default_model_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vaultscribe")
        .join("models")
}

/// Resolve the configured override or fall back to the user cache dir.
pub fn resolve_dir(configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(dir) => dir.to_path_buf(),
        None => default_model_dir(),
    }
}

/// Download URL for a model size.
pub fn model_url(size: ModelSize) -> String {
    format!("{MODEL_BASE_URL}/{}", size.file_name())
}

/// Ensure the weights for `size` exist under `model_dir`, downloading them on
/// first use. A corrupted download is retried once; a second failure surfaces
/// guidance for fetching the file manually.
pub fn ensure_model(model_dir: &Path, size: ModelSize) -> Result<PathBuf> {
    let target = model_dir.join(size.file_name());
    if target.exists() {
        log_debug(&format!("model cache hit: {}", target.display()));
        return Ok(target);
    }

    fs::create_dir_all(model_dir).with_context(|| {
        format!(
            "failed to create model directory '{}'",
            model_dir.display()
        )
    })?;

    let url = model_url(size);
    let mut last_err = anyhow!("no download attempt made");
    for attempt in 1..=DOWNLOAD_ATTEMPTS {
        log_debug(&format!(
            "downloading model '{}' (attempt {attempt}/{DOWNLOAD_ATTEMPTS})",
            size.label()
        ));
        match download_verified(&url, &target) {
            Ok(()) => return Ok(target),
            Err(err) => {
                log_debug(&format!("model download failed: {err:#}"));
                last_err = err;
            }
        }
    }

    Err(last_err.context(format!(
        "failed to fetch the '{}' model; download {url} manually and place it at {}",
        size.label(),
        target.display()
    )))
}

/// Stream the weights to `<target>.part`, verify the hash, then rename. The
/// rename is the commit point, so an interrupted download never leaves a
/// half-written file under the final name.
fn download_verified(url: &str, target: &Path) -> Result<()> {
    let client = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("request to {url} failed"))?;
    if !response.status().is_success() {
        bail!("server returned {} for {url}", response.status());
    }
    let expected = expected_digest(response.headers());

    let part = part_path(target);
    let file = File::create(&part)
        .with_context(|| format!("failed to create '{}'", part.display()))?;
    let mut sink = HashingWriter::new(BufWriter::new(file));
    response
        .copy_to(&mut sink)
        .context("model download interrupted")?;
    let actual = sink.finish().context("failed to flush model file")?;

    match expected {
        Some(want) if want != actual => {
            let _ = fs::remove_file(&part);
            bail!("checksum mismatch for {url}: expected {want}, got {actual}");
        }
        Some(_) => log_debug("model checksum verified"),
        None => log_debug("server sent no linked etag; skipping checksum verification"),
    }

    fs::rename(&part, target)
        .with_context(|| format!("failed to move model into place at '{}'", target.display()))?;
    Ok(())
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Hugging Face serves LFS objects with the content SHA-256 as the linked
/// ETag. Anything that does not look like a SHA-256 hex digest is ignored.
fn expected_digest(headers: &HeaderMap) -> Option<String> {
    for key in ["x-linked-etag", "etag"] {
        let Some(value) = headers.get(key).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let trimmed = value
            .trim()
            .trim_start_matches("W/")
            .trim_matches('"')
            .to_ascii_lowercase();
        if trimmed.len() == 64 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Some(trimmed);
        }
    }
    None
}

struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(mut self) -> io::Result<String> {
        self.inner.flush()?;
        let digest = self.hasher.finalize();
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
