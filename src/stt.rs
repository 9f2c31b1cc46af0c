//! Whisper speech-to-text integration.
//!
//! Wraps `whisper_rs` behind the `SpeechToText` seam. The model is loaded
//! once at session start and reused for every chunk to avoid repeated
//! initialization overhead.

use anyhow::Result;

/// Transcription seam of the pipeline: decodes one chunk of 16kHz mono PCM.
pub trait SpeechToText: Send {
    fn transcribe(&mut self, samples: &[f32], lang: &str) -> Result<String>;
}

#[cfg(unix)]
mod platform {
    use super::SpeechToText;
    use crate::log_debug;
    use anyhow::{anyhow, Context, Result};
    use std::io;
    use std::os::raw::{c_char, c_uint, c_void};
    use std::os::unix::io::AsRawFd;
    use std::path::Path;
    use std::sync::Once;
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Whisper model context. Create once per session and reuse for all
    /// chunks.
    pub struct Transcriber {
        ctx: WhisperContext,
    }

    impl Transcriber {
        /// Loads the Whisper model from disk.
        ///
        /// Temporarily redirects stderr to `/dev/null` during loading because
        /// whisper.cpp emits verbose initialization messages that would
        /// corrupt the countdown line or the TUI.
        ///
        /// # Errors
        ///
        /// Returns an error if the model file cannot be loaded or stderr
        /// redirection fails.
        pub fn new(model_path: &Path) -> Result<Self> {
            install_whisper_log_silencer();

            let model_path = model_path
                .to_str()
                .ok_or_else(|| anyhow!("model path must be valid UTF-8"))?;

            let null = std::fs::OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .context("failed to open /dev/null")?;
            let null_fd = null.as_raw_fd();

            // SAFETY: dup(2) duplicates the stderr file descriptor. We hold
            // the only reference and restore it before returning.
            let orig_stderr = unsafe { libc::dup(2) };
            if orig_stderr < 0 {
                return Err(anyhow!(
                    "failed to dup stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let dup_result = unsafe { libc::dup2(null_fd, 2) };
            if dup_result < 0 {
                unsafe {
                    libc::close(orig_stderr);
                }
                return Err(anyhow!(
                    "failed to redirect stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let ctx_result =
                WhisperContext::new_with_params(model_path, WhisperContextParameters::default());

            let restore_result = unsafe { libc::dup2(orig_stderr, 2) };
            unsafe {
                libc::close(orig_stderr);
            }
            if restore_result < 0 {
                return Err(anyhow!(
                    "failed to restore stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let ctx = ctx_result.context("failed to load whisper model")?;
            Ok(Self { ctx })
        }

        /// Run greedy decoding over the captured PCM and return the
        /// concatenated segment text.
        pub fn decode(&self, samples: &[f32], lang: &str) -> Result<String> {
            let mut state = self
                .ctx
                .create_state()
                .context("failed to create whisper state")?;
            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            if lang.eq_ignore_ascii_case("auto") {
                params.set_language(None);
                params.set_detect_language(true);
            } else {
                params.set_language(Some(lang));
                params.set_detect_language(false);
            }
            // Limit CPU usage so laptops don't max out all cores.
            params.set_n_threads(num_cpus::get().min(8) as i32);
            params.set_print_progress(false);
            params.set_print_timestamps(false);
            params.set_print_special(false);
            params.set_print_realtime(false);
            params.set_translate(false);
            params.set_token_timestamps(false);
            state.full(params, samples)?;

            let mut transcript = String::new();
            let num_segments = match state.full_n_segments() {
                Ok(count) => count,
                Err(err) => {
                    log_debug(&format!("whisper failed to read segment count: {err}"));
                    return Ok(transcript);
                }
            };
            if num_segments < 0 {
                log_debug("whisper returned a negative segment count");
                return Ok(transcript);
            }
            // Whisper splits output into small segments; stitch them together.
            for i in 0..num_segments {
                match state.full_get_segment_text_lossy(i) {
                    Ok(text) => transcript.push_str(&text),
                    Err(err) => log_debug(&format!("failed to read whisper segment {i}: {err}")),
                }
            }
            Ok(transcript.replace("[BLANK_AUDIO]", ""))
        }
    }

    impl SpeechToText for Transcriber {
        fn transcribe(&mut self, samples: &[f32], lang: &str) -> Result<String> {
            self.decode(samples, lang)
        }
    }

    fn install_whisper_log_silencer() {
        static INSTALL_LOG_CALLBACK: Once = Once::new();
        INSTALL_LOG_CALLBACK.call_once(|| unsafe {
            whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
        });
    }

    #[allow(unused_variables)]
    unsafe extern "C" fn whisper_log_callback(
        _level: c_uint,
        _text: *const c_char,
        _user_data: *mut c_void,
    ) {
        // Silence the default whisper.cpp logger so it cannot write over the
        // presenter's output.
    }
}

#[cfg(not(unix))]
mod platform {
    use super::SpeechToText;
    use anyhow::{anyhow, Result};
    use std::path::Path;

    /// Stub implementation for targets without the stderr-redirect path.
    pub struct Transcriber;

    impl Transcriber {
        pub fn new(_: &Path) -> Result<Self> {
            Err(anyhow!(
                "Whisper transcription is currently supported only on Unix-like platforms"
            ))
        }

        pub fn decode(&self, _: &[f32], _: &str) -> Result<String> {
            Err(anyhow!(
                "Whisper transcription is currently supported only on Unix-like platforms"
            ))
        }
    }

    impl SpeechToText for Transcriber {
        fn transcribe(&mut self, samples: &[f32], lang: &str) -> Result<String> {
            self.decode(samples, lang)
        }
    }
}

pub use platform::Transcriber;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[cfg(unix)]
    #[test]
    fn transcriber_rejects_missing_model() {
        let result = Transcriber::new(Path::new("/no/such/model.bin"));
        assert!(result.is_err());
    }
}
