use super::defaults::ISO_639_1_CODES;
use super::{AppConfig, MAX_CHUNK_DURATION_SECS, MIN_CHUNK_DURATION_SECS};
use anyhow::{bail, Context, Result};

impl AppConfig {
    /// Check CLI values and normalize paths. Everything caught here is a
    /// startup-fatal configuration error: nothing has been recorded or
    /// written yet.
    pub fn validate(&mut self) -> Result<()> {
        if !(MIN_CHUNK_DURATION_SECS..=MAX_CHUNK_DURATION_SECS).contains(&self.chunk_duration) {
            bail!(
                "--chunk-duration must be between {MIN_CHUNK_DURATION_SECS} and {MAX_CHUNK_DURATION_SECS} seconds, got {}",
                self.chunk_duration
            );
        }

        if !(-120.0..=0.0).contains(&self.silence_threshold_db) {
            bail!(
                "--silence-threshold-db must be between -120.0 and 0.0 dBFS, got {}",
                self.silence_threshold_db
            );
        }

        if !self.vault_path.exists() {
            bail!(
                "vault path '{}' does not exist; pass --vault-path or set VAULTSCRIBE_VAULT_PATH",
                self.vault_path.display()
            );
        }
        self.vault_path = self.vault_path.canonicalize().with_context(|| {
            format!(
                "failed to canonicalize vault path '{}'",
                self.vault_path.display()
            )
        })?;
        if !self.vault_path.is_dir() {
            bail!(
                "vault path '{}' is not a directory",
                self.vault_path.display()
            );
        }

        // The subfolder is never created implicitly; a typo should not spray
        // new directories across someone's vault.
        if let Some(sub) = &self.subfolder {
            if sub.trim().is_empty() {
                bail!("--subfolder must not be empty");
            }
            let dir = self.vault_path.join(sub);
            if !dir.is_dir() {
                bail!(
                    "vault subfolder '{}' does not exist under '{}'",
                    sub,
                    self.vault_path.display()
                );
            }
        }

        if self.lang.trim().is_empty() {
            bail!("--lang must not be empty");
        }
        if !self.lang.eq_ignore_ascii_case("auto") {
            if !self
                .lang
                .chars()
                .all(|ch| ch.is_ascii_alphabetic() || ch == '-' || ch == '_')
            {
                bail!("--lang must contain only alphabetic characters or '-'/'_' separators");
            }
            // Allow locale-style values but only check the leading ISO-639-1 code.
            let lang_primary = self
                .lang
                .split(['-', '_'])
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();
            if !ISO_639_1_CODES.contains(&lang_primary.as_str()) {
                bail!(
                    "--lang must start with a valid ISO-639-1 code or be 'auto', got '{}'",
                    self.lang
                );
            }
        }

        Ok(())
    }
}
