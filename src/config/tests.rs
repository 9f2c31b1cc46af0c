use super::{AppConfig, ModelSize};
use clap::Parser;
use tempfile::tempdir;

fn base_config(vault: &std::path::Path) -> AppConfig {
    AppConfig::parse_from(["test-app", "--vault-path", &vault.display().to_string()])
}

#[test]
fn accepts_default_flags_with_existing_vault() {
    let vault = tempdir().expect("tempdir");
    let mut cfg = base_config(vault.path());
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.model_size, ModelSize::Base);
}

#[test]
fn rejects_missing_vault_path() {
    let mut cfg = AppConfig::parse_from(["test-app", "--vault-path", "/no/such/vault"]);
    let err = cfg.validate().expect_err("missing vault should fail");
    assert!(err.to_string().contains("does not exist"), "got {err}");
}

#[test]
fn rejects_vault_path_that_is_a_file() {
    let vault = tempdir().expect("tempdir");
    let file = vault.path().join("note.md");
    std::fs::write(&file, "x").expect("write file");
    let mut cfg = AppConfig::parse_from(["test-app", "--vault-path", &file.display().to_string()]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_chunk_duration_out_of_bounds() {
    let vault = tempdir().expect("tempdir");
    let mut cfg = base_config(vault.path());
    cfg.chunk_duration = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = base_config(vault.path());
    cfg.chunk_duration = 301;
    assert!(cfg.validate().is_err());
}

#[test]
fn accepts_chunk_duration_bounds() {
    let vault = tempdir().expect("tempdir");
    let mut cfg = base_config(vault.path());
    cfg.chunk_duration = 1;
    assert!(cfg.validate().is_ok());
    cfg.chunk_duration = 300;
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_silence_threshold_out_of_bounds() {
    let vault = tempdir().expect("tempdir");
    let mut cfg = base_config(vault.path());
    cfg.silence_threshold_db = 1.0;
    assert!(cfg.validate().is_err());
    cfg.silence_threshold_db = -121.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_unknown_subfolder() {
    let vault = tempdir().expect("tempdir");
    let mut cfg = base_config(vault.path());
    cfg.subfolder = Some("dictation".to_string());
    let err = cfg.validate().expect_err("subfolder must already exist");
    assert!(err.to_string().contains("subfolder"), "got {err}");
}

#[test]
fn accepts_existing_subfolder_and_resolves_note_dir() {
    let vault = tempdir().expect("tempdir");
    std::fs::create_dir(vault.path().join("dictation")).expect("mkdir");
    let mut cfg = base_config(vault.path());
    cfg.subfolder = Some("dictation".to_string());
    assert!(cfg.validate().is_ok());
    assert!(cfg.note_dir().ends_with("dictation"));
}

#[test]
fn rejects_invalid_language_code() {
    let vault = tempdir().expect("tempdir");
    let mut cfg = base_config(vault.path());
    cfg.lang = "en$".to_string();
    assert!(cfg.validate().is_err());
    cfg.lang = "zz".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn accepts_auto_and_locale_style_languages() {
    let vault = tempdir().expect("tempdir");
    let mut cfg = base_config(vault.path());
    cfg.lang = "auto".to_string();
    assert!(cfg.validate().is_ok());
    cfg.lang = "pt_BR".to_string();
    assert!(cfg.validate().is_ok());
}

#[test]
fn model_size_maps_to_ggml_file_names() {
    assert_eq!(ModelSize::Tiny.file_name(), "ggml-tiny.bin");
    assert_eq!(ModelSize::Large.file_name(), "ggml-large-v3.bin");
}

#[test]
fn model_size_selector_saturates_at_ends() {
    assert_eq!(ModelSize::Large.next(), ModelSize::Large);
    assert_eq!(ModelSize::Tiny.prev(), ModelSize::Tiny);
    assert_eq!(ModelSize::Base.next(), ModelSize::Small);
    assert_eq!(ModelSize::Base.prev(), ModelSize::Tiny);
}
