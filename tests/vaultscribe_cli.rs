use std::process::Command;
use tempfile::tempdir;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn vaultscribe_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_vaultscribe").expect("vaultscribe test binary not built")
}

fn vaultscribe_cmd() -> Command {
    let mut cmd = Command::new(vaultscribe_bin());
    // Keep the operator's environment from leaking into assertions.
    for var in [
        "VAULTSCRIBE_VAULT_PATH",
        "VAULTSCRIBE_SUBFOLDER",
        "VAULTSCRIBE_MODEL_SIZE",
        "VAULTSCRIBE_CHUNK_DURATION",
        "VAULTSCRIBE_SILENCE_THRESHOLD_DB",
        "VAULTSCRIBE_LANG",
        "VAULTSCRIBE_MODEL_DIR",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_mentions_vault_dictation() {
    let output = vaultscribe_cmd()
        .arg("--help")
        .output()
        .expect("run vaultscribe --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("vault"));
    assert!(combined.contains("--model-size"));
}

#[test]
fn invalid_model_size_is_startup_fatal_and_writes_nothing() {
    let vault = tempdir().expect("tempdir");
    let output = vaultscribe_cmd()
        .args([
            "--vault-path",
            &vault.path().display().to_string(),
            "--model-size",
            "enormous",
        ])
        .output()
        .expect("run vaultscribe");
    assert!(!output.status.success());

    let entries = std::fs::read_dir(vault.path()).expect("read vault").count();
    assert_eq!(entries, 0, "no note may be created on bad configuration");
}

#[test]
fn missing_vault_path_is_startup_fatal() {
    let output = vaultscribe_cmd()
        .args(["--vault-path", "/no/such/vault-for-vaultscribe"])
        .output()
        .expect("run vaultscribe");
    assert!(!output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("vault"), "got: {combined}");
}

#[test]
fn zero_chunk_duration_is_startup_fatal_and_writes_nothing() {
    let vault = tempdir().expect("tempdir");
    let output = vaultscribe_cmd()
        .args([
            "--vault-path",
            &vault.path().display().to_string(),
            "--chunk-duration",
            "0",
        ])
        .output()
        .expect("run vaultscribe");
    assert!(!output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("--chunk-duration"), "got: {combined}");

    let entries = std::fs::read_dir(vault.path()).expect("read vault").count();
    assert_eq!(entries, 0);
}

#[test]
fn list_input_devices_prints_message() {
    let output = vaultscribe_cmd()
        .arg("--list-input-devices")
        .output()
        .expect("run vaultscribe --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("audio input devices"));
}
