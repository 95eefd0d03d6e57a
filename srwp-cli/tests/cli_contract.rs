//! Integration tests for core CLI contract behavior.
//!
//! None of these need a device attached: they cover argument handling,
//! output streams and exit codes up to the point where a port would open.

use {predicates::prelude::*, std::fs, tempfile::tempdir};

const MISSING_DEVICE: &str = "/dev/srwp-missing-device-xyz";

fn cli_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("srwp");
    cmd.env_remove("SRWP_DEVICE")
        .env_remove("SRWP_FRAM_SIZE");
    cmd
}

#[test]
fn help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("srwp"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn help_lists_every_subcommand() {
    let mut cmd = cli_cmd();
    let assert = cmd
        .arg("--help")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(
        &assert
            .get_output()
            .stdout,
    )
    .to_string();
    for sub in [
        "echo",
        "read",
        "write",
        "info",
        "clear",
        "check",
        "backup",
        "restore",
        "verify",
        "dfu",
        "list-ports",
        "completions",
    ] {
        assert!(stdout.contains(sub), "help should mention {sub}");
    }
}

#[test]
fn version_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("srwp"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn completions_command_writes_to_stdout() {
    let mut cmd = cli_cmd();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::contains("srwp"));
}

#[test]
fn completions_without_shell_is_usage_error() {
    let mut cmd = cli_cmd();
    cmd.env_remove("SHELL")
        .arg("completions")
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn list_ports_json_returns_valid_json() {
    let mut cmd = cli_cmd();
    let output = cmd
        .args(["list-ports", "--json"])
        .output()
        .expect("command should execute");

    assert!(
        output
            .status
            .success()
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be a single JSON document");
    assert_eq!(parsed["ok"], serde_json::Value::Bool(true));
    assert!(parsed["data"]["ports"].is_array());
}

// ============================================================================
// Exit Code Tests
// ============================================================================

/// Exit code 2: usage error (unknown command, invalid arguments)
#[test]
fn exit_code_two_for_unknown_command() {
    let mut cmd = cli_cmd();
    cmd.arg("unknown-command-xyz")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn exit_code_two_for_invalid_address() {
    let mut cmd = cli_cmd();
    cmd.args(["read", "zz", "4"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid number"));
}

#[test]
fn exit_code_two_for_missing_required_arg() {
    let mut cmd = cli_cmd();
    cmd.arg("backup")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn exit_code_two_for_non_ascii_echo() {
    let mut cmd = cli_cmd();
    cmd.args(["-d", MISSING_DEVICE, "echo", "grüße"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("ASCII"));
}

#[test]
fn exit_code_two_for_zero_chunk_size() {
    let mut cmd = cli_cmd();
    cmd.args(["-d", MISSING_DEVICE, "--chunk-size", "0", "check"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("chunk size"));
}

/// Exit code 1: the device cannot be opened
#[test]
fn exit_code_one_for_missing_device() {
    let mut cmd = cli_cmd();
    cmd.args(["-d", MISSING_DEVICE, "check"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(MISSING_DEVICE));
}

#[test]
fn device_can_come_from_environment() {
    let mut cmd = cli_cmd();
    cmd.env("SRWP_DEVICE", MISSING_DEVICE)
        .arg("info")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(MISSING_DEVICE));
}

#[test]
fn device_can_come_from_config_file() {
    let dir = tempdir().expect("tempdir should be created");
    let config = dir
        .path()
        .join("custom.toml");
    fs::write(&config, format!("[device]\npath = \"{MISSING_DEVICE}\"\n"))
        .expect("write config");

    let mut cmd = cli_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(MISSING_DEVICE));
}

#[test]
fn info_json_error_keeps_stdout_clean() {
    let mut cmd = cli_cmd();
    cmd.args(["-d", MISSING_DEVICE, "info", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn restore_missing_file_fails_before_opening_device() {
    let dir = tempdir().expect("tempdir should be created");
    let missing = dir
        .path()
        .join("not_there.bin");

    let mut cmd = cli_cmd();
    cmd.args(["-d", MISSING_DEVICE, "restore"])
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn verify_missing_file_fails_before_opening_device() {
    let dir = tempdir().expect("tempdir should be created");
    let missing = dir
        .path()
        .join("not_there.bin");

    let mut cmd = cli_cmd();
    cmd.args(["-d", MISSING_DEVICE, "verify"])
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn invalid_local_config_is_a_warning() {
    let dir = tempdir().expect("tempdir should be created");
    fs::write(
        dir.path()
            .join("srwp.toml"),
        "invalid toml [[[",
    )
    .expect("write invalid config");

    let mut cmd = cli_cmd();
    let output = cmd
        .current_dir(dir.path())
        .args(["list-ports", "--json"])
        .output()
        .expect("command should execute");

    assert!(
        output
            .status
            .success(),
        "command should succeed despite config warning"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TOML"), "should warn about invalid TOML");
}

#[test]
fn colors_disabled_when_not_tty() {
    let mut cmd = cli_cmd();
    cmd.args(["-d", MISSING_DEVICE, "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\u{1b}[").not());
}
