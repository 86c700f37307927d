//! Integration tests for the `spcbridge` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without a gateway; the rest drive the binary against a wiremock gateway.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `spcbridge` binary with env isolation.
///
/// Clears all `SPCBRIDGE_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn spcbridge_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("spcbridge");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("SPCBRIDGE_PROFILE")
        .env_remove("SPCBRIDGE_GATEWAY")
        .env_remove("SPCBRIDGE_OUTPUT")
        .env_remove("SPCBRIDGE_TIMEOUT")
        .env_remove("SPCBRIDGE_CODE");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(home: &Path, toml: &str) {
    let dir = home.join(".config").join("spcbridge");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), toml).unwrap();
}

fn ok(key: &str, data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "success",
        "data": { key: data }
    }))
}

async fn mount_get(server: &MockServer, key: &str, data: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/spc/{key}")))
        .and(basic_auth("get_user", "get_pwd"))
        .respond_with(ok(key, data))
        .mount(server)
        .await;
}

/// A two-area panel: a motion and a fire zone in the house, a door zone in
/// the garage.
async fn gateway() -> MockServer {
    let server = MockServer::start().await;
    mount_get(&server, "panel", json!({ "serial": "123456", "model": "SPC5330", "mode": 0 })).await;
    mount_get(&server, "user", json!([{ "id": 3, "name": "Alice" }])).await;
    mount_get(
        &server,
        "area",
        json!([
            { "id": 1, "name": "House", "mode": 0, "zones": [10, 11] },
            { "id": 2, "name": "Garage", "mode": 0, "zones": [12] }
        ]),
    )
    .await;
    mount_get(
        &server,
        "zone",
        json!([
            { "id": 10, "name": "Hall PIR", "zone_type": "motion", "area": 1, "state": "closed" },
            { "id": 11, "name": "Kitchen smoke", "zone_type": "fire", "area": 1, "state": "closed" },
            { "id": 12, "name": "Garage door", "zone_type": "door", "area": 2, "state": "open" }
        ]),
    )
    .await;
    mount_get(&server, "output", json!([{ "id": 1, "name": "Siren", "state": 0 }])).await;
    mount_get(&server, "door", json!([])).await;
    server
}

fn command_result(code: u32, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "success",
        "data": { "code": code, "message": message }
    }))
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = spcbridge_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("SPC")
            .and(predicate::str::contains("areas"))
            .and(predicate::str::contains("zones"))
            .and(predicate::str::contains("arm-status"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spcbridge"));
}

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_output_format() {
    let home = TempDir::new().unwrap();
    let output = spcbridge_cmd(home.path())
        .args(["--output", "invalid", "areas"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_unknown_entity_kind_is_usage_error() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path())
        .args(["command", "garage", "1", "set"])
        .assert()
        .code(2);
}

#[test]
fn test_areas_without_config_or_gateway() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path())
        .arg("areas")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path()).args(["config", "show"]).assert().success();
}

#[test]
fn test_config_path_follows_xdg() {
    let home = TempDir::new().unwrap();
    let expected = home.path().join(".config").join("spcbridge").join("config.toml");
    spcbridge_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn test_config_init_then_show_redacts_passwords() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path())
        .args([
            "--profile",
            "home",
            "--gateway",
            "192.168.1.50",
            "config",
            "init",
            "--put-password",
            "hunter2",
        ])
        .assert()
        .success();

    spcbridge_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("192.168.1.50")
                .and(predicate::str::contains("default_profile = \"home\""))
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let home = TempDir::new().unwrap();
    let init = |force: bool| {
        let mut cmd = spcbridge_cmd(home.path());
        cmd.args(["--gateway", "10.0.0.5", "config", "init"]);
        if force {
            cmd.arg("--force");
        }
        cmd.output().unwrap()
    };

    assert!(init(false).status.success());
    assert_eq!(init(false).status.code(), Some(2));
    assert!(init(true).status.success());
}

#[test]
fn test_config_init_requires_gateway() {
    let home = TempDir::new().unwrap();
    spcbridge_cmd(home.path())
        .args(["config", "init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("gateway"));
}

// ── Against a gateway ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_reports_panel() {
    let server = gateway().await;
    let home = TempDir::new().unwrap();

    let output = spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "--output", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["serial"], "123456");
    assert_eq!(status["mode"], "unset");
    assert_eq!(status["areas"], 2);
    assert_eq!(status["zones"], 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_areas_hide_excluded_unless_all() {
    let server = gateway().await;
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        &format!(
            r#"
default_profile = "home"

[profiles.home]
gateway = "{}"

[profiles.home.include]
areas = {{ "2" = "exclude" }}
"#,
            server.uri()
        ),
    );

    spcbridge_cmd(home.path())
        .args(["--output", "plain", "areas"])
        .assert()
        .success()
        .stdout("1\n");

    spcbridge_cmd(home.path())
        .args(["--output", "plain", "areas", "--all"])
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_zones_carry_default_class() {
    let server = gateway().await;
    let home = TempDir::new().unwrap();

    let output = spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "--output", "json", "zones", "--area", "1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let zones: Value = serde_json::from_slice(&output.stdout).unwrap();
    let zones = zones.as_array().unwrap();
    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0]["id"], 10);
    assert_eq!(zones[0]["class"], "motion");
    assert_eq!(zones[1]["id"], 11);
    assert_eq!(zones[1]["class"], "smoke");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_sends_code_with_put_credentials() {
    let server = gateway().await;
    Mock::given(method("PUT"))
        .and(path("/spc/area/1/set"))
        .and(basic_auth("put_user", "put_pwd"))
        .and(body_json(json!({ "code": "1234" })))
        .respond_with(command_result(0, "OK"))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "command", "area", "1", "set", "--code", "1234"])
        .assert()
        .success()
        .stdout(predicate::str::contains("area 1 set: OK"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_command_exit_code() {
    let server = gateway().await;
    Mock::given(method("PUT"))
        .and(path("/spc/area/1/set"))
        .respond_with(command_result(7, "Zone open"))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "command", "area", "1", "set"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Zone open"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_for_missing_area_never_reaches_gateway() {
    let server = gateway().await;
    Mock::given(method("PUT"))
        .respond_with(command_result(0, "OK"))
        .expect(0)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "command", "area", "9", "set"])
        .assert()
        .code(2);

    // Action that does not apply to the kind.
    spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "command", "output", "1", "inhibit"])
        .assert()
        .code(2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_keypad_code_is_translated_by_map() {
    let server = gateway().await;
    Mock::given(method("PUT"))
        .and(path("/spc/area/1/unset"))
        .and(body_json(json!({ "code": "s3cret" })))
        .respond_with(command_result(0, "OK"))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        &format!(
            r#"
default_profile = "home"

[profiles.home]
gateway = "{}"
user_identify = "by_map"

[profiles.home.users.3]
keypad_code = "1234"
spc_password = "s3cret"
"#,
            server.uri()
        ),
    );

    spcbridge_cmd(home.path())
        .args(["command", "area", "1", "unset", "--code", "1234"])
        .assert()
        .success();

    // Unknown codes are rejected locally.
    spcbridge_cmd(home.path())
        .args(["command", "area", "1", "unset", "--code", "9999"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown keypad code"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_arm_status_plain() {
    let server = gateway().await;
    Mock::given(method("GET"))
        .and(path("/spc/arm_status"))
        .and(query_param("mode", "set"))
        .respond_with(ok(
            "arm_status",
            json!([
                { "area_id": 1, "reasons": [] },
                { "area_id": 2, "reasons": ["Zone 12 open"] }
            ]),
        ))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "--output", "plain", "arm-status", "set"])
        .assert()
        .success()
        .stdout("1 ready\n2 Zone 12 open\n");

    spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "arm-status", "arm"])
        .assert()
        .code(2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_auth_failure_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "areas"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_test_prints_serial() {
    let server = gateway().await;
    let home = TempDir::new().unwrap();

    spcbridge_cmd(home.path())
        .args(["--gateway", &server.uri(), "config", "test"])
        .assert()
        .success()
        .stdout("123456\n");
}
