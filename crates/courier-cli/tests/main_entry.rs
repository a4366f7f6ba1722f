//! Integration tests for the `courier` binary entry point.
//!
//! Exercises manifest loading through flags, the environment and a
//! configuration file, and the user-facing error handling for missing or
//! invalid inputs.

use std::fs;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

const MANIFEST: &str = r#"{
  "contracts": [
    {
      "name": "OnlineService",
      "remote": true,
      "methods": [{ "name": "greet", "parameters": ["String"], "returns": "String" }]
    }
  ],
  "services": [
    { "name": "OfflineServiceImpl", "implements": ["OnlineService"], "shadow": {} }
  ]
}"#;

fn write_manifest(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("manifest.json");
    fs::write(&path, contents).expect("write manifest");
    path.to_str().expect("utf-8 path").to_owned()
}

fn courier() -> Command {
    let mut command = cargo_bin_cmd!("courier");
    command
        .env_remove("COURIER_CONFIG_PATH")
        .env_remove("COURIER_LOG_FORMAT")
        .env_remove("COURIER_MANIFEST")
        .env("COURIER_LOG_FILTER", "off");
    command
}

#[test]
fn plan_reports_the_remote_channel() {
    let dir = TempDir::new().expect("temp dir");
    let manifest = write_manifest(&dir, MANIFEST);
    courier()
        .args(["--manifest", &manifest, "--output", "human", "plan"])
        .assert()
        .success()
        .stdout(contains("OnlineService:RPC [shadow_for_remote]"));
}

#[test]
fn manifest_can_come_from_the_environment() {
    let dir = TempDir::new().expect("temp dir");
    let manifest = write_manifest(&dir, MANIFEST);
    courier()
        .env("COURIER_MANIFEST", &manifest)
        .args(["--output", "human", "signatures"])
        .assert()
        .success()
        .stdout(contains("OnlineService|greet(String) (remote)"));
}

#[test]
fn route_prints_the_reply_as_json() {
    let dir = TempDir::new().expect("temp dir");
    let manifest = write_manifest(&dir, MANIFEST);
    courier()
        .args([
            "--manifest",
            &manifest,
            "--output",
            "json",
            "route",
            "--channel",
            "OnlineService:RPC",
            r#"{"commandLabel":"OnlineService|greet(String)","parameters":["Ada"],"replyTo":"conv-1"}"#,
        ])
        .assert()
        .success()
        .stdout(contains(r#""conversationId": "conv-1""#));
}

#[test]
fn manifest_can_come_from_a_configuration_file() {
    let dir = TempDir::new().expect("temp dir");
    let manifest = write_manifest(&dir, MANIFEST);
    let config = dir.path().join("courier.toml");
    fs::write(&config, format!("manifest = {manifest:?}\n")).expect("write config");
    courier()
        .arg("--config-path")
        .arg(&config)
        .args(["--output", "human", "plan"])
        .assert()
        .success()
        .stdout(contains("OfflineServiceImpl"));
}

#[test]
fn missing_manifest_exits_with_failure() {
    courier()
        .arg("plan")
        .assert()
        .failure()
        .stderr(contains("no service manifest configured"));
}

#[test]
fn generation_errors_exit_with_failure() {
    let dir = TempDir::new().expect("temp dir");
    let manifest = write_manifest(
        &dir,
        r#"{"services": [{"name": "S", "implements": ["Missing"], "shadow": {}}]}"#,
    );
    courier()
        .args(["--manifest", &manifest, "plan"])
        .assert()
        .failure()
        .stderr(contains("implements unknown contract 'Missing'"));
}
