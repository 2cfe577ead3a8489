//! Integration tests for the sarge-deploy binary
//!
//! These tests verify argument parsing, deployer-file loading and the
//! commands that complete without contacting a deployment host.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DEPLOYER: &str = r#"
name: pubdocs
env:
  host_string: gerty.invalid
  sarge_home: /var/local/pubdocs
  pubdocs_nginx_instance: "pubdocs-{sarge_instance}.gerty.grep.ro"
applications:
  - name: web
    rolling_update: true
    launcher: exec python manage.py runfcgi -s fcgi.sock
    proxy:
      instance_host: "{pubdocs_nginx_instance}"
      live_host: pubdocs.gerty.grep.ro
  - name: worker
  - name: redis
"#;

fn sarge_deploy() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sarge-deploy"));
    cmd.env("NO_COLOR", "1")
        .env_remove("SARGE_DEPLOY_CONFIG")
        .env_remove("SARGE_DEPLOY_LOG");
    cmd
}

/// A temp dir holding `deploy.yaml` with `body`.
fn deployer_dir(body: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("deploy.yaml"), body).expect("write deploy.yaml");
    dir
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    sarge_deploy().assert().code(2).stderr(predicate::str::contains(
        "Rolling deployments onto a sarge-managed host",
    ));
}

#[test]
fn test_cli_help_lists_commands() {
    sarge_deploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("shell"))
        .stdout(predicate::str::contains("supervisorctl"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("configure"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    sarge_deploy()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sarge-deploy"));
}

#[test]
fn test_unknown_command_exits_with_error() {
    sarge_deploy().arg("nonexistent").assert().code(2);
}

// --- NO_COLOR ---

#[test]
fn test_no_color_env_accepts_conventional_values() {
    let dir = deployer_dir(DEPLOYER);
    for value in ["1", "yes", "true", "0", ""] {
        sarge_deploy()
            .current_dir(dir.path())
            .env("NO_COLOR", value)
            .arg("deploy")
            .assert()
            .success()
            .stdout(predicate::str::contains("Available applications:"));
    }
}

// --- deploy ---

#[test]
fn test_deploy_without_app_lists_applications() {
    let dir = deployer_dir(DEPLOYER);
    sarge_deploy()
        .current_dir(dir.path())
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available applications:"))
        .stdout(predicate::str::contains("web"))
        .stdout(predicate::str::contains("worker"))
        .stdout(predicate::str::contains("redis"));
}

#[test]
fn test_deploy_listing_is_printed_when_quiet() {
    let dir = deployer_dir(DEPLOYER);
    sarge_deploy()
        .current_dir(dir.path())
        .args(["--quiet", "deploy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("worker"));
}

#[test]
fn test_deploy_unknown_app_fails_before_connecting() {
    let dir = deployer_dir(DEPLOYER);
    sarge_deploy()
        .current_dir(dir.path())
        .args(["deploy", "es", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown application 'es'"))
        .stderr(predicate::str::contains("web, worker, redis"));
}

#[test]
fn test_config_flag_points_at_deployer_file() {
    let dir = deployer_dir(DEPLOYER);
    let path = dir.path().join("deploy.yaml");
    sarge_deploy()
        .arg("--config")
        .arg(&path)
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("redis"));
}

#[test]
fn test_config_env_var_points_at_deployer_file() {
    let dir = deployer_dir(DEPLOYER);
    sarge_deploy()
        .env("SARGE_DEPLOY_CONFIG", dir.path().join("deploy.yaml"))
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("web"));
}

// --- deployer file errors ---

#[test]
fn test_missing_deployer_file_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    sarge_deploy()
        .current_dir(dir.path())
        .arg("deploy")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("deployer file not found"));
}

#[test]
fn test_deployer_without_applications_is_rejected() {
    let dir = deployer_dir("name: pubdocs\n");
    sarge_deploy()
        .current_dir(dir.path())
        .arg("deploy")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no applications"));
}

#[test]
fn test_configure_without_app_config_fails() {
    let dir = deployer_dir(DEPLOYER);
    sarge_deploy()
        .current_dir(dir.path())
        .arg("configure")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("app_config"));
}

#[test]
fn test_invalid_set_binding_is_a_usage_error() {
    let dir = deployer_dir(DEPLOYER);
    sarge_deploy()
        .current_dir(dir.path())
        .args(["deploy", "--set", "novalue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("KEY=VALUE"));
}
