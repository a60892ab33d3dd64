// Integration tests for the merakictl binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_rotate_has_dry_run_flag() {
    let mut cmd = cargo_bin_cmd!("merakictl");
    cmd.args(["rotate", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("--dry-run"))
        .stdout(predicates::str::contains("--network"))
        .stdout(predicates::str::contains("--ssid"));
}

#[test]
fn test_missing_api_key_fails() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("merakictl");
    cmd.current_dir(dir.path())
        .env_remove("MERAKI_API")
        .env("MERAKICTL_CONFIG_DIR", dir.path().join("config"))
        .arg("orgs");
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("API key is required"));
}

#[test]
fn test_configure_then_show_masks_key() {
    let dir = tempdir().unwrap();

    let mut configure = cargo_bin_cmd!("merakictl");
    configure
        .current_dir(dir.path())
        .env("MERAKICTL_CONFIG_DIR", dir.path().join("config"))
        .args(["configure", "--key", "secret-key", "--ssid", "Lobby"]);
    configure
        .assert()
        .success()
        .stdout(predicates::str::contains("Saved configuration"));

    let mut show = cargo_bin_cmd!("merakictl");
    show.current_dir(dir.path())
        .env("MERAKICTL_CONFIG_DIR", dir.path().join("config"))
        .arg("config-show");
    show.assert()
        .success()
        .stdout(predicates::str::contains("Lobby"))
        .stdout(predicates::str::contains("*****"))
        .stdout(predicates::str::contains("secret-key").not());
}

#[test]
fn test_completion_generates_script() {
    let mut cmd = cargo_bin_cmd!("merakictl");
    cmd.args(["completion", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("merakictl"));
}

#[test]
fn test_validate_fails_when_dashboard_unreachable() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("merakictl");
    cmd.current_dir(dir.path())
        .env("MERAKICTL_CONFIG_DIR", dir.path().join("config"))
        .args(["--api-key", "k", "--base-url", "http://127.0.0.1:9", "validate"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Dashboard API key check failed"));
}
