#![allow(deprecated)]

//! End-to-end tests of the `educonnect` binary
//!
//! Every invocation uses a memory or temp-dir session backend so no test
//! touches the per-user data directory.
use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn educonnect() -> Command {
    let mut cmd = Command::cargo_bin("educonnect").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("EDUCONNECT_API_BASE")
        .env_remove("EDUCONNECT_TIMEOUT_SECONDS")
        .env_remove("EDUCONNECT_SESSION_PATH")
        .env_remove("EDUCONNECT_PROFILE")
        .env("EDUCONNECT_SESSION_BACKEND", "memory")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_version_flag() {
    educonnect()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("educonnect"));
}

#[test]
fn test_whoami_without_session() {
    educonnect()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_send_without_session_fails() {
    educonnect()
        .arg("send")
        .arg("Explain photosynthesis")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_login_with_missing_image_fails_with_camera_error() {
    educonnect()
        .arg("login")
        .arg("--image")
        .arg("/nonexistent/face.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Camera unavailable"));
}

#[test]
fn test_invalid_config_timeout_zero() {
    let (_temp_dir, config_path) =
        common::temp_config_file("api:\n  base_url: http://localhost:8000\n  timeout_seconds: 0\n");

    educonnect()
        .arg("--config")
        .arg(config_path)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be greater than 0"));
}

#[test]
fn test_missing_config_file_is_reported_and_defaults_apply() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("absent.yaml");

    educonnect()
        .arg("--config")
        .arg(&missing)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"))
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_invalid_backend_env_var() {
    educonnect()
        .env("EDUCONNECT_SESSION_BACKEND", "floppy")
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("floppy"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_whoami_then_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::login_success_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let image = common::write_face_image(&dir);
    let session_path = dir.path().join("session.json");

    let run = |args: &[&str]| {
        let mut cmd = educonnect();
        cmd.env("EDUCONNECT_SESSION_BACKEND", "file")
            .env("EDUCONNECT_SESSION_PATH", &session_path)
            .arg("--api-base")
            .arg(server.uri())
            .args(args);
        cmd
    };

    run(&["login", "--image", image.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana (student)"));

    run(&["whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana (student) [id u1]"));

    run(&["logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    run(&["whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));

    server.verify().await;
}
