//! Session persistence integration tests
//!
//! A login survives a restart of the client within the same profile, and a
//! logout removes the persisted record.

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use educonnect::api::ApiClient;
use educonnect::config::{ChatConfig, Config, SessionBackendKind};
use educonnect::session::{FileBackend, SessionStore};
use educonnect::EduConnect;

mod common;

fn file_config(base_url: &str, session_path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.session.backend = SessionBackendKind::File;
    config.session.path = Some(session_path.to_path_buf());
    config
}

#[tokio::test]
async fn test_login_survives_client_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::login_success_body()))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let session_path = dir.path().join("session.json");
    let config = file_config(&server.uri(), &session_path);

    {
        let client = EduConnect::from_config(&config).unwrap();
        client.login(common::captured_image()).await.unwrap();
    }
    assert!(session_path.exists());

    let restarted = EduConnect::from_config(&config).unwrap();
    let session = restarted.session().expect("session must be rehydrated");
    assert_eq!(session.token(), "t1");
    assert_eq!(session.display_name(), "Ana");
}

#[tokio::test]
async fn test_logout_removes_persisted_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let session_path = dir.path().join("session.json");
    let store = Arc::new(SessionStore::open(Box::new(FileBackend::new(&session_path))));
    store
        .set(
            educonnect::Session::new("t1", "u1", "Ana", educonnect::Role::Student).unwrap(),
        )
        .unwrap();

    let api = ApiClient::with_base_url(&server.uri()).unwrap();
    let client = EduConnect::new(api, store, &ChatConfig::default());
    if let Some(notification) = client.logout() {
        notification.await.unwrap();
    }

    assert!(!session_path.exists());
    let restarted = EduConnect::from_config(&file_config(&server.uri(), &session_path)).unwrap();
    assert!(!restarted.is_authenticated());
}

#[test]
fn test_corrupt_session_file_starts_logged_out() {
    let dir = tempfile::TempDir::new().unwrap();
    let session_path = dir.path().join("session.json");
    std::fs::write(&session_path, "{ not json").unwrap();

    let client =
        EduConnect::from_config(&file_config("http://localhost:8000", &session_path)).unwrap();
    assert!(!client.is_authenticated());
}

#[test]
fn test_profiles_are_isolated() {
    let dir = tempfile::TempDir::new().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    let client = EduConnect::from_config(&file_config("http://localhost:8000", &first)).unwrap();
    client
        .session_store()
        .set(educonnect::Session::new("t1", "u1", "Ana", educonnect::Role::Student).unwrap())
        .unwrap();

    let other = EduConnect::from_config(&file_config("http://localhost:8000", &second)).unwrap();
    assert!(!other.is_authenticated());
}
