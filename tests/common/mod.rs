use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use educonnect::api::ApiClient;
use educonnect::capture::CapturedImage;
use educonnect::config::ChatConfig;
use educonnect::session::{Role, Session, SessionStore};
use educonnect::EduConnect;
use image::{DynamicImage, Rgb, RgbImage};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// A small camera frame with a gradient so the JPEG is not trivially empty
#[allow(dead_code)]
pub fn sample_frame() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(32, 24, |x, y| {
        Rgb([(x * 8) as u8, (y * 10) as u8, 90])
    }))
}

#[allow(dead_code)]
pub fn captured_image() -> CapturedImage {
    CapturedImage::from_frame(&sample_frame()).expect("failed to encode sample frame")
}

/// Writes the sample frame as a PNG file acting as a still-image camera feed
#[allow(dead_code)]
pub fn write_face_image(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("face.png");
    sample_frame()
        .save(&path)
        .expect("failed to write face image");
    path
}

/// Client against `base_url` with an in-memory session store and no session
#[allow(dead_code)]
pub fn memory_client(base_url: &str) -> EduConnect {
    let api = ApiClient::with_base_url(base_url).expect("valid base url");
    EduConnect::new(
        api,
        Arc::new(SessionStore::in_memory()),
        &ChatConfig::default(),
    )
}

/// Client against `base_url` already logged in as Ana (student) with `token`
#[allow(dead_code)]
pub fn logged_in_client(base_url: &str, token: &str) -> EduConnect {
    let client = memory_client(base_url);
    let session =
        Session::new(token, "u1", "Ana", Role::Student).expect("failed to build session");
    client
        .session_store()
        .set(session)
        .expect("failed to store session");
    client
}

/// Login response body as the service returns it on success
#[allow(dead_code)]
pub fn login_success_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "t1",
        "name": "Ana",
        "user_id": "u1",
        "role": "student"
    })
}
