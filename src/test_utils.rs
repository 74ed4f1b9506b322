//! Test utilities for EduConnect
//!
//! Temporary directories and files, sample sessions and images, and an
//! address that refuses connections.

use crate::capture::CapturedImage;
use crate::error::EduConnectError;
use crate::session::{Role, Session};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Session for user `u1` ("Ana", student) with the given token
pub fn sample_session(token: &str) -> Session {
    Session::new(token, "u1", "Ana", Role::Student).expect("valid sample session")
}

fn sample_frame() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(16, 12, |x, y| {
        Rgb([(x * 15) as u8, (y * 20) as u8, 128])
    }))
}

/// A small JPEG-encoded frame
pub fn captured_image() -> CapturedImage {
    CapturedImage::from_frame(&sample_frame()).expect("encode sample frame")
}

/// Writes a small PNG into `dir` and returns its path
pub fn write_test_png(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    sample_frame().save(&path).expect("Failed to write test image");
    path
}

/// Base URL of a local port that was bound and released, so connections
/// to it are refused
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener
        .local_addr()
        .expect("ephemeral port address")
        .port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T, EduConnectError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}', got Ok", expected),
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(expected),
                "Expected error containing '{}', got '{}'",
                expected,
                msg
            );
        }
    }
}
