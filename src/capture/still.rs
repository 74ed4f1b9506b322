//! Still-image camera
//!
//! Treats an image file on disk as the live camera feed. Opening the device
//! decodes the file (any format supported by `image`); each captured frame
//! is the decoded picture. This is the device the command-line client uses,
//! and it doubles as a deterministic camera for tests.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use image::DynamicImage;

use super::CameraDevice;
use crate::error::{ClientResult, EduConnectError};

/// Camera whose stream is a single image file.
#[derive(Debug)]
pub struct StillImageCamera {
    path: PathBuf,
    frame: Mutex<Option<DynamicImage>>,
}

impl StillImageCamera {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            frame: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CameraDevice for StillImageCamera {
    fn open(&self) -> ClientResult<()> {
        if !self.path.is_file() {
            return Err(EduConnectError::CameraUnavailable(format!(
                "no image source at {}",
                self.path.display()
            )));
        }
        let decoded = image::open(&self.path).map_err(|e| {
            EduConnectError::CameraUnavailable(format!(
                "cannot read image source {}: {}",
                self.path.display(),
                e
            ))
        })?;
        *self.frame.lock().unwrap_or_else(PoisonError::into_inner) = Some(decoded);
        Ok(())
    }

    fn current_frame(&self) -> ClientResult<DynamicImage> {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(EduConnectError::NotReady)
    }

    fn close(&self) {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn name(&self) -> String {
        format!("still:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureAdapter;
    use crate::test_utils::{temp_dir, write_test_png};
    use std::sync::Arc;

    #[test]
    fn test_missing_file_is_camera_unavailable() {
        let camera = StillImageCamera::new("/definitely/not/here.png");
        assert!(matches!(
            camera.open(),
            Err(EduConnectError::CameraUnavailable(_))
        ));
    }

    #[test]
    fn test_undecodable_file_is_camera_unavailable() {
        let dir = temp_dir();
        let path = dir.path().join("face.png");
        std::fs::write(&path, b"not an image").unwrap();
        let camera = StillImageCamera::new(path);
        assert!(matches!(
            camera.open(),
            Err(EduConnectError::CameraUnavailable(_))
        ));
    }

    #[test]
    fn test_frame_before_open_is_not_ready() {
        let camera = StillImageCamera::new("face.png");
        assert!(matches!(
            camera.current_frame(),
            Err(EduConnectError::NotReady)
        ));
    }

    #[test]
    fn test_png_source_captures_as_jpeg() {
        let dir = temp_dir();
        let path = write_test_png(&dir, "face.png");
        let adapter = CaptureAdapter::new(Arc::new(StillImageCamera::new(path)));

        let stream = adapter.start().unwrap();
        let image = stream.capture_frame().unwrap();
        stream.stop();

        assert!(image.into_bytes().starts_with(&[0xFF, 0xD8]));
        assert!(!adapter.is_active());
    }

    #[test]
    fn test_close_drops_frame() {
        let dir = temp_dir();
        let camera = StillImageCamera::new(write_test_png(&dir, "face.png"));
        camera.open().unwrap();
        assert!(camera.current_frame().is_ok());
        camera.close();
        assert!(camera.current_frame().is_err());
    }
}
