//! Capture Adapter: camera access and still-frame capture
//!
//! The adapter wraps a [`CameraDevice`] and hands out a single encoded still
//! image on demand. Camera access is scoped: [`CaptureAdapter::start`]
//! returns a [`CaptureStream`] guard, and the device is released when that
//! guard is dropped -- when the login view goes away, after a successful
//! capture, or on any error path that unwinds past it.
//!
//! Frames are always re-encoded as JPEG, so whatever the device produces,
//! the bytes handed to the login endpoint are JPEG-compatible.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use educonnect::capture::{CaptureAdapter, StillImageCamera};
//!
//! # fn example() -> educonnect::error::ClientResult<()> {
//! let adapter = CaptureAdapter::new(Arc::new(StillImageCamera::new("face.png")));
//! let stream = adapter.start()?;
//! let image = stream.capture_frame()?;
//! drop(stream); // camera released
//! assert!(!image.is_empty());
//! # Ok(())
//! # }
//! ```

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

use crate::error::{ClientResult, EduConnectError};

pub mod still;

pub use still::StillImageCamera;

/// File name attached to captured frames in multipart uploads
pub const CAPTURE_FILE_NAME: &str = "login.jpg";

/// MIME type of captured frames
pub const JPEG_MIME: &str = "image/jpeg";

// ---------------------------------------------------------------------------
// CameraDevice
// ---------------------------------------------------------------------------

/// Platform camera behind the adapter.
///
/// `open` corresponds to the media-capture permission prompt: it fails with
/// [`EduConnectError::CameraUnavailable`] when permission is denied or no
/// device exists. `close` must be idempotent.
#[cfg_attr(test, mockall::automock)]
pub trait CameraDevice: Send + Sync {
    /// Requests access to the camera and starts the stream.
    fn open(&self) -> ClientResult<()>;

    /// Returns the frame currently shown by the stream.
    fn current_frame(&self) -> ClientResult<DynamicImage>;

    /// Stops the stream and releases the device.
    fn close(&self);

    /// Human-readable device name for logs.
    fn name(&self) -> String;
}

// ---------------------------------------------------------------------------
// CapturedImage
// ---------------------------------------------------------------------------

/// An encoded still image, consumed by a single login attempt.
///
/// `CapturedImage` is deliberately not `Clone`: the login call takes it by
/// value, so retrying a login requires capturing a fresh frame.
#[derive(Debug, PartialEq, Eq)]
pub struct CapturedImage {
    bytes: Bytes,
}

impl CapturedImage {
    /// Encodes a frame as JPEG.
    ///
    /// # Errors
    ///
    /// Returns [`EduConnectError::InvalidImage`] if encoding fails or the
    /// frame has zero size.
    pub fn from_frame(frame: &DynamicImage) -> ClientResult<Self> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(EduConnectError::InvalidImage(
                "frame has zero dimensions".to_string(),
            ));
        }

        // The JPEG encoder has no alpha channel support.
        let rgb = DynamicImage::ImageRgb8(frame.to_rgb8());
        let mut buf = Cursor::new(Vec::new());
        rgb.write_to(&mut buf, ImageFormat::Jpeg)
            .map_err(|e| EduConnectError::InvalidImage(format!("JPEG encoding failed: {}", e)))?;

        Ok(Self {
            bytes: Bytes::from(buf.into_inner()),
        })
    }

    /// Wraps bytes that are already JPEG-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`EduConnectError::InvalidImage`] when the bytes are empty or
    /// do not start with the JPEG start-of-image marker.
    ///
    /// # Examples
    ///
    /// ```
    /// use educonnect::capture::CapturedImage;
    ///
    /// assert!(CapturedImage::from_jpeg_bytes(Vec::new()).is_err());
    /// assert!(CapturedImage::from_jpeg_bytes(b"GIF89a".to_vec()).is_err());
    /// ```
    pub fn from_jpeg_bytes(bytes: impl Into<Bytes>) -> ClientResult<Self> {
        let bytes = bytes.into();
        validate_jpeg(&bytes)?;
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the image, returning the encoded bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

fn validate_jpeg(bytes: &[u8]) -> ClientResult<()> {
    if bytes.is_empty() {
        return Err(EduConnectError::InvalidImage("image is empty".to_string()));
    }
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return Err(EduConnectError::InvalidImage(
            "image is not JPEG-encoded".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CaptureAdapter
// ---------------------------------------------------------------------------

/// Owns a camera device and tracks whether its stream is active.
pub struct CaptureAdapter {
    device: Arc<dyn CameraDevice>,
    active: AtomicBool,
}

impl CaptureAdapter {
    pub fn new(device: Arc<dyn CameraDevice>) -> Self {
        Self {
            device,
            active: AtomicBool::new(false),
        }
    }

    /// Requests camera access and starts the stream.
    ///
    /// The returned guard releases the camera when dropped. Only one guard
    /// exists at a time.
    ///
    /// # Errors
    ///
    /// Returns [`EduConnectError::CameraUnavailable`] if access is denied,
    /// no device exists, or a stream from this adapter is already active.
    /// Callers surface this without retrying; the user has to re-grant
    /// permission out of band.
    pub fn start(&self) -> ClientResult<CaptureStream<'_>> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Camera stream already active on {}", self.device.name());
            return Err(EduConnectError::CameraUnavailable(
                "camera stream is already in use".to_string(),
            ));
        }

        if let Err(e) = self.device.open() {
            self.active.store(false, Ordering::SeqCst);
            return Err(match e {
                EduConnectError::CameraUnavailable(_) => e,
                other => EduConnectError::CameraUnavailable(other.to_string()),
            });
        }
        tracing::info!("Camera stream started on {}", self.device.name());
        Ok(CaptureStream { adapter: self })
    }

    /// Returns `true` while a stream guard is alive.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Captures the current frame as a JPEG image.
    ///
    /// # Errors
    ///
    /// Returns [`EduConnectError::NotReady`] when no stream is active, or
    /// [`EduConnectError::InvalidImage`] if the frame cannot be encoded.
    pub fn capture_frame(&self) -> ClientResult<CapturedImage> {
        if !self.is_active() {
            return Err(EduConnectError::NotReady);
        }
        let frame = self.device.current_frame()?;
        let image = CapturedImage::from_frame(&frame)?;
        tracing::debug!(
            "Captured {}x{} frame ({} bytes JPEG)",
            frame.width(),
            frame.height(),
            image.len()
        );
        Ok(image)
    }

    fn release(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.device.close();
            tracing::info!("Camera stream released on {}", self.device.name());
        }
    }
}

/// Scoped camera acquisition; the stream stops when this guard drops.
pub struct CaptureStream<'a> {
    adapter: &'a CaptureAdapter,
}

impl CaptureStream<'_> {
    /// Captures the current frame; see [`CaptureAdapter::capture_frame`].
    pub fn capture_frame(&self) -> ClientResult<CapturedImage> {
        self.adapter.capture_frame()
    }

    /// Stops the stream explicitly.
    pub fn stop(self) {}
}

impl Drop for CaptureStream<'_> {
    fn drop(&mut self) {
        self.adapter.release();
    }
}
