//! Error types for EduConnect
//!
//! This module defines the error taxonomy of the session and conversation
//! lifecycle, using `thiserror` for ergonomic error handling.
//!
//! Lifecycle operations (capture, login, send, history, upload) return the
//! typed [`ClientResult`] so callers can match on the failure kind and pick
//! the right message and retry affordance. Application glue (configuration
//! loading, CLI commands) uses the `anyhow`-backed [`Result`] alias.

use thiserror::Error;

/// Main error type for EduConnect operations
#[derive(Error, Debug)]
pub enum EduConnectError {
    /// Camera permission was denied or no capture device exists
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// A frame was requested before a capture stream was active
    #[error("Camera stream is not ready")]
    NotReady,

    /// A captured or uploaded image is empty or not JPEG-compatible
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The login endpoint refused the captured face (terminal for the attempt)
    #[error("Login rejected: {0}")]
    LoginRejected(String),

    /// The login endpoint could not be reached or failed server-side
    #[error("Login service unreachable: {0}")]
    LoginUnreachable(String),

    /// A bearer-authenticated operation was attempted without a session
    #[error("Not logged in")]
    NotAuthenticated,

    /// A chat send was attempted while another one is still in flight
    #[error("A message is already being sent")]
    SendInProgress,

    /// The chat request failed (network, expired token, server error)
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    /// The chat history could not be fetched
    #[error("Failed to fetch chat history: {0}")]
    HistoryFetchFailed(String),

    /// The attachment upload failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The best-effort logout notification failed (logged, never surfaced)
    #[error("Logout notification failed: {0}")]
    LogoutNotifyFailed(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted session storage errors
    #[error("Session storage error: {0}")]
    SessionStorage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl EduConnectError {
    /// Returns `true` for failures a user may simply retry by re-clicking.
    ///
    /// No operation in this crate retries automatically; this only drives
    /// how the failure is presented.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LoginUnreachable(_)
                | Self::SendFailed(_)
                | Self::HistoryFetchFailed(_)
                | Self::UploadFailed(_)
        )
    }

    /// Returns `true` for camera and login failures, which end the current
    /// login attempt and require a fresh capture.
    pub fn is_terminal_for_attempt(&self) -> bool {
        matches!(
            self,
            Self::CameraUnavailable(_)
                | Self::NotReady
                | Self::InvalidImage(_)
                | Self::LoginRejected(_)
                | Self::LoginUnreachable(_)
        )
    }
}

/// Result type alias for application-level glue
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Result type alias for lifecycle operations with a typed error
pub type ClientResult<T> = std::result::Result<T, EduConnectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_unavailable_display() {
        let error = EduConnectError::CameraUnavailable("permission denied".to_string());
        assert_eq!(error.to_string(), "Camera unavailable: permission denied");
    }

    #[test]
    fn test_login_rejected_display() {
        let error = EduConnectError::LoginRejected("face not recognized".to_string());
        assert_eq!(error.to_string(), "Login rejected: face not recognized");
    }

    #[test]
    fn test_send_in_progress_display() {
        let error = EduConnectError::SendInProgress;
        assert_eq!(error.to_string(), "A message is already being sent");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(EduConnectError::LoginUnreachable("timeout".into()).is_retryable());
        assert!(EduConnectError::SendFailed("HTTP 500".into()).is_retryable());
        assert!(EduConnectError::UploadFailed("HTTP 413".into()).is_retryable());
        assert!(!EduConnectError::LoginRejected("HTTP 401".into()).is_retryable());
        assert!(!EduConnectError::SendInProgress.is_retryable());
        assert!(!EduConnectError::CameraUnavailable("denied".into()).is_retryable());
    }

    #[test]
    fn test_terminal_for_attempt_classification() {
        assert!(EduConnectError::CameraUnavailable("denied".into()).is_terminal_for_attempt());
        assert!(EduConnectError::LoginRejected("HTTP 401".into()).is_terminal_for_attempt());
        assert!(EduConnectError::NotReady.is_terminal_for_attempt());
        assert!(!EduConnectError::SendFailed("offline".into()).is_terminal_for_attempt());
        assert!(!EduConnectError::HistoryFetchFailed("x".into()).is_terminal_for_attempt());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: EduConnectError = io_error.into();
        assert!(matches!(error, EduConnectError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: EduConnectError = json_error.into();
        assert!(matches!(error, EduConnectError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: EduConnectError = yaml_error.into();
        assert!(matches!(error, EduConnectError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EduConnectError>();
    }
}
