//! Auth Flow: turns a captured face image into a session
//!
//! [`AuthFlow::login`] sends one multipart request to `POST /user/login`. On
//! success the session is built from that single response and written to
//! the [`SessionStore`]; on failure nothing is written and the conversation
//! is never touched.
//!
//! Failures are split by what the user should do next:
//!
//! - [`EduConnectError::LoginRejected`] -- the service answered and refused
//!   the face (bad request, unauthorized, forbidden, unknown user,
//!   unprocessable image). Capture again and retry.
//! - [`EduConnectError::LoginUnreachable`] -- network failure, timeout,
//!   server error, or a response without a token. Retrying may help.
//!
//! The captured image is taken by value and dropped once the request
//! completes, so every attempt needs a fresh capture.

use std::sync::Arc;

use crate::api::{is_rejection_status, ApiClient, ApiError, LoginResponse};
use crate::capture::{CaptureAdapter, CapturedImage};
use crate::error::{ClientResult, EduConnectError};
use crate::session::{redact_token, Role, Session, SessionStore};

/// Display name used when the login response carries none
pub const DEFAULT_USER_LABEL: &str = "You";

/// Face-login flow bound to one API client and session store.
#[derive(Debug, Clone)]
pub struct AuthFlow {
    api: ApiClient,
    store: Arc<SessionStore>,
    user_label_fallback: String,
}

impl AuthFlow {
    pub fn new(api: ApiClient, store: Arc<SessionStore>) -> Self {
        Self {
            api,
            store,
            user_label_fallback: DEFAULT_USER_LABEL.to_string(),
        }
    }

    /// Sets the display name used when the login response has no `name`.
    pub fn with_user_label_fallback(mut self, label: impl Into<String>) -> Self {
        self.user_label_fallback = label.into();
        self
    }

    /// Logs in with a captured image.
    ///
    /// # Arguments
    ///
    /// * `image` - JPEG-encoded still frame; consumed by this attempt
    ///
    /// # Returns
    ///
    /// The new [`Session`], already stored in the session store.
    ///
    /// # Errors
    ///
    /// - [`EduConnectError::LoginRejected`] if the service refused the face
    /// - [`EduConnectError::LoginUnreachable`] for network or server failures
    pub async fn login(&self, image: CapturedImage) -> ClientResult<Session> {
        tracing::info!("Sending face login ({} bytes)", image.len());

        let response = self.api.login(image).await.map_err(map_login_error)?;
        let session = self.session_from_response(response)?;

        if let Err(e) = self.store.set(session.clone()) {
            tracing::warn!("Login succeeded but the session was not persisted: {}", e);
        }

        tracing::info!(
            "Logged in as '{}' ({}) with token {}",
            session.display_name(),
            session.role(),
            redact_token(session.token())
        );
        Ok(session)
    }

    /// Runs the full capture pipeline: start the camera, grab one frame,
    /// release the camera, then log in with that frame.
    ///
    /// The camera is released before the network request starts and on
    /// every error path.
    ///
    /// # Errors
    ///
    /// Camera errors ([`EduConnectError::CameraUnavailable`],
    /// [`EduConnectError::NotReady`], [`EduConnectError::InvalidImage`]) or
    /// any error from [`login`](Self::login).
    pub async fn capture_and_login(&self, adapter: &CaptureAdapter) -> ClientResult<Session> {
        let image = {
            let stream = adapter.start()?;
            stream.capture_frame()?
        };
        self.login(image).await
    }

    fn session_from_response(&self, response: LoginResponse) -> ClientResult<Session> {
        let token = response.token().ok_or_else(|| {
            tracing::error!("Login response carried no token");
            EduConnectError::LoginUnreachable("login response carried no token".to_string())
        })?;

        let display_name = response
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.user_label_fallback)
            .to_string();
        let user_id = response.user_id().unwrap_or_default();
        let role = response
            .role
            .as_deref()
            .map(Role::parse)
            .unwrap_or_default();

        Session::new(token, user_id, display_name, role)
            .map_err(|e| EduConnectError::LoginUnreachable(e.to_string()))
    }
}

fn map_login_error(error: ApiError) -> EduConnectError {
    match error {
        ApiError::Status { status, ref body } if is_rejection_status(status) => {
            let reason = if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body)
            };
            EduConnectError::LoginRejected(reason)
        }
        other => EduConnectError::LoginUnreachable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_login_error_rejection() {
        let err = map_login_error(ApiError::Status {
            status: 401,
            body: "face not recognized".to_string(),
        });
        match err {
            EduConnectError::LoginRejected(reason) => {
                assert!(reason.contains("face not recognized"))
            }
            other => panic!("Expected LoginRejected, got {:?}", other),
        }
    }

    #[test]
    fn test_map_login_error_server_failure() {
        let err = map_login_error(ApiError::Status {
            status: 503,
            body: String::new(),
        });
        assert!(matches!(err, EduConnectError::LoginUnreachable(_)));
        let err = map_login_error(ApiError::Transport("connection refused".to_string()));
        assert!(matches!(err, EduConnectError::LoginUnreachable(_)));
    }

    #[test]
    fn test_session_from_response_fills_defaults() {
        let flow = AuthFlow::new(
            ApiClient::with_base_url("http://localhost").unwrap(),
            Arc::new(SessionStore::in_memory()),
        )
        .with_user_label_fallback("Learner");
        let response: LoginResponse = serde_json::from_str(r#"{"token":"t9"}"#).unwrap();
        let session = flow.session_from_response(response).unwrap();
        assert_eq!(session.token(), "t9");
        assert_eq!(session.display_name(), "Learner");
        assert_eq!(session.user_id(), "");
        assert_eq!(session.role(), Role::Unknown);
    }

    #[test]
    fn test_session_from_response_without_token_fails() {
        let flow = AuthFlow::new(
            ApiClient::with_base_url("http://localhost").unwrap(),
            Arc::new(SessionStore::in_memory()),
        );
        let response: LoginResponse = serde_json::from_str(r#"{"name":"Ana"}"#).unwrap();
        assert!(matches!(
            flow.session_from_response(response),
            Err(EduConnectError::LoginUnreachable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_login_leaves_store_untouched() {
        let store = Arc::new(SessionStore::in_memory());
        let flow = AuthFlow::new(
            ApiClient::with_base_url(&crate::test_utils::unreachable_base_url()).unwrap(),
            Arc::clone(&store),
        );
        let result = flow.login(crate::test_utils::captured_image()).await;
        assert!(matches!(result, Err(EduConnectError::LoginUnreachable(_))));
        assert!(store.get().is_none());
    }
}
