//! HTTP client for the remote EduConnect API
//!
//! [`ApiClient`] issues exactly one request per call and reports failures as
//! an [`ApiError`] that keeps transport problems, non-success statuses and
//! malformed bodies apart. The lifecycle flows map those onto the user-facing
//! taxonomy in [`crate::error::EduConnectError`].
//!
//! The client never stores a token: authenticated calls take the token as an
//! argument, read from the session store by the caller at call time.

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::capture::{CapturedImage, CAPTURE_FILE_NAME, JPEG_MIME};
use crate::config::ApiConfig;
use crate::error::{ClientResult, EduConnectError};

pub mod types;

pub use types::{
    guess_mime, Attachment, ChatRequest, ChatResponse, HistoryItem, HistoryResponse,
    LoginResponse, UploadResponse,
};

const LOGIN_PATH: &str = "user/login";
const CHAT_PATH: &str = "user/chat";
const UPLOAD_PATH: &str = "user/upload";
const LOGOUT_PATH: &str = "user/logout";

/// Longest error body kept in an [`ApiError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// Failure of a single API request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout)
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// Numeric HTTP status
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// The server answered 2xx with a body that does not match the schema
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Thin wrapper over `reqwest` bound to one EduConnect base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EduConnectError::Config`] for an unparseable base URL and
    /// [`EduConnectError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("educonnect/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url)?,
        })
    }

    /// Creates a client for `base_url` with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use educonnect::api::ApiClient;
    ///
    /// let client = ApiClient::with_base_url("http://localhost:8000/api").unwrap();
    /// assert_eq!(
    ///     client.endpoint("user/chat").as_str(),
    ///     "http://localhost:8000/api/user/chat"
    /// );
    /// ```
    pub fn with_base_url(base_url: &str) -> ClientResult<Self> {
        Self::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    /// Base URL all endpoints are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Url {
        // `join` only fails on malformed relative references; the paths used
        // here are constants.
        self.base_url
            .join(path.trim_start_matches('/'))
            .unwrap_or_else(|_| self.base_url.clone())
    }

    /// `POST /user/login` with the captured frame as multipart field `file`.
    ///
    /// The image is consumed; it is dropped as soon as the request body has
    /// been built, whatever the outcome.
    pub async fn login(&self, image: CapturedImage) -> Result<LoginResponse, ApiError> {
        let part = Part::bytes(image.into_bytes().to_vec())
            .file_name(CAPTURE_FILE_NAME)
            .mime_str(JPEG_MIME)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let form = Form::new().part("file", part);

        let request = self.http.post(self.endpoint(LOGIN_PATH)).multipart(form);
        let response = execute(request, "login").await?;
        decode(response).await
    }

    /// `POST /user/chat` with `{ "user_input": text }`.
    pub async fn send_chat(&self, token: &str, text: &str) -> Result<ChatResponse, ApiError> {
        let request = self
            .http
            .post(self.endpoint(CHAT_PATH))
            .bearer_auth(token)
            .json(&ChatRequest { user_input: text });
        let response = execute(request, "chat").await?;
        decode(response).await
    }

    /// `GET /user/chat`.
    pub async fn fetch_history(&self, token: &str) -> Result<HistoryResponse, ApiError> {
        let request = self.http.get(self.endpoint(CHAT_PATH)).bearer_auth(token);
        let response = execute(request, "history").await?;
        decode(response).await
    }

    /// `POST /user/upload` with the attachment as multipart field `file`.
    pub async fn upload(
        &self,
        token: &str,
        attachment: &Attachment,
    ) -> Result<UploadResponse, ApiError> {
        let part = Part::bytes(attachment.bytes().to_vec())
            .file_name(attachment.file_name().to_string())
            .mime_str(attachment.mime())
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let form = Form::new().part("file", part);

        let request = self
            .http
            .post(self.endpoint(UPLOAD_PATH))
            .bearer_auth(token)
            .multipart(form);
        let response = execute(request, "upload").await?;
        decode(response).await
    }

    /// `POST /user/logout` with an empty body. The response body is ignored.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.endpoint(LOGOUT_PATH))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LENGTH, 0);
        execute(request, "logout").await?;
        Ok(())
    }
}

/// Ensures the base URL parses and ends with `/` so `join` appends rather
/// than replacing the last path segment.
fn normalize_base_url(raw: &str) -> ClientResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| EduConnectError::Config(format!("Invalid API base URL {}: {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn execute(request: RequestBuilder, operation: &str) -> Result<Response, ApiError> {
    let response = request.send().await.map_err(|e| {
        tracing::error!("{} request failed: {}", operation, e);
        if e.is_timeout() {
            ApiError::Transport("request timed out".to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    })?;

    let status = response.status();
    tracing::debug!("{} request returned {}", operation, status);
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("{} returned error {}: {}", operation, status, body);
    Err(ApiError::Status {
        status: status.as_u16(),
        body: truncate(&body, MAX_ERROR_BODY),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Returns `true` for statuses that mean "the server understood the request
/// and refused these credentials".
pub(crate) fn is_rejection_status(status: u16) -> bool {
    matches!(
        StatusCode::from_u16(status),
        Ok(StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
            | StatusCode::UNPROCESSABLE_ENTITY)
    )
}
