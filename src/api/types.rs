//! Wire types for the EduConnect HTTP API
//!
//! Canonical schemas used by this client:
//!
//! | Endpoint | Request | Response |
//! |---|---|---|
//! | `POST /user/login` | multipart field `file` (`login.jpg`) | `{ token \| access_token, name?, user_id?, role? }` |
//! | `POST /user/chat` | `{ "user_input": string }` | `{ "ai_response": string }` |
//! | `GET /user/chat` | -- | `{ "messages": [ { "text", "sender"? } ] }` |
//! | `POST /user/upload` | multipart field `file` | `{ "status": string }` |
//! | `POST /user/logout` | empty | ignored |

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{ClientResult, EduConnectError};

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Body of a successful `POST /user/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    /// Display name of the recognized user
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub role: Option<String>,
}

impl LoginResponse {
    /// The bearer token, whichever of `token`/`access_token` carried it.
    ///
    /// # Examples
    ///
    /// ```
    /// use educonnect::api::LoginResponse;
    ///
    /// let body: LoginResponse =
    ///     serde_json::from_str(r#"{"access_token":"t1","name":"Ana"}"#).unwrap();
    /// assert_eq!(body.token(), Some("t1"));
    /// ```
    pub fn token(&self) -> Option<&str> {
        [self.token.as_deref(), self.access_token.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
    }

    /// The user id as a string; numeric ids are rendered in decimal.
    pub fn user_id(&self) -> Option<String> {
        match self.user_id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Body of `POST /user/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub user_input: &'a str,
}

/// Body of a successful `POST /user/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub ai_response: Option<String>,
}

/// Body of `GET /user/chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryItem>,
}

/// One stored message as returned by the history endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryItem {
    #[serde(default)]
    pub text: Option<String>,
    /// Who wrote the message; also accepted as `origin` or `role`
    #[serde(default, alias = "origin", alias = "role")]
    pub sender: Option<String>,
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Body of a successful `POST /user/upload`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: Option<String>,
}

/// A file to upload through `POST /user/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    mime: String,
    bytes: Bytes,
}

impl Attachment {
    /// Creates an attachment from in-memory bytes.
    pub fn new(
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`EduConnectError::UploadFailed`] when the file cannot be
    /// read or is empty.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            EduConnectError::UploadFailed(format!("cannot read {}: {}", path.display(), e))
        })?;
        if bytes.is_empty() {
            return Err(EduConnectError::UploadFailed(format!(
                "{} is empty",
                path.display()
            )));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "attachment".to_string());
        let mime = guess_mime(&file_name);
        Ok(Self::new(file_name, mime, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

/// Infers a MIME type from the file extension; unknown extensions are sent
/// as `application/octet-stream`.
pub fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string()
}
