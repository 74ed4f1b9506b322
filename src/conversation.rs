//! Conversation Controller: message log, sends, history and uploads
//!
//! The controller owns the ordered message log (oldest first) and runs each
//! chat send through a small state machine:
//!
//! ```text
//! Idle --send_message--> Sending --reply--> Settled --> Idle
//!                                \--error--> Failed  --> Idle
//! ```
//!
//! - The user's message is appended *before* the request goes out
//!   (optimistic update) and is never rolled back.
//! - At most one send is in flight. A second `send_message` while `pending`
//!   is rejected with [`EduConnectError::SendInProgress`] and does not touch
//!   the log.
//! - `pending` is reset on every exit path, including when the caller drops
//!   the send future.
//!
//! History loads and attachment uploads are independent of the send guard
//! and may overlap with a send.
//!
//! Every request reads the token from the [`SessionStore`] at dispatch and
//! remembers the store generation. A response that arrives after a logout,
//! a new login, or [`ConversationController::reset`] is discarded instead of
//! being applied to the log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError, Attachment, HistoryItem};
use crate::error::{ClientResult, EduConnectError};
use crate::session::{Session, SessionStore};

/// Label used for assistant messages when none is configured
pub const DEFAULT_ASSISTANT_LABEL: &str = "EduConnect";

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

impl Origin {
    /// Maps a history `sender` value onto an origin; anything that is not
    /// recognizably the assistant counts as the user.
    fn from_sender(sender: Option<&str>) -> Self {
        match sender.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("assistant" | "ai" | "bot" | "model" | "tutor") => Self::Assistant,
            _ => Self::User,
        }
    }
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub origin: Origin,
    /// Name shown next to the message
    pub display_label: String,
}

impl Message {
    pub fn user(text: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::User,
            display_label: display_label.into(),
        }
    }

    pub fn assistant(text: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Assistant,
            display_label: display_label.into(),
        }
    }
}

/// Snapshot of the conversation for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    /// `true` exactly while one send is in flight
    pub pending: bool,
}

// ---------------------------------------------------------------------------
// ConversationController
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<Message>,
    pending: bool,
    last_error: Option<String>,
    /// Bumped by `reset`; responses dispatched under an older epoch are stale
    epoch: u64,
    /// Number of messages ever appended by sends and uploads
    appended: u64,
    /// Optimistic message of the send in flight, with its append sequence
    in_flight: Option<(u64, Message)>,
}

impl Inner {
    fn append(&mut self, message: Message) -> u64 {
        let seq = self.appended;
        self.appended += 1;
        self.messages.push(message);
        seq
    }
}

/// Request context captured at dispatch time.
struct Dispatch {
    session: Session,
    generation: u64,
    epoch: u64,
}

/// Owner of the message log for one logged-in session.
#[derive(Debug)]
pub struct ConversationController {
    api: ApiClient,
    store: Arc<SessionStore>,
    assistant_label: String,
    inner: Mutex<Inner>,
}

impl ConversationController {
    pub fn new(api: ApiClient, store: Arc<SessionStore>) -> Self {
        Self {
            api,
            store,
            assistant_label: DEFAULT_ASSISTANT_LABEL.to_string(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Sets the label shown on assistant messages.
    pub fn with_assistant_label(mut self, label: impl Into<String>) -> Self {
        self.assistant_label = label.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the session at call time together with the generation and
    /// conversation epoch the eventual response must still match.
    fn dispatch(&self, inner: &Inner) -> ClientResult<Dispatch> {
        match self.store.snapshot() {
            (Some(session), generation) => Ok(Dispatch {
                session,
                generation,
                epoch: inner.epoch,
            }),
            (None, _) => Err(EduConnectError::NotAuthenticated),
        }
    }

    fn is_stale(&self, inner: &Inner, dispatch: &Dispatch) -> bool {
        inner.epoch != dispatch.epoch || !self.store.is_current(dispatch.generation)
    }

    /// Sends a chat message.
    ///
    /// Blank or whitespace-only text is a no-op and returns `Ok(None)`
    /// without touching the log or `pending`.
    ///
    /// # Returns
    ///
    /// The assistant's reply, which has also been appended to the log.
    ///
    /// # Errors
    ///
    /// - [`EduConnectError::SendInProgress`] if another send is in flight
    /// - [`EduConnectError::NotAuthenticated`] if there is no session
    /// - [`EduConnectError::SendFailed`] if the request failed, the reply was
    ///   malformed, or the session changed before the reply arrived; the
    ///   optimistic user message stays in the log
    pub async fn send_message(&self, text: &str) -> ClientResult<Option<Message>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let (dispatch, _pending) = {
            let mut inner = self.lock();
            if inner.pending {
                tracing::debug!("Rejecting send while another is in flight");
                return Err(EduConnectError::SendInProgress);
            }
            let dispatch = self.dispatch(&inner)?;
            let message = Message::user(text, dispatch.session.display_name().to_string());
            let seq = inner.append(message.clone());
            inner.in_flight = Some((seq, message));
            inner.pending = true;
            inner.last_error = None;
            let guard = PendingGuard {
                controller: self,
                epoch: dispatch.epoch,
            };
            (dispatch, guard)
        };

        tracing::debug!("Sending chat message ({} chars)", text.chars().count());
        let result = self.api.send_chat(dispatch.session.token(), text).await;

        let mut inner = self.lock();
        if inner.epoch == dispatch.epoch {
            inner.in_flight = None;
        }
        if self.is_stale(&inner, &dispatch) {
            tracing::info!("Discarding chat reply for a session that has ended");
            return Err(EduConnectError::SendFailed(
                "session changed before the reply arrived".to_string(),
            ));
        }

        let outcome = match result {
            Ok(reply) => match reply.ai_response {
                Some(answer) => {
                    let message = Message::assistant(answer, self.assistant_label.clone());
                    inner.append(message.clone());
                    tracing::debug!(
                        "Chat reply appended; log has {} messages",
                        inner.messages.len()
                    );
                    Ok(Some(message))
                }
                None => Err(EduConnectError::SendFailed(
                    "reply carried no ai_response".to_string(),
                )),
            },
            Err(e) => Err(map_send_error(e)),
        };

        if let Err(e) = &outcome {
            tracing::warn!("{}", e);
            inner.last_error = Some(e.to_string());
        }
        outcome
    }

    /// Fetches the stored history for the session and replaces the log.
    ///
    /// Messages appended after the load was dispatched (for example an
    /// optimistic send that overlapped it) are kept after the history. The
    /// message of a send that was already in flight at dispatch and is still
    /// waiting for its reply is kept too, so the reply lands right after it.
    ///
    /// # Returns
    ///
    /// The number of history messages loaded.
    ///
    /// # Errors
    ///
    /// [`EduConnectError::NotAuthenticated`] without a session, or
    /// [`EduConnectError::HistoryFetchFailed`]; the log is left unchanged.
    pub async fn load_history(&self) -> ClientResult<usize> {
        let (dispatch, appended_at_dispatch) = {
            let inner = self.lock();
            (self.dispatch(&inner)?, inner.appended)
        };

        let result = self.api.fetch_history(dispatch.session.token()).await;

        let mut inner = self.lock();
        if self.is_stale(&inner, &dispatch) {
            tracing::info!("Discarding chat history for a session that has ended");
            return Err(EduConnectError::HistoryFetchFailed(
                "session changed before history arrived".to_string(),
            ));
        }

        match result {
            Ok(history) => {
                let loaded: Vec<Message> = history
                    .messages
                    .into_iter()
                    .filter_map(|item| self.history_message(item, &dispatch.session))
                    .collect();
                let count = loaded.len();
                let appended_since =
                    usize::try_from(inner.appended - appended_at_dispatch).unwrap_or(usize::MAX);
                let split_at = inner.messages.len().saturating_sub(appended_since);
                let newer = inner.messages.split_off(split_at);
                let unsettled = inner
                    .in_flight
                    .as_ref()
                    .filter(|(seq, _)| *seq < appended_at_dispatch)
                    .map(|(_, message)| message.clone());

                inner.messages = loaded;
                inner.messages.extend(unsettled);
                inner.messages.extend(newer);
                tracing::info!("Loaded {} history messages", count);
                Ok(count)
            }
            Err(e) => {
                let error = EduConnectError::HistoryFetchFailed(e.to_string());
                tracing::warn!("{}", error);
                inner.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    fn history_message(&self, item: HistoryItem, session: &Session) -> Option<Message> {
        let text = item.text.filter(|t| !t.trim().is_empty())?;
        Some(match Origin::from_sender(item.sender.as_deref()) {
            Origin::User => Message::user(text, session.display_name().to_string()),
            Origin::Assistant => Message::assistant(text, self.assistant_label.clone()),
        })
    }

    /// Uploads an attachment and, on success, appends a user message
    /// describing it.
    ///
    /// Independent of the send guard: uploads may run while a send is
    /// pending and never change `pending`.
    ///
    /// # Errors
    ///
    /// [`EduConnectError::NotAuthenticated`] without a session, or
    /// [`EduConnectError::UploadFailed`]; nothing is appended on failure.
    pub async fn upload_attachment(&self, attachment: Attachment) -> ClientResult<Message> {
        let dispatch = {
            let inner = self.lock();
            self.dispatch(&inner)?
        };

        tracing::info!(
            "Uploading {} ({} bytes, {})",
            attachment.file_name(),
            attachment.len(),
            attachment.mime()
        );
        let result = self
            .api
            .upload(dispatch.session.token(), &attachment)
            .await;

        let mut inner = self.lock();
        if self.is_stale(&inner, &dispatch) {
            tracing::info!("Discarding upload result for a session that has ended");
            return Err(EduConnectError::UploadFailed(
                "session changed before the upload completed".to_string(),
            ));
        }

        match result {
            Ok(response) => {
                let text = match response.status.as_deref().map(str::trim) {
                    Some(status) if !status.is_empty() => {
                        format!("Uploaded {} ({})", attachment.file_name(), status)
                    }
                    _ => format!("Uploaded {}", attachment.file_name()),
                };
                let message = Message::user(text, dispatch.session.display_name().to_string());
                inner.append(message.clone());
                Ok(message)
            }
            Err(e) => {
                let error = EduConnectError::UploadFailed(e.to_string());
                tracing::warn!("{}", error);
                inner.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Copy of the message log, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Snapshot of the log and the pending flag.
    pub fn state(&self) -> ConversationState {
        let inner = self.lock();
        ConversationState {
            messages: inner.messages.clone(),
            pending: inner.pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Most recent non-fatal error, for display.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Ends the conversation: empties the log, clears `pending`, and marks
    /// every in-flight request as stale.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.messages.clear();
        inner.pending = false;
        inner.in_flight = None;
        inner.last_error = None;
        inner.epoch += 1;
        tracing::debug!("Conversation reset");
    }
}

/// Clears `pending` when a send finishes, fails, or is dropped mid-flight.
struct PendingGuard<'a> {
    controller: &'a ConversationController,
    epoch: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.controller.lock();
        // After a reset, `pending` may belong to a newer send.
        if inner.epoch == self.epoch {
            inner.pending = false;
            inner.in_flight = None;
        }
    }
}

fn map_send_error(error: ApiError) -> EduConnectError {
    match error.status() {
        Some(status @ (401 | 403)) => EduConnectError::SendFailed(format!(
            "session expired or unauthorized (HTTP {})",
            status
        )),
        _ => EduConnectError::SendFailed(error.to_string()),
    }
}
