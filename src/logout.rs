//! Logout Flow: local teardown plus best-effort remote notification
//!
//! Local state is authoritative. [`LogoutFlow::logout`] always clears the
//! [`SessionStore`] (and ends the conversation, if one is attached) before
//! anything touches the network. The remote service is then told about the
//! logout from a detached task whose outcome is only logged: a network
//! error or an already-expired token never reaches the user and never
//! blocks the local clear.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::conversation::ConversationController;
use crate::error::EduConnectError;
use crate::session::{redact_token, SessionStore};

/// Tears down the current session.
#[derive(Debug, Clone)]
pub struct LogoutFlow {
    api: ApiClient,
    store: Arc<SessionStore>,
    conversation: Option<Arc<ConversationController>>,
}

impl LogoutFlow {
    pub fn new(api: ApiClient, store: Arc<SessionStore>) -> Self {
        Self {
            api,
            store,
            conversation: None,
        }
    }

    /// Attaches the conversation that ends with the session.
    pub fn with_conversation(mut self, conversation: Arc<ConversationController>) -> Self {
        self.conversation = Some(conversation);
        self
    }

    /// Logs out.
    ///
    /// The session store is cleared and the conversation reset before this
    /// returns. If a token was present, a notification to
    /// `POST /user/logout` is spawned on the current Tokio runtime and its
    /// handle returned; callers are free to ignore it. Without a token, or
    /// outside a runtime, no notification is sent and `None` is returned.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let token = self.store.token();

        if let Err(e) = self.store.clear() {
            tracing::warn!("Persisted session could not be removed: {}", e);
        }
        if let Some(conversation) = &self.conversation {
            conversation.reset();
        }
        tracing::info!("Logged out locally");

        let token = token?;
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("No async runtime; skipping logout notification");
                return None;
            }
        };

        let api = self.api.clone();
        Some(runtime.spawn(async move {
            match api.logout(&token).await {
                Ok(()) => tracing::debug!("Logout acknowledged for {}", redact_token(&token)),
                Err(e) => {
                    let error = EduConnectError::LogoutNotifyFailed(e.to_string());
                    tracing::warn!("{}", error);
                }
            }
        }))
    }
}
