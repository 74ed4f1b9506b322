//! Wiring of the session and conversation lifecycle
//!
//! [`EduConnect`] builds one [`SessionStore`] and injects it into the auth
//! flow, the conversation controller and the logout flow, so every request
//! reads the token from the same place:
//!
//! ```text
//! CaptureAdapter -> AuthFlow -> SessionStore -> ConversationController
//!                                    ^                    |
//!                                    +---- LogoutFlow <---+
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::{ApiClient, Attachment};
use crate::auth::AuthFlow;
use crate::capture::{CaptureAdapter, CapturedImage};
use crate::config::{ChatConfig, Config};
use crate::conversation::{ConversationController, ConversationState, Message};
use crate::error::ClientResult;
use crate::logout::LogoutFlow;
use crate::session::{build_backend, Session, SessionStore};

/// Client facade over the whole lifecycle.
#[derive(Debug)]
pub struct EduConnect {
    store: Arc<SessionStore>,
    auth: AuthFlow,
    conversation: Arc<ConversationController>,
    logout: LogoutFlow,
}

impl EduConnect {
    /// Builds the client from configuration, rehydrating any persisted
    /// session for the configured profile.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EduConnectError::Config`] for a bad base URL
    /// or [`crate::error::EduConnectError::SessionStorage`] if the session
    /// location cannot be determined.
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let api = ApiClient::new(&config.api)?;
        let store = Arc::new(SessionStore::open(build_backend(&config.session)?));
        Ok(Self::new(api, store, &config.chat))
    }

    /// Builds the client around an existing API client and session store.
    pub fn new(api: ApiClient, store: Arc<SessionStore>, chat: &ChatConfig) -> Self {
        let auth = AuthFlow::new(api.clone(), Arc::clone(&store))
            .with_user_label_fallback(chat.user_label_fallback.clone());
        let conversation = Arc::new(
            ConversationController::new(api.clone(), Arc::clone(&store))
                .with_assistant_label(chat.assistant_label.clone()),
        );
        let logout =
            LogoutFlow::new(api, Arc::clone(&store)).with_conversation(Arc::clone(&conversation));

        Self {
            store,
            auth,
            conversation,
            logout,
        }
    }

    pub fn session_store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Current session, if logged in.
    pub fn session(&self) -> Option<Session> {
        self.store.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn conversation(&self) -> &Arc<ConversationController> {
        &self.conversation
    }

    /// Logs in with a captured image; a successful login starts a fresh
    /// conversation.
    pub async fn login(&self, image: CapturedImage) -> ClientResult<Session> {
        let session = self.auth.login(image).await?;
        self.conversation.reset();
        Ok(session)
    }

    /// Captures one frame from `adapter` and logs in with it.
    pub async fn capture_and_login(&self, adapter: &CaptureAdapter) -> ClientResult<Session> {
        let session = self.auth.capture_and_login(adapter).await?;
        self.conversation.reset();
        Ok(session)
    }

    /// See [`ConversationController::send_message`].
    pub async fn send_message(&self, text: &str) -> ClientResult<Option<Message>> {
        self.conversation.send_message(text).await
    }

    /// See [`ConversationController::load_history`].
    pub async fn load_history(&self) -> ClientResult<usize> {
        self.conversation.load_history().await
    }

    /// See [`ConversationController::upload_attachment`].
    pub async fn upload_attachment(&self, attachment: Attachment) -> ClientResult<Message> {
        self.conversation.upload_attachment(attachment).await
    }

    pub fn conversation_state(&self) -> ConversationState {
        self.conversation.state()
    }

    /// See [`LogoutFlow::logout`].
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        self.logout.logout()
    }
}
